use chartbox_core::{calculate, timestamp_id, CalcError};
use thiserror::Error;

use crate::{
    CalculatorEntryData, Database, DatabaseError, NewCalculatorEntry, PrimaryKey, StudioContext,
};

/// Calculator evaluation with cloud-synced history.
pub struct Calculator<Db> {
    context: StudioContext<Db>,
}

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl<Db> Calculator<Db>
where
    Db: Database,
{
    pub fn new(context: &StudioContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Evaluates the input and records it in the user's history.
    /// Failed evaluations are not recorded.
    pub async fn evaluate(
        &self,
        user_id: PrimaryKey,
        input: &str,
    ) -> Result<CalculatorEntryData, CalculatorError> {
        let calculation = calculate(input)?;

        let entry = self
            .context
            .database
            .create_calculator_entry(NewCalculatorEntry {
                id: timestamp_id(),
                user_id,
                expression: input.to_string(),
                result: calculation.formatted,
            })
            .await?;

        Ok(entry)
    }

    /// The user's history, newest first
    pub async fn history(
        &self,
        user_id: PrimaryKey,
    ) -> Result<Vec<CalculatorEntryData>, DatabaseError> {
        self.context.database.calculator_history(user_id).await
    }

    pub async fn delete_entry(
        &self,
        user_id: PrimaryKey,
        entry_id: &str,
    ) -> Result<(), DatabaseError> {
        self.context
            .database
            .delete_calculator_entry(user_id, entry_id)
            .await
    }

    pub async fn clear(&self, user_id: PrimaryKey) -> Result<(), DatabaseError> {
        self.context
            .database
            .clear_calculator_history(user_id)
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{studio, user};

    #[tokio::test]
    async fn test_evaluation_is_recorded() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;

        let entry = studio.calculator.evaluate(me.id, "6 * 7").await.unwrap();
        assert_eq!(entry.expression, "6 * 7");
        assert_eq!(entry.result, "42");

        let history = studio.calculator.history(me.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, entry.id);
    }

    #[tokio::test]
    async fn test_failed_evaluations_are_not_recorded() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;

        assert!(matches!(
            studio.calculator.evaluate(me.id, "2 +").await,
            Err(CalculatorError::Calc(_))
        ));

        assert!(studio.calculator.history(me.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;

        studio.calculator.evaluate(me.id, "1 + 1").await.unwrap();
        studio.calculator.evaluate(me.id, "2 + 2").await.unwrap();

        let history = studio.calculator.history(me.id).await.unwrap();
        assert_eq!(history[0].expression, "2 + 2");
        assert_eq!(history[1].expression, "1 + 1");
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;
        let other = user(&studio, "other@example.com").await;

        let entry = studio.calculator.evaluate(me.id, "1 + 1").await.unwrap();
        studio.calculator.evaluate(me.id, "2 + 2").await.unwrap();
        studio.calculator.evaluate(other.id, "3 + 3").await.unwrap();

        // Deleting someone else's entry is NotFound
        assert!(matches!(
            studio.calculator.delete_entry(other.id, &entry.id).await,
            Err(DatabaseError::NotFound { .. })
        ));

        studio.calculator.delete_entry(me.id, &entry.id).await.unwrap();
        assert_eq!(studio.calculator.history(me.id).await.unwrap().len(), 1);

        studio.calculator.clear(me.id).await.unwrap();
        assert!(studio.calculator.history(me.id).await.unwrap().is_empty());

        // Clearing only touches the caller's history
        assert_eq!(studio.calculator.history(other.id).await.unwrap().len(), 1);
    }
}
