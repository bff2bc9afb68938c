use chartbox_core::{
    sample_curve, timestamp_id, Category, Expr, GraphData, GraphError, GraphSpec, SampleError,
    Scope,
};
use log::info;
use thiserror::Error;

use crate::{Database, DatabaseError, GraphRecord, NewGraph, PrimaryKey, StudioContext, UpdatedGraph};

/// Per-user, per-category graph storage.
pub struct GraphLibrary<Db> {
    context: StudioContext<Db>,
}

#[derive(Debug, Error)]
pub enum GraphLibraryError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

impl<Db> GraphLibrary<Db>
where
    Db: Database,
{
    pub fn new(context: &StudioContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Validates and stores a new graph. Expression graphs get their labels
    /// and data derived from the expression before validation.
    pub async fn create(
        &self,
        user_id: PrimaryKey,
        category: Category,
        mut spec: GraphSpec,
    ) -> Result<GraphRecord, GraphLibraryError> {
        if category == Category::Expression {
            derive_curve(&mut spec)?;
        }

        spec.validate(category)?;

        let graph = self
            .context
            .database
            .create_graph(NewGraph {
                id: timestamp_id(),
                user_id,
                category,
                spec,
            })
            .await?;

        info!("Graph '{}' created in {}", graph.spec.name, category);

        Ok(graph)
    }

    pub async fn get(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
    ) -> Result<GraphRecord, DatabaseError> {
        self.context
            .database
            .graph_by_id(user_id, category, graph_id)
            .await
    }

    pub async fn list(
        &self,
        user_id: PrimaryKey,
        category: Category,
    ) -> Result<Vec<GraphRecord>, DatabaseError> {
        self.context.database.list_graphs(user_id, category).await
    }

    /// Replaces a graph's content, with the same validation as creation.
    /// Writes are last-write-wins, there is no conflict detection.
    pub async fn update(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
        mut spec: GraphSpec,
    ) -> Result<GraphRecord, GraphLibraryError> {
        if category == Category::Expression {
            derive_curve(&mut spec)?;
        }

        spec.validate(category)?;

        let graph = self
            .context
            .database
            .update_graph(UpdatedGraph {
                user_id,
                category,
                graph_id: graph_id.to_string(),
                spec,
            })
            .await?;

        Ok(graph)
    }

    /// Deletes a graph along with any share codes pointing at it
    pub async fn delete(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
    ) -> Result<(), DatabaseError> {
        self.context
            .database
            .delete_graph(user_id, category, graph_id)
            .await
    }
}

/// Samples the spec's expression across its range and replaces the labels and
/// data with the resulting curve.
fn derive_curve(spec: &mut GraphSpec) -> Result<(), GraphLibraryError> {
    let expression = spec
        .expression
        .as_deref()
        .ok_or(GraphError::MissingExpression)?;

    let (x_min, x_max) = match (spec.x_min, spec.x_max) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Err(GraphError::InvalidRange {
                min: spec.x_min.unwrap_or(f64::NAN),
                max: spec.x_max.unwrap_or(f64::NAN),
            }
            .into())
        }
    };

    let expr = Expr::parse(expression).map_err(SampleError::from)?;

    let scope = match spec.variables.as_deref() {
        Some(text) => Scope::parse(text).map_err(SampleError::from)?,
        None => Scope::new(),
    };

    let points = sample_curve(&expr, &scope, x_min, x_max)?;

    spec.labels = points.iter().map(|p| format_x(p.x)).collect();
    spec.data = GraphData::Single(points.iter().map(|p| p.y).collect());

    Ok(())
}

/// Axis labels don't need full float precision
fn format_x(x: f64) -> String {
    let rounded = (x * 1000.).round() / 1000.;
    format!("{}", rounded)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{studio, user};
    use chartbox_core::{Dataset, GraphKind, CURVE_SAMPLES};

    fn line_spec(name: &str) -> GraphSpec {
        GraphSpec {
            name: name.to_string(),
            kind: GraphKind::Line,
            labels: vec!["Q1".to_string(), "Q2".to_string()],
            data: GraphData::Single(vec![10., 20.]),
            metric: None,
            weather_type: None,
            expression: None,
            variables: None,
            x_min: None,
            x_max: None,
        }
    }

    fn curve_spec(expression: &str) -> GraphSpec {
        GraphSpec {
            name: "Curve".to_string(),
            kind: GraphKind::Line,
            labels: vec![],
            data: GraphData::Single(vec![]),
            metric: None,
            weather_type: None,
            expression: Some(expression.to_string()),
            variables: None,
            x_min: Some(0.),
            x_max: Some(99.),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, line_spec("Revenue"))
            .await
            .unwrap();

        assert_eq!(graph.user_id, owner.id);
        assert_eq!(graph.category, Category::Business);
        assert_eq!(graph.spec.data, GraphData::Single(vec![10., 20.]));

        let listed = studio
            .graphs
            .list(owner.id, Category::Business)
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, graph.id);

        // Categories are separate namespaces
        assert!(studio
            .graphs
            .list(owner.id, Category::Sports)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_names_are_unique_per_category() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        studio
            .graphs
            .create(owner.id, Category::Business, line_spec("Revenue"))
            .await
            .unwrap();

        let duplicate = studio
            .graphs
            .create(owner.id, Category::Business, line_spec("Revenue"))
            .await;

        assert!(matches!(
            duplicate,
            Err(GraphLibraryError::Db(DatabaseError::Conflict { .. }))
        ));

        // The same name in another category is fine
        assert!(studio
            .graphs
            .create(owner.id, Category::Education, line_spec("Revenue"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_invalid_specs_are_rejected() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let mut spec = line_spec("Lopsided");
        spec.data = GraphData::Multi(vec![Dataset {
            label: "A".to_string(),
            values: vec![1.],
        }]);

        let result = studio.graphs.create(owner.id, Category::Business, spec).await;

        assert!(matches!(
            result,
            Err(GraphLibraryError::Graph(GraphError::LengthMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_expression_graphs_derive_their_curve() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Expression, curve_spec("x ^ 2"))
            .await
            .unwrap();

        assert_eq!(graph.spec.labels.len(), CURVE_SAMPLES);

        match &graph.spec.data {
            GraphData::Single(values) => {
                assert_eq!(values.len(), CURVE_SAMPLES);
                assert_eq!(values[0], 0.);
                assert_eq!(*values.last().unwrap(), 9801.);
            }
            GraphData::Multi(_) => panic!("expected a single derived series"),
        }
    }

    #[tokio::test]
    async fn test_expression_errors_surface() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let result = studio
            .graphs
            .create(owner.id, Category::Expression, curve_spec("x +"))
            .await;

        assert!(matches!(result, Err(GraphLibraryError::Sample(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_content() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, line_spec("Revenue"))
            .await
            .unwrap();

        let mut spec = line_spec("Revenue 2026");
        spec.data = GraphData::Single(vec![30., 40.]);

        let updated = studio
            .graphs
            .update(owner.id, Category::Business, &graph.id, spec)
            .await
            .unwrap();

        assert_eq!(updated.spec.name, "Revenue 2026");
        assert_eq!(updated.spec.data, GraphData::Single(vec![30., 40.]));
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_other_users_graphs_are_invisible() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;
        let intruder = user(&studio, "intruder@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, line_spec("Revenue"))
            .await
            .unwrap();

        let fetched = studio
            .graphs
            .get(intruder.id, Category::Business, &graph.id)
            .await;

        assert!(matches!(fetched, Err(DatabaseError::NotFound { .. })));

        let deleted = studio
            .graphs
            .delete(intruder.id, Category::Business, &graph.id)
            .await;

        assert!(matches!(deleted, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_the_graph() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, line_spec("Revenue"))
            .await
            .unwrap();

        studio
            .graphs
            .delete(owner.id, Category::Business, &graph.id)
            .await
            .unwrap();

        assert!(matches!(
            studio.graphs.get(owner.id, Category::Business, &graph.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
