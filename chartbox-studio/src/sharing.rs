use chartbox_core::{random_string, Category};
use log::info;
use thiserror::Error;

use crate::{
    Database, DatabaseError, GraphRecord, NewShareCode, PrimaryKey, ShareCodeData, StudioContext,
};

/// The length of a generated share code.
pub const SHARE_CODE_LENGTH: usize = 10;

/// Creates and resolves opaque read-only share codes for graphs.
pub struct Sharing<Db> {
    context: StudioContext<Db>,
}

#[derive(Debug, Error)]
pub enum SharingError {
    /// Unknown codes, private codes, and codes owned by someone else all
    /// collapse into this, so a code reveals nothing it shouldn't.
    #[error("Share code does not exist")]
    UnknownCode,
    #[error(transparent)]
    Db(DatabaseError),
}

/// A share code together with the graph content it exposes.
#[derive(Debug, Clone)]
pub struct SharedGraph {
    pub code: ShareCodeData,
    pub graph: GraphRecord,
}

impl<Db> Sharing<Db>
where
    Db: Database,
{
    pub fn new(context: &StudioContext<Db>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a share code for one of the caller's own graphs
    pub async fn create(
        &self,
        owner_id: PrimaryKey,
        category: Category,
        graph_id: &str,
        is_public: bool,
    ) -> Result<ShareCodeData, SharingError> {
        // Only the owner of an existing graph may share it
        let graph = self
            .context
            .database
            .graph_by_id(owner_id, category, graph_id)
            .await
            .map_err(SharingError::Db)?;

        let code = self
            .context
            .database
            .create_share_code(NewShareCode {
                code: random_string(SHARE_CODE_LENGTH),
                owner_id,
                category,
                graph_id: graph.id,
                is_public,
            })
            .await
            .map_err(SharingError::Db)?;

        info!("Graph '{}' shared as {}", graph.spec.name, code.code);

        Ok(code)
    }

    /// Resolves a code to the referenced graph's current content. Only public
    /// codes resolve. The graph is read live, so edits after sharing change
    /// what the link shows.
    pub async fn resolve(&self, code: &str) -> Result<SharedGraph, SharingError> {
        let data = self
            .context
            .database
            .share_code(code)
            .await
            .map_err(not_found_is_unknown)?;

        if !data.is_public {
            return Err(SharingError::UnknownCode);
        }

        let graph = self
            .context
            .database
            .graph_by_id(data.owner_id, data.category, &data.graph_id)
            .await
            .map_err(not_found_is_unknown)?;

        Ok(SharedGraph { code: data, graph })
    }

    /// Toggles whether a code resolves publicly
    pub async fn set_visibility(
        &self,
        owner_id: PrimaryKey,
        code: &str,
        is_public: bool,
    ) -> Result<ShareCodeData, SharingError> {
        let _ = self.owned_code(owner_id, code).await?;

        self.context
            .database
            .set_share_code_visibility(code, is_public)
            .await
            .map_err(SharingError::Db)
    }

    /// Deletes a code entirely
    pub async fn revoke(&self, owner_id: PrimaryKey, code: &str) -> Result<(), SharingError> {
        let _ = self.owned_code(owner_id, code).await?;

        self.context
            .database
            .delete_share_code(code)
            .await
            .map_err(SharingError::Db)
    }

    async fn owned_code(
        &self,
        owner_id: PrimaryKey,
        code: &str,
    ) -> Result<ShareCodeData, SharingError> {
        let data = self
            .context
            .database
            .share_code(code)
            .await
            .map_err(not_found_is_unknown)?;

        if data.owner_id != owner_id {
            return Err(SharingError::UnknownCode);
        }

        Ok(data)
    }
}

fn not_found_is_unknown(error: DatabaseError) -> SharingError {
    match error {
        DatabaseError::NotFound { .. } => SharingError::UnknownCode,
        e => SharingError::Db(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{studio, user};
    use chartbox_core::{GraphData, GraphKind, GraphSpec};

    fn spec() -> GraphSpec {
        GraphSpec {
            name: "Revenue".to_string(),
            kind: GraphKind::Bar,
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

    #[tokio::test]
    async fn test_public_codes_resolve_to_current_content() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, spec())
            .await
            .unwrap();

        let code = studio
            .sharing
            .create(owner.id, Category::Business, &graph.id, true)
            .await
            .unwrap();

        assert_eq!(code.code.len(), SHARE_CODE_LENGTH);

        let shared = studio.sharing.resolve(&code.code).await.unwrap();
        assert_eq!(shared.graph.spec.data, GraphData::Single(vec![10., 20.]));

        // Edits after sharing change what the link shows
        let mut updated = spec();
        updated.data = GraphData::Single(vec![1., 2.]);

        studio
            .graphs
            .update(owner.id, Category::Business, &graph.id, updated)
            .await
            .unwrap();

        let shared = studio.sharing.resolve(&code.code).await.unwrap();
        assert_eq!(shared.graph.spec.data, GraphData::Single(vec![1., 2.]));
    }

    #[tokio::test]
    async fn test_private_codes_do_not_resolve() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, spec())
            .await
            .unwrap();

        let code = studio
            .sharing
            .create(owner.id, Category::Business, &graph.id, false)
            .await
            .unwrap();

        assert!(matches!(
            studio.sharing.resolve(&code.code).await,
            Err(SharingError::UnknownCode)
        ));

        // Until the owner flips visibility
        studio
            .sharing
            .set_visibility(owner.id, &code.code, true)
            .await
            .unwrap();

        assert!(studio.sharing.resolve(&code.code).await.is_ok());
    }

    #[tokio::test]
    async fn test_sharing_requires_ownership() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;
        let intruder = user(&studio, "intruder@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, spec())
            .await
            .unwrap();

        let result = studio
            .sharing
            .create(intruder.id, Category::Business, &graph.id, true)
            .await;

        assert!(matches!(
            result,
            Err(SharingError::Db(DatabaseError::NotFound { .. }))
        ));

        // Nor can someone else's code be revoked or toggled
        let code = studio
            .sharing
            .create(owner.id, Category::Business, &graph.id, true)
            .await
            .unwrap();

        assert!(matches!(
            studio.sharing.revoke(intruder.id, &code.code).await,
            Err(SharingError::UnknownCode)
        ));
        assert!(matches!(
            studio
                .sharing
                .set_visibility(intruder.id, &code.code, false)
                .await,
            Err(SharingError::UnknownCode)
        ));
    }

    #[tokio::test]
    async fn test_revoked_codes_are_gone() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, spec())
            .await
            .unwrap();

        let code = studio
            .sharing
            .create(owner.id, Category::Business, &graph.id, true)
            .await
            .unwrap();

        studio.sharing.revoke(owner.id, &code.code).await.unwrap();

        assert!(matches!(
            studio.sharing.resolve(&code.code).await,
            Err(SharingError::UnknownCode)
        ));
    }

    #[tokio::test]
    async fn test_deleting_the_graph_orphans_no_codes() {
        let studio = studio().await;
        let owner = user(&studio, "owner@example.com").await;

        let graph = studio
            .graphs
            .create(owner.id, Category::Business, spec())
            .await
            .unwrap();

        let code = studio
            .sharing
            .create(owner.id, Category::Business, &graph.id, true)
            .await
            .unwrap();

        studio
            .graphs
            .delete(owner.id, Category::Business, &graph.id)
            .await
            .unwrap();

        // The code cascaded away with the graph
        assert!(matches!(
            studio.sharing.resolve(&code.code).await,
            Err(SharingError::UnknownCode)
        ));
    }
}
