//! Structure Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Allocation, Structure};

const STRUCTURE_TABLE: &str = "structure";

#[derive(Clone)]
pub struct StructureRepository {
    base: BaseRepository,
}

impl StructureRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all structures
    pub async fn find_all(&self) -> RepoResult<Vec<Structure>> {
        let structures: Vec<Structure> = self
            .base
            .db()
            .query("SELECT * FROM structure ORDER BY structurePO")
            .await?
            .take(0)?;
        Ok(structures)
    }

    /// Find structure by purchase order number
    pub async fn find_by_po(&self, structure_po: &str) -> RepoResult<Option<Structure>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM structure WHERE structurePO = $po LIMIT 1")
            .bind(("po", structure_po.to_string()))
            .await?;
        let structures: Vec<Structure> = result.take(0)?;
        Ok(structures.into_iter().next())
    }

    /// Find by PO, creating an empty structure on first reference
    ///
    /// `structure_name` 仅在创建时落库。
    pub async fn find_or_create(
        &self,
        structure_po: &str,
        structure_name: &str,
    ) -> RepoResult<Structure> {
        if let Some(existing) = self.find_by_po(structure_po).await? {
            return Ok(existing);
        }

        let structure = Structure {
            id: None,
            structure_po: structure_po.to_string(),
            structure_name: structure_name.to_string(),
            hardware_allocation: Vec::new(),
        };

        let created: Option<Structure> = self
            .base
            .db()
            .create(STRUCTURE_TABLE)
            .content(structure)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create structure".to_string()))
    }

    /// Replace the allocation list of a structure (per-document atomic save)
    pub async fn set_allocations(
        &self,
        structure_po: &str,
        allocations: Vec<Allocation>,
    ) -> RepoResult<Structure> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE structure SET hardwareAllocation = $alloc \
                 WHERE structurePO = $po RETURN AFTER",
            )
            .bind(("po", structure_po.to_string()))
            .bind(("alloc", allocations))
            .await?;
        let structures: Vec<Structure> = result.take(0)?;
        structures
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Structure {} not found", structure_po)))
    }
}
