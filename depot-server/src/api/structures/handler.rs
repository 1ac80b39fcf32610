//! Structure API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::Structure;
use crate::db::repository::StructureRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/structures - 所有结构及其分配
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Structure>>> {
    let repo = StructureRepository::new(state.db.clone());
    let structures = repo
        .find_all()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(structures))
}

/// GET /api/structures/:po - 按 PO 查询结构
pub async fn get_by_po(
    State(state): State<ServerState>,
    Path(po): Path<String>,
) -> AppResult<Json<Structure>> {
    let repo = StructureRepository::new(state.db.clone());
    let structure = repo
        .find_by_po(&po)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Structure {} not found", po)))?;
    Ok(Json(structure))
}
