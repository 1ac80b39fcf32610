//! Hardware API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::{Actor, AuditAction};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Hardware, HardwareCreate, HardwareUpdate};
use crate::db::repository::HardwareRepository;
use crate::utils::{AppError, AppResult};

/// POST 载荷：单个对象或数组 (批量导入路径)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddHardwarePayload {
    Many(Vec<HardwareCreate>),
    One(Box<HardwareCreate>),
}

#[derive(Debug, Serialize)]
pub struct AddHardwareResponse {
    pub message: String,
    pub result: Hardware,
}

/// 批量导入中被跳过的重复项
#[derive(Debug, Serialize)]
pub struct DuplicateItem {
    pub item: HardwareCreate,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAddResponse {
    pub message: String,
    pub added_items: Vec<Hardware>,
    pub duplicate_items: Vec<DuplicateItem>,
}

/// GET /api/hardware - 库存列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Hardware>>> {
    let repo = HardwareRepository::new(state.db.clone());
    let items = repo
        .find_all()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(items))
}

/// POST /api/hardware - 入库 (单个或批量)
///
/// 批量路径按 (`hardwarePO`, `hardwareOldNumber`) 去重，
/// 重复项跳过并上报，不中断其余条目。
pub async fn add(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AddHardwarePayload>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let repo = HardwareRepository::new(state.db.clone());
    let actor = Actor::user(&user.id, &user.username);

    match payload {
        AddHardwarePayload::One(item) => {
            let created = repo.create(*item).await?;

            state
                .audit_service
                .log(
                    AuditAction::HardwareAdded,
                    actor,
                    json!({
                        "hardwareOldNumber": &created.old_number,
                        "hardwarePO": &created.purchase_order,
                        "quantity": created.quantity,
                    }),
                )
                .await;

            let response = AddHardwareResponse {
                message: "Hardware items added successfully".to_string(),
                result: created,
            };
            Ok((StatusCode::CREATED, Json(serde_json::to_value(response).unwrap_or_default())))
        }
        AddHardwarePayload::Many(items) => {
            let mut added = Vec::new();
            let mut duplicates = Vec::new();

            for item in items {
                let exists = repo
                    .exists_by_po_and_number(&item.purchase_order, &item.old_number)
                    .await?;
                if exists {
                    duplicates.push(DuplicateItem {
                        item,
                        reason: "Duplicate hardwarePO and hardwareOldNumber combination"
                            .to_string(),
                    });
                } else {
                    added.push(repo.create(item).await?);
                }
            }

            state
                .audit_service
                .log(
                    AuditAction::HardwareAdded,
                    actor,
                    json!({
                        "added": added.iter().map(|h| h.old_number.clone()).collect::<Vec<_>>(),
                        "duplicatesSkipped": duplicates.len(),
                    }),
                )
                .await;

            let response = BatchAddResponse {
                message: format!("{} items added successfully.", added.len()),
                added_items: added,
                duplicate_items: duplicates,
            };
            Ok((StatusCode::CREATED, Json(serde_json::to_value(response).unwrap_or_default())))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHardwareResponse {
    pub message: String,
    pub updated_item: Hardware,
}

/// PUT /api/hardware/:id - 更新硬件
///
/// 直接管理端修改，不与在途订单核对 (既有行为)。
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<HardwareUpdate>,
) -> AppResult<Json<UpdateHardwareResponse>> {
    let repo = HardwareRepository::new(state.db.clone());
    let updated = repo.update(&id, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::HardwareUpdated,
            Actor::user(&user.id, &user.username),
            json!({
                "hardwareOldNumber": &updated.old_number,
                "quantity": updated.quantity,
            }),
        )
        .await;

    Ok(Json(UpdateHardwareResponse {
        message: "Hardware updated successfully".to_string(),
        updated_item: updated,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHardwareResponse {
    pub message: String,
    pub deleted_item: Hardware,
}

/// DELETE /api/hardware/:id - 删除硬件
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteHardwareResponse>> {
    let repo = HardwareRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;

    state
        .audit_service
        .log(
            AuditAction::HardwareDeleted,
            Actor::user(&user.id, &user.username),
            json!({
                "hardwareOldNumber": &deleted.old_number,
                "hardwarePO": &deleted.purchase_order,
            }),
        )
        .await;

    Ok(Json(DeleteHardwareResponse {
        message: "Hardware item deleted successfully".to_string(),
        deleted_item: deleted,
    }))
}
