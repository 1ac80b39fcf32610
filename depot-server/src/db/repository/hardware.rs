//! Hardware Repository

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Hardware, HardwareCreate, HardwareUpdate};
use shared::util::{normalize_hardware_number, now_millis};

const HARDWARE_TABLE: &str = "hardware";

#[derive(Clone)]
pub struct HardwareRepository {
    base: BaseRepository,
}

impl HardwareRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all hardware items
    pub async fn find_all(&self) -> RepoResult<Vec<Hardware>> {
        let items: Vec<Hardware> = self
            .base
            .db()
            .query("SELECT * FROM hardware ORDER BY hardwareGroupName, hardwareOldNumber")
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Find hardware by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Hardware>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let item: Option<Hardware> = self.base.db().select(thing).await?;
        Ok(item)
    }

    /// Find hardware by normalized old number
    pub async fn find_by_old_number(&self, old_number: &str) -> RepoResult<Option<Hardware>> {
        let num = normalize_hardware_number(old_number);
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM hardware WHERE hardwareOldNumber = $num LIMIT 1")
            .bind(("num", num))
            .await?;
        let items: Vec<Hardware> = result.take(0)?;
        Ok(items.into_iter().next())
    }

    /// Duplicate check for the bulk path: (`hardwarePO`, `hardwareOldNumber`)
    pub async fn exists_by_po_and_number(
        &self,
        purchase_order: &str,
        old_number: &str,
    ) -> RepoResult<bool> {
        let num = normalize_hardware_number(old_number);
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM hardware WHERE hardwarePO = $po AND hardwareOldNumber = $num LIMIT 1")
            .bind(("po", purchase_order.to_string()))
            .bind(("num", num))
            .await?;
        let items: Vec<Hardware> = result.take(0)?;
        Ok(!items.is_empty())
    }

    /// Create a new hardware item
    ///
    /// old number 在入库时即规范化，后续所有查找以规范形式为键。
    pub async fn create(&self, data: HardwareCreate) -> RepoResult<Hardware> {
        if data.quantity < 0 {
            return Err(RepoError::Validation(
                "quantity cannot be negative".to_string(),
            ));
        }

        let item = Hardware {
            id: None,
            name: data.name,
            old_number: normalize_hardware_number(&data.old_number),
            purchase_order: data.purchase_order,
            group_name: data.group_name,
            quantity: data.quantity,
            description: data.description,
            created_at: now_millis(),
        };

        let created: Option<Hardware> = self
            .base
            .db()
            .create(HARDWARE_TABLE)
            .content(item)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create hardware item".to_string()))
    }

    /// Update a hardware item
    pub async fn update(&self, id: &str, data: HardwareUpdate) -> RepoResult<Hardware> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;

        if let Some(q) = data.quantity
            && q < 0
        {
            return Err(RepoError::Validation(
                "quantity cannot be negative".to_string(),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    hardwareName = $name OR hardwareName,
                    hardwareOldNumber = $old_number OR hardwareOldNumber,
                    hardwarePO = $purchase_order OR hardwarePO,
                    hardwareGroupName = $group_name OR hardwareGroupName,
                    quantity = IF $has_quantity THEN $quantity ELSE quantity END,
                    hardwareDescription = $description OR hardwareDescription
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", data.name))
            .bind((
                "old_number",
                data.old_number.as_deref().map(normalize_hardware_number),
            ))
            .bind(("purchase_order", data.purchase_order))
            .bind(("group_name", data.group_name))
            .bind(("has_quantity", data.quantity.is_some()))
            .bind(("quantity", data.quantity))
            .bind(("description", data.description))
            .await?;

        result
            .take::<Option<Hardware>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Hardware item {} not found", id)))
    }

    /// Hard delete a hardware item
    pub async fn delete(&self, id: &str) -> RepoResult<Hardware> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let deleted: Option<Hardware> = self.base.db().delete(thing).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("Hardware item {} not found", id)))
    }

    /// Conditionally decrement stock by `quantity`
    ///
    /// 只有余量充足时更新才会生效；返回 None 表示条件未满足
    /// (库存不足或编号不存在) 且什么都没有改变。
    pub async fn try_decrement_stock(
        &self,
        old_number: &str,
        quantity: i64,
    ) -> RepoResult<Option<Hardware>> {
        let num = normalize_hardware_number(old_number);
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE hardware SET quantity -= $qty \
                 WHERE hardwareOldNumber = $num AND quantity >= $qty RETURN AFTER",
            )
            .bind(("num", num))
            .bind(("qty", quantity))
            .await?;
        let items: Vec<Hardware> = result.take(0)?;
        Ok(items.into_iter().next())
    }

    /// Increment stock by `quantity` (return processing)
    pub async fn increment_stock(
        &self,
        old_number: &str,
        quantity: i64,
    ) -> RepoResult<Hardware> {
        let num = normalize_hardware_number(old_number);
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE hardware SET quantity += $qty \
                 WHERE hardwareOldNumber = $num RETURN AFTER",
            )
            .bind(("num", num.clone()))
            .bind(("qty", quantity))
            .await?;
        let items: Vec<Hardware> = result.take(0)?;
        items
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Hardware item {} not found", num)))
    }
}
