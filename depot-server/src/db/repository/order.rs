//! Order Repository

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderCreate, OrderLine};
use shared::util::now_millis;

const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all orders, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY date DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find orders for one employee, newest first
    pub async fn find_by_emp(&self, emp_id: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE empId = $emp ORDER BY date DESC")
            .bind(("emp", emp_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find orders referencing a structure, oldest first
    ///
    /// 退还按最旧订单优先消耗，排序在这里保证。
    pub async fn find_by_structure(&self, structure_po: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE structurePO = $po ORDER BY date ASC")
            .bind(("po", structure_po.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Persist a new order document
    pub async fn create(&self, data: OrderCreate) -> RepoResult<Order> {
        let order = Order {
            id: None,
            emp_id: data.emp_id,
            emp_name: data.emp_name,
            structure_po: data.structure_po,
            structure_name: data.structure_name,
            lines: data.lines,
            created_at: now_millis(),
        };

        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Replace the line list of an order (per-document atomic save)
    pub async fn set_lines(&self, order_id: &RecordId, lines: Vec<OrderLine>) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET orders = $lines RETURN AFTER")
            .bind(("thing", order_id.clone()))
            .bind(("lines", lines))
            .await?;
        result
            .take::<Option<Order>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Hard delete an order
    pub async fn delete(&self, id: &str) -> RepoResult<Order> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let deleted: Option<Order> = self.base.db().delete(thing).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }
}
