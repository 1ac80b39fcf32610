use super::*;
use crate::db::models::OrderLineStatus;
use crate::reconcile::ReconcileError;

#[tokio::test]
async fn test_create_order_deducts_stock_and_allocates() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let order = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .expect("order should succeed");

    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 4);
    assert_eq!(order.lines[0].status, OrderLineStatus::Pending);
    assert_eq!(order.emp_id, "E1");

    assert_eq!(ctx.stock("H1").await, 6);
    assert_eq!(ctx.allocation("P1", "H1").await, 4);
}

#[tokio::test]
async fn test_create_order_seeds_structure_name_lazily() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    ctx.engine()
        .create_order(submission("P9", &[("H1", 1)]), &actor())
        .await
        .expect("order should succeed");

    let structure = StructureRepository::new(ctx.db.clone())
        .find_by_po("P9")
        .await
        .unwrap()
        .expect("structure created on first reference");
    assert_eq!(structure.structure_name, "Structure P9");
}

#[tokio::test]
async fn test_zero_quantity_rejected_without_mutation() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let err = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 0)]), &actor())
        .await
        .expect_err("zero quantity must fail");

    assert!(matches!(err, ReconcileError::Validation(_)));
    assert_eq!(ctx.stock("H1").await, 10);

    // 验证失败发生在任何副作用之前 — 不应有审计条目
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(ctx.audit_total().await, 0);
}

#[tokio::test]
async fn test_negative_quantity_rejected() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let err = ctx
        .engine()
        .create_order(submission("P1", &[("H1", -3)]), &actor())
        .await
        .expect_err("negative quantity must fail");

    assert!(matches!(err, ReconcileError::Validation(_)));
    assert_eq!(ctx.stock("H1").await, 10);
}

#[tokio::test]
async fn test_unknown_hardware_rejected() {
    let ctx = TestContext::new().await;

    let err = ctx
        .engine()
        .create_order(submission("P1", &[("NOPE", 1)]), &actor())
        .await
        .expect_err("unknown hardware must fail");

    assert!(matches!(err, ReconcileError::NotFound(_)));
}

#[tokio::test]
async fn test_insufficient_stock_names_offender() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 3).await;

    let err = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 5)]), &actor())
        .await
        .expect_err("oversized order must fail");

    match err {
        ReconcileError::InsufficientStock {
            hardware,
            requested,
            available,
        } => {
            assert_eq!(hardware, "H1");
            assert_eq!(requested, 5);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(ctx.stock("H1").await, 3);
}

#[tokio::test]
async fn test_multi_line_failure_is_all_or_nothing() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;
    // H2 故意缺失

    let err = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 2), ("H2", 1)]), &actor())
        .await
        .expect_err("missing second line must fail the submission");

    assert!(matches!(err, ReconcileError::NotFound(_)));

    // 第一行不应留下任何痕迹
    assert_eq!(ctx.stock("H1").await, 10);
    assert!(
        StructureRepository::new(ctx.db.clone())
            .find_by_po("P1")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        OrderRepository::new(ctx.db.clone())
            .find_by_structure("P1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_repeated_number_validated_against_aggregate() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    // 6 + 5 = 11 > 10，整体拒绝
    let err = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 6), ("H1", 5)]), &actor())
        .await
        .expect_err("aggregate over stock must fail");

    assert!(matches!(err, ReconcileError::InsufficientStock { .. }));
    assert_eq!(ctx.stock("H1").await, 10);

    // 6 + 4 = 10 刚好可行，生成两个独立行项
    let order = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 6), ("H1", 4)]), &actor())
        .await
        .expect("exact fit should succeed");
    assert_eq!(order.lines.len(), 2);
    assert_eq!(ctx.stock("H1").await, 0);
    assert_eq!(ctx.allocation("P1", "H1").await, 10);
}

#[tokio::test]
async fn test_hardware_number_normalized_on_create() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let order = ctx
        .engine()
        .create_order(submission("P1", &[("  h1 ", 2)]), &actor())
        .await
        .expect("normalized lookup should succeed");

    assert_eq!(order.lines[0].hardware_old_number, "H1");
    assert_eq!(ctx.stock("H1").await, 8);
    assert_eq!(ctx.allocation("P1", "H1").await, 2);
}

#[tokio::test]
async fn test_empty_order_rejected() {
    let ctx = TestContext::new().await;

    let err = ctx
        .engine()
        .create_order(submission("P1", &[]), &actor())
        .await
        .expect_err("empty order must fail");

    assert!(matches!(err, ReconcileError::Validation(_)));
}
