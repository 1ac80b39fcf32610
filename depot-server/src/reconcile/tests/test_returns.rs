use super::*;
use crate::db::models::OrderLineStatus;
use crate::reconcile::ReconcileError;

#[tokio::test]
async fn test_full_untargeted_return_round_trip() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let order = ctx
        .engine()
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();
    let line_id = order.lines[0].line_id.clone();

    let outcome = ctx
        .engine()
        .process_returns(
            return_submission("P1", vec![return_item("H1", 4)]),
            &actor(),
        )
        .await
        .expect("return should be processed");

    assert_eq!(outcome.success.len(), 1);
    assert!(outcome.skipped.is_empty());
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.success[0].returned_quantity, 4);
    assert_eq!(outcome.success[0].remaining_stock, 10);
    assert_eq!(outcome.success[0].remaining_allocation, 0);

    // 完整往返：库存复原、分配归零、行项状态 Returned
    assert_eq!(ctx.stock("H1").await, 10);
    assert_eq!(ctx.allocation("P1", "H1").await, 0);
    assert_eq!(
        ctx.line_status("P1", &line_id).await,
        Some(OrderLineStatus::Returned)
    );
}

#[tokio::test]
async fn test_over_return_fails_item_and_leaves_state() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    ctx.engine()
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();

    let outcome = ctx
        .engine()
        .process_returns(
            return_submission("P1", vec![return_item("H1", 20)]),
            &actor(),
        )
        .await
        .expect("request itself is valid");

    assert!(outcome.success.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].error.contains("Insufficient allocation"));

    // 状态不变
    assert_eq!(ctx.stock("H1").await, 6);
    assert_eq!(ctx.allocation("P1", "H1").await, 4);
}

#[tokio::test]
async fn test_unknown_structure_fails_whole_request() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let err = ctx
        .engine()
        .process_returns(
            return_submission("NO-SUCH-PO", vec![return_item("H1", 1)]),
            &actor(),
        )
        .await
        .expect_err("missing structure fails wholesale");

    assert!(matches!(err, ReconcileError::NotFound(_)));
}

#[tokio::test]
async fn test_untargeted_return_consumes_oldest_order_first() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 20).await;

    let engine = ctx.engine();
    let first = engine
        .create_order(submission("P1", &[("H1", 3)]), &actor())
        .await
        .unwrap();
    let second = engine
        .create_order(submission("P1", &[("H1", 5)]), &actor())
        .await
        .unwrap();

    let outcome = engine
        .process_returns(
            return_submission("P1", vec![return_item("H1", 6)]),
            &actor(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.success.len(), 1);

    // 最旧订单先清零并转为 Returned；第二单剩 2 仍 Pending
    assert_eq!(
        ctx.line_status("P1", &first.lines[0].line_id).await,
        Some(OrderLineStatus::Returned)
    );
    assert_eq!(
        ctx.line_status("P1", &second.lines[0].line_id).await,
        Some(OrderLineStatus::Pending)
    );

    let orders = OrderRepository::new(ctx.db.clone())
        .find_by_structure("P1")
        .await
        .unwrap();
    let second_qty = orders
        .iter()
        .flat_map(|o| o.lines.iter())
        .find(|l| l.line_id == second.lines[0].line_id)
        .unwrap()
        .quantity;
    assert_eq!(second_qty, 2);

    assert_eq!(ctx.stock("H1").await, 18);
    assert_eq!(ctx.allocation("P1", "H1").await, 2);
}

#[tokio::test]
async fn test_untargeted_shortfall_is_prevalidated() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let engine = ctx.engine();
    let order = engine
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();

    // 模拟管理端把行项余量改小：在途量 2 < 分配量 4
    let mut lines = order.lines.clone();
    lines[0].quantity = 2;
    OrderRepository::new(ctx.db.clone())
        .set_lines(order.id.as_ref().unwrap(), lines)
        .await
        .unwrap();

    let outcome = engine
        .process_returns(
            return_submission("P1", vec![return_item("H1", 3)]),
            &actor(),
        )
        .await
        .unwrap();

    // 在途量预验证失败 — 不做部分冲销
    assert_eq!(outcome.errors.len(), 1);
    assert!(
        outcome.errors[0]
            .error
            .contains("Insufficient outstanding quantity")
    );
    assert_eq!(ctx.stock("H1").await, 6);
    assert_eq!(ctx.allocation("P1", "H1").await, 4);
}

#[tokio::test]
async fn test_targeted_return_clamps_to_line_quantity() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 20).await;

    let engine = ctx.engine();
    let first = engine
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();
    engine
        .create_order(submission("P1", &[("H1", 5)]), &actor())
        .await
        .unwrap();

    // 分配量 9 >= 请求 6，但目标行只剩 4 — 实际退还量收口到 4
    let outcome = engine
        .process_returns(
            return_submission(
                "P1",
                vec![targeted_return_item(&first.lines[0].line_id, "H1", 6)],
            ),
            &actor(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.success.len(), 1);
    assert_eq!(outcome.success[0].returned_quantity, 4);
    assert_eq!(
        ctx.line_status("P1", &first.lines[0].line_id).await,
        Some(OrderLineStatus::Returned)
    );
    assert_eq!(ctx.stock("H1").await, 15);
    assert_eq!(ctx.allocation("P1", "H1").await, 5);
}

#[tokio::test]
async fn test_targeted_return_mismatched_hardware_conflicts() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;
    ctx.seed_hardware("H2", 10).await;

    let engine = ctx.engine();
    let order = engine
        .create_order(submission("P1", &[("H1", 2), ("H2", 3)]), &actor())
        .await
        .unwrap();
    let h1_line = order
        .lines
        .iter()
        .find(|l| l.hardware_old_number == "H1")
        .unwrap();

    // 行项属于 H1 却声称退 H2 — 误指向防护
    let outcome = engine
        .process_returns(
            return_submission(
                "P1",
                vec![targeted_return_item(&h1_line.line_id, "H2", 1)],
            ),
            &actor(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].error.contains("is for hardware"));
    assert_eq!(ctx.stock("H1").await, 8);
    assert_eq!(ctx.stock("H2").await, 7);
}

#[tokio::test]
async fn test_returning_depleted_line_is_skipped_not_error() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let engine = ctx.engine();
    let order = engine
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();
    let line_id = order.lines[0].line_id.clone();

    engine
        .process_returns(
            return_submission("P1", vec![return_item("H1", 4)]),
            &actor(),
        )
        .await
        .unwrap();

    // 定向：行项已清零 → skipped (非错误)
    let outcome = engine
        .process_returns(
            return_submission("P1", vec![targeted_return_item(&line_id, "H1", 1)]),
            &actor(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.skipped.len(), 1);
    assert!(outcome.errors.is_empty());

    // 非定向：分配量已归零 → 分配量防护报错
    let outcome = engine
        .process_returns(
            return_submission("P1", vec![return_item("H1", 1)]),
            &actor(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].error.contains("Insufficient allocation"));

    assert_eq!(ctx.stock("H1").await, 10);
}

#[tokio::test]
async fn test_non_positive_return_quantity_fails_item_only() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let engine = ctx.engine();
    engine
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();

    // 无效项与有效项混合：有效项正常生效
    let outcome = engine
        .process_returns(
            return_submission(
                "P1",
                vec![return_item("H1", 0), return_item("H1", 2)],
            ),
            &actor(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.success.len(), 1);
    assert_eq!(ctx.stock("H1").await, 8);
    assert_eq!(ctx.allocation("P1", "H1").await, 2);
}

#[tokio::test]
async fn test_return_accepts_unnormalized_number() {
    let ctx = TestContext::new().await;
    ctx.seed_hardware("H1", 10).await;

    let engine = ctx.engine();
    engine
        .create_order(submission("P1", &[("H1", 4)]), &actor())
        .await
        .unwrap();

    let outcome = engine
        .process_returns(
            return_submission("P1", vec![return_item(" h1 ", 4)]),
            &actor(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.success.len(), 1);
    assert_eq!(outcome.success[0].hardware_old_number, "H1");
    assert_eq!(ctx.stock("H1").await, 10);
}
