mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use inventory_ledger::entities::production_order_item::MaterialStatus;
use inventory_ledger::errors::ServiceError;
use inventory_ledger::events::{event_channel, Event};
use inventory_ledger::services::production::{self, NewMaterialLine};
use inventory_ledger::services::{movements, stock_ledger, ProductionOrderService};
use inventory_ledger::DbPool;

async fn seed_stock(db: &DbPool, product: Uuid, warehouse: Uuid, qty: Decimal) {
    let entry = stock_ledger::get_or_create(db, product, warehouse).await.unwrap();
    stock_ledger::add_stock(db, entry, qty).await.unwrap();
}

fn material(product_id: Uuid, required: Decimal) -> NewMaterialLine {
    NewMaterialLine {
        product_id,
        quantity_required: required,
        unit_cost: dec!(1.50),
    }
}

#[tokio::test]
async fn reserve_picks_the_warehouse_with_most_available_stock() {
    let db = common::setup_test_db().await;
    let service = ProductionOrderService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let warehouse_small = Uuid::new_v4();
    let warehouse_big = Uuid::new_v4();

    seed_stock(&db, product, warehouse_small, dec!(10)).await;
    seed_stock(&db, product, warehouse_big, dec!(100)).await;

    let order = service
        .create(Uuid::new_v4(), dec!(5), vec![material(product, dec!(8))], None)
        .await
        .unwrap();
    assert!(order.order_number.starts_with("PRD-"));
    assert_eq!(order.status, "draft");

    let order = service.reserve_materials(order.id).await.unwrap();
    assert_eq!(order.status, "released");

    let items = service.get_items(order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, MaterialStatus::Reserved.as_str());
    assert_eq!(items[0].quantity_reserved, dec!(8));
    assert_eq!(items[0].warehouse_id, Some(warehouse_big));

    let entry = stock_ledger::get_entry(&*db, product, warehouse_big)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.reserved_quantity, dec!(8));
    assert_eq!(entry.available_quantity, dec!(92));
}

#[tokio::test]
async fn reservation_is_all_or_nothing_and_reports_the_shortage() {
    let db = common::setup_test_db().await;
    let (sender, mut rx) = event_channel(16);
    let service = ProductionOrderService::new(db.clone(), Some(sender));
    let plentiful = Uuid::new_v4();
    let scarce = Uuid::new_v4();
    let warehouse = Uuid::new_v4();

    seed_stock(&db, plentiful, warehouse, dec!(100)).await;
    seed_stock(&db, scarce, warehouse, dec!(2)).await;

    let order = service
        .create(
            Uuid::new_v4(),
            dec!(1),
            vec![material(plentiful, dec!(10)), material(scarce, dec!(5))],
            None,
        )
        .await
        .unwrap();

    let err = service.reserve_materials(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // The plentiful line's reservation was rolled back with the rest.
    let entry = stock_ledger::get_entry(&*db, plentiful, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.reserved_quantity, Decimal::ZERO);

    let order = service.get(order.id).await.unwrap();
    assert_eq!(order.status, "draft");
    let items = service.get_items(order.id).await.unwrap();
    assert!(items
        .iter()
        .all(|i| i.status == MaterialStatus::Pending.as_str()));

    match rx.recv().await.unwrap() {
        Event::MaterialShortageDetected {
            production_order_id,
            product_id,
            required_quantity,
        } => {
            assert_eq!(production_order_id, order.id);
            assert_eq!(product_id, scarce);
            assert_eq!(required_quantity, dec!(5));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn unreserve_returns_the_order_to_draft() {
    let db = common::setup_test_db().await;
    let service = ProductionOrderService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    seed_stock(&db, product, warehouse, dec!(20)).await;

    let order = service
        .create(Uuid::new_v4(), dec!(1), vec![material(product, dec!(12))], None)
        .await
        .unwrap();
    service.reserve_materials(order.id).await.unwrap();

    let order = service.unreserve_materials(order.id).await.unwrap();
    assert_eq!(order.status, "draft");

    let items = service.get_items(order.id).await.unwrap();
    assert_eq!(items[0].status, MaterialStatus::Pending.as_str());
    assert_eq!(items[0].quantity_reserved, Decimal::ZERO);
    assert_eq!(items[0].warehouse_id, None);

    let entry = stock_ledger::get_entry(&*db, product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.reserved_quantity, Decimal::ZERO);
    assert_eq!(entry.available_quantity, dec!(20));
}

#[tokio::test]
async fn pick_issue_consume_walks_the_line_to_completion() {
    let db = common::setup_test_db().await;
    let (sender, mut rx) = event_channel(16);
    let service = ProductionOrderService::new(db.clone(), Some(sender));
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    let operator = Uuid::new_v4();
    seed_stock(&db, product, warehouse, dec!(50)).await;

    let order = service
        .create(Uuid::new_v4(), dec!(1), vec![material(product, dec!(10))], None)
        .await
        .unwrap();
    service.reserve_materials(order.id).await.unwrap();
    let item_id = service.get_items(order.id).await.unwrap()[0].id;

    let item = service.pick(item_id, operator).await.unwrap();
    assert_eq!(item.status, MaterialStatus::Picked.as_str());
    // Picking moves nothing in the ledger.
    let entry = stock_ledger::get_entry(&*db, product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.quantity, dec!(50));
    assert_eq!(entry.reserved_quantity, dec!(10));

    let item = service.issue(item_id, operator).await.unwrap();
    assert_eq!(item.status, MaterialStatus::Issued.as_str());
    assert_eq!(item.quantity_issued, dec!(10));

    let entry = stock_ledger::get_entry(&*db, product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.quantity, dec!(40));
    assert_eq!(entry.reserved_quantity, Decimal::ZERO);
    assert_eq!(entry.available_quantity, dec!(40));

    let rows = movements::for_document(&*db, production::DOCUMENT_TYPE, order.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, dec!(-10));
    assert_eq!(rows[0].balance_before, dec!(50));
    assert_eq!(rows[0].balance_after, dec!(40));
    assert_eq!(rows[0].unit_cost, dec!(1.50));

    let order = service.get(order.id).await.unwrap();
    assert_eq!(order.status, "in_progress");

    let item = service.consume(item_id, dec!(4)).await.unwrap();
    assert_eq!(item.status, MaterialStatus::Issued.as_str());
    assert_eq!(item.quantity_consumed, dec!(4));

    let item = service.consume(item_id, dec!(6)).await.unwrap();
    assert_eq!(item.status, MaterialStatus::Consumed.as_str());

    let order = service.get(order.id).await.unwrap();
    assert_eq!(order.status, "completed");
    assert!(order.completed_at.is_some());

    let mut saw_completed = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, Event::ProductionOrderCompleted { production_order_id, .. }
            if production_order_id == order.id)
        {
            saw_completed = true;
        }
    }
    assert!(saw_completed);
}

#[tokio::test]
async fn returned_material_goes_back_to_its_issuing_warehouse() {
    let db = common::setup_test_db().await;
    let service = ProductionOrderService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    let operator = Uuid::new_v4();
    seed_stock(&db, product, warehouse, dec!(30)).await;

    let order = service
        .create(Uuid::new_v4(), dec!(1), vec![material(product, dec!(10))], None)
        .await
        .unwrap();
    service.reserve_materials(order.id).await.unwrap();
    let item_id = service.get_items(order.id).await.unwrap()[0].id;
    service.pick(item_id, operator).await.unwrap();
    service.issue(item_id, operator).await.unwrap();

    // Returning more than is outstanding is refused.
    let err = service
        .return_material(item_id, dec!(11), operator)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let item = service.return_material(item_id, dec!(10), operator).await.unwrap();
    assert_eq!(item.status, MaterialStatus::Returned.as_str());
    assert_eq!(item.quantity_returned, dec!(10));

    let entry = stock_ledger::get_entry(&*db, product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.quantity, dec!(30));

    let rows = movements::for_document(&*db, production::DOCUMENT_TYPE, order.id)
        .await
        .unwrap();
    // One outbound issue plus one inbound return.
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|m| m.quantity == dec!(10) && m.movement_type == "return"));

    // Everything consumed or returned, so the order is done.
    let order = service.get(order.id).await.unwrap();
    assert_eq!(order.status, "completed");
}

#[tokio::test]
async fn reservation_lifecycle_emits_reserved_and_released_events() {
    let db = common::setup_test_db().await;
    let (sender, mut rx) = event_channel(16);
    let service = ProductionOrderService::new(db.clone(), Some(sender));
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    seed_stock(&db, product, warehouse, dec!(20)).await;

    let order = service
        .create(Uuid::new_v4(), dec!(1), vec![material(product, dec!(12))], None)
        .await
        .unwrap();
    service.reserve_materials(order.id).await.unwrap();

    match rx.recv().await.unwrap() {
        Event::StockReserved {
            product_id,
            warehouse_id,
            quantity,
            available_after,
        } => {
            assert_eq!(product_id, product);
            assert_eq!(warehouse_id, warehouse);
            assert_eq!(quantity, dec!(12));
            assert_eq!(available_after, dec!(8));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(matches!(
        rx.recv().await.unwrap(),
        Event::MaterialsReserved { .. }
    ));

    service.unreserve_materials(order.id).await.unwrap();
    match rx.recv().await.unwrap() {
        Event::StockReleased {
            quantity,
            available_after,
            ..
        } => {
            assert_eq!(quantity, dec!(12));
            assert_eq!(available_after, dec!(20));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn issuing_announces_the_stock_draw_down() {
    let db = common::setup_test_db().await;
    let (sender, mut rx) = event_channel(16);
    let service = ProductionOrderService::new(db.clone(), Some(sender));
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    let operator = Uuid::new_v4();

    let entry = stock_ledger::get_or_create(&*db, product, warehouse)
        .await
        .unwrap();
    let entry = stock_ledger::add_stock(&*db, entry, dec!(15)).await.unwrap();
    stock_ledger::set_reorder_level(&*db, entry, dec!(10)).await.unwrap();

    let order = service
        .create(Uuid::new_v4(), dec!(1), vec![material(product, dec!(10))], None)
        .await
        .unwrap();
    service.reserve_materials(order.id).await.unwrap();
    let item_id = service.get_items(order.id).await.unwrap()[0].id;
    service.pick(item_id, operator).await.unwrap();
    service.issue(item_id, operator).await.unwrap();

    let mut removed = None;
    let mut movement = None;
    let mut low_stock = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::StockRemoved {
                quantity,
                new_on_hand,
                ..
            } => removed = Some((quantity, new_on_hand)),
            Event::MovementRecorded {
                reference_number,
                quantity,
                ..
            } => movement = Some((reference_number, quantity)),
            Event::LowStockDetected { on_hand, .. } => low_stock = Some(on_hand),
            _ => {}
        }
    }

    assert_eq!(removed, Some((dec!(10), dec!(5))));
    let (reference_number, quantity) = movement.unwrap();
    assert!(reference_number.starts_with("MOV-"));
    assert_eq!(quantity, dec!(-10));
    assert_eq!(low_stock, Some(dec!(5)));
}

#[tokio::test]
async fn material_state_machine_rejects_skipped_steps() {
    let db = common::setup_test_db().await;
    let service = ProductionOrderService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    let operator = Uuid::new_v4();
    seed_stock(&db, product, warehouse, dec!(50)).await;

    let order = service
        .create(Uuid::new_v4(), dec!(1), vec![material(product, dec!(5))], None)
        .await
        .unwrap();
    let item_id = service.get_items(order.id).await.unwrap()[0].id;

    // Pending lines cannot be picked, issued, or consumed.
    let err = service.pick(item_id, operator).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, action: "pick" } if from == "pending"
    ));
    let err = service.issue(item_id, operator).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { action: "issue", .. }
    ));
    let err = service.consume(item_id, dec!(1)).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { action: "consume", .. }
    ));

    service.reserve_materials(order.id).await.unwrap();

    // A released order cannot reserve again.
    let err = service.reserve_materials(order.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, .. } if from == "released"
    ));

    // Reserved lines must be picked before issue.
    let err = service.issue(item_id, operator).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, .. } if from == "reserved"
    ));

    service.pick(item_id, operator).await.unwrap();

    // Picked lines are past the point of unreserving the order.
    let err = service.unreserve_materials(order.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    service.issue(item_id, operator).await.unwrap();
    let err = service.pick(item_id, operator).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, .. } if from == "issued"
    ));
}
