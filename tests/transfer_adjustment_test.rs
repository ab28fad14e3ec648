mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use inventory_ledger::errors::ServiceError;
use inventory_ledger::events::{event_channel, Event};
use inventory_ledger::services::adjustments::{self, NewAdjustmentLine};
use inventory_ledger::services::transfers::{self, NewTransferLine};
use inventory_ledger::services::{movements, stock_ledger, AdjustmentService, TransferService};
use inventory_ledger::DbPool;

async fn seed_stock(db: &DbPool, product: Uuid, warehouse: Uuid, qty: Decimal) {
    let entry = stock_ledger::get_or_create(db, product, warehouse).await.unwrap();
    stock_ledger::add_stock(db, entry, qty).await.unwrap();
}

#[tokio::test]
async fn shipped_then_received_transfer_moves_stock_between_warehouses() {
    let db = common::setup_test_db().await;
    let service = TransferService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let source = Uuid::new_v4();
    let destination = Uuid::new_v4();
    let operator = Uuid::new_v4();
    seed_stock(&db, product, source, dec!(40)).await;

    let transfer = service
        .create(
            source,
            destination,
            vec![NewTransferLine {
                product_id: product,
                quantity: dec!(15),
            }],
            None,
        )
        .await
        .unwrap();
    assert!(transfer.transfer_number.starts_with("TRF-"));
    assert_eq!(transfer.status, "draft");

    let transfer = service.ship(transfer.id, operator).await.unwrap();
    assert_eq!(transfer.status, "in_transit");

    let source_entry = stock_ledger::get_entry(&*db, product, source)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source_entry.quantity, dec!(25));
    // Goods in transit exist at neither warehouse.
    assert!(stock_ledger::get_entry(&*db, product, destination)
        .await
        .unwrap()
        .is_none());

    let transfer = service.receive(transfer.id, operator).await.unwrap();
    assert_eq!(transfer.status, "completed");

    let dest_entry = stock_ledger::get_entry(&*db, product, destination)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dest_entry.quantity, dec!(15));
    assert_eq!(
        stock_ledger::total_stock(&*db, product).await.unwrap(),
        dec!(40)
    );

    let rows = movements::for_document(&*db, transfers::DOCUMENT_TYPE, transfer.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|m| m.movement_type == "transfer_out" && m.quantity == dec!(-15)));
    assert!(rows
        .iter()
        .any(|m| m.movement_type == "transfer_in" && m.quantity == dec!(15)));
}

#[tokio::test]
async fn transfer_announces_draw_down_landing_and_low_stock() {
    let db = common::setup_test_db().await;
    let (sender, mut rx) = event_channel(32);
    let service = TransferService::new(db.clone(), Some(sender));
    let product = Uuid::new_v4();
    let source = Uuid::new_v4();
    let destination = Uuid::new_v4();

    let entry = stock_ledger::get_or_create(&*db, product, source).await.unwrap();
    let entry = stock_ledger::add_stock(&*db, entry, dec!(20)).await.unwrap();
    stock_ledger::set_reorder_level(&*db, entry, dec!(10)).await.unwrap();

    let transfer = service
        .create(
            source,
            destination,
            vec![NewTransferLine {
                product_id: product,
                quantity: dec!(15),
            }],
            None,
        )
        .await
        .unwrap();
    service.ship(transfer.id, Uuid::new_v4()).await.unwrap();
    service.receive(transfer.id, Uuid::new_v4()).await.unwrap();

    let mut removed = None;
    let mut added = None;
    let mut low_stock = None;
    let mut movement_count = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::StockRemoved {
                warehouse_id,
                new_on_hand,
                ..
            } => removed = Some((warehouse_id, new_on_hand)),
            Event::StockAdded {
                warehouse_id,
                new_on_hand,
                ..
            } => added = Some((warehouse_id, new_on_hand)),
            Event::LowStockDetected {
                on_hand,
                reorder_level,
                ..
            } => low_stock = Some((on_hand, reorder_level)),
            Event::MovementRecorded { .. } => movement_count += 1,
            _ => {}
        }
    }

    assert_eq!(removed, Some((source, dec!(5))));
    assert_eq!(added, Some((destination, dec!(15))));
    // Five left against a reorder level of ten.
    assert_eq!(low_stock, Some((dec!(5), dec!(10))));
    assert_eq!(movement_count, 2);
}

#[tokio::test]
async fn ship_fails_whole_and_leaves_the_draft_intact_when_stock_is_short() {
    let db = common::setup_test_db().await;
    let service = TransferService::new(db.clone(), None);
    let covered = Uuid::new_v4();
    let short = Uuid::new_v4();
    let source = Uuid::new_v4();
    seed_stock(&db, covered, source, dec!(50)).await;
    seed_stock(&db, short, source, dec!(3)).await;

    let transfer = service
        .create(
            source,
            Uuid::new_v4(),
            vec![
                NewTransferLine {
                    product_id: covered,
                    quantity: dec!(10),
                },
                NewTransferLine {
                    product_id: short,
                    quantity: dec!(5),
                },
            ],
            None,
        )
        .await
        .unwrap();

    let err = service.ship(transfer.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let transfer = service.get(transfer.id).await.unwrap();
    assert_eq!(transfer.status, "draft");
    assert_eq!(
        stock_ledger::total_stock(&*db, covered).await.unwrap(),
        dec!(50)
    );
    assert!(
        movements::for_document(&*db, transfers::DOCUMENT_TYPE, transfer.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn transfer_transitions_must_happen_in_order() {
    let db = common::setup_test_db().await;
    let service = TransferService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let source = Uuid::new_v4();
    seed_stock(&db, product, source, dec!(10)).await;

    let err = service
        .create(source, source, vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let transfer = service
        .create(
            source,
            Uuid::new_v4(),
            vec![NewTransferLine {
                product_id: product,
                quantity: dec!(5),
            }],
            None,
        )
        .await
        .unwrap();

    let err = service.receive(transfer.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, action: "receive" } if from == "draft"
    ));

    service.ship(transfer.id, Uuid::new_v4()).await.unwrap();
    let err = service.ship(transfer.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, action: "ship" } if from == "in_transit"
    ));

    service.receive(transfer.id, Uuid::new_v4()).await.unwrap();
    let err = service.receive(transfer.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn approved_adjustment_applies_counted_minus_system_deltas() {
    let db = common::setup_test_db().await;
    let service = AdjustmentService::new(db.clone(), None);
    let counted_down = Uuid::new_v4();
    let counted_up = Uuid::new_v4();
    let unchanged = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    let auditor = Uuid::new_v4();

    seed_stock(&db, counted_down, warehouse, dec!(10)).await;
    seed_stock(&db, unchanged, warehouse, dec!(7)).await;
    // counted_up has no ledger entry yet: system quantity snapshots as zero.

    let adjustment = service
        .create(
            warehouse,
            vec![
                NewAdjustmentLine {
                    product_id: counted_down,
                    counted_quantity: dec!(6),
                },
                NewAdjustmentLine {
                    product_id: counted_up,
                    counted_quantity: dec!(5),
                },
                NewAdjustmentLine {
                    product_id: unchanged,
                    counted_quantity: dec!(7),
                },
            ],
            Some("cycle count".to_string()),
        )
        .await
        .unwrap();
    assert!(adjustment.adjustment_number.starts_with("ADJ-"));

    let items = service.get_items(adjustment.id).await.unwrap();
    let down_item = items.iter().find(|i| i.product_id == counted_down).unwrap();
    assert_eq!(down_item.system_quantity, dec!(10));
    assert_eq!(down_item.delta(), dec!(-4));

    let adjustment = service.approve(adjustment.id, auditor).await.unwrap();
    assert_eq!(adjustment.status, "approved");

    assert_eq!(
        stock_ledger::get_entry(&*db, counted_down, warehouse)
            .await
            .unwrap()
            .unwrap()
            .quantity,
        dec!(6)
    );
    assert_eq!(
        stock_ledger::get_entry(&*db, counted_up, warehouse)
            .await
            .unwrap()
            .unwrap()
            .quantity,
        dec!(5)
    );
    assert_eq!(
        stock_ledger::get_entry(&*db, unchanged, warehouse)
            .await
            .unwrap()
            .unwrap()
            .quantity,
        dec!(7)
    );

    // Matching counts post no movement.
    let rows = movements::for_document(&*db, adjustments::DOCUMENT_TYPE, adjustment.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|m| m.product_id == counted_down && m.quantity == dec!(-4)));
    assert!(rows
        .iter()
        .any(|m| m.product_id == counted_up && m.quantity == dec!(5)));
    assert!(rows.iter().all(|m| m.movement_type == "adjustment"));

    let err = service.approve(adjustment.id, auditor).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition { ref from, action: "approve" } if from == "approved"
    ));
}

#[tokio::test]
async fn adjustment_snapshot_is_taken_at_creation_time() {
    let db = common::setup_test_db().await;
    let service = AdjustmentService::new(db.clone(), None);
    let product = Uuid::new_v4();
    let warehouse = Uuid::new_v4();
    seed_stock(&db, product, warehouse, dec!(10)).await;

    let adjustment = service
        .create(
            warehouse,
            vec![NewAdjustmentLine {
                product_id: product,
                counted_quantity: dec!(8),
            }],
            None,
        )
        .await
        .unwrap();

    // Stock moves between count and approval; the delta stays relative to
    // the snapshot, not the live figure.
    seed_stock(&db, product, warehouse, dec!(100)).await;

    service.approve(adjustment.id, Uuid::new_v4()).await.unwrap();
    let entry = stock_ledger::get_entry(&*db, product, warehouse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.quantity, dec!(108));
}
