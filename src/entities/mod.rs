//! Sea-ORM entities for the inventory ledger core.
//!
//! Status columns are stored as strings and converted through the per-entity
//! status enums (`as_str`/`from_str`); services reject rows whose status does
//! not parse.

pub mod goods_receipt_item;
pub mod goods_receipt_note;
pub mod production_order;
pub mod production_order_item;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod reference_sequence;
pub mod stock_adjustment;
pub mod stock_adjustment_item;
pub mod stock_entry;
pub mod stock_movement;
pub mod warehouse_transfer;
pub mod warehouse_transfer_item;

pub use goods_receipt_item::DiscrepancyType;
pub use goods_receipt_note::ReceiptStatus;
pub use production_order::ProductionOrderStatus;
pub use production_order_item::MaterialStatus;
pub use purchase_order::PurchaseOrderStatus;
pub use stock_adjustment::AdjustmentStatus;
pub use stock_movement::MovementType;
pub use warehouse_transfer::TransferStatus;
