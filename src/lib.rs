//! Inventory ledger core: per-warehouse stock balances, an append-only
//! movement log, a material reservation protocol, and the document state
//! machines (purchase orders, goods receipts, warehouse transfers, stock
//! adjustments, production orders) that drive them.
//!
//! Every document action that touches stock runs in a single database
//! transaction: the document status change, the ledger mutations, and the
//! movement rows commit together or not at all. Ledger mutations are guarded
//! by an optimistic version check per stock entry.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;
pub mod telemetry;

pub use config::{load_config, AppConfig};
pub use db::{establish_connection, run_migrations, DbPool};
pub use errors::ServiceError;
pub use events::{event_channel, Event, EventSender};
pub use services::{
    AdjustmentService, GoodsReceiptService, ProductionOrderService, PurchaseOrderService,
    TransferService,
};
