pub mod adjustments;
pub mod goods_receipts;
pub mod movements;
pub mod production;
pub mod purchase_orders;
pub mod sequences;
pub mod stock_ledger;
pub mod transfers;

pub use adjustments::{AdjustmentService, NewAdjustmentLine};
pub use goods_receipts::{GoodsReceiptService, ReceivedLine};
pub use movements::NewMovement;
pub use production::{NewMaterialLine, ProductionOrderService};
pub use purchase_orders::{NewPurchaseOrderLine, PurchaseOrderService};
pub use transfers::{NewTransferLine, TransferService};
