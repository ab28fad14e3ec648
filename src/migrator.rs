use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_stock_tables::Migration),
            Box::new(m20250101_000002_create_document_tables::Migration),
        ]
    }
}

mod m20250101_000001_create_stock_tables {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockEntries::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(StockEntries::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(StockEntries::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockEntries::WarehouseId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockEntries::Quantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockEntries::ReservedQuantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockEntries::AvailableQuantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockEntries::ReorderLevel)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockEntries::Version).integer().not_null())
                        .col(
                            ColumnDef::new(StockEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockEntries::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One balance row per (product, warehouse); get_or_create relies
            // on this to lose at most one racing insert.
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_entries_product_warehouse")
                        .table(StockEntries::Table)
                        .col(StockEntries::ProductId)
                        .col(StockEntries::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(StockMovements::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(StockMovements::ReferenceNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::MovementType).string().not_null())
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::UnitCost)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::TotalCost)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::BalanceBefore)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::BalanceAfter)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::DocumentType).string().not_null())
                        .col(ColumnDef::new(StockMovements::DocumentId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::PerformedBy).uuid())
                        .col(ColumnDef::new(StockMovements::Notes).text())
                        .col(
                            ColumnDef::new(StockMovements::MovementDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_product_warehouse")
                        .table(StockMovements::Table)
                        .col(StockMovements::ProductId)
                        .col(StockMovements::WarehouseId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_document")
                        .table(StockMovements::Table)
                        .col(StockMovements::DocumentType)
                        .col(StockMovements::DocumentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReferenceSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReferenceSequences::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ReferenceSequences::Prefix).string().not_null())
                        .col(
                            ColumnDef::new(ReferenceSequences::SequenceDate)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReferenceSequences::NextValue)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReferenceSequences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_reference_sequences_prefix_date")
                        .table(ReferenceSequences::Table)
                        .col(ReferenceSequences::Prefix)
                        .col(ReferenceSequences::SequenceDate)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReferenceSequences::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockEntries::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockEntries {
        Table,
        Id,
        ProductId,
        WarehouseId,
        Quantity,
        ReservedQuantity,
        AvailableQuantity,
        ReorderLevel,
        Version,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StockMovements {
        Table,
        Id,
        ReferenceNumber,
        ProductId,
        WarehouseId,
        MovementType,
        Quantity,
        UnitCost,
        TotalCost,
        BalanceBefore,
        BalanceAfter,
        DocumentType,
        DocumentId,
        PerformedBy,
        Notes,
        MovementDate,
        CreatedAt,
    }

    #[derive(Iden)]
    enum ReferenceSequences {
        Table,
        Id,
        Prefix,
        SequenceDate,
        NextValue,
        UpdatedAt,
    }
}

mod m20250101_000002_create_document_tables {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PurchaseOrders::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::OrderDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ApprovedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(PurchaseOrders::ApprovedBy).uuid())
                        .col(ColumnDef::new(PurchaseOrders::CancelledAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(PurchaseOrders::Notes).text())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::QuantityOrdered)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::QuantityReceived)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::QuantityRemaining)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UnitCost)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_order_items_order")
                        .table(PurchaseOrderItems::Table)
                        .col(PurchaseOrderItems::PurchaseOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceiptNotes::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptNotes::ReceiptNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptNotes::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptNotes::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceiptNotes::Status).string().not_null())
                        .col(
                            ColumnDef::new(GoodsReceiptNotes::HasDiscrepancy)
                                .boolean()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptNotes::ReceivedBy).uuid())
                        .col(ColumnDef::new(GoodsReceiptNotes::VerifiedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(GoodsReceiptNotes::VerifiedBy).uuid())
                        .col(ColumnDef::new(GoodsReceiptNotes::ApprovedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(GoodsReceiptNotes::ApprovedBy).uuid())
                        .col(ColumnDef::new(GoodsReceiptNotes::Notes).text())
                        .col(
                            ColumnDef::new(GoodsReceiptNotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptNotes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceiptItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::ReceiptId).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceiptItems::PurchaseOrderItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceiptItems::QuantityOrdered)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptItems::QuantityReceived)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptItems::QuantityAccepted)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptItems::DiscrepancyQuantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceiptItems::DiscrepancyType).string())
                        .col(ColumnDef::new(GoodsReceiptItems::Notes).text())
                        .col(
                            ColumnDef::new(GoodsReceiptItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_goods_receipt_items_receipt")
                        .table(GoodsReceiptItems::Table)
                        .col(GoodsReceiptItems::ReceiptId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WarehouseTransfers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseTransfers::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransfers::TransferNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransfers::FromWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransfers::ToWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WarehouseTransfers::Status).string().not_null())
                        .col(ColumnDef::new(WarehouseTransfers::ShippedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(WarehouseTransfers::ShippedBy).uuid())
                        .col(
                            ColumnDef::new(WarehouseTransfers::ReceivedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(WarehouseTransfers::ReceivedBy).uuid())
                        .col(ColumnDef::new(WarehouseTransfers::Notes).text())
                        .col(
                            ColumnDef::new(WarehouseTransfers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransfers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WarehouseTransferItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseTransferItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransferItems::TransferId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransferItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransferItems::Quantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransferItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseTransferItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StockAdjustments::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockAdjustments::Status).string().not_null())
                        .col(ColumnDef::new(StockAdjustments::Reason).text())
                        .col(ColumnDef::new(StockAdjustments::ApprovedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(StockAdjustments::ApprovedBy).uuid())
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustmentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustmentItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::AdjustmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustmentItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustmentItems::SystemQuantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::CountedQuantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionOrders::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ProductionOrders::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductionOrders::Quantity)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionOrders::Status).string().not_null())
                        .col(ColumnDef::new(ProductionOrders::ReleasedAt).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(ProductionOrders::CompletedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(ProductionOrders::Notes).text())
                        .col(
                            ColumnDef::new(ProductionOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionOrderItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::ProductionOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionOrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductionOrderItems::Status).string().not_null())
                        .col(
                            ColumnDef::new(ProductionOrderItems::QuantityRequired)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::QuantityReserved)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::QuantityIssued)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::QuantityConsumed)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::QuantityReturned)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::UnitCost)
                                .decimal_len(20, 6)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionOrderItems::WarehouseId).uuid())
                        .col(
                            ColumnDef::new(ProductionOrderItems::ReservedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::PickedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(ProductionOrderItems::PickedBy).uuid())
                        .col(
                            ColumnDef::new(ProductionOrderItems::IssuedAt)
                                .timestamp_with_time_zone(),
                        )
                        .col(ColumnDef::new(ProductionOrderItems::IssuedBy).uuid())
                        .col(
                            ColumnDef::new(ProductionOrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrderItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_production_order_items_order")
                        .table(ProductionOrderItems::Table)
                        .col(ProductionOrderItems::ProductionOrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockAdjustmentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WarehouseTransferItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WarehouseTransfers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsReceiptItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsReceiptNotes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum PurchaseOrders {
        Table,
        Id,
        OrderNumber,
        SupplierId,
        Status,
        OrderDate,
        ApprovedAt,
        ApprovedBy,
        CancelledAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum PurchaseOrderItems {
        Table,
        Id,
        PurchaseOrderId,
        ProductId,
        QuantityOrdered,
        QuantityReceived,
        QuantityRemaining,
        UnitCost,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum GoodsReceiptNotes {
        Table,
        Id,
        ReceiptNumber,
        PurchaseOrderId,
        WarehouseId,
        Status,
        HasDiscrepancy,
        ReceivedBy,
        VerifiedAt,
        VerifiedBy,
        ApprovedAt,
        ApprovedBy,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum GoodsReceiptItems {
        Table,
        Id,
        ReceiptId,
        PurchaseOrderItemId,
        ProductId,
        QuantityOrdered,
        QuantityReceived,
        QuantityAccepted,
        DiscrepancyQuantity,
        DiscrepancyType,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum WarehouseTransfers {
        Table,
        Id,
        TransferNumber,
        FromWarehouseId,
        ToWarehouseId,
        Status,
        ShippedAt,
        ShippedBy,
        ReceivedAt,
        ReceivedBy,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum WarehouseTransferItems {
        Table,
        Id,
        TransferId,
        ProductId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StockAdjustments {
        Table,
        Id,
        AdjustmentNumber,
        WarehouseId,
        Status,
        Reason,
        ApprovedAt,
        ApprovedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StockAdjustmentItems {
        Table,
        Id,
        AdjustmentId,
        ProductId,
        SystemQuantity,
        CountedQuantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProductionOrders {
        Table,
        Id,
        OrderNumber,
        ProductId,
        Quantity,
        Status,
        ReleasedAt,
        CompletedAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProductionOrderItems {
        Table,
        Id,
        ProductionOrderId,
        ProductId,
        Status,
        QuantityRequired,
        QuantityReserved,
        QuantityIssued,
        QuantityConsumed,
        QuantityReturned,
        UnitCost,
        WarehouseId,
        ReservedAt,
        PickedAt,
        PickedBy,
        IssuedAt,
        IssuedBy,
        CreatedAt,
        UpdatedAt,
    }
}
