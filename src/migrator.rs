use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_gifts_table::Migration),
            Box::new(m20250301_000002_create_ownership_records_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250301_000001_create_gifts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_gifts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Gifts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Gifts::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Gifts::Name).string().not_null())
                        .col(ColumnDef::new(Gifts::Price).big_integer().not_null())
                        .col(
                            ColumnDef::new(Gifts::RemainingQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Gifts::TotalQuantity).integer().not_null())
                        .col(
                            ColumnDef::new(Gifts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Gifts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Gifts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Gifts {
        Table,
        Id,
        Name,
        Price,
        RemainingQuantity,
        TotalQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_ownership_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_ownership_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OwnershipRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OwnershipRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OwnershipRecords::BuyerId).string().not_null())
                        .col(ColumnDef::new(OwnershipRecords::GiftId).string().not_null())
                        .col(
                            ColumnDef::new(OwnershipRecords::TransactionId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OwnershipRecords::Username).string().null())
                        .col(ColumnDef::new(OwnershipRecords::FirstName).string().null())
                        .col(ColumnDef::new(OwnershipRecords::LastName).string().null())
                        .col(
                            ColumnDef::new(OwnershipRecords::PurchasedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // The unique index is the idempotency guarantee: a retried or
            // duplicated payment confirmation cannot insert a second record.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_ownership_records_transaction_id")
                        .table(OwnershipRecords::Table)
                        .col(OwnershipRecords::TransactionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ownership_records_gift_id")
                        .table(OwnershipRecords::Table)
                        .col(OwnershipRecords::GiftId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ownership_records_purchased_at")
                        .table(OwnershipRecords::Table)
                        .col(OwnershipRecords::PurchasedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OwnershipRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OwnershipRecords {
        Table,
        Id,
        BuyerId,
        GiftId,
        TransactionId,
        Username,
        FirstName,
        LastName,
        PurchasedAt,
    }
}
