use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_warehouse_table::Migration),
            Box::new(m20240101_000002_create_spaces_table::Migration),
        ]
    }
}

/// Table identifiers. Column names are part of the stored contract and keep
/// their camel-case spelling.
#[derive(DeriveIden)]
pub enum Warehouse {
    Table,
    #[sea_orm(iden = "warehouseID")]
    WarehouseId,
    Name,
    Width,
    Height,
}

#[derive(DeriveIden)]
pub enum Spaces {
    Table,
    #[sea_orm(iden = "warehouseID")]
    WarehouseId,
    #[sea_orm(iden = "xPos")]
    XPos,
    #[sea_orm(iden = "yPos")]
    YPos,
    #[sea_orm(iden = "type")]
    Type,
}

mod m20240101_000001_create_warehouse_table {
    use super::Warehouse;
    use crate::entities::warehouse::DEFAULT_NAME;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_warehouse_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouse::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouse::WarehouseId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Warehouse::Name).text().default(DEFAULT_NAME))
                        .col(ColumnDef::new(Warehouse::Width).integer().not_null())
                        .col(ColumnDef::new(Warehouse::Height).integer().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouse::Table).to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_spaces_table {
    use super::{Spaces, Warehouse};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_spaces_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // No ON DELETE / ON UPDATE action and no bounds check: both are
            // left to the application.
            manager
                .create_table(
                    Table::create()
                        .table(Spaces::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Spaces::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(Spaces::XPos).integer().not_null())
                        .col(ColumnDef::new(Spaces::YPos).integer().not_null())
                        .col(ColumnDef::new(Spaces::Type).text())
                        .primary_key(
                            Index::create()
                                .col(Spaces::WarehouseId)
                                .col(Spaces::XPos)
                                .col(Spaces::YPos),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spaces_warehouse_id")
                                .from(Spaces::Table, Spaces::WarehouseId)
                                .to(Warehouse::Table, Warehouse::WarehouseId),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Spaces::Table).to_owned())
                .await
        }
    }
}
