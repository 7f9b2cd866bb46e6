use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_catalog_tables::Migration),
            Box::new(m20250301_000002_create_cart_tables::Migration),
            Box::new(m20250301_000003_create_quote_tables::Migration),
        ]
    }
}

mod m20250301_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .col(ColumnDef::new(Categories::ImageUrl).string_len(1024).null())
                        .col(ColumnDef::new(Categories::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Categories::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Brands::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Brands::Slug)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Brands::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Brands::Description).text().null())
                        .col(ColumnDef::new(Brands::LogoUrl).string_len(1024).null())
                        .col(ColumnDef::new(Brands::Website).string_len(1024).null())
                        .col(ColumnDef::new(Brands::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Brands::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Products::Description).text().not_null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::StockQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Images).json().not_null())
                        .col(ColumnDef::new(Products::Specs).json().not_null())
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(Products::BrandId).uuid().not_null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_brand_id")
                                .from(Products::Table, Products::BrandId)
                                .to(Brands::Table, Brands::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_brand_id")
                        .table(Products::Table)
                        .col(Products::BrandId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Slug,
        Name,
        Description,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Brands {
        Table,
        Id,
        Slug,
        Name,
        Description,
        LogoUrl,
        Website,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Slug,
        Name,
        Description,
        Price,
        StockQty,
        Images,
        Specs,
        IsActive,
        CategoryId,
        BrandId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_cart_tables {
    use super::m20250301_000001_create_catalog_tables::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_cart_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Carts::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Carts::SessionId)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Carts::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::ItemType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(CartItems::UpdatedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_cart_id")
                                .from(CartItems::Table, CartItems::CartId)
                                .to(Carts::Table, Carts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_product_id")
                                .from(CartItems::Table, CartItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // One row per (cart, product); adds accumulate instead.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_cart_product")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .col(CartItems::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        SessionId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        ProductId,
        Quantity,
        ItemType,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_quote_tables {
    use super::m20250301_000001_create_catalog_tables::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_quote_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteRequests::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::Email)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::CustomerName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::PhoneNumber)
                                .string_len(50)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::CompanyName)
                                .string_len(255)
                                .null(),
                        )
                        .col(ColumnDef::new(QuoteRequests::Message).text().not_null())
                        .col(
                            ColumnDef::new(QuoteRequests::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::Status)
                                .string_len(20)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quote_requests_email")
                        .table(QuoteRequests::Table)
                        .col(QuoteRequests::Email)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuoteItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteItems::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(QuoteItems::QuoteRequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(QuoteItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(QuoteItems::UnitPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteItems::CreatedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_items_quote_request_id")
                                .from(QuoteItems::Table, QuoteItems::QuoteRequestId)
                                .to(QuoteRequests::Table, QuoteRequests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_items_product_id")
                                .from(QuoteItems::Table, QuoteItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quote_items_quote_request_id")
                        .table(QuoteItems::Table)
                        .col(QuoteItems::QuoteRequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuoteItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QuoteRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum QuoteRequests {
        Table,
        Id,
        Email,
        CustomerName,
        PhoneNumber,
        CompanyName,
        Message,
        TotalAmount,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum QuoteItems {
        Table,
        Id,
        QuoteRequestId,
        ProductId,
        Quantity,
        UnitPrice,
        CreatedAt,
    }
}
