//! Migration to create the connections table.
//!
//! This migration creates the registry table holding connection descriptors
//! for external services. `conn_id` is indexed but deliberately not unique:
//! uniqueness is maintained by the synchronizer's delete-before-insert
//! transaction, matching the registry's historical schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Connections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Connections::ConnId).text().not_null())
                    .col(ColumnDef::new(Connections::ConnType).text().not_null())
                    .col(ColumnDef::new(Connections::Host).text().null())
                    .col(ColumnDef::new(Connections::Password).text().null())
                    .col(ColumnDef::new(Connections::Extra).json_binary().null())
                    .col(
                        ColumnDef::new(Connections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Connections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connections_conn_id")
                    .table(Connections::Table)
                    .col(Connections::ConnId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_connections_conn_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Connections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Connections {
    Table,
    Id,
    ConnId,
    ConnType,
    Host,
    Password,
    Extra,
    CreatedAt,
    UpdatedAt,
}
