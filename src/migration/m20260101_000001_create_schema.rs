use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entity::{CartItems, Carts, Foods, OrderItems, Orders, Users, cart_items};

const CART_ITEM_UNIQUE_INDEX: &str = "idx_cart_items_cart_food";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children so foreign keys resolve.
        create_table(manager, &schema, Users).await?;
        create_table(manager, &schema, Foods).await?;
        create_table(manager, &schema, Carts).await?;
        create_table(manager, &schema, CartItems).await?;
        create_table(manager, &schema, Orders).await?;
        create_table(manager, &schema, OrderItems).await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(CART_ITEM_UNIQUE_INDEX)
                    .table(CartItems)
                    .col(cart_items::Column::CartId)
                    .col(cart_items::Column::FoodId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(CART_ITEM_UNIQUE_INDEX)
                    .table(CartItems)
                    .to_owned(),
            )
            .await?;

        manager.drop_table(Table::drop().table(OrderItems).to_owned()).await?;
        manager.drop_table(Table::drop().table(Orders).to_owned()).await?;
        manager.drop_table(Table::drop().table(CartItems).to_owned()).await?;
        manager.drop_table(Table::drop().table(Carts).to_owned()).await?;
        manager.drop_table(Table::drop().table(Foods).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users).to_owned()).await
    }
}

async fn create_table<E>(manager: &SchemaManager<'_>, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}
