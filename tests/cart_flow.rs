mod common;

use food_order_api::{
    dto::cart::{AddToCartRequest, MAX_QUANTITY, UpdateCartRequest},
    entity::{
        foods::ActiveModel as FoodActive,
        users::{Entity as Users, Role},
    },
    error::AppError,
    services::cart_service,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

fn add(food_id: Uuid, quantity: i32) -> AddToCartRequest {
    AddToCartRequest { food_id, quantity }
}

#[tokio::test]
async fn adding_same_food_twice_merges_into_one_line() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let pizza = common::create_food(&state, "Pizza", 999, "Pizza", true).await?;

    cart_service::add_item(&state, &user, add(pizza.id, 1)).await?;
    let cart = cart_service::add_item(&state, &user, add(pizza.id, 2))
        .await?
        .data
        .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.total_items, 3);
    assert_eq!(cart.total_price, 2997);
    Ok(())
}

#[tokio::test]
async fn cart_totals_follow_price_snapshots() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let pizza = common::create_food(&state, "Pizza", 999, "Pizza", true).await?;
    let soda = common::create_food(&state, "Soda", 199, "Beverages", true).await?;

    cart_service::add_item(&state, &user, add(pizza.id, 2)).await?;
    cart_service::add_item(&state, &user, add(soda.id, 3)).await?;

    // Catalog price changes after the pizza line was created.
    let mut active: FoodActive = pizza.clone().into();
    active.price = Set(1500);
    active.update(&state.orm).await?;

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.total_price, 2595);
    assert_eq!(cart.total_items, 5);

    let pizza_line = cart.items.iter().find(|i| i.food_id == pizza.id).unwrap();
    assert_eq!(pizza_line.price_at_time, 999);
    assert_eq!(pizza_line.subtotal, 1998);

    // Incrementing an existing line keeps its original snapshot.
    let cart = cart_service::add_item(&state, &user, add(pizza.id, 1))
        .await?
        .data
        .unwrap();
    let pizza_line = cart.items.iter().find(|i| i.food_id == pizza.id).unwrap();
    assert_eq!(pizza_line.price_at_time, 999);
    assert_eq!(pizza_line.quantity, 3);
    assert_eq!(cart.total_price, 999 * 3 + 199 * 3);
    Ok(())
}

#[tokio::test]
async fn get_cart_creates_one_cart_lazily() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;

    let first = cart_service::get_cart(&state, &user).await?.data.unwrap();
    let second = cart_service::get_cart(&state, &user).await?.data.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.user_id, user.user_id);
    assert!(first.items.is_empty());
    assert_eq!((first.total_price, first.total_items), (0, 0));
    Ok(())
}

#[tokio::test]
async fn adding_unknown_or_unavailable_food_fails() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let sold_out = common::create_food(&state, "Sold Out Thali", 1299, "Thali", false).await?;

    let err = cart_service::add_item(&state, &user, add(Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let err = cart_service::add_item(&state, &user, add(sold_out.id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");
    assert!(err.to_string().contains("Sold Out Thali"));

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_and_remove_enforce_ownership() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let alice = common::create_user(&state, Role::User, "alice@example.com").await?;
    let bob = common::create_user(&state, Role::User, "bob@example.com").await?;
    let dosa = common::create_food(&state, "Dosa", 699, "South Indian", true).await?;

    let cart = cart_service::add_item(&state, &alice, add(dosa.id, 1))
        .await?
        .data
        .unwrap();
    let line_id = cart.items[0].id;

    let err = cart_service::update_item(&state, &bob, line_id, UpdateCartRequest { quantity: 5 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");

    let err = cart_service::remove_item(&state, &bob, line_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");

    let err = cart_service::remove_item(&state, &alice, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    // Alice's line is untouched.
    let cart = cart_service::get_cart(&state, &alice).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 1);
    Ok(())
}

#[tokio::test]
async fn update_overwrites_quantity_and_remove_deletes_line() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let pizza = common::create_food(&state, "Pizza", 999, "Pizza", true).await?;
    let soda = common::create_food(&state, "Soda", 199, "Beverages", true).await?;

    cart_service::add_item(&state, &user, add(pizza.id, 2)).await?;
    let cart = cart_service::add_item(&state, &user, add(soda.id, 1))
        .await?
        .data
        .unwrap();
    let pizza_line = cart.items.iter().find(|i| i.food_id == pizza.id).unwrap().id;
    let soda_line = cart.items.iter().find(|i| i.food_id == soda.id).unwrap().id;

    let cart = cart_service::update_item(&state, &user, pizza_line, UpdateCartRequest { quantity: 4 })
        .await?
        .data
        .unwrap();
    assert_eq!(cart.total_items, 5);
    assert_eq!(cart.total_price, 999 * 4 + 199);

    let cart = cart_service::remove_item(&state, &user, soda_line)
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_price, 999 * 4);
    Ok(())
}

#[tokio::test]
async fn service_update_does_not_apply_a_minimum_quantity() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let pizza = common::create_food(&state, "Pizza", 999, "Pizza", true).await?;

    let cart = cart_service::add_item(&state, &user, add(pizza.id, 2))
        .await?
        .data
        .unwrap();

    let cart = cart_service::update_item(
        &state,
        &user,
        cart.items[0].id,
        UpdateCartRequest { quantity: 0 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.items[0].quantity, 0);
    assert_eq!(cart.total_price, 0);
    Ok(())
}

#[tokio::test]
async fn clear_removes_every_line() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let pizza = common::create_food(&state, "Pizza", 999, "Pizza", true).await?;
    let soda = common::create_food(&state, "Soda", 199, "Beverages", true).await?;

    cart_service::add_item(&state, &user, add(pizza.id, 1)).await?;
    let before = cart_service::add_item(&state, &user, add(soda.id, 2))
        .await?
        .data
        .unwrap();

    let cleared = cart_service::clear_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cleared.id, before.id);
    assert!(cleared.items.is_empty());

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);
    Ok(())
}

#[tokio::test]
async fn line_quantity_is_capped_without_overflow() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let pizza = common::create_food(&state, "Pizza", 999, "Pizza", true).await?;

    let err = cart_service::add_item(&state, &user, add(pizza.id, i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");

    cart_service::add_item(&state, &user, add(pizza.id, MAX_QUANTITY)).await?;
    let err = cart_service::add_item(&state, &user, add(pizza.id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");

    let err = cart_service::add_item(&state, &user, add(pizza.id, i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items[0].quantity, MAX_QUANTITY);
    Ok(())
}

#[tokio::test]
async fn oversized_subtotal_is_rejected_and_rolled_back() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "user@example.com").await?;
    let gold = common::create_food(&state, "Gold Leaf Thali", i64::MAX / 2, "Specials", true).await?;

    let err = cart_service::add_item(&state, &user, add(gold.id, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn deleted_user_gets_not_found_instead_of_a_cart() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, Role::User, "gone@example.com").await?;
    Users::delete_by_id(user.user_id).exec(&state.orm).await?;

    let err = cart_service::get_cart(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    Ok(())
}
