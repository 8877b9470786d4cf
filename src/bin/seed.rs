use chrono::Utc;
use food_order_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        foods::{self, ActiveModel as FoodActive, Entity as Foods},
        users::{self, ActiveModel as UserActive, Entity as Users, Role},
    },
    services::auth_service::hash_password,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin", "admin@example.com", "admin123", Role::Admin).await?;
    let user_id = ensure_user(&orm, "Demo User", "user@example.com", "user123", Role::User).await?;
    seed_menu(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role:?})");
    Ok(user.id)
}

async fn seed_menu(orm: &DatabaseConnection) -> anyhow::Result<()> {
    // (name, description, price in minor units, category)
    let menu = [
        ("Margherita Pizza", "Tomato, mozzarella and basil", 999, "Pizza"),
        ("Farmhouse Pizza", "Onion, capsicum, tomato and mushroom", 1299, "Pizza"),
        ("Chicken Biryani", "Slow-cooked basmati rice with spiced chicken", 1499, "Biryani"),
        ("Veg Biryani", "Basmati rice with seasonal vegetables", 1199, "Biryani"),
        ("Paneer Butter Masala", "Cottage cheese in a buttery tomato gravy", 1099, "North Indian"),
        ("Masala Dosa", "Crisp rice crepe with potato filling", 699, "South Indian"),
        ("Gulab Jamun", "Milk dumplings in rose syrup", 399, "Desserts"),
        ("Cola", "Chilled soft drink", 199, "Beverages"),
    ];

    for (name, description, price, category) in menu {
        let exists = Foods::find()
            .filter(foods::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        FoodActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            category: Set(category.to_string()),
            image_url: Set(None),
            is_available: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded menu");
    Ok(())
}
