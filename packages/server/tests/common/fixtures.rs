//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.
//! Tests share one database, so every fixture takes or generates unique
//! names.

use anyhow::Result;
use relief_core::domains::family::FamilyLink;
use relief_core::domains::profiles::Profile;
use relief_core::domains::supplies::models::{Item, NewPin, NewPinItem, Pin, PinStatus};
use relief_core::kernel::TestDependencies;
use sqlx::PgPool;
use uuid::Uuid;

/// A signed-up user: profile row plus an access token
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Unique email for a test user
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.org", prefix, Uuid::new_v4().simple())
}

/// Unique label, e.g. for item names
pub fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::new_v4().simple())
}

/// Create a profile and mint a token for it
pub async fn create_test_user(
    pool: &PgPool,
    deps: &TestDependencies,
    full_name: &str,
) -> Result<TestUser> {
    create_user_with_role(pool, deps, full_name, false).await
}

/// Create an admin profile (admin rides on the token claim)
pub async fn create_test_admin(pool: &PgPool, deps: &TestDependencies) -> Result<TestUser> {
    create_user_with_role(pool, deps, "Admin", true).await
}

async fn create_user_with_role(
    pool: &PgPool,
    deps: &TestDependencies,
    full_name: &str,
    is_admin: bool,
) -> Result<TestUser> {
    let id = Uuid::new_v4();
    let email = unique_email(&full_name.to_lowercase().replace(' ', "-"));
    Profile::upsert(id, &email, Some(full_name), None, pool).await?;
    let token = deps.token_for(id, &email, is_admin);

    Ok(TestUser { id, email, token })
}

/// Link two users both ways
pub async fn link_family(pool: &PgPool, a: &TestUser, b: &TestUser) -> Result<()> {
    FamilyLink::link(a.id, b.id, None, pool).await?;
    Ok(())
}

pub async fn create_test_item(pool: &PgPool, prefix: &str, unit: Option<&str>) -> Result<Item> {
    let (item, _) = Item::find_or_create(&unique_name(prefix), unit, pool).await?;
    Ok(item)
}

/// Create a pin and move it to `confirmed`
pub async fn create_confirmed_pin(
    pool: &PgPool,
    created_by: Uuid,
    latitude: f64,
    longitude: f64,
    items: &[(Uuid, i32)],
) -> Result<Pin> {
    let pin = Pin::create(
        &NewPin {
            created_by,
            title: unique_name("Pin"),
            description: None,
            latitude,
            longitude,
            items: items
                .iter()
                .map(|(item_id, quantity)| NewPinItem {
                    item_id: *item_id,
                    quantity: *quantity,
                })
                .collect(),
        },
        pool,
    )
    .await?;

    let confirmed = Pin::update_status(pin.id, PinStatus::Pending, PinStatus::Confirmed, pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("pin {} was not pending", pin.id))?;

    Ok(confirmed)
}
