//! Common test utilities

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use account_service::auth::digest;
use account_service::db;

/// Connect to DATABASE_URL and make sure the schema exists.
///
/// Tests share the database, so each one works on its own logins
/// (see [`unique_login`]) instead of truncating the table.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::verify_connection(&pool).await.expect("DB not reachable");
    db::apply_schema(&pool).await.expect("Failed to apply schema");

    pool
}

/// Login that no other test run will use
pub fn unique_login(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Insert an account directly, password = login
pub async fn seed_account(pool: &PgPool, login: &str, balance: Decimal) {
    sqlx::query("INSERT INTO accounts (login, password_digest, balance) VALUES ($1, $2, $3)")
        .bind(login)
        .bind(digest(login))
        .bind(balance)
        .execute(pool)
        .await
        .expect("Failed to seed account");
}

pub async fn balance_of(pool: &PgPool, login: &str) -> Decimal {
    sqlx::query_scalar("SELECT balance FROM accounts WHERE login = $1")
        .bind(login)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}
