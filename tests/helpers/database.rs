use sqlx::SqlitePool;

use greenroom::adapters::sqlite::create_migrated_test_pool;

/// Create an in-memory SQLite database for testing
///
/// Creates a fresh in-memory database with all embedded migrations applied.
/// Each call creates a completely isolated database instance.
pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}
