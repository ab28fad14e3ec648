use std::sync::Arc;

use inventory_ledger::db::{establish_connection_with_config, run_migrations, DbConfig, DbPool};

/// Spins up an in-memory SQLite database with the full schema applied.
///
/// The pool is capped at a single connection so the in-memory database is
/// shared by every query in the test.
pub async fn setup_test_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = establish_connection_with_config(&config)
        .await
        .expect("failed to open in-memory database");
    run_migrations(&pool).await.expect("migrations failed");
    Arc::new(pool)
}
