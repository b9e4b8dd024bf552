#![cfg(test)]
use sea_orm::DatabaseConnection;

use common::pagination::Paginator;

/// Fresh, migrated in-memory database for one test.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    models::db::connect_in_memory().await
}

pub fn paginator() -> Paginator {
    Paginator::new(10).expect("page size")
}
