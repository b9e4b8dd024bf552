use crate::db::{connect_in_memory, migrate};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use anyhow::Result;

/// Schema is present right after connecting
#[tokio::test]
async fn test_in_memory_schema_applied() -> Result<()> {
    let db = connect_in_memory().await?;
    assert_eq!(db.get_database_backend(), DatabaseBackend::Sqlite);

    for table in ["user", "user_credentials", "group", "post"] {
        let stmt = Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = '{table}'"),
        );
        let row = db.query_one(stmt).await?.expect("row");
        let n: i64 = row.try_get("", "n")?;
        assert_eq!(n, 1, "missing table {table}");
    }
    Ok(())
}

/// Running the migrator twice is a no-op
#[tokio::test]
async fn test_migrations_are_idempotent() -> Result<()> {
    let db = connect_in_memory().await?;
    migrate(&db).await?;
    Ok(())
}

/// Each in-memory handle is an isolated database
#[tokio::test]
async fn test_in_memory_databases_are_isolated() -> Result<()> {
    let a = connect_in_memory().await?;
    let b = connect_in_memory().await?;
    crate::group::create(&a, "Only in A", "only-a", "").await?;
    assert!(crate::group::find_by_slug(&b, "only-a").await?.is_none());
    Ok(())
}
