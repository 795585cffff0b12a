use log::{info, warn};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::config::AppConfig;

pub async fn connect_db(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    if config.is_sqlite() {
        ensure_sqlite_path(config);
    }
    let url = config.database_url();
    let db = Database::connect(&url).await?;
    if db.get_database_backend() == DbBackend::Sqlite {
        init_sqlite_schema(&db).await?;
    } else {
        warn!("non-sqlite backend, expecting schema to be provisioned already");
    }
    Ok(db)
}

fn ensure_sqlite_path(config: &AppConfig) -> bool {
    let raw = config.database_url();
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw.as_str());
    if path.starts_with(":memory:") {
        return true;
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("failed to create sqlite directory {}: {}", parent.display(), e);
            return false;
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(_) => true,
        Err(e) => {
            warn!("failed to create sqlite file {}: {}", path.display(), e);
            false
        }
    }
}

async fn init_sqlite_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let exists_stmt = Statement::from_string(
        backend,
        "SELECT name FROM sqlite_master WHERE type='table' AND name='t_user' LIMIT 1",
    );
    let exists = db.query_one(exists_stmt).await?.is_some();
    if exists {
        return Ok(());
    }

    let sql = include_str!("../schema-sqlite.sql");
    for stmt in split_sql(sql) {
        db.execute(Statement::from_string(backend, stmt)).await?;
    }
    info!("sqlite schema initialised");
    Ok(())
}

fn split_sql(input: &str) -> Vec<String> {
    let mut buf = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }
        buf.push_str(line);
        buf.push('\n');
    }
    buf.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
pub async fn test_db() -> DatabaseConnection {
    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    init_sqlite_schema(&db).await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sql_skips_comments_and_blank_statements() {
        let sql = "-- heading\nCREATE TABLE a (id INTEGER);\n\n-- next\nCREATE INDEX i ON a (id);\n;";
        let stmts = split_sql(sql);
        assert_eq!(stmts, vec!["CREATE TABLE a (id INTEGER)", "CREATE INDEX i ON a (id)"]);
    }

    #[test]
    fn sqlite_file_is_created_with_parents() {
        let root = std::env::temp_dir().join(format!("holonet-db-{}", std::process::id()));
        let file = root.join("nested/holonet.sqlite");
        let config = AppConfig {
            sqlite_path: file.display().to_string(),
            database_url: None,
            ..AppConfig::for_tests()
        };
        assert!(ensure_sqlite_path(&config));
        assert!(file.is_file());

        // a regular file cannot act as a parent directory
        let blocked = AppConfig {
            sqlite_path: file.join("inner.sqlite").display().to_string(),
            database_url: None,
            ..AppConfig::for_tests()
        };
        assert!(!ensure_sqlite_path(&blocked));

        assert!(ensure_sqlite_path(&AppConfig::for_tests()));
        fs::remove_dir_all(&root).unwrap();
    }

    #[actix_rt::test]
    async fn schema_is_applied_once() {
        let db = test_db().await;
        // second run sees t_user and is a no-op
        init_sqlite_schema(&db).await.unwrap();

        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT COUNT(*) AS cnt FROM sqlite_master WHERE type='table' AND name LIKE 't_%'",
            ))
            .await
            .unwrap()
            .unwrap();
        let cnt: i64 = row.try_get("", "cnt").unwrap();
        assert_eq!(cnt, 6);
    }
}
