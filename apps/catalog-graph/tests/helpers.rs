#![allow(dead_code)]

use catalog_graph::{AppState, CatalogDb};
use sqlx::{AnyConnection, Connection};
use tempfile::TempDir;

pub const TABLE: &str = "cartesian_catalog_data_flat";

/// A catalog table in a throwaway SQLite file. Keep it alive for the
/// duration of the test; the directory is removed on drop.
pub struct TestCatalog {
    pub dir: TempDir,
    pub url: String,
}

impl TestCatalog {
    pub fn db(&self) -> CatalogDb {
        CatalogDb::new(self.url.clone(), TABLE)
    }

    pub fn state(&self) -> AppState {
        AppState { db: self.db() }
    }

    pub async fn insert(&self, rows: &[(Option<i64>, Option<&str>)]) {
        let mut conn = AnyConnection::connect(&self.url).await.unwrap();
        for (seller, category) in rows {
            sqlx::query(&format!(
                "INSERT INTO {TABLE} (seller_id, category_name) VALUES ({}, {})",
                seller.map_or("NULL".to_string(), |s| s.to_string()),
                category.map_or("NULL".to_string(), |c| format!("'{c}'")),
            ))
            .execute(&mut conn)
            .await
            .unwrap();
        }
        conn.close().await.unwrap();
    }

    /// Runs a raw statement, for rows the typed `insert` cannot express.
    pub async fn execute(&self, sql: &str) {
        let mut conn = AnyConnection::connect(&self.url).await.unwrap();
        sqlx::query(sql).execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();
    }
}

/// Empty catalog table.
pub async fn empty_catalog() -> TestCatalog {
    let catalog = bare_database().await;
    let mut conn = AnyConnection::connect(&catalog.url).await.unwrap();
    sqlx::query(&format!(
        "CREATE TABLE {TABLE} (id INTEGER PRIMARY KEY, seller_id INTEGER, category_name TEXT, product_name TEXT)"
    ))
    .execute(&mut conn)
    .await
    .unwrap();
    conn.close().await.unwrap();
    catalog
}

/// The three-row catalog: (1, "A"), (1, "B"), (2, "A").
pub async fn sample_catalog() -> TestCatalog {
    let catalog = empty_catalog().await;
    catalog
        .insert(&[(Some(1), Some("A")), (Some(1), Some("B")), (Some(2), Some("A"))])
        .await;
    catalog
}

/// A database file with no catalog table in it.
pub async fn bare_database() -> TestCatalog {
    sqlx::any::install_default_drivers();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("catalog.db").display());
    let conn = AnyConnection::connect(&url).await.unwrap();
    conn.close().await.unwrap();
    TestCatalog { dir, url }
}

/// Points at a database file that does not exist and may not be created.
pub fn unreachable_db() -> CatalogDb {
    CatalogDb::new("sqlite:///nonexistent-dir/catalog.db?mode=ro", TABLE)
}
