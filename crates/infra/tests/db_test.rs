//! Database 統合テスト
//!
//! PostgreSQL が必要なため既定では無視される。

use petstore_infra::db::{DataSource, Database, DatabaseProbe};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_pingが成功する(pool: PgPool) {
    let db = Database::new(pool, None);

    assert!(db.ping().await.is_ok());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_レプリカ未設定でもreplicaのトランザクションを開始できる(pool: PgPool) {
    let db = Database::new(pool, None);

    let tx = db.begin(DataSource::Replica).await.unwrap();

    assert!(tx.commit().await.is_ok());
}
