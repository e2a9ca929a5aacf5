//! # PostgreSQL データベース接続管理
//!
//! 接続プールの作成、マイグレーション、データソースの選択、トランザクションを扱う。
//!
//! ## データソース
//!
//! - [`DataSource::Master`]: 書き込みと、挿入直後の再取得に使う
//! - [`DataSource::Replica`]: 読み取り専用クエリに使う。レプリカ未設定時はマスターを使う
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use petstore_infra::db::{DataSource, Database};
//!
//! let db = Database::connect("postgres://localhost/petstore", None).await?;
//! let mut tx = db.begin(DataSource::Master).await?;
//! // ... tx.conn() でクエリ実行 ...
//! tx.commit().await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::error::InfraError;

/// ヘルスチェック（`SELECT 1`）のタイムアウト
const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// データベースマイグレーションを実行する
///
/// `sqlx::migrate!()` マクロで埋め込まれたマイグレーションファイルを
/// 順番に適用する。適用済みのマイグレーションはスキップされる。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// PostgreSQL 接続プールを作成する
///
/// # 設定値
///
/// - `max_connections(10)`: 最大接続数
/// - `acquire_timeout(5秒)`: 接続取得のタイムアウト
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

// =============================================================================
// DataSource / Database
// =============================================================================

/// クエリの実行先
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DataSource {
    #[display("master")]
    Master,
    #[display("replica")]
    Replica,
}

/// マスター / レプリカの接続プールの組
#[derive(Debug, Clone)]
pub struct Database {
    master:  PgPool,
    replica: Option<PgPool>,
}

impl Database {
    pub fn new(master: PgPool, replica: Option<PgPool>) -> Self {
        Self { master, replica }
    }

    /// 接続 URL からプールを作成する
    pub async fn connect(master_url: &str, replica_url: Option<&str>) -> Result<Self, sqlx::Error> {
        let master = create_pool(master_url).await?;
        let replica = match replica_url {
            Some(url) => Some(create_pool(url).await?),
            None => None,
        };
        Ok(Self::new(master, replica))
    }

    /// マスターの接続プール
    pub fn master(&self) -> &PgPool {
        &self.master
    }

    /// データソースに対応する接続プールを返す
    ///
    /// レプリカが設定されていない場合、`Replica` はマスターにフォールバックする。
    pub fn pool(&self, source: DataSource) -> &PgPool {
        match source {
            DataSource::Master => &self.master,
            DataSource::Replica => self.replica.as_ref().unwrap_or(&self.master),
        }
    }

    /// 指定したデータソースでトランザクションを開始する
    pub async fn begin(&self, source: DataSource) -> Result<TxContext, InfraError> {
        TxContext::begin(self.pool(source)).await
    }
}

/// DB 疎通確認の抽象化
///
/// readiness チェックで使用する。テストではモックに差し替える。
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self) -> Result<(), InfraError>;
}

#[async_trait]
impl DatabaseProbe for Database {
    async fn ping(&self) -> Result<(), InfraError> {
        let query = sqlx::query("SELECT 1").execute(&self.master);
        match tokio::time::timeout(PING_TIMEOUT, query).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(InfraError::unexpected("データベースの応答がタイムアウトしました")),
        }
    }
}

// =============================================================================
// TxContext
// =============================================================================

/// トランザクションコンテキスト
///
/// リポジトリの各操作はこのスコープ内でクエリを実行する。
/// 挿入と再取得は同じ TxContext で行う。
///
/// `commit()` を呼ばずにドロップすると、sqlx が自動的にロールバックする。
pub struct TxContext(Transaction<'static, Postgres>);

impl TxContext {
    async fn begin(pool: &PgPool) -> Result<Self, InfraError> {
        Ok(Self(pool.begin().await?))
    }

    /// トランザクションをコミットする
    pub async fn commit(self) -> Result<(), InfraError> {
        self.0.commit().await?;
        Ok(())
    }

    /// トランザクション内の DB コネクションを取得する
    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        &mut self.0
    }
}
