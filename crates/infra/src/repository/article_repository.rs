//! # ArticleRepository
//!
//! 記事の永続化を担当するリポジトリ。
//!
//! 作成時は主キーとは独立した oid を生成し、マスターのトランザクション内で
//! 挿入 → oid で再取得 → コミットの順に処理する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use petstore_domain::{
    article::{
        Article,
        ArticleBody,
        ArticleChanges,
        ArticleId,
        ArticleOid,
        ArticleTitle,
        NewArticle,
    },
    pagination::PageRequest,
};
use uuid::Uuid;

use super::require_inserted;
use crate::{
    db::{DataSource, Database},
    error::InfraError,
    query::{DeleteBuilder, InsertBuilder, Order, SelectBuilder, UpdateBuilder},
    schema::ARTICLES,
};

/// 記事リポジトリトレイト
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// 記事を作成し、再取得した行を返す
    async fn create(&self, article: &NewArticle, tid: &str) -> Result<Article, InfraError>;

    /// ID で記事を検索する
    async fn find_by_id(&self, id: ArticleId, tid: &str) -> Result<Option<Article>, InfraError>;

    /// `id` 昇順で記事を取得する
    async fn list(&self, page: PageRequest, tid: &str) -> Result<Vec<Article>, InfraError>;

    /// 記事を更新する。対象がなければ `None`
    async fn update(
        &self,
        id: ArticleId,
        changes: &ArticleChanges,
        tid: &str,
    ) -> Result<Option<Article>, InfraError>;

    /// 記事を削除する。削除した場合 `true`
    async fn delete(&self, id: ArticleId, tid: &str) -> Result<bool, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id:         i64,
    oid:        Uuid,
    title:      String,
    body:       String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ArticleRow> for Article {
    type Error = InfraError;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        Ok(Article::from_db(
            ArticleId::from_i64(row.id),
            ArticleOid::from_uuid(row.oid),
            ArticleTitle::new(row.title)?,
            ArticleBody::new(row.body)?,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の ArticleRepository
#[derive(Debug, Clone)]
pub struct PostgresArticleRepository {
    db: Database,
}

impl PostgresArticleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ArticleRepository for PostgresArticleRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%tid))]
    async fn create(&self, article: &NewArticle, tid: &str) -> Result<Article, InfraError> {
        let oid = ArticleOid::new();
        let mut tx = self.db.begin(DataSource::Master).await?;

        InsertBuilder::new(&ARTICLES)
            .value("oid", *oid.as_uuid())
            .value("title", article.title.as_str())
            .value("body", article.body.as_str())
            .build()?
            .execute(tx.conn())
            .await?;

        let row: Option<ArticleRow> = SelectBuilder::new(&ARTICLES)
            .where_eq(&ARTICLES, "oid", *oid.as_uuid())
            .build()?
            .fetch_optional(tx.conn())
            .await?;
        let inserted = require_inserted(row, ARTICLES.entity, oid)?;

        tx.commit().await?;
        tracing::debug!(id = inserted.id, %oid, "記事を作成しました");
        inserted.try_into()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn find_by_id(&self, id: ArticleId, tid: &str) -> Result<Option<Article>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let row: Option<ArticleRow> = SelectBuilder::new(&ARTICLES)
            .where_eq(&ARTICLES, "id", id.as_i64())
            .build()?
            .fetch_optional(tx.conn())
            .await?;

        tx.commit().await?;
        row.map(Article::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(limit = page.limit(), %tid))]
    async fn list(&self, page: PageRequest, tid: &str) -> Result<Vec<Article>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let mut select = SelectBuilder::new(&ARTICLES);
        if let Some(after) = page.after() {
            select = select.where_gt(&ARTICLES, "id", after);
        }
        let rows: Vec<ArticleRow> = select
            .order_by(&ARTICLES, "id", Order::Asc)
            .limit(page.limit())
            .build()?
            .fetch_all(tx.conn())
            .await?;

        tx.commit().await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn update(
        &self,
        id: ArticleId,
        changes: &ArticleChanges,
        tid: &str,
    ) -> Result<Option<Article>, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let mut update = UpdateBuilder::new(&ARTICLES);
        if let Some(title) = &changes.title {
            update = update.set("title", title.as_str());
        }
        if let Some(body) = &changes.body {
            update = update.set("body", body.as_str());
        }
        let affected = update
            .touch("updated_at")
            .where_eq("id", id.as_i64())
            .build()?
            .execute(tx.conn())
            .await?;
        if affected == 0 {
            return Ok(None);
        }

        let row: Option<ArticleRow> = SelectBuilder::new(&ARTICLES)
            .where_eq(&ARTICLES, "id", id.as_i64())
            .build()?
            .fetch_optional(tx.conn())
            .await?;

        tx.commit().await?;
        row.map(Article::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn delete(&self, id: ArticleId, tid: &str) -> Result<bool, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let affected = DeleteBuilder::new(&ARTICLES)
            .where_eq("id", id.as_i64())
            .build()?
            .execute(tx.conn())
            .await?;

        tx.commit().await?;
        Ok(affected > 0)
    }
}
