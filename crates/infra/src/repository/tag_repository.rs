//! # TagRepository
//!
//! タグと、ペットとタグの関連（`pet_tags`）の永続化を担当するリポジトリ。
//!
//! - タグ名は一意。重複した作成は [`InfraErrorKind::Conflict`](crate::error::InfraErrorKind::Conflict) になる
//! - 関連付けは `ON CONFLICT DO NOTHING` で冪等。同じ組を二度付けても行は増えない

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use petstore_domain::{
    pagination::PageRequest,
    pet::PetId,
    tag::{NewTag, PetTag, Tag, TagId, TagName},
};
use sqlx::Postgres;

use super::require_inserted;
use crate::{
    db::{DataSource, Database},
    error::InfraError,
    query::{DeleteBuilder, InsertBuilder, Order, SelectBuilder},
    schema::{PET_TAGS, TAGS},
};

/// タグリポジトリトレイト
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// タグを作成し、再取得した行を返す
    async fn create(&self, tag: &NewTag, tid: &str) -> Result<Tag, InfraError>;

    /// ID でタグを検索する
    async fn find_by_id(&self, id: TagId, tid: &str) -> Result<Option<Tag>, InfraError>;

    /// `id` 昇順でタグを取得する
    async fn list(&self, page: PageRequest, tid: &str) -> Result<Vec<Tag>, InfraError>;

    /// タグを削除する（関連も連鎖削除される）。削除した場合 `true`
    async fn delete(&self, id: TagId, tid: &str) -> Result<bool, InfraError>;

    /// ペットにタグを付ける。新たに関連を作った場合 `true`、既にあれば `false`
    async fn attach(&self, link: PetTag, tid: &str) -> Result<bool, InfraError>;

    /// ペットからタグを外す。外した場合 `true`
    async fn detach(&self, link: PetTag, tid: &str) -> Result<bool, InfraError>;

    /// ペットに付いているタグを `id` 昇順で取得する
    async fn find_by_pet(&self, pet_id: PetId, tid: &str) -> Result<Vec<Tag>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    id:         i64,
    name:       String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TagRow> for Tag {
    type Error = InfraError;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        Ok(Tag::from_db(
            TagId::from_i64(row.id),
            TagName::new(row.name)?,
            row.created_at,
        ))
    }
}

/// PostgreSQL 実装の TagRepository
#[derive(Debug, Clone)]
pub struct PostgresTagRepository {
    db: Database,
}

impl PostgresTagRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(name = %tag.name, %tid))]
    async fn create(&self, tag: &NewTag, tid: &str) -> Result<Tag, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let insert = InsertBuilder::new(&TAGS)
            .value("name", tag.name.as_str())
            .build()?;
        sqlx::query_with::<Postgres, _>(insert.sql(), insert.arguments()?)
            .execute(tx.conn())
            .await
            .map_err(|e| InfraError::from_unique_violation(e, TAGS.entity, tag.name.as_str()))?;

        // タグ名は一意キーなので、名前で再取得する
        let row: Option<TagRow> = SelectBuilder::new(&TAGS)
            .where_eq(&TAGS, "name", tag.name.as_str())
            .build()?
            .fetch_optional(tx.conn())
            .await?;
        let inserted = require_inserted(row, TAGS.entity, &tag.name)?;

        tx.commit().await?;
        inserted.try_into()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn find_by_id(&self, id: TagId, tid: &str) -> Result<Option<Tag>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let row: Option<TagRow> = SelectBuilder::new(&TAGS)
            .where_eq(&TAGS, "id", id.as_i64())
            .build()?
            .fetch_optional(tx.conn())
            .await?;

        tx.commit().await?;
        row.map(Tag::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(limit = page.limit(), %tid))]
    async fn list(&self, page: PageRequest, tid: &str) -> Result<Vec<Tag>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let mut select = SelectBuilder::new(&TAGS);
        if let Some(after) = page.after() {
            select = select.where_gt(&TAGS, "id", after);
        }
        let rows: Vec<TagRow> = select
            .order_by(&TAGS, "id", Order::Asc)
            .limit(page.limit())
            .build()?
            .fetch_all(tx.conn())
            .await?;

        tx.commit().await?;
        rows.into_iter().map(Tag::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn delete(&self, id: TagId, tid: &str) -> Result<bool, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let affected = DeleteBuilder::new(&TAGS)
            .where_eq("id", id.as_i64())
            .build()?
            .execute(tx.conn())
            .await?;

        tx.commit().await?;
        Ok(affected > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(pet_id = %link.pet_id, tag_id = %link.tag_id, %tid))]
    async fn attach(&self, link: PetTag, tid: &str) -> Result<bool, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let affected = InsertBuilder::new(&PET_TAGS)
            .value("pet_id", link.pet_id.as_i64())
            .value("tag_id", link.tag_id.as_i64())
            .on_conflict_do_nothing()
            .build()?
            .execute(tx.conn())
            .await?;

        tx.commit().await?;
        Ok(affected == 1)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(pet_id = %link.pet_id, tag_id = %link.tag_id, %tid))]
    async fn detach(&self, link: PetTag, tid: &str) -> Result<bool, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let affected = DeleteBuilder::new(&PET_TAGS)
            .where_eq("pet_id", link.pet_id.as_i64())
            .where_eq("tag_id", link.tag_id.as_i64())
            .build()?
            .execute(tx.conn())
            .await?;

        tx.commit().await?;
        Ok(affected > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%pet_id, %tid))]
    async fn find_by_pet(&self, pet_id: PetId, tid: &str) -> Result<Vec<Tag>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let rows: Vec<TagRow> = SelectBuilder::new(&TAGS)
            .join(&PET_TAGS, "tag_id", &TAGS, "id")
            .where_eq(&PET_TAGS, "pet_id", pet_id.as_i64())
            .order_by(&TAGS, "id", Order::Asc)
            .build()?
            .fetch_all(tx.conn())
            .await?;

        tx.commit().await?;
        rows.into_iter().map(Tag::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_repository_traitはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn TagRepository>();
    }
}
