//! # PetRepository
//!
//! ペットの永続化を担当するリポジトリ。
//!
//! 一覧取得はステータスとタグ名で絞り込める。タグ名を指定した場合は
//! `pet_tags` / `tags` を結合し、いずれかのタグが付いたペットを重複なく返す。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use petstore_domain::pet::{NewPet, Pet, PetChanges, PetFilter, PetId, PetName, PetOid};
use uuid::Uuid;

use super::require_inserted;
use crate::{
    db::{DataSource, Database},
    error::InfraError,
    query::{DeleteBuilder, InsertBuilder, Order, SelectBuilder, UpdateBuilder},
    schema::{PET_TAGS, PETS, TAGS},
};

/// ペットリポジトリトレイト
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// ペットを作成し、再取得した行を返す
    async fn create(&self, pet: &NewPet, tid: &str) -> Result<Pet, InfraError>;

    /// ID でペットを検索する
    async fn find_by_id(&self, id: PetId, tid: &str) -> Result<Option<Pet>, InfraError>;

    /// 条件に合うペットを `id` 昇順で取得する
    async fn list(&self, filter: &PetFilter, tid: &str) -> Result<Vec<Pet>, InfraError>;

    /// ペットを更新する。対象がなければ `None`
    async fn update(
        &self,
        id: PetId,
        changes: &PetChanges,
        tid: &str,
    ) -> Result<Option<Pet>, InfraError>;

    /// ペットを削除する（タグとの関連も連鎖削除される）。削除した場合 `true`
    async fn delete(&self, id: PetId, tid: &str) -> Result<bool, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct PetRow {
    id:         i64,
    oid:        Uuid,
    name:       String,
    status:     String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PetRow> for Pet {
    type Error = InfraError;

    fn try_from(row: PetRow) -> Result<Self, Self::Error> {
        Ok(Pet::from_db(
            PetId::from_i64(row.id),
            PetOid::from_uuid(row.oid),
            PetName::new(row.name)?,
            row.status.parse()?,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の PetRepository
#[derive(Debug, Clone)]
pub struct PostgresPetRepository {
    db: Database,
}

impl PostgresPetRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// 絞り込み条件から一覧取得の SELECT を組み立てる
fn list_query(filter: &PetFilter) -> SelectBuilder {
    let mut select = SelectBuilder::new(&PETS);

    if !filter.tags.is_empty() {
        let names = filter.tags.iter().map(|t| t.as_str().to_string()).collect();
        select = select
            .join(&PET_TAGS, "pet_id", &PETS, "id")
            .join(&TAGS, "id", &PET_TAGS, "tag_id")
            .distinct()
            .where_any(&TAGS, "name", names);
    }
    if let Some(status) = filter.status {
        let status: &'static str = status.into();
        select = select.where_eq(&PETS, "status", status);
    }
    if let Some(after) = filter.page.after() {
        select = select.where_gt(&PETS, "id", after);
    }

    select
        .order_by(&PETS, "id", Order::Asc)
        .limit(filter.page.limit())
}

#[async_trait]
impl PetRepository for PostgresPetRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%tid))]
    async fn create(&self, pet: &NewPet, tid: &str) -> Result<Pet, InfraError> {
        let oid = PetOid::new();
        let status: &'static str = pet.status.into();
        let mut tx = self.db.begin(DataSource::Master).await?;

        InsertBuilder::new(&PETS)
            .value("oid", *oid.as_uuid())
            .value("name", pet.name.as_str())
            .value("status", status)
            .build()?
            .execute(tx.conn())
            .await?;

        let row: Option<PetRow> = SelectBuilder::new(&PETS)
            .where_eq(&PETS, "oid", *oid.as_uuid())
            .build()?
            .fetch_optional(tx.conn())
            .await?;
        let inserted = require_inserted(row, PETS.entity, oid)?;

        tx.commit().await?;
        tracing::debug!(id = inserted.id, %oid, "ペットを作成しました");
        inserted.try_into()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn find_by_id(&self, id: PetId, tid: &str) -> Result<Option<Pet>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let row: Option<PetRow> = SelectBuilder::new(&PETS)
            .where_eq(&PETS, "id", id.as_i64())
            .build()?
            .fetch_optional(tx.conn())
            .await?;

        tx.commit().await?;
        row.map(Pet::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(tags = filter.tags.len(), %tid))]
    async fn list(&self, filter: &PetFilter, tid: &str) -> Result<Vec<Pet>, InfraError> {
        let mut tx = self.db.begin(DataSource::Replica).await?;

        let rows: Vec<PetRow> = list_query(filter).build()?.fetch_all(tx.conn()).await?;

        tx.commit().await?;
        rows.into_iter().map(Pet::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn update(
        &self,
        id: PetId,
        changes: &PetChanges,
        tid: &str,
    ) -> Result<Option<Pet>, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let mut update = UpdateBuilder::new(&PETS);
        if let Some(name) = &changes.name {
            update = update.set("name", name.as_str());
        }
        if let Some(status) = changes.status {
            let status: &'static str = status.into();
            update = update.set("status", status);
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

        let row: Option<PetRow> = SelectBuilder::new(&PETS)
            .where_eq(&PETS, "id", id.as_i64())
            .build()?
            .fetch_optional(tx.conn())
            .await?;

        tx.commit().await?;
        row.map(Pet::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, %tid))]
    async fn delete(&self, id: PetId, tid: &str) -> Result<bool, InfraError> {
        let mut tx = self.db.begin(DataSource::Master).await?;

        let affected = DeleteBuilder::new(&PETS)
            .where_eq("id", id.as_i64())
            .build()?
            .execute(tx.conn())
            .await?;

        tx.commit().await?;
        Ok(affected > 0)
    }
}
