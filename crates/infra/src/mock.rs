//! # テスト用モックリポジトリ
//!
//! ハンドラテストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! petstore-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! ペットとタグの関連を扱うため、各モックは [`MockStore`] の状態を共有する。

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use petstore_domain::{
    article::{Article, ArticleChanges, ArticleId, ArticleOid, NewArticle},
    pagination::PageRequest,
    pet::{NewPet, Pet, PetChanges, PetFilter, PetId, PetOid},
    tag::{NewTag, PetTag, Tag, TagId},
};

use crate::{
    db::DatabaseProbe,
    error::InfraError,
    repository::{ArticleRepository, PetRepository, TagRepository},
};

#[derive(Default)]
struct State {
    pets:         Vec<Pet>,
    tags:         Vec<Tag>,
    links:        Vec<PetTag>,
    articles:     Vec<Article>,
    last_id:      i64,
    lose_inserts: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// キーセットページネーションをインメモリで適用する
fn paginate<T: Clone>(items: &[T], page: PageRequest, id_of: impl Fn(&T) -> i64) -> Vec<T> {
    let mut items: Vec<T> = items
        .iter()
        .filter(|item| page.after().is_none_or(|after| id_of(item) > after))
        .cloned()
        .collect();
    items.sort_by_key(|item| id_of(item));
    items.truncate(usize::try_from(page.limit()).unwrap_or(usize::MAX));
    items
}

// ===== MockStore =====

/// モックリポジトリが共有するインメモリストア
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<State>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// 以降の作成で、挿入後の再取得が行を見つけられなかった状態を再現する
    pub fn lose_inserts(&self) {
        self.lock().lose_inserts = true;
    }

    pub fn pet_repository(&self) -> MockPetRepository {
        MockPetRepository { store: self.clone() }
    }

    pub fn tag_repository(&self) -> MockTagRepository {
        MockTagRepository { store: self.clone() }
    }

    pub fn article_repository(&self) -> MockArticleRepository {
        MockArticleRepository { store: self.clone() }
    }

    /// 保存されている関連の数
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }
}

// ===== MockPetRepository =====

#[derive(Clone)]
pub struct MockPetRepository {
    store: MockStore,
}

#[async_trait]
impl PetRepository for MockPetRepository {
    async fn create(&self, pet: &NewPet, _tid: &str) -> Result<Pet, InfraError> {
        let mut state = self.store.lock();
        let oid = PetOid::new();
        if state.lose_inserts {
            return Err(InfraError::not_found("Pet", oid.to_string()));
        }
        let now = Utc::now();
        let id = state.next_id();
        let created = Pet::from_db(
            PetId::from_i64(id),
            oid,
            pet.name.clone(),
            pet.status,
            now,
            now,
        );
        state.pets.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: PetId, _tid: &str) -> Result<Option<Pet>, InfraError> {
        Ok(self
            .store
            .lock()
            .pets
            .iter()
            .find(|p| p.id() == id)
            .cloned())
    }

    async fn list(&self, filter: &PetFilter, _tid: &str) -> Result<Vec<Pet>, InfraError> {
        let state = self.store.lock();
        let tagged = |pet: &Pet| {
            state.links.iter().any(|link| {
                link.pet_id == pet.id()
                    && state
                        .tags
                        .iter()
                        .any(|t| t.id() == link.tag_id && filter.tags.contains(t.name()))
            })
        };
        let matched: Vec<Pet> = state
            .pets
            .iter()
            .filter(|p| filter.status.is_none_or(|s| p.status() == s))
            .filter(|p| filter.tags.is_empty() || tagged(p))
            .cloned()
            .collect();
        Ok(paginate(&matched, filter.page, |p| p.id().as_i64()))
    }

    async fn update(
        &self,
        id: PetId,
        changes: &PetChanges,
        _tid: &str,
    ) -> Result<Option<Pet>, InfraError> {
        let mut state = self.store.lock();
        let Some(pet) = state.pets.iter_mut().find(|p| p.id() == id) else {
            return Ok(None);
        };
        let updated = Pet::from_db(
            pet.id(),
            pet.oid(),
            changes.name.clone().unwrap_or_else(|| pet.name().clone()),
            changes.status.unwrap_or(pet.status()),
            pet.created_at(),
            Utc::now().max(pet.updated_at()),
        );
        *pet = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: PetId, _tid: &str) -> Result<bool, InfraError> {
        let mut state = self.store.lock();
        let before = state.pets.len();
        state.pets.retain(|p| p.id() != id);
        state.links.retain(|l| l.pet_id != id);
        Ok(state.pets.len() < before)
    }
}

// ===== MockTagRepository =====

#[derive(Clone)]
pub struct MockTagRepository {
    store: MockStore,
}

#[async_trait]
impl TagRepository for MockTagRepository {
    async fn create(&self, tag: &NewTag, _tid: &str) -> Result<Tag, InfraError> {
        let mut state = self.store.lock();
        if state.tags.iter().any(|t| t.name() == &tag.name) {
            return Err(InfraError::conflict("Tag", tag.name.as_str()));
        }
        if state.lose_inserts {
            return Err(InfraError::not_found("Tag", tag.name.as_str()));
        }
        let id = state.next_id();
        let created = Tag::from_db(TagId::from_i64(id), tag.name.clone(), Utc::now());
        state.tags.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: TagId, _tid: &str) -> Result<Option<Tag>, InfraError> {
        Ok(self
            .store
            .lock()
            .tags
            .iter()
            .find(|t| t.id() == id)
            .cloned())
    }

    async fn list(&self, page: PageRequest, _tid: &str) -> Result<Vec<Tag>, InfraError> {
        let state = self.store.lock();
        Ok(paginate(&state.tags, page, |t| t.id().as_i64()))
    }

    async fn delete(&self, id: TagId, _tid: &str) -> Result<bool, InfraError> {
        let mut state = self.store.lock();
        let before = state.tags.len();
        state.tags.retain(|t| t.id() != id);
        state.links.retain(|l| l.tag_id != id);
        Ok(state.tags.len() < before)
    }

    async fn attach(&self, link: PetTag, _tid: &str) -> Result<bool, InfraError> {
        let mut state = self.store.lock();
        if state.links.contains(&link) {
            return Ok(false);
        }
        state.links.push(link);
        Ok(true)
    }

    async fn detach(&self, link: PetTag, _tid: &str) -> Result<bool, InfraError> {
        let mut state = self.store.lock();
        let before = state.links.len();
        state.links.retain(|l| *l != link);
        Ok(state.links.len() < before)
    }

    async fn find_by_pet(&self, pet_id: PetId, _tid: &str) -> Result<Vec<Tag>, InfraError> {
        let state = self.store.lock();
        let mut tags: Vec<Tag> = state
            .tags
            .iter()
            .filter(|t| state.links.contains(&PetTag::new(pet_id, t.id())))
            .cloned()
            .collect();
        tags.sort_by_key(|t| t.id());
        Ok(tags)
    }
}

// ===== MockArticleRepository =====

#[derive(Clone)]
pub struct MockArticleRepository {
    store: MockStore,
}

#[async_trait]
impl ArticleRepository for MockArticleRepository {
    async fn create(&self, article: &NewArticle, _tid: &str) -> Result<Article, InfraError> {
        let mut state = self.store.lock();
        let oid = ArticleOid::new();
        if state.lose_inserts {
            return Err(InfraError::not_found("Article", oid.to_string()));
        }
        let now = Utc::now();
        let id = state.next_id();
        let created = Article::from_db(
            ArticleId::from_i64(id),
            oid,
            article.title.clone(),
            article.body.clone(),
            now,
            now,
        );
        state.articles.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: ArticleId, _tid: &str) -> Result<Option<Article>, InfraError> {
        Ok(self
            .store
            .lock()
            .articles
            .iter()
            .find(|a| a.id() == id)
            .cloned())
    }

    async fn list(&self, page: PageRequest, _tid: &str) -> Result<Vec<Article>, InfraError> {
        let state = self.store.lock();
        Ok(paginate(&state.articles, page, |a| a.id().as_i64()))
    }

    async fn update(
        &self,
        id: ArticleId,
        changes: &ArticleChanges,
        _tid: &str,
    ) -> Result<Option<Article>, InfraError> {
        let mut state = self.store.lock();
        let Some(article) = state.articles.iter_mut().find(|a| a.id() == id) else {
            return Ok(None);
        };
        let updated = Article::from_db(
            article.id(),
            article.oid(),
            changes
                .title
                .clone()
                .unwrap_or_else(|| article.title().clone()),
            changes.body.clone().unwrap_or_else(|| article.body().clone()),
            article.created_at(),
            Utc::now().max(article.updated_at()),
        );
        *article = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: ArticleId, _tid: &str) -> Result<bool, InfraError> {
        let mut state = self.store.lock();
        let before = state.articles.len();
        state.articles.retain(|a| a.id() != id);
        Ok(state.articles.len() < before)
    }
}

// ===== MockDatabaseProbe =====

/// readiness チェック用のモック
#[derive(Clone, Copy, Default)]
pub struct MockDatabaseProbe {
    pub healthy: bool,
}

impl MockDatabaseProbe {
    pub fn healthy() -> Self {
        Self { healthy: true }
    }

    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

#[async_trait]
impl DatabaseProbe for MockDatabaseProbe {
    async fn ping(&self) -> Result<(), InfraError> {
        if self.healthy {
            Ok(())
        } else {
            Err(InfraError::unexpected("database unavailable"))
        }
    }
}
