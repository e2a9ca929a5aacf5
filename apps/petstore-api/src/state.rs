//! # アプリケーション状態
//!
//! ハンドラとミドルウェアが共有する依存関係。`main` でリクエスト受付前に一度だけ組み立てる。
//! リポジトリはトレイトオブジェクトで保持し、テストではインメモリ実装に差し替える。

use std::sync::Arc;

use axum::extract::FromRef;
use petstore_infra::{
    db::{Database, DatabaseProbe},
    repository::{
        ArticleRepository,
        PetRepository,
        PostgresArticleRepository,
        PostgresPetRepository,
        PostgresTagRepository,
        TagRepository,
    },
};

use crate::{config::AppConfig, i18n::I18n, logging::LoggingService};

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub config:   Arc<AppConfig>,
    pub i18n:     Arc<I18n>,
    pub logging:  LoggingService,
    pub pets:     Arc<dyn PetRepository>,
    pub tags:     Arc<dyn TagRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub probe:    Arc<dyn DatabaseProbe>,
}

impl AppState {
    /// PostgreSQL 実装のリポジトリで状態を組み立てる
    pub fn postgres(
        config: Arc<AppConfig>,
        i18n: Arc<I18n>,
        logging: LoggingService,
        db: Database,
    ) -> Self {
        Self {
            config,
            i18n,
            logging,
            pets: Arc::new(PostgresPetRepository::new(db.clone())),
            tags: Arc::new(PostgresTagRepository::new(db.clone())),
            articles: Arc::new(PostgresArticleRepository::new(db.clone())),
            probe: Arc::new(db),
        }
    }
}

impl FromRef<AppState> for Arc<I18n> {
    fn from_ref(state: &AppState) -> Self {
        state.i18n.clone()
    }
}
