//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - 入力は検証済み抽出器で受け取り、SQL は組み立てない（リポジトリに委譲する）
//! - 応答の型は `utoipa::path` に列挙し、OpenAPI ドキュメントと実際のレスポンスで同じ型を使う

pub mod article;
pub mod health;
pub mod pet;
pub mod tag;

pub use article::{create_article, delete_article, get_article, list_articles, update_article};
pub use health::{health_check, readiness_check};
pub use pet::{attach_tag, create_pet, delete_pet, detach_tag, get_pet, list_pets, update_pet};
pub use tag::{create_tag, delete_tag, get_tag, list_tags};

use petstore_domain::DomainError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// 削除・関連付けなど、リソースを返さない操作の応答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    /// 翻訳済みメッセージ
    pub message: String,
}

/// 一覧取得の上限件数（カーソル判定用）
pub(crate) fn page_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// 値オブジェクトの生成失敗を `field` の検証エラーにする
pub(crate) fn invalid(field: &'static str) -> impl FnOnce(DomainError) -> ApiError {
    move |err| ApiError::from_domain(field, &err)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! ハンドラテスト用のヘルパー

    use std::{path::Path, sync::Arc};

    use axum::{Router, body::Body, http::Request, response::Response};
    use petstore_infra::mock::{MockDatabaseProbe, MockStore};
    use petstore_shared::observability::LogLevel;
    use serde::de::DeserializeOwned;

    use crate::{
        app::build_router,
        config::{AppConfig, FALLBACK_MESSAGE_KEY},
        i18n::I18n,
        logging::LoggingService,
        state::AppState,
    };

    pub fn test_config() -> AppConfig {
        AppConfig::from_lookup(|name| match name {
            "DATABASE_URL" => Some("postgres://localhost/petstore_test".to_string()),
            "RUN_MODE" => Some("server".to_string()),
            _ => None,
        })
        .unwrap()
    }

    /// リポジトリ同梱のカタログを読み込む
    pub fn test_i18n() -> I18n {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../resources/locales");
        I18n::load(&root, "en", FALLBACK_MESSAGE_KEY).unwrap()
    }

    pub fn test_state(store: &MockStore, probe: MockDatabaseProbe) -> AppState {
        AppState {
            config:   Arc::new(test_config()),
            i18n:     Arc::new(test_i18n()),
            logging:  LoggingService::new(LogLevel::Info),
            pets:     Arc::new(store.pet_repository()),
            tags:     Arc::new(store.tag_repository()),
            articles: Arc::new(store.article_repository()),
            probe:    Arc::new(probe),
        }
    }

    pub fn test_app(store: &MockStore) -> Router {
        build_router(test_state(store, MockDatabaseProbe::healthy()))
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub async fn response_body<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
