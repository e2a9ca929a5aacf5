//! # ルーター構築
//!
//! ルート定義とレイヤーの適用を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use axum::{
    Router,
    http::Uri,
    middleware::from_fn_with_state,
    routing::{get, put},
};
use petstore_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    error::{ApiError, Resource},
    handler::{
        attach_tag,
        create_article,
        create_pet,
        create_tag,
        delete_article,
        delete_pet,
        delete_tag,
        detach_tag,
        get_article,
        get_pet,
        get_tag,
        health_check,
        list_articles,
        list_pets,
        list_tags,
        readiness_check,
        update_article,
        update_pet,
    },
    middleware::{RequestLogState, localize_errors, log_requests},
    openapi::openapi_json,
    state::AppState,
};

/// 登録するルート（`METHOD path`）
///
/// リクエストログの有効フラグはこの一覧から作る。
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("GET", "/health/ready"),
    ("GET", "/openapi.json"),
    ("POST", "/v1/pets"),
    ("GET", "/v1/pets"),
    ("GET", "/v1/pets/{id}"),
    ("PUT", "/v1/pets/{id}"),
    ("DELETE", "/v1/pets/{id}"),
    ("PUT", "/v1/pets/{id}/tags/{tag_id}"),
    ("DELETE", "/v1/pets/{id}/tags/{tag_id}"),
    ("POST", "/v1/tags"),
    ("GET", "/v1/tags"),
    ("GET", "/v1/tags/{id}"),
    ("DELETE", "/v1/tags/{id}"),
    ("POST", "/v1/articles"),
    ("GET", "/v1/articles"),
    ("GET", "/v1/articles/{id}"),
    ("PUT", "/v1/articles/{id}"),
    ("DELETE", "/v1/articles/{id}"),
];

/// ルーターを組み立てる
pub fn build_router(state: AppState) -> Router {
    let request_log = RequestLogState::new(
        state.logging.component("request"),
        &state.config.logger,
        ROUTES.iter().copied(),
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/openapi.json", get(openapi_json))
        .route("/v1/pets", get(list_pets).post(create_pet))
        .route(
            "/v1/pets/{id}",
            get(get_pet).put(update_pet).delete(delete_pet),
        )
        .route(
            "/v1/pets/{id}/tags/{tag_id}",
            put(attach_tag).delete(detach_tag),
        )
        .route("/v1/tags", get(list_tags).post(create_tag))
        .route("/v1/tags/{id}", get(get_tag).delete(delete_tag))
        .route("/v1/articles", get(list_articles).post(create_article))
        .route(
            "/v1/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .fallback(route_not_found)
        // レイヤー順序: 下に書いたものが外側
        // 1. SetRequestIdLayer（最外）: UUID v7 の x-request-id を付与（クライアント提供値は維持）
        // 2. PropagateRequestIdLayer: レスポンスヘッダーに x-request-id をコピー
        // 3. TraceLayer: request_id を含むリクエストスパン
        // 4. log_requests: 翻訳後のレスポンスを記録する
        // 5. localize_errors: エラー応答を要求言語に翻訳する
        .layer(from_fn_with_state(state.i18n.clone(), localize_errors))
        .layer(from_fn_with_state(request_log, log_requests))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(Resource::Route, uri.path())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use petstore_infra::mock::MockStore;
    use petstore_shared::{ErrorResponse, observability::REQUEST_ID_HEADER};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::handler::test_support::{empty_request, json_request, response_body, test_app};

    #[tokio::test]
    async fn test_未登録のルートは翻訳済みの404になる() {
        let sut = test_app(&MockStore::new());
        let request = Request::builder()
            .uri("/v1/unknown")
            .header("accept-language", "ja")
            .body(Body::empty())
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.code.as_deref(), Some("common.error.route_not_found"));
        assert_ne!(body.detail, "common.error.route_not_found");
    }

    #[tokio::test]
    async fn test_レスポンスにリクエストidが付与される() {
        let sut = test_app(&MockStore::new());

        let response = sut.oneshot(empty_request("GET", "/health")).await.unwrap();

        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_クライアントが指定したリクエストidを維持する() {
        let sut = test_app(&MockStore::new());
        let request = Request::builder()
            .uri("/health")
            .header(REQUEST_ID_HEADER, "client-req-1")
            .body(Body::empty())
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "client-req-1");
    }

    #[tokio::test]
    async fn test_未対応の言語ではデフォルト言語で翻訳する() {
        let sut = test_app(&MockStore::new());
        let request = Request::builder()
            .uri("/v1/articles/7")
            .header("accept-language", "fr-FR,de;q=0.5")
            .body(Body::empty())
            .unwrap();

        let response = sut.oneshot(request).await.unwrap();

        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.detail, "Article 7 was not found.");
    }

    #[tokio::test]
    async fn test_ボディを記録してもレスポンスは変わらない() {
        let store = MockStore::new();

        let response = test_app(&store)
            .oneshot(json_request("POST", "/v1/tags", json!({ "name": "cute" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: serde_json::Value = response_body(response).await;
        assert_eq!(body["data"]["name"], "cute");
    }
}
