//! # ヘルスチェックハンドラ
//!
//! - `/health` - 稼働環境・待ち受けポートと、そのリクエストに対して解決された言語を返す
//! - `/health/ready` - Readiness Check（データベースへの接続を確認）
//!
//! レスポンス型は [`petstore_shared::HealthResponse`] / [`petstore_shared::ReadinessResponse`] を参照。

use std::collections::HashMap;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use petstore_shared::{
    CheckStatus,
    ErrorResponse,
    HealthResponse,
    I18nInfo,
    ReadinessResponse,
    ReadinessStatus,
};

use crate::{i18n::RequestLanguage, state::AppState};

/// ヘルスチェックエンドポイント
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "サーバー稼働中", body = HealthResponse),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
pub async fn health_check(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
) -> Json<HealthResponse> {
    let server = &state.config.server;
    Json(HealthResponse {
        env_mode: server.env_mode.as_str().to_string(),
        run_mode: server.run_mode.as_str().to_string(),
        port:     server.port,
        i18n:     I18nInfo { language },
    })
}

/// Readiness Check エンドポイント
///
/// データベースに接続できれば 200、できなければ 503。
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "依存サービス稼働中", body = ReadinessResponse),
        (status = 503, description = "依存サービスが利用不可", body = ReadinessResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.probe.ping().await {
        Ok(()) => CheckStatus::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            CheckStatus::Error
        }
    };

    let (http_status, status) = if database == CheckStatus::Ok {
        (StatusCode::OK, ReadinessStatus::Ready)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ReadinessStatus::NotReady)
    };
    let checks = HashMap::from([("database".to_string(), database)]);

    (http_status, Json(ReadinessResponse { status, checks }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};
    use petstore_infra::mock::{MockDatabaseProbe, MockStore};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        app::build_router,
        handler::test_support::{empty_request, response_body, test_app, test_state},
    };

    #[tokio::test]
    async fn test_accept_languageがなければデフォルト言語を返す() {
        // Given
        let sut = test_app(&MockStore::new());

        // When
        let response = sut.oneshot(empty_request("GET", "/health")).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response_body(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "envMode": "local",
                "runMode": "server",
                "port": 7878,
                "i18n": { "language": "en" }
            })
        );
    }

    #[tokio::test]
    async fn test_accept_languageで解決した言語を返す() {
        // Given
        let sut = test_app(&MockStore::new());
        let request = Request::builder()
            .uri("/health")
            .header("accept-language", "ko-KR,ko;q=0.9,en;q=0.8")
            .body(axum::body::Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        let body: HealthResponse = response_body(response).await;
        assert_eq!(body.i18n.language, "ko");
    }

    #[tokio::test]
    async fn test_データベースに接続できればreadyを返す() {
        let sut = test_app(&MockStore::new());

        let response = sut
            .oneshot(empty_request("GET", "/health/ready"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ReadinessResponse = response_body(response).await;
        assert_eq!(body.status, ReadinessStatus::Ready);
        assert_eq!(body.checks["database"], CheckStatus::Ok);
    }

    #[tokio::test]
    async fn test_データベースに接続できなければ503を返す() {
        let sut = build_router(test_state(
            &MockStore::new(),
            MockDatabaseProbe::unhealthy(),
        ));

        let response = sut
            .oneshot(empty_request("GET", "/health/ready"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ReadinessResponse = response_body(response).await;
        assert_eq!(body.status, ReadinessStatus::NotReady);
        assert_eq!(body.checks["database"], CheckStatus::Error);
    }
}
