//! # リクエストログミドルウェア
//!
//! ルートごとの有効フラグ（`METHOD path` → bool）を持ち、有効なルートだけ
//! メソッド・マッチしたパス・ステータス・処理時間を [`Logger`] に渡す。
//! レスポンスボディの記録が有効な場合は JSON ボディを読み取ってから同じ内容で返し直す。
//!
//! ステータスが 5xx なら error、4xx なら warn、それ以外は info で出力する。

use std::{collections::HashMap, sync::Arc, time::Instant};

use axum::{
    body::{Body, to_bytes},
    extract::{MatchedPath, Request, State},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::{
    config::{LoggerConfig, route_key},
    logging::{LogRecord, Logger},
};

/// リクエストログミドルウェアの状態
#[derive(Debug, Clone)]
pub struct RequestLogState {
    logger:        Logger,
    /// `METHOD path` → ログ出力するか
    routes:        Arc<HashMap<String, bool>>,
    reply_payload: bool,
}

impl RequestLogState {
    /// 登録済みルートの有効フラグを組み立てる
    ///
    /// `/health` 配下と `LOG_EXCLUDE_ROUTES` に挙げたルートは無効にする。
    pub fn new<'a>(
        logger: Logger,
        config: &LoggerConfig,
        routes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let routes = routes
            .into_iter()
            .map(|(method, path)| {
                let key = route_key(method, path);
                let enabled =
                    !path.starts_with("/health") && !config.excluded_routes.contains(&key);
                (key, enabled)
            })
            .collect();

        Self {
            logger,
            routes: Arc::new(routes),
            reply_payload: config.reply_payload,
        }
    }

    /// ルートがログ出力対象か
    pub fn includes(&self, method: &str, path: &str) -> bool {
        self.routes
            .get(&route_key(method, path))
            .copied()
            .unwrap_or(false)
    }
}

/// 対象ルートのリクエストをログに出力する
pub async fn log_requests(
    State(state): State<RequestLogState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(route) = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
    else {
        return next.run(request).await;
    };
    let method = request.method().as_str().to_string();
    if !state.includes(&method, &route) {
        return next.run(request).await;
    }
    let url = request
        .uri()
        .path_and_query()
        .map_or_else(|| route.clone(), |pq| pq.as_str().to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_millis();

    let status = response.status();
    let mut record = LogRecord::new(format!("{method} {route}"))
        .status(status.as_u16())
        .request(method, url)
        .duration(elapsed);

    let response = if state.reply_payload && is_json(&response) {
        let (parts, body) = response.into_parts();
        match to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                if let Ok(payload) = serde_json::from_slice::<Value>(&bytes) {
                    record = record.body(payload);
                }
                Response::from_parts(parts, Body::from(bytes))
            }
            Err(err) => {
                record = record.error(err);
                Response::from_parts(parts, Body::empty())
            }
        }
    } else {
        response
    };

    if status.is_server_error() {
        state.logger.error(record);
    } else if status.is_client_error() {
        state.logger.warn(record);
    } else {
        state.logger.info(record);
    }

    response
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use petstore_shared::observability::{LogFormat, LogLevel};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::logging::LoggingService;

    const ROUTES: [(&str, &str); 4] = [
        ("GET", "/health"),
        ("GET", "/health/ready"),
        ("GET", "/v1/pets"),
        ("POST", "/v1/pets"),
    ];

    fn state(excluded: &[&str]) -> RequestLogState {
        let config = LoggerConfig {
            level:           LogLevel::Info,
            format:          LogFormat::Pretty,
            inspecting:      false,
            reply_payload:   true,
            excluded_routes: excluded.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        };
        let logger = LoggingService::new(LogLevel::Info).component("request");
        RequestLogState::new(logger, &config, ROUTES)
    }

    #[rstest]
    #[case::apiルートは既定で対象("GET", "/v1/pets", true)]
    #[case::メソッドの大小は区別しない("post", "/v1/pets", true)]
    #[case::ヘルスチェックは対象外("GET", "/health", false)]
    #[case::readinessも対象外("GET", "/health/ready", false)]
    #[case::未登録のルートは対象外("DELETE", "/v1/pets", false)]
    fn test_登録済みルートの有効フラグで判定する(
        #[case] method: &str,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(state(&[]).includes(method, path), expected);
    }

    #[test]
    fn test_除外指定したルートは対象外になる() {
        let sut = state(&["POST /v1/pets"]);

        assert!(!sut.includes("POST", "/v1/pets"));
        assert!(sut.includes("GET", "/v1/pets"));
    }
}
