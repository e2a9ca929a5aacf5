//! # ヘルスチェック共通型
//!
//! ヘルスチェックエンドポイントで使用されるレスポンス型を提供する。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// リクエスト言語の解決結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct I18nInfo {
    /// `Accept-Language` から解決された言語コード
    pub language: String,
}

/// ヘルスチェックレスポンス
///
/// 稼働環境（`envMode` / `runMode`）、待ち受けポート、
/// そのリクエストに対して解決された言語を返す。
///
/// ## 使用例
///
/// ```
/// use petstore_shared::{HealthResponse, I18nInfo};
///
/// let response = HealthResponse {
///     env_mode: "local".to_string(),
///     run_mode: "local".to_string(),
///     port:     7878,
///     i18n:     I18nInfo {
///         language: "en".to_string(),
///     },
/// };
/// assert_eq!(response.port, 7878);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    /// 実行環境（`local` / `develop` / `qa` / `production`）
    pub env_mode: String,
    /// 実行モード（`local` / `server`）
    pub run_mode: String,
    /// 待ち受けポート
    pub port:     u16,
    pub i18n:     I18nInfo,
}

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CheckStatus {
    /// チェック成功
    Ok,
    /// チェック失敗
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ReadinessStatus {
    /// 全依存サービスが利用可能
    Ready,
    /// 一部の依存サービスが利用不可
    NotReady,
}

/// Readiness Check レスポンス
///
/// `status` は全体のステータス、`checks` は個別チェック結果を示す。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReadinessResponse {
    /// 全体のステータス
    pub status: ReadinessStatus,
    /// 個別チェック結果（キー: チェック名、値: ステータス）
    pub checks: HashMap<String, CheckStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_responseのserializeでcamel_caseのjson形状にする() {
        let response = HealthResponse {
            env_mode: "local".to_string(),
            run_mode: "server".to_string(),
            port:     7878,
            i18n:     I18nInfo {
                language: "en".to_string(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "envMode": "local",
                "runMode": "server",
                "port": 7878,
                "i18n": { "language": "en" }
            })
        );
    }

    #[test]
    fn test_readiness_response_not_readyのserialize結果() {
        let mut checks = HashMap::new();
        checks.insert("database".to_string(), CheckStatus::Error);
        let response = ReadinessResponse {
            status: ReadinessStatus::NotReady,
            checks,
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "not_ready");
        assert_eq!(json["checks"]["database"], "error");
    }
}
