//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は API 側の責務（shared に axum 依存を入れない）
//! - `detail` は利用者の言語に翻訳済みの文字列、`code` は機械可読なメッセージキー
//! - バリデーションエラーは `invalidParams` にフィールド単位の詳細を持つ

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://petstore.example.com/errors";

/// フィールド単位のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InvalidParam {
    /// 違反したフィールドのパス（例: `body.title`, `query.limit`）
    pub field:      String,
    /// 違反した制約（例: `length`, `range`, `required`）
    pub constraint: String,
    /// 翻訳済みメッセージ
    pub message:    String,
}

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type:     String,
    pub title:          String,
    pub status:         u16,
    pub detail:         String,
    /// 機械可読なエラーキー（翻訳キー）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code:           Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_params: Vec<InvalidParam>,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"not-found"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
            code: None,
            invalid_params: Vec::new(),
        }
    }

    /// 機械可読なエラーキーを付与する
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// フィールド単位のエラーを付与する
    pub fn with_invalid_params(mut self, params: Vec<InvalidParam>) -> Self {
        self.invalid_params = params;
        self
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new("conflict", "Conflict", 409, detail)
    }

    /// 400 Validation Error
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new("validation-error", "Validation Error", 400, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は呼び出し側が用意したフォールバックメッセージのみ（内部情報を含めない）。
    pub fn internal_error(fallback_message: impl Into<String>) -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            fallback_message,
        )
    }
}
