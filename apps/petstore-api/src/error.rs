//! # API エラー定義
//!
//! ハンドラと抽出器が返すエラーと、HTTP レスポンスへの変換を定義する。
//!
//! ## 翻訳との分担
//!
//! `ApiError` はレスポンスを組み立てる際、翻訳前の情報（ステータス、メッセージキー、
//! 差し込み値、フィールド単位の違反）を [`ErrorReply`] としてレスポンスの
//! extensions に載せる。利用者の言語への翻訳は
//! [`localize_errors`](crate::middleware::localize_errors) が行う。
//! ミドルウェアを通らない場合でも、ボディはメッセージキーを `detail` に持つ
//! 有効な `ErrorResponse` になる。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use petstore_domain::DomainError;
use petstore_infra::InfraError;
use petstore_shared::{ErrorResponse, InvalidParam};
use thiserror::Error;
use validator::ValidationErrors;

/// メッセージへの差し込み値（`{{name}}` → 値）
pub type MessageParams = Vec<(String, String)>;

/// 存在しなかったリソースの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Pet,
    Tag,
    PetTag,
    Article,
    Route,
}

impl Resource {
    fn not_found_key(self) -> &'static str {
        match self {
            Self::Pet => "pet.error.not_found",
            Self::Tag => "tag.error.not_found",
            Self::PetTag => "pet.error.tag_not_attached",
            Self::Article => "article.error.not_found",
            Self::Route => "common.error.route_not_found",
        }
    }
}

/// フィールド単位のバリデーション違反（翻訳前）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// `body.title` のような位置付きのフィールドパス
    pub field:      String,
    /// 違反した制約の名前
    pub constraint: String,
    /// メッセージキー
    pub key:        String,
    pub params:     MessageParams,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        let constraint = constraint.into();
        Self {
            field: field.into(),
            key: format!("validation.{constraint}"),
            constraint,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// 翻訳前のエラー応答
///
/// レスポンスの extensions に格納され、翻訳ミドルウェアが取り出す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    pub status:     StatusCode,
    /// メッセージキー。`None` の場合はフォールバックメッセージを使う
    pub key:        Option<String>,
    pub params:     MessageParams,
    pub violations: Vec<FieldViolation>,
}

impl ErrorReply {
    /// 翻訳済みメッセージから RFC 9457 形式のボディを組み立てる
    ///
    /// `code` には実際に使ったメッセージキーを入れる。
    pub fn to_response_body(
        &self,
        code: &str,
        detail: String,
        invalid_params: Vec<InvalidParam>,
    ) -> ErrorResponse {
        let body = match self.status {
            StatusCode::BAD_REQUEST if !self.violations.is_empty() => {
                ErrorResponse::validation_error(detail)
            }
            StatusCode::BAD_REQUEST => ErrorResponse::bad_request(detail),
            StatusCode::NOT_FOUND => ErrorResponse::not_found(detail),
            StatusCode::CONFLICT => ErrorResponse::conflict(detail),
            StatusCode::INTERNAL_SERVER_ERROR => ErrorResponse::internal_error(detail),
            status => ErrorResponse::new(
                "error",
                status.canonical_reason().unwrap_or("Error"),
                status.as_u16(),
                detail,
            ),
        };
        body.with_code(code).with_invalid_params(invalid_params)
    }
}

/// API で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値が制約を満たさない
    #[error("入力値が不正です: {} 件の違反", .0.len())]
    Validation(Vec<FieldViolation>),

    /// リソースが見つからない
    #[error("{resource:?} が見つかりません: {id}")]
    NotFound { resource: Resource, id: String },

    /// 一意制約に違反した
    #[error("{entity} は既に存在します: {key}")]
    Conflict { entity: String, key: String },

    /// インフラ層のエラー
    #[error("インフラエラー: {0}")]
    Infra(InfraError),
}

impl ApiError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// 単一フィールドの違反
    pub fn invalid_field(field: impl Into<String>, constraint: &str) -> Self {
        Self::Validation(vec![FieldViolation::new(field, constraint)])
    }

    /// `validator` の検証結果を `location.field` 形式の違反一覧に変換する
    pub fn from_validation(location: &str, errors: &ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = format!("{location}.{field}");
                errs.iter().map(move |err| {
                    let mut violation = FieldViolation::new(field.clone(), err.code.to_string());
                    let mut params: Vec<_> = err
                        .params
                        .iter()
                        .filter(|(name, _)| *name != "value")
                        .map(|(name, value)| {
                            let value = value
                                .as_str()
                                .map_or_else(|| value.to_string(), str::to_string);
                            (name.to_string(), value)
                        })
                        .collect();
                    params.sort();
                    violation.params = params;
                    violation
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field).then(a.constraint.cmp(&b.constraint)));
        Self::Validation(violations)
    }

    /// 値オブジェクトの生成に失敗したフィールド
    pub fn from_domain(field: impl Into<String>, error: &DomainError) -> Self {
        tracing::debug!(error = %error, "値オブジェクトの検証に失敗しました");
        Self::invalid_field(field, "invalid")
    }

    /// 翻訳前のエラー応答に変換する
    pub fn reply(&self) -> ErrorReply {
        match self {
            Self::Validation(violations) => ErrorReply {
                status:     StatusCode::BAD_REQUEST,
                key:        Some("common.error.validation".to_string()),
                params:     Vec::new(),
                violations: violations.clone(),
            },
            Self::NotFound { resource, id } => ErrorReply {
                status:     StatusCode::NOT_FOUND,
                key:        Some(resource.not_found_key().to_string()),
                params:     vec![("id".to_string(), id.clone())],
                violations: Vec::new(),
            },
            Self::Conflict { entity, key } => ErrorReply {
                status:     StatusCode::CONFLICT,
                key:        Some("common.error.conflict".to_string()),
                params:     vec![
                    ("entity".to_string(), entity.clone()),
                    ("key".to_string(), key.clone()),
                ],
                violations: Vec::new(),
            },
            Self::Infra(_) => ErrorReply {
                status:     StatusCode::INTERNAL_SERVER_ERROR,
                key:        None,
                params:     Vec::new(),
                violations: Vec::new(),
            },
        }
    }
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        if let Some((entity, key)) = err.as_conflict() {
            return Self::Conflict {
                entity: entity.to_string(),
                key:    key.to_string(),
            };
        }
        Self::Infra(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Infra(err) = &self {
            tracing::error!(
                error.category = "infrastructure",
                error.kind = ?err.kind(),
                span_trace = %err.span_trace(),
                "インフラエラー: {}",
                err
            );
        }

        let reply = self.reply();
        let code = reply.key.clone().unwrap_or_default();
        let invalid_params = reply
            .violations
            .iter()
            .map(|v| InvalidParam {
                field:      v.field.clone(),
                constraint: v.constraint.clone(),
                message:    v.key.clone(),
            })
            .collect();
        let body = reply.to_response_body(&code, code.clone(), invalid_params);

        let mut response = (reply.status, Json(body)).into_response();
        response.extensions_mut().insert(reply);
        response
    }
}
