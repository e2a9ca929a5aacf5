//! # 検証付き抽出器
//!
//! リクエストのデシリアライズと `validator` による検証をハンドラ本体より前に行う。
//! どちらかに失敗した場合は [`ApiError::Validation`] を返し、ハンドラは呼ばれない。
//!
//! | 抽出器 | 入力 | フィールドパスの接頭辞 |
//! |--------|------|------------------------|
//! | [`ValidatedJson`] | JSON ボディ | `body` |
//! | [`ValidatedQuery`] | クエリ文字列 | `query` |
//! | [`ValidatedPath`] | パスパラメータ | `path` |
//!
//! デシリアライズの失敗も `body.title` のような位置付きの違反として返す。
//! 欠けたフィールドは `required`、型の合わない値は `type`、列挙にない値は `enum`、
//! 構文として読めない入力は位置だけの `format` になる。
//!
//! クエリは `axum-extra` の `Query` と同じく `serde_html_form` で読むため、
//! `?tags=a&tags=b` のような繰り返しキーを配列として受け取れる。

use axum::{
    body::Bytes,
    extract::{
        FromRequest,
        FromRequestParts,
        Path,
        Request,
        path::ErrorKind,
        rejection::PathRejection,
    },
    http::{HeaderMap, header::CONTENT_TYPE, request::Parts},
};
use axum_extra::extract::Query;
use petstore_shared::{CorrelationId, observability::REQUEST_ID_HEADER};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::error::Category;
use validator::Validate;

use crate::error::{ApiError, FieldViolation};

/// 検証済みの JSON ボディ
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(ApiError::invalid_field("body", "format"));
        }
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "リクエストボディを読み取れません");
            ApiError::invalid_field("body", "format")
        })?;

        let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
        let value: T = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            tracing::debug!(error = %e, "JSON ボディを読み取れません");
            match e.inner().classify() {
                Category::Data => ApiError::Validation(vec![deserialize_violation(
                    "body",
                    e.path(),
                    &e.inner().to_string(),
                )]),
                Category::Io | Category::Syntax | Category::Eof => {
                    ApiError::invalid_field("body", "format")
                }
            }
        })?;
        // 値の後ろに余計な文字が続く
        deserializer
            .end()
            .map_err(|_| ApiError::invalid_field("body", "format"))?;

        value
            .validate()
            .map_err(|e| ApiError::from_validation("body", &e))?;
        Ok(Self(value))
    }
}

/// 検証済みのクエリパラメータ
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let deserializer = serde_html_form::Deserializer::from_bytes(query.as_bytes());
        let value: T = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            tracing::debug!(error = %e, "クエリを読み取れません");
            ApiError::Validation(vec![deserialize_violation(
                "query",
                e.path(),
                &e.inner().to_string(),
            )])
        })?;
        value
            .validate()
            .map_err(|e| ApiError::from_validation("query", &e))?;
        Ok(Self(value))
    }
}

/// 検証済みのパスパラメータ
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e.body_text(), "パスパラメータを読み取れません");
                ApiError::Validation(vec![path_violation(&e)])
            })?;
        value
            .validate()
            .map_err(|e| ApiError::from_validation("path", &e))?;
        Ok(Self(value))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}

/// デシリアライズの失敗を位置付きの違反に変換する
///
/// serde は欠けたフィールドを親の位置で報告するため、名前はメッセージから補う。
fn deserialize_violation(
    location: &str,
    path: &serde_path_to_error::Path,
    message: &str,
) -> FieldViolation {
    let mut field = location.to_string();
    let path = path.to_string();
    if path != "." {
        field.push('.');
        field.push_str(&path);
    }

    if let Some(name) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        if !field.ends_with(&format!(".{name}")) {
            field.push('.');
            field.push_str(name);
        }
        return FieldViolation::new(field, "required");
    }

    let constraint = if message.starts_with("unknown variant") {
        "enum"
    } else {
        "type"
    };
    FieldViolation::new(field, constraint)
}

fn path_violation(rejection: &PathRejection) -> FieldViolation {
    let PathRejection::FailedToDeserializePathParams(e) = rejection else {
        return FieldViolation::new("path", "format");
    };
    match e.kind() {
        ErrorKind::ParseErrorAtKey { key, .. }
        | ErrorKind::DeserializeError { key, .. }
        | ErrorKind::InvalidUtf8InPathParam { key } => {
            FieldViolation::new(format!("path.{key}"), "type")
        }
        _ => FieldViolation::new("path", "format"),
    }
}

#[derive(Debug, Deserialize)]
struct TidQuery {
    tid: Option<String>,
}

/// リクエスト単位の追跡 ID
///
/// `?tid=` が指定されていればそれを、なければ `x-request-id` ヘッダを使う。
/// どちらもなければ新たに生成する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tid(pub CorrelationId);

impl Tid {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn from_parts(parts: &Parts) -> Self {
        let from_query = Query::<TidQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.tid)
            .and_then(|tid| CorrelationId::from_external(&tid));
        let from_header = || {
            parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(CorrelationId::from_external)
        };

        Self(from_query.or_else(from_header).unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for Tid
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
