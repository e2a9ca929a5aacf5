//! # タグ API ハンドラ
//!
//! タグの作成・取得・一覧・削除を提供する。
//! タグ名はシステム全体で一意のため、重複した作成は 409 になる。

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use petstore_domain::{
    pagination::PageRequest,
    tag::{NewTag, Tag, TagId, TagName},
};
use petstore_shared::{ApiResponse, ErrorResponse, PaginatedResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{MessageDto, invalid, page_limit};
use crate::{
    error::{ApiError, Resource},
    extract::{Tid, ValidatedJson, ValidatedPath, ValidatedQuery},
    i18n::RequestLanguage,
    state::AppState,
};

// --- リクエスト型 ---

/// タグ作成リクエスト
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTagRequest {
    /// タグ名（1〜50 文字、一意）
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

/// タグ一覧のクエリ
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTagsQuery {
    /// 取得件数（既定 20、最大 100）
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// 前ページ最後のタグ ID
    #[validate(range(min = 0))]
    pub after: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TagPath {
    #[validate(range(min = 1))]
    pub id: i64,
}

// --- レスポンス型 ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub id:         i64,
    pub name:       String,
    pub created_at: String,
}

impl From<&Tag> for TagDto {
    fn from(tag: &Tag) -> Self {
        Self {
            id:         tag.id().as_i64(),
            name:       tag.name().as_str().to_string(),
            created_at: tag.created_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// POST /v1/tags
#[utoipa::path(
    post,
    path = "/v1/tags",
    tag = "tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "タグ作成", body = ApiResponse<TagDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 409, description = "同名のタグが存在する", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn create_tag(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedJson(req): ValidatedJson<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_tag = NewTag {
        name: TagName::new(req.name).map_err(invalid("body.name"))?,
    };

    let tag = state.tags.create(&new_tag, tid.as_str()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TagDto::from(&tag))),
    ))
}

/// GET /v1/tags
#[utoipa::path(
    get,
    path = "/v1/tags",
    tag = "tags",
    params(ListTagsQuery),
    responses(
        (status = 200, description = "タグ一覧", body = PaginatedResponse<TagDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn list_tags(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedQuery(query): ValidatedQuery<ListTagsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(query.limit, query.after).map_err(invalid("query"))?;

    let tags = state.tags.list(page, tid.as_str()).await?;
    let data: Vec<TagDto> = tags.iter().map(TagDto::from).collect();

    Ok(Json(PaginatedResponse::from_page(
        data,
        page_limit(page.limit()),
        |tag| tag.id.to_string(),
    )))
}

/// GET /v1/tags/{id}
#[utoipa::path(
    get,
    path = "/v1/tags/{id}",
    tag = "tags",
    params(("id" = i64, Path, description = "タグ ID")),
    responses(
        (status = 200, description = "タグ詳細", body = ApiResponse<TagDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "タグが見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn get_tag(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedPath(path): ValidatedPath<TagPath>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tags
        .find_by_id(TagId::from_i64(path.id), tid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Tag, path.id))?;

    Ok(Json(ApiResponse::new(TagDto::from(&tag))))
}

/// DELETE /v1/tags/{id}
///
/// ペットとの関連もあわせて削除される。
#[utoipa::path(
    delete,
    path = "/v1/tags/{id}",
    tag = "tags",
    params(("id" = i64, Path, description = "タグ ID")),
    responses(
        (status = 200, description = "削除完了", body = ApiResponse<MessageDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "タグが見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn delete_tag(
    State(state): State<AppState>,
    tid: Tid,
    RequestLanguage(language): RequestLanguage,
    ValidatedPath(path): ValidatedPath<TagPath>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .tags
        .delete(TagId::from_i64(path.id), tid.as_str())
        .await?;
    if !deleted {
        return Err(ApiError::not_found(Resource::Tag, path.id));
    }

    let message = state.i18n.translate(
        &language,
        "tag.message.deleted",
        &[("id".to_string(), path.id.to_string())],
    );
    Ok(Json(ApiResponse::new(MessageDto { message })))
}
