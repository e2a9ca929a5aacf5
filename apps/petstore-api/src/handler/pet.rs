//! # ペット API ハンドラ
//!
//! ペットの CRUD と、ペットへのタグの付け外しを提供する。
//!
//! ## エンドポイント
//!
//! - `POST /v1/pets` - 作成
//! - `GET /v1/pets` - 一覧（`status` / `tags` で絞り込み）
//! - `GET /v1/pets/{id}` - 詳細（付与済みタグを含む）
//! - `PUT /v1/pets/{id}` - 部分更新
//! - `DELETE /v1/pets/{id}` - 削除
//! - `PUT /v1/pets/{id}/tags/{tag_id}` - タグ付与（冪等）
//! - `DELETE /v1/pets/{id}/tags/{tag_id}` - タグ解除

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use petstore_domain::{
    pagination::PageRequest,
    pet::{NewPet, Pet, PetChanges, PetFilter, PetId, PetName, PetStatus},
    tag::{PetTag, TagId, TagName},
};
use petstore_shared::{ApiResponse, ErrorResponse, PaginatedResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{MessageDto, invalid, page_limit, tag::TagDto};
use crate::{
    error::{ApiError, FieldViolation, Resource},
    extract::{Tid, ValidatedJson, ValidatedPath, ValidatedQuery},
    i18n::RequestLanguage,
    state::AppState,
};

// --- リクエスト型 ---

/// ペット作成リクエスト
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePetRequest {
    /// ペット名（1〜100 文字）
    #[validate(length(min = 1, max = 100))]
    pub name:   String,
    /// 販売状況（省略時は `available`）
    #[serde(default)]
    #[schema(value_type = String, example = "available")]
    pub status: PetStatus,
}

/// ペット更新リクエスト
///
/// 指定したフィールドだけを変更する。どちらも省略した場合は 400。
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePetRequest {
    #[validate(length(min = 1, max = 100))]
    pub name:   Option<String>,
    #[schema(value_type = Option<String>, example = "sold")]
    pub status: Option<PetStatus>,
}

/// ペット一覧のクエリ
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPetsQuery {
    /// 販売状況で絞り込む
    #[param(value_type = Option<String>)]
    pub status: Option<PetStatus>,
    /// いずれかのタグが付いたペットに絞り込む
    ///
    /// `?tags=a` の単一指定も `?tags=a&tags=b` の繰り返し指定も配列として扱う。
    #[serde(default)]
    #[validate(length(max = 10))]
    pub tags:   Vec<String>,
    /// 取得件数（既定 20、最大 100）
    #[validate(range(min = 1, max = 100))]
    pub limit:  Option<i64>,
    /// 前ページ最後のペット ID
    #[validate(range(min = 0))]
    pub after:  Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PetPath {
    #[validate(range(min = 1))]
    pub id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PetTagPath {
    #[validate(range(min = 1))]
    pub id:     i64,
    #[validate(range(min = 1))]
    pub tag_id: i64,
}

// --- レスポンス型 ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetDto {
    pub id:         i64,
    /// 作成時に割り当てられる外部公開用識別子
    pub oid:        Uuid,
    pub name:       String,
    pub status:     String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Pet> for PetDto {
    fn from(pet: &Pet) -> Self {
        Self {
            id:         pet.id().as_i64(),
            oid:        *pet.oid().as_uuid(),
            name:       pet.name().as_str().to_string(),
            status:     pet.status().to_string(),
            created_at: pet.created_at().to_rfc3339(),
            updated_at: pet.updated_at().to_rfc3339(),
        }
    }
}

/// ペット詳細（付与済みタグを含む）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PetDetailDto {
    #[serde(flatten)]
    pub pet:  PetDto,
    pub tags: Vec<TagDto>,
}

// --- ハンドラ ---

/// POST /v1/pets
#[utoipa::path(
    post,
    path = "/v1/pets",
    tag = "pets",
    request_body = CreatePetRequest,
    responses(
        (status = 201, description = "ペット作成", body = ApiResponse<PetDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn create_pet(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedJson(req): ValidatedJson<CreatePetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_pet = NewPet {
        name:   PetName::new(req.name).map_err(invalid("body.name"))?,
        status: req.status,
    };

    let pet = state.pets.create(&new_pet, tid.as_str()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(PetDto::from(&pet))),
    ))
}

/// GET /v1/pets
#[utoipa::path(
    get,
    path = "/v1/pets",
    tag = "pets",
    params(ListPetsQuery),
    responses(
        (status = 200, description = "ペット一覧", body = PaginatedResponse<PetDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn list_pets(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedQuery(query): ValidatedQuery<ListPetsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(query.limit, query.after).map_err(invalid("query"))?;
    let tags = query
        .tags
        .into_iter()
        .map(|tag| TagName::new(tag).map_err(invalid("query.tags")))
        .collect::<Result<Vec<_>, _>>()?;
    let filter = PetFilter {
        status: query.status,
        tags,
        page,
    };

    let pets = state.pets.list(&filter, tid.as_str()).await?;
    let data: Vec<PetDto> = pets.iter().map(PetDto::from).collect();

    Ok(Json(PaginatedResponse::from_page(
        data,
        page_limit(page.limit()),
        |pet| pet.id.to_string(),
    )))
}

/// GET /v1/pets/{id}
#[utoipa::path(
    get,
    path = "/v1/pets/{id}",
    tag = "pets",
    params(("id" = i64, Path, description = "ペット ID")),
    responses(
        (status = 200, description = "ペット詳細", body = ApiResponse<PetDetailDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "ペットが見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn get_pet(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedPath(path): ValidatedPath<PetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let pet_id = PetId::from_i64(path.id);
    let pet = state
        .pets
        .find_by_id(pet_id, tid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Pet, path.id))?;
    let tags = state.tags.find_by_pet(pet_id, tid.as_str()).await?;

    Ok(Json(ApiResponse::new(PetDetailDto {
        pet:  PetDto::from(&pet),
        tags: tags.iter().map(TagDto::from).collect(),
    })))
}

/// PUT /v1/pets/{id}
#[utoipa::path(
    put,
    path = "/v1/pets/{id}",
    tag = "pets",
    params(("id" = i64, Path, description = "ペット ID")),
    request_body = UpdatePetRequest,
    responses(
        (status = 200, description = "更新後のペット", body = ApiResponse<PetDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "ペットが見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn update_pet(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedPath(path): ValidatedPath<PetPath>,
    ValidatedJson(req): ValidatedJson<UpdatePetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let changes = PetChanges {
        name:   req
            .name
            .map(PetName::new)
            .transpose()
            .map_err(invalid("body.name"))?,
        status: req.status,
    };
    if changes.is_empty() {
        return Err(ApiError::Validation(vec![FieldViolation::new(
            "body",
            "empty_changes",
        )]));
    }

    let pet = state
        .pets
        .update(PetId::from_i64(path.id), &changes, tid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Pet, path.id))?;

    Ok(Json(ApiResponse::new(PetDto::from(&pet))))
}

/// DELETE /v1/pets/{id}
#[utoipa::path(
    delete,
    path = "/v1/pets/{id}",
    tag = "pets",
    params(("id" = i64, Path, description = "ペット ID")),
    responses(
        (status = 200, description = "削除完了", body = ApiResponse<MessageDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "ペットが見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn delete_pet(
    State(state): State<AppState>,
    tid: Tid,
    RequestLanguage(language): RequestLanguage,
    ValidatedPath(path): ValidatedPath<PetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .pets
        .delete(PetId::from_i64(path.id), tid.as_str())
        .await?;
    if !deleted {
        return Err(ApiError::not_found(Resource::Pet, path.id));
    }

    let message = state.i18n.translate(
        &language,
        "pet.message.deleted",
        &[("id".to_string(), path.id.to_string())],
    );
    Ok(Json(ApiResponse::new(MessageDto { message })))
}

/// PUT /v1/pets/{id}/tags/{tag_id}
///
/// 付与済みの組に対しては何もせず 200 を返す。
#[utoipa::path(
    put,
    path = "/v1/pets/{id}/tags/{tag_id}",
    tag = "pets",
    params(
        ("id" = i64, Path, description = "ペット ID"),
        ("tag_id" = i64, Path, description = "タグ ID")
    ),
    responses(
        (status = 200, description = "タグ付与", body = ApiResponse<MessageDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "ペットまたはタグが見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn attach_tag(
    State(state): State<AppState>,
    tid: Tid,
    RequestLanguage(language): RequestLanguage,
    ValidatedPath(path): ValidatedPath<PetTagPath>,
) -> Result<impl IntoResponse, ApiError> {
    let pet_id = PetId::from_i64(path.id);
    let tag_id = TagId::from_i64(path.tag_id);

    // ペットとタグの存在確認は互いに独立
    let (pet, tag) = tokio::try_join!(
        state.pets.find_by_id(pet_id, tid.as_str()),
        state.tags.find_by_id(tag_id, tid.as_str()),
    )?;
    if pet.is_none() {
        return Err(ApiError::not_found(Resource::Pet, path.id));
    }
    if tag.is_none() {
        return Err(ApiError::not_found(Resource::Tag, path.tag_id));
    }

    let created = state
        .tags
        .attach(PetTag::new(pet_id, tag_id), tid.as_str())
        .await?;
    let key = if created {
        "pet.message.tag_attached"
    } else {
        "pet.message.tag_already_attached"
    };

    let message = state.i18n.translate(&language, key, &link_params(&path));
    Ok(Json(ApiResponse::new(MessageDto { message })))
}

/// DELETE /v1/pets/{id}/tags/{tag_id}
#[utoipa::path(
    delete,
    path = "/v1/pets/{id}/tags/{tag_id}",
    tag = "pets",
    params(
        ("id" = i64, Path, description = "ペット ID"),
        ("tag_id" = i64, Path, description = "タグ ID")
    ),
    responses(
        (status = 200, description = "タグ解除", body = ApiResponse<MessageDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "タグが付与されていない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn detach_tag(
    State(state): State<AppState>,
    tid: Tid,
    RequestLanguage(language): RequestLanguage,
    ValidatedPath(path): ValidatedPath<PetTagPath>,
) -> Result<impl IntoResponse, ApiError> {
    let link = PetTag::new(PetId::from_i64(path.id), TagId::from_i64(path.tag_id));

    let removed = state.tags.detach(link, tid.as_str()).await?;
    if !removed {
        return Err(ApiError::not_found(Resource::PetTag, path.id));
    }

    let message = state
        .i18n
        .translate(&language, "pet.message.tag_detached", &link_params(&path));
    Ok(Json(ApiResponse::new(MessageDto { message })))
}

fn link_params(path: &PetTagPath) -> Vec<(String, String)> {
    vec![
        ("id".to_string(), path.id.to_string()),
        ("tag_id".to_string(), path.tag_id.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use petstore_infra::mock::MockStore;
    use petstore_shared::ErrorResponse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::handler::test_support::{empty_request, json_request, response_body, test_app};

    async fn create_pet(store: &MockStore, body: serde_json::Value) -> PetDto {
        let response = test_app(store)
            .oneshot(json_request("POST", "/v1/pets", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: ApiResponse<PetDto> = response_body(response).await;
        body.data
    }

    async fn create_tag(store: &MockStore, name: &str) -> TagDto {
        let response = test_app(store)
            .oneshot(json_request("POST", "/v1/tags", json!({ "name": name })))
            .await
            .unwrap();
        let body: ApiResponse<TagDto> = response_body(response).await;
        body.data
    }

    fn timestamp(value: &str) -> chrono::DateTime<chrono::FixedOffset> {
        chrono::DateTime::parse_from_rfc3339(value).unwrap()
    }

    async fn send(store: &MockStore, request: Request<Body>) -> axum::response::Response {
        test_app(store).oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_作成したペットを取得すると同じ値が返る() {
        // Given
        let store = MockStore::new();
        let created = create_pet(&store, json!({ "name": "Pochi", "status": "pending" })).await;

        // When
        let response = send(
            &store,
            empty_request("GET", &format!("/v1/pets/{}", created.id)),
        )
        .await;

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<PetDetailDto> = response_body(response).await;
        assert_eq!(body.data.pet, created);
        assert_eq!(body.data.pet.name, "Pochi");
        assert_eq!(body.data.pet.status, "pending");
        assert!(body.data.tags.is_empty());
        assert!(timestamp(&created.created_at) <= timestamp(&created.updated_at));
    }

    #[tokio::test]
    async fn test_statusを省略するとavailableで作成される() {
        let store = MockStore::new();

        let created = create_pet(&store, json!({ "name": "Tama" })).await;

        assert_eq!(created.status, "available");
    }

    #[tokio::test]
    async fn test_作成のたびに異なるoidが割り当てられる() {
        let store = MockStore::new();

        let first = create_pet(&store, json!({ "name": "Pochi" })).await;
        let second = create_pet(&store, json!({ "name": "Pochi" })).await;

        assert_ne!(first.oid, second.oid);
        assert_ne!(first.oid.to_string(), first.id.to_string());
    }

    #[rstest]
    #[case::名前が空(json!({ "name": "" }), "body.name")]
    #[case::名前が長すぎる(json!({ "name": "a".repeat(101) }), "body.name")]
    #[case::名前が空白のみ(json!({ "name": "   " }), "body.name")]
    #[case::不明なステータス(json!({ "name": "Pochi", "status": "lost" }), "body.status")]
    #[case::名前がない(json!({ "status": "sold" }), "body.name")]
    #[case::名前が文字列でない(json!({ "name": 7 }), "body.name")]
    #[tokio::test]
    async fn test_不正な作成リクエストは400になる(
        #[case] body: serde_json::Value,
        #[case] field: &str,
    ) {
        let store = MockStore::new();

        let response = send(&store, json_request("POST", "/v1/pets", body)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.code.as_deref(), Some("common.error.validation"));
        assert_eq!(body.invalid_params[0].field, field);
        assert!(!body.invalid_params[0].message.is_empty());
    }

    #[tokio::test]
    async fn test_再取得で行が見つからなければ500とフォールバックメッセージを返す() {
        // Given
        let store = MockStore::new();
        store.lose_inserts();

        // When
        let response = send(
            &store,
            json_request("POST", "/v1/pets", json!({ "name": "Pochi" })),
        )
        .await;

        // Then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.code.as_deref(), Some("common.main.error"));
        assert_eq!(
            body.detail,
            "An unexpected error occurred. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_存在しないペットは要求言語で404を返す() {
        let store = MockStore::new();
        let request = Request::builder()
            .uri("/v1/pets/999")
            .header("accept-language", "ko-KR,ko;q=0.9")
            .body(Body::empty())
            .unwrap();

        let response = send(&store, request).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.code.as_deref(), Some("pet.error.not_found"));
        assert!(body.detail.contains("999"));
        assert_ne!(body.detail, "Pet 999 was not found.");
    }

    #[tokio::test]
    async fn test_idが数値でなければ400になる() {
        let store = MockStore::new();

        let response = send(&store, empty_request("GET", "/v1/pets/abc")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.invalid_params[0].field, "path.id");
        assert_eq!(body.invalid_params[0].constraint, "type");
    }

    #[tokio::test]
    async fn test_一覧の不明なステータスは400になる() {
        let store = MockStore::new();

        let response = send(&store, empty_request("GET", "/v1/pets?status=lost")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.invalid_params[0].field, "query.status");
        assert_eq!(body.invalid_params[0].constraint, "enum");
    }

    #[tokio::test]
    async fn test_指定したフィールドだけ更新される() {
        let store = MockStore::new();
        let created = create_pet(&store, json!({ "name": "Pochi" })).await;

        let response = send(
            &store,
            json_request(
                "PUT",
                &format!("/v1/pets/{}", created.id),
                json!({ "status": "sold" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<PetDto> = response_body(response).await;
        assert_eq!(body.data.name, "Pochi");
        assert_eq!(body.data.status, "sold");
        assert_eq!(body.data.oid, created.oid);
        assert!(timestamp(&body.data.updated_at) >= timestamp(&created.updated_at));
    }

    #[tokio::test]
    async fn test_変更のない更新は400になる() {
        let store = MockStore::new();
        let created = create_pet(&store, json!({ "name": "Pochi" })).await;

        let response = send(
            &store,
            json_request("PUT", &format!("/v1/pets/{}", created.id), json!({})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.invalid_params[0].constraint, "empty_changes");
    }

    #[tokio::test]
    async fn test_タグとステータスで一覧を絞り込める() {
        // Given
        let store = MockStore::new();
        let pochi = create_pet(&store, json!({ "name": "Pochi" })).await;
        let tama = create_pet(&store, json!({ "name": "Tama", "status": "sold" })).await;
        let cute = create_tag(&store, "cute").await;
        for pet in [&pochi, &tama] {
            let uri = format!("/v1/pets/{}/tags/{}", pet.id, cute.id);
            send(&store, empty_request("PUT", &uri)).await;
        }

        // When
        let by_tag = send(&store, empty_request("GET", "/v1/pets?tags=cute")).await;
        let by_both = send(
            &store,
            empty_request("GET", "/v1/pets?tags=cute&tags=small&status=available"),
        )
        .await;

        // Then
        let by_tag: PaginatedResponse<PetDto> = response_body(by_tag).await;
        assert_eq!(by_tag.data, vec![pochi.clone(), tama]);
        assert_eq!(by_tag.next_cursor, None);
        let by_both: PaginatedResponse<PetDto> = response_body(by_both).await;
        assert_eq!(by_both.data, vec![pochi]);
    }

    #[tokio::test]
    async fn test_同じタグを二度付与しても関連は一つ() {
        // Given
        let store = MockStore::new();
        let pet = create_pet(&store, json!({ "name": "Pochi" })).await;
        let tag = create_tag(&store, "cute").await;
        let uri = format!("/v1/pets/{}/tags/{}", pet.id, tag.id);

        // When
        let first = send(&store, empty_request("PUT", &uri)).await;
        let second = send(&store, empty_request("PUT", &uri)).await;

        // Then
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        let second: ApiResponse<MessageDto> = response_body(second).await;
        assert_eq!(
            second.data.message,
            format!("Tag {} is already attached to pet {}.", tag.id, pet.id)
        );
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn test_存在しないタグの付与は404になる() {
        let store = MockStore::new();
        let pet = create_pet(&store, json!({ "name": "Pochi" })).await;

        let response = send(
            &store,
            empty_request("PUT", &format!("/v1/pets/{}/tags/999", pet.id)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.code.as_deref(), Some("tag.error.not_found"));
        assert_eq!(store.link_count(), 0);
    }

    #[tokio::test]
    async fn test_付与されていないタグの解除は404になる() {
        let store = MockStore::new();
        let pet = create_pet(&store, json!({ "name": "Pochi" })).await;
        let tag = create_tag(&store, "cute").await;
        let uri = format!("/v1/pets/{}/tags/{}", pet.id, tag.id);

        let before = send(&store, empty_request("DELETE", &uri)).await;
        send(&store, empty_request("PUT", &uri)).await;
        let after = send(&store, empty_request("DELETE", &uri)).await;

        assert_eq!(before.status(), StatusCode::NOT_FOUND);
        assert_eq!(after.status(), StatusCode::OK);
        assert_eq!(store.link_count(), 0);
    }

    #[tokio::test]
    async fn test_削除したペットは取得できない() {
        let store = MockStore::new();
        let pet = create_pet(&store, json!({ "name": "Pochi" })).await;
        let uri = format!("/v1/pets/{}", pet.id);

        let deleted = send(&store, empty_request("DELETE", &uri)).await;
        let fetched = send(&store, empty_request("GET", &uri)).await;

        assert_eq!(deleted.status(), StatusCode::OK);
        let body: ApiResponse<MessageDto> = response_body(deleted).await;
        assert_eq!(body.data.message, format!("Pet {} was deleted.", pet.id));
        assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
    }
}
