//! # 記事 API ハンドラ
//!
//! 作成結果はリポジトリが挿入後に `oid` で再取得した行であり、
//! リクエストの値をそのまま返すことはない。

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use petstore_domain::{
    article::{Article, ArticleBody, ArticleChanges, ArticleId, ArticleTitle, NewArticle},
    pagination::PageRequest,
};
use petstore_shared::{ApiResponse, ErrorResponse, PaginatedResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{MessageDto, invalid, page_limit};
use crate::{
    error::{ApiError, FieldViolation, Resource},
    extract::{Tid, ValidatedJson, ValidatedPath, ValidatedQuery},
    i18n::RequestLanguage,
    state::AppState,
};

/// 記事作成リクエスト
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub body:  String,
}

/// 記事更新リクエスト（省略したフィールドは変更しない）
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub body:  Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListArticlesQuery {
    /// 取得件数（既定 20、最大 100）
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// 前ページ最後の記事 ID
    #[validate(range(min = 0))]
    pub after: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ArticlePath {
    #[validate(range(min = 1))]
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub id:         i64,
    pub oid:        Uuid,
    pub title:      String,
    pub body:       String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Article> for ArticleDto {
    fn from(article: &Article) -> Self {
        Self {
            id:         article.id().as_i64(),
            oid:        *article.oid().as_uuid(),
            title:      article.title().as_str().to_string(),
            body:       article.body().as_str().to_string(),
            created_at: article.created_at().to_rfc3339(),
            updated_at: article.updated_at().to_rfc3339(),
        }
    }
}

/// POST /v1/articles
#[utoipa::path(
    post,
    path = "/v1/articles",
    tag = "articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "記事作成", body = ApiResponse<ArticleDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn create_article(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedJson(req): ValidatedJson<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_article = NewArticle {
        title: ArticleTitle::new(req.title).map_err(invalid("body.title"))?,
        body:  ArticleBody::new(req.body).map_err(invalid("body.body"))?,
    };

    let article = state.articles.create(&new_article, tid.as_str()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ArticleDto::from(&article))),
    ))
}

/// GET /v1/articles
#[utoipa::path(
    get,
    path = "/v1/articles",
    tag = "articles",
    params(ListArticlesQuery),
    responses(
        (status = 200, description = "記事一覧", body = PaginatedResponse<ArticleDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn list_articles(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedQuery(query): ValidatedQuery<ListArticlesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(query.limit, query.after).map_err(invalid("query"))?;

    let articles = state.articles.list(page, tid.as_str()).await?;
    let data: Vec<ArticleDto> = articles.iter().map(ArticleDto::from).collect();

    Ok(Json(PaginatedResponse::from_page(
        data,
        page_limit(page.limit()),
        |article| article.id.to_string(),
    )))
}

/// GET /v1/articles/{id}
#[utoipa::path(
    get,
    path = "/v1/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "記事 ID")),
    responses(
        (status = 200, description = "記事詳細", body = ApiResponse<ArticleDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "記事が見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn get_article(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedPath(path): ValidatedPath<ArticlePath>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .articles
        .find_by_id(ArticleId::from_i64(path.id), tid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Article, path.id))?;

    Ok(Json(ApiResponse::new(ArticleDto::from(&article))))
}

/// PUT /v1/articles/{id}
#[utoipa::path(
    put,
    path = "/v1/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "記事 ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "更新後の記事", body = ApiResponse<ArticleDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "記事が見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn update_article(
    State(state): State<AppState>,
    tid: Tid,
    ValidatedPath(path): ValidatedPath<ArticlePath>,
    ValidatedJson(req): ValidatedJson<UpdateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let changes = ArticleChanges {
        title: req
            .title
            .map(ArticleTitle::new)
            .transpose()
            .map_err(invalid("body.title"))?,
        body:  req
            .body
            .map(ArticleBody::new)
            .transpose()
            .map_err(invalid("body.body"))?,
    };
    if changes.is_empty() {
        return Err(ApiError::Validation(vec![FieldViolation::new(
            "body",
            "empty_changes",
        )]));
    }

    let article = state
        .articles
        .update(ArticleId::from_i64(path.id), &changes, tid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Article, path.id))?;

    Ok(Json(ApiResponse::new(ArticleDto::from(&article))))
}

/// DELETE /v1/articles/{id}
#[utoipa::path(
    delete,
    path = "/v1/articles/{id}",
    tag = "articles",
    params(("id" = i64, Path, description = "記事 ID")),
    responses(
        (status = 200, description = "削除完了", body = ApiResponse<MessageDto>),
        (status = 400, description = "不正なリクエスト", body = ErrorResponse),
        (status = 404, description = "記事が見つからない", body = ErrorResponse),
        (status = 500, description = "内部エラー", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tid = %tid.as_str()))]
pub async fn delete_article(
    State(state): State<AppState>,
    tid: Tid,
    RequestLanguage(language): RequestLanguage,
    ValidatedPath(path): ValidatedPath<ArticlePath>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .articles
        .delete(ArticleId::from_i64(path.id), tid.as_str())
        .await?;
    if !deleted {
        return Err(ApiError::not_found(Resource::Article, path.id));
    }

    let message = state.i18n.translate(
        &language,
        "article.message.deleted",
        &[("id".to_string(), path.id.to_string())],
    );
    Ok(Json(ApiResponse::new(MessageDto { message })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use petstore_infra::mock::MockStore;
    use petstore_shared::ErrorResponse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::handler::test_support::{empty_request, json_request, response_body, test_app};

    #[tokio::test]
    async fn test_作成した記事は採番されたidとoidを持つ() {
        // Given
        let store = MockStore::new();

        // When
        let response = test_app(&store)
            .oneshot(json_request(
                "POST",
                "/v1/articles",
                json!({ "title": "A", "body": "B" }),
            ))
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: serde_json::Value = response_body(response).await;
        let data = &body["data"];
        assert!(data["id"].as_i64().is_some());
        let oid = data["oid"].as_str().unwrap();
        assert!(!oid.is_empty());
        assert_ne!(oid, data["id"].to_string());
        assert_eq!(data["title"], "A");
        assert_eq!(data["body"], "B");
        assert!(data["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_作成して取得すると同じ記事が返る() {
        let store = MockStore::new();
        let created = test_app(&store)
            .oneshot(json_request(
                "POST",
                "/v1/articles",
                json!({ "title": "Hello", "body": "World" }),
            ))
            .await
            .unwrap();
        let created: ApiResponse<ArticleDto> = response_body(created).await;

        let response = test_app(&store)
            .oneshot(empty_request(
                "GET",
                &format!("/v1/articles/{}", created.data.id),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let fetched: ApiResponse<ArticleDto> = response_body(response).await;
        assert_eq!(fetched.data, created.data);
    }

    #[tokio::test]
    async fn test_再取得で行が見つからなければ入力値を返さず500になる() {
        let store = MockStore::new();
        store.lose_inserts();

        let response = test_app(&store)
            .oneshot(json_request(
                "POST",
                "/v1/articles",
                json!({ "title": "A", "body": "B" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response_body(response).await;
        assert!(body.get("data").is_none());
        assert_eq!(body["code"], "common.main.error");
    }

    #[tokio::test]
    async fn test_タイトルが長すぎると400になる() {
        let store = MockStore::new();

        let response = test_app(&store)
            .oneshot(json_request(
                "POST",
                "/v1/articles",
                json!({ "title": "t".repeat(201), "body": "B" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.invalid_params.len(), 1);
        assert_eq!(body.invalid_params[0].field, "body.title");
        assert_eq!(body.invalid_params[0].constraint, "length");
    }

    #[rstest]
    #[case::本文がない(json!({ "title": "A" }), "body.body", "required")]
    #[case::タイトルが数値(json!({ "title": 5, "body": "B" }), "body.title", "type")]
    #[tokio::test]
    async fn test_読み取れないフィールドは位置付きで400になる(
        #[case] request: serde_json::Value,
        #[case] field: &str,
        #[case] constraint: &str,
    ) {
        let store = MockStore::new();

        let response = test_app(&store)
            .oneshot(json_request("POST", "/v1/articles", request))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.invalid_params.len(), 1);
        assert_eq!(body.invalid_params[0].field, field);
        assert_eq!(body.invalid_params[0].constraint, constraint);
        assert_ne!(body.invalid_params[0].message, format!("validation.{constraint}"));
    }

    #[tokio::test]
    async fn test_存在しない記事の更新は404になる() {
        let store = MockStore::new();

        let response = test_app(&store)
            .oneshot(json_request(
                "PUT",
                "/v1/articles/42",
                json!({ "title": "New" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = response_body(response).await;
        assert_eq!(body.detail, "Article 42 was not found.");
    }

    #[tokio::test]
    async fn test_本文だけを更新できる() {
        let store = MockStore::new();
        let created = test_app(&store)
            .oneshot(json_request(
                "POST",
                "/v1/articles",
                json!({ "title": "A", "body": "B" }),
            ))
            .await
            .unwrap();
        let created: ApiResponse<ArticleDto> = response_body(created).await;

        let response = test_app(&store)
            .oneshot(json_request(
                "PUT",
                &format!("/v1/articles/{}", created.data.id),
                json!({ "body": "C" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let updated: ApiResponse<ArticleDto> = response_body(response).await;
        assert_eq!(updated.data.title, "A");
        assert_eq!(updated.data.body, "C");
        assert_eq!(updated.data.oid, created.data.oid);
    }

    #[tokio::test]
    async fn test_一覧はafterより後の記事を返す() {
        let store = MockStore::new();
        let mut ids = Vec::new();
        for title in ["one", "two", "three"] {
            let response = test_app(&store)
                .oneshot(json_request(
                    "POST",
                    "/v1/articles",
                    json!({ "title": title, "body": "x" }),
                ))
                .await
                .unwrap();
            let created: ApiResponse<ArticleDto> = response_body(response).await;
            ids.push(created.data.id);
        }

        let response = test_app(&store)
            .oneshot(empty_request(
                "GET",
                &format!("/v1/articles?after={}&limit=5", ids[0]),
            ))
            .await
            .unwrap();

        let page: PaginatedResponse<ArticleDto> = response_body(response).await;
        let titles: Vec<_> = page.data.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["two", "three"]);
        assert_eq!(page.next_cursor, None);
    }
}
