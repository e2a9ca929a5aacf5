//! # OpenAPI 仕様定義
//!
//! utoipa を使用して OpenAPI 仕様を Rust の型から自動生成する。
//! ハンドラが実際に返す型をそのまま参照するため、ドキュメントとレスポンスはずれない。

use std::{io, path::Path};

use axum::Json;
use utoipa::OpenApi;

use crate::handler::{article, health, pet, tag};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Petstore API",
        version = "0.1.0",
        description = "ペット・タグ・記事を管理する API"
    ),
    paths(
        // health
        health::health_check,
        health::readiness_check,
        // pets
        pet::create_pet,
        pet::list_pets,
        pet::get_pet,
        pet::update_pet,
        pet::delete_pet,
        pet::attach_tag,
        pet::detach_tag,
        // tags
        tag::create_tag,
        tag::list_tags,
        tag::get_tag,
        tag::delete_tag,
        // articles
        article::create_article,
        article::list_articles,
        article::get_article,
        article::update_article,
        article::delete_article,
    ),
    components(schemas(
        petstore_shared::ErrorResponse,
        petstore_shared::InvalidParam,
    )),
    tags(
        (name = "health", description = "ヘルスチェック"),
        (name = "pets", description = "ペット管理"),
        (name = "tags", description = "タグ管理"),
        (name = "articles", description = "記事管理"),
    )
)]
pub struct ApiDoc;

/// GET /openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// OpenAPI ドキュメントを JSON でファイルに書き出す
pub fn write_schema(path: &Path) -> io::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(io::Error::other)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_全エンドポイントがドキュメントに含まれる() {
        let doc = ApiDoc::openapi();

        let mut paths: Vec<_> = doc.paths.paths.keys().map(String::as_str).collect();
        paths.sort_unstable();

        assert_eq!(
            paths,
            vec![
                "/health",
                "/health/ready",
                "/v1/articles",
                "/v1/articles/{id}",
                "/v1/pets",
                "/v1/pets/{id}",
                "/v1/pets/{id}/tags/{tag_id}",
                "/v1/tags",
                "/v1/tags/{id}",
            ]
        );
    }

    #[test]
    fn test_スキーマをファイルに書き出せる() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi/openapi.json");

        write_schema(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["info"]["title"], "Petstore API");
        assert!(written["components"]["schemas"]["ErrorResponse"].is_object());
    }
}
