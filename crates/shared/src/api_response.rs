//! # 単一リソースのレスポンス
//!
//! 作成・取得・更新・削除の結果を `{ "data": ... }` で包む。
//! 一覧は [`PaginatedResponse`](crate::PaginatedResponse)、エラーは
//! [`ErrorResponse`](crate::ErrorResponse) を使い、`data` キーは持たない。

use serde::{Deserialize, Serialize};

/// `{ "data": T }` 形式のレスポンス
///
/// ```
/// use petstore_shared::ApiResponse;
///
/// let body = serde_json::to_value(ApiResponse::new(serde_json::json!({ "id": 1 }))).unwrap();
/// assert_eq!(body["data"]["id"], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Message {
        message: String,
    }

    #[test]
    fn test_データはdataキーの下に入る() {
        let response = ApiResponse::new(Message {
            message: "Pet 1 was deleted.".to_string(),
        });

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, json!({ "data": { "message": "Pet 1 was deleted." } }));
    }

    #[test]
    fn test_クライアント側でも同じ型で読み戻せる() {
        let body = r#"{"data":{"message":"ok"}}"#;

        let response: ApiResponse<Message> = serde_json::from_str(body).unwrap();

        assert_eq!(response.data.message, "ok");
    }
}
