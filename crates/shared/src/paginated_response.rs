//! # ページネーション付きレスポンス
//!
//! キーセット（カーソル）ページネーションに対応した API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページネーション付きレスポンス
///
/// `ApiResponse<T>` が単一データ用であるのに対し、
/// `PaginatedResponse<T>` はリスト + カーソルのページネーション形式。
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "nextCursor": "42"
/// }
/// ```
///
/// `nextCursor` が `null` の場合は最後のページを意味する。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginatedResponse<T> {
    pub data:        Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// 取得件数と上限から次ページのカーソルを決める
    ///
    /// 取得件数が `limit` に達した場合のみ、最後の要素のキーをカーソルとして返す。
    /// `limit` 未満なら最後のページとみなし `None` にする。
    pub fn from_page(data: Vec<T>, limit: usize, cursor_of: impl Fn(&T) -> String) -> Self {
        let next_cursor = if limit > 0 && data.len() >= limit {
            data.last().map(cursor_of)
        } else {
            None
        };
        Self { data, next_cursor }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_limitに達したとき最後の要素がカーソルになる() {
        let page = PaginatedResponse::from_page(vec![1, 2, 3], 3, |n| n.to_string());

        assert_eq!(page.next_cursor, Some("3".to_string()));
    }

    #[test]
    fn test_limit未満なら最後のページ() {
        let page = PaginatedResponse::from_page(vec![1, 2], 3, |n| n.to_string());

        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_camel_caseでシリアライズされる() {
        let page = PaginatedResponse::from_page(vec!["a"], 1, |s| s.to_string());
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "data": ["a"], "nextCursor": "a" })
        );
    }
}
