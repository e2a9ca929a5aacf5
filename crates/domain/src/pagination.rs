//! # ページネーション
//!
//! 一覧取得で使うキーセットページネーションの条件。
//! `after` に前ページ最後の `id` を渡し、それより大きい `id` を `limit` 件取得する。

use crate::DomainError;

/// 1 ページの既定件数
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// 1 ページの最大件数
pub const MAX_PAGE_LIMIT: i64 = 100;

/// キーセットページネーション条件（値オブジェクト）
///
/// # 不変条件
///
/// - `limit` は 1 以上 [`MAX_PAGE_LIMIT`] 以下
/// - `after` は 0 以上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: i64,
    after: Option<i64>,
}

impl PageRequest {
    /// ページ条件を作成する
    ///
    /// `limit` 未指定時は [`DEFAULT_PAGE_LIMIT`] を使う。
    pub fn new(limit: Option<i64>, after: Option<i64>) -> Result<Self, DomainError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(DomainError::Validation(format!(
                "limit は 1 以上 {MAX_PAGE_LIMIT} 以下である必要があります"
            )));
        }
        if after.is_some_and(|a| a < 0) {
            return Err(DomainError::Validation(
                "after は 0 以上である必要があります".to_string(),
            ));
        }
        Ok(Self { limit, after })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn after(&self) -> Option<i64> {
        self.after
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            after: None,
        }
    }
}
