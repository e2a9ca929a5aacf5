//! # リクエスト追跡用の Correlation ID
//!
//! リクエスト単位でログとクエリを紐付けるための識別子（`tid`）。
//! リポジトリ操作はすべてこの ID を受け取り、トレーシングスパンに記録する。
//!
//! ## 設計判断
//!
//! - **Newtype パターン**: `String` をラップし、他の文字列との取り違えを防ぐ
//! - **UUID v7 採用**: タイムスタンプを含むため時系列でソート可能
//! - **文字列表現**: `x-request-id` ヘッダや `?tid=` クエリから受け取った値をそのまま保持する

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 外部から受け取る ID の最大長
const MAX_EXTERNAL_LENGTH: usize = 128;

/// リクエスト追跡用の一意識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// 新しい Correlation ID を生成する（UUID v7）
    ///
    /// ```rust
    /// use petstore_shared::CorrelationId;
    ///
    /// let id = CorrelationId::new();
    /// assert!(!id.as_str().is_empty());
    /// ```
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// 外部から受け取った値で Correlation ID を作成する
    ///
    /// 空文字列、128 文字超、制御文字を含む値はログを汚すため受け付けず `None` を返す。
    pub fn from_external(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty()
            || value.chars().count() > MAX_EXTERNAL_LENGTH
            || value.chars().any(char::is_control)
        {
            return None;
        }
        Some(Self(value.to_string()))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
