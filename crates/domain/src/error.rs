//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成時に検出する制約違反を表現する。
//! 存在しないリソースや一意制約の違反は、それぞれ API 層とインフラ層で扱う。
//!
//! ```rust
//! use petstore_domain::DomainError;
//!
//! fn parse_limit(raw: i64) -> Result<i64, DomainError> {
//!     if raw < 1 {
//!         return Err(DomainError::Validation(format!("limit は 1 以上: {raw}")));
//!     }
//!     Ok(raw)
//! }
//!
//! assert!(parse_limit(0).is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// # 例
    ///
    /// - 文字数制限の超過
    /// - 空白だけの名前
    /// - 不正な列挙値
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
