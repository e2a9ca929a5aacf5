//! # Petstore ドメイン層
//!
//! ペット・タグ・記事のドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB）に一切依存しない。
//! テーブル名やカラムとの対応は `petstore-infra` の `schema` モジュールが持つ。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`pet`] - ペットエンティティと絞り込み条件
//! - [`tag`] - タグエンティティとペットとの関連
//! - [`article`] - 記事エンティティ
//! - [`pagination`] - キーセットページネーション条件

#[macro_use]
mod macros;

pub mod article;
pub mod error;
pub mod pagination;
pub mod pet;
pub mod tag;

pub use error::DomainError;
