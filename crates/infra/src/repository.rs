//! # リポジトリ実装
//!
//! エンティティごとのリポジトリトレイトと PostgreSQL 実装を提供する。
//!
//! ## 共通の流れ
//!
//! 1. 操作に応じたデータソースでトランザクションを開始する（書き込みはマスター）
//! 2. [`crate::query`] のビルダーでパラメータ化クエリを組み立てる
//! 3. 行をエンティティに変換する
//! 4. コミットして返す
//!
//! 作成系の操作は挿入後に `oid` で再取得した行を返す。
//! 再取得で行が見つからない場合は [`InfraError::not_found`] を返し、
//! 呼び出し元の入力値をそのまま返すことはない。

pub mod article_repository;
pub mod pet_repository;
pub mod tag_repository;

pub use article_repository::{ArticleRepository, PostgresArticleRepository};
pub use pet_repository::{PetRepository, PostgresPetRepository};
pub use tag_repository::{PostgresTagRepository, TagRepository};

use crate::error::InfraError;

/// 挿入直後の再取得結果を検証する
///
/// 行がなければストレージの不整合として `NotFound` を返す。
pub fn require_inserted<T>(
    row: Option<T>,
    entity: &str,
    oid: impl std::fmt::Display,
) -> Result<T, InfraError> {
    row.ok_or_else(|| InfraError::not_found(entity, oid.to_string()))
}
