//! # Petstore インフラ層
//!
//! PostgreSQL への永続化を担当する。
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール、データソース（マスター / レプリカ）、トランザクション
//! - [`schema`] - エンティティとテーブルの対応表
//! - [`query`] - 対応表からパラメータ化クエリを組み立てるビルダー
//! - [`repository`] - エンティティごとのリポジトリ
//! - [`error`] - インフラ層エラー
//! - `mock` - テスト用インメモリリポジトリ（`test-utils` feature）

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod query;
pub mod repository;
pub mod schema;

pub use error::{InfraError, InfraErrorKind};
