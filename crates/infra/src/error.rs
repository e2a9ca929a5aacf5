//! # インフラ層エラー定義
//!
//! データベースとの通信で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Database, NotFound, Conflict 等）
//!
//! `From` 実装や convenience constructor でエラーを生成すると、
//! その時点のスパン情報（リポジトリ名、`tid` など）が自動的に記録される。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する:
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::Conflict { entity, key } => { /* 409 */ }
///     _ => { /* 500 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// SQL クエリの実行失敗、接続エラー、制約違反など。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 挿入直後の再取得で行が見つからない
    ///
    /// ストレージの不整合を表す。クライアント起因の 404 ではなく 500 として扱う。
    #[error("{entity} が見つかりません: {key}")]
    NotFound {
        /// エンティティ名（例: "Article"）
        entity: String,
        /// 検索キー（oid など）
        key:    String,
    },

    /// 一意制約違反
    #[error("競合が発生しました: {entity}({key})")]
    Conflict {
        /// エンティティ名（例: "Tag"）
        entity: String,
        /// 競合したキー
        key:    String,
    },

    /// クエリビルダへの不正な入力
    ///
    /// マッピングにないカラムの参照、WHERE 句のない更新・削除など。
    /// SQL を発行する前に検出される。
    #[error("入力エラー: {0}")]
    InvalidInput(String),

    /// 予期しないエラー
    ///
    /// DB の値がドメインの制約に違反している場合や、応答のタイムアウトなど。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Conflict バリアントの場合、entity と key を返す
    pub fn as_conflict(&self) -> Option<(&str, &str)> {
        match &self.kind {
            InfraErrorKind::Conflict { entity, key } => Some((entity, key)),
            _ => None,
        }
    }

    // ===== Convenience constructors =====

    fn with_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    /// 再取得失敗（行が見つからない）エラーを生成する
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::NotFound {
            entity: entity.into(),
            key:    key.into(),
        })
    }

    /// 一意制約違反エラーを生成する
    pub fn conflict(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Conflict {
            entity: entity.into(),
            key:    key.into(),
        })
    }

    /// クエリビルダの入力エラーを生成する
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::InvalidInput(msg.into()))
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(msg.into()))
    }

    /// sqlx エラーを変換し、一意制約違反なら Conflict にする
    pub fn from_unique_violation(
        source: sqlx::Error,
        entity: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let is_unique = source
            .as_database_error()
            .is_some_and(|e| e.is_unique_violation());
        if is_unique {
            Self::conflict(entity, key)
        } else {
            source.into()
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::with_kind(InfraErrorKind::Database(source))
    }
}

impl From<petstore_domain::DomainError> for InfraError {
    fn from(source: petstore_domain::DomainError) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(format!(
            "DB の値がドメインの制約に違反しています: {source}"
        )))
    }
}
