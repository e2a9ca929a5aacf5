//! # 記事
//!
//! 記事エンティティを定義する。
//!
//! 記事は作成時に主キーとは独立した `oid` を割り当てられる。
//! 作成結果は挿入後に `oid` で再取得した行であり、呼び出し元の入力値ではない。

use chrono::{DateTime, Utc};

define_serial_id! {
    /// 記事 ID（DB 採番の主キー）
    pub struct ArticleId;
}

define_oid! {
    /// 記事の外部公開用識別子
    pub struct ArticleOid;
}

define_validated_string! {
    /// 記事タイトル（1〜200 文字）
    pub struct ArticleTitle {
        label: "タイトル",
        max_length: 200,
    }
}

define_validated_string! {
    /// 記事本文（1〜10000 文字）
    pub struct ArticleBody {
        label: "本文",
        max_length: 10_000,
    }
}

/// 記事エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    id:         ArticleId,
    oid:        ArticleOid,
    title:      ArticleTitle,
    body:       ArticleBody,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Article {
    /// データベースから記事を復元する
    pub fn from_db(
        id: ArticleId,
        oid: ArticleOid,
        title: ArticleTitle,
        body: ArticleBody,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            oid,
            title,
            body,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ArticleId {
        self.id
    }

    pub fn oid(&self) -> ArticleOid {
        self.oid
    }

    pub fn title(&self) -> &ArticleTitle {
        &self.title
    }

    pub fn body(&self) -> &ArticleBody {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 記事作成コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: ArticleTitle,
    pub body:  ArticleBody,
}

/// 記事更新コマンド（`None` は変更なし）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleChanges {
    pub title: Option<ArticleTitle>,
    pub body:  Option<ArticleBody>,
}

impl ArticleChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}
