//! # タグ
//!
//! ペットに付与するタグと、ペットとタグの関連（PetTag）を定義する。
//!
//! タグ名はシステム全体で一意。ペットとの関連は多対多で、
//! `(pet_id, tag_id)` の組が複合主キーになる。

use chrono::{DateTime, Utc};

use crate::pet::PetId;

define_serial_id! {
    /// タグ ID（DB 採番の主キー）
    pub struct TagId;
}

define_validated_string! {
    /// タグ名（値オブジェクト）
    ///
    /// 1〜50 文字。前後の空白はトリミングされる。
    pub struct TagName {
        label: "タグ名",
        max_length: 50,
    }
}

/// タグエンティティ
///
/// # 不変条件
///
/// - `name` はシステム全体で一意
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    id:         TagId,
    name:       TagName,
    created_at: DateTime<Utc>,
}

impl Tag {
    /// データベースからタグを復元する
    pub fn from_db(id: TagId, name: TagName, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn name(&self) -> &TagName {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// タグ作成コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: TagName,
}

/// ペットとタグの関連（結合エンティティ）
///
/// サロゲートキーを持たず、`(pet_id, tag_id)` が複合主キーになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PetTag {
    pub pet_id: PetId,
    pub tag_id: TagId,
}

impl PetTag {
    pub fn new(pet_id: PetId, tag_id: TagId) -> Self {
        Self { pet_id, tag_id }
    }
}
