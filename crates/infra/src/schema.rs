//! # エンティティとテーブルの対応表
//!
//! ドメインのエンティティ型には DB の知識を持たせず、テーブル名・別名・カラム・
//! 主キー・サーバー生成カラムの対応をこのモジュールの静的な表で管理する。
//!
//! クエリビルダー（[`crate::query`]）が参照できる識別子はこの表にあるものだけで、
//! それ以外のカラム名は拒否される。

/// エンティティとテーブルの対応
#[derive(Debug, PartialEq, Eq)]
pub struct EntityMapping {
    /// エンティティ名（エラーメッセージ・ログ用）
    pub entity:      &'static str,
    /// テーブル名
    pub table:       &'static str,
    /// SELECT で使うテーブル別名
    pub alias:       &'static str,
    /// 全カラム（SELECT の列順）
    pub columns:     &'static [&'static str],
    /// 主キー（結合エンティティは複合キー）
    pub primary_key: &'static [&'static str],
    /// サーバー側で値が決まるカラム（INSERT / SET の対象外）
    pub generated:   &'static [&'static str],
    /// 作成後に変更できないカラム（SET の対象外）
    pub immutable:   &'static [&'static str],
}

impl EntityMapping {
    /// カラムが存在するか
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    /// アプリケーションから値を書き込めるカラムか
    pub fn is_writable(&self, column: &str) -> bool {
        self.has_column(column) && !self.generated.contains(&column)
    }

    /// UPDATE で値を変更できるカラムか
    pub fn is_updatable(&self, column: &str) -> bool {
        self.is_writable(column)
            && !self.is_primary_key(column)
            && !self.immutable.contains(&column)
    }

    /// 主キーを構成するカラムか
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.contains(&column)
    }
}

/// ペット
pub static PETS: EntityMapping = EntityMapping {
    entity:      "Pet",
    table:       "pets",
    alias:       "pet",
    columns:     &["id", "oid", "name", "status", "created_at", "updated_at"],
    primary_key: &["id"],
    generated:   &["id", "created_at", "updated_at"],
    immutable:   &["oid"],
};

/// タグ
pub static TAGS: EntityMapping = EntityMapping {
    entity:      "Tag",
    table:       "tags",
    alias:       "tag",
    columns:     &["id", "name", "created_at"],
    primary_key: &["id"],
    generated:   &["id", "created_at"],
    immutable:   &[],
};

/// ペットとタグの関連（複合主キー、サロゲートキーなし）
pub static PET_TAGS: EntityMapping = EntityMapping {
    entity:      "PetTag",
    table:       "pet_tags",
    alias:       "pt",
    columns:     &["pet_id", "tag_id"],
    primary_key: &["pet_id", "tag_id"],
    generated:   &[],
    immutable:   &[],
};

/// 記事
pub static ARTICLES: EntityMapping = EntityMapping {
    entity:      "Article",
    table:       "articles",
    alias:       "article",
    columns:     &["id", "oid", "title", "body", "created_at", "updated_at"],
    primary_key: &["id"],
    generated:   &["id", "created_at", "updated_at"],
    immutable:   &["oid"],
};
