//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use petstore_domain::{
    article::{ArticleBody, ArticleTitle, NewArticle},
    pet::{NewPet, PetName, PetStatus},
    tag::{NewTag, TagName},
};
use petstore_infra::db::Database;
use sqlx::PgPool;

/// テスト用のトランザクション ID
pub const TID: &str = "test-tid";

/// sqlx::test が用意したプールから Database を作る（レプリカなし）
pub fn database(pool: PgPool) -> Database {
    Database::new(pool, None)
}

pub fn new_pet(name: &str, status: PetStatus) -> NewPet {
    NewPet {
        name: PetName::new(name).unwrap(),
        status,
    }
}

pub fn new_tag(name: &str) -> NewTag {
    NewTag {
        name: TagName::new(name).unwrap(),
    }
}

pub fn new_article(title: &str, body: &str) -> NewArticle {
    NewArticle {
        title: ArticleTitle::new(title).unwrap(),
        body:  ArticleBody::new(body).unwrap(),
    }
}
