//! PetRepository / TagRepository 統合テスト
//!
//! PostgreSQL が必要なため既定では無視される。
//!
//! 実行方法:
//! ```bash
//! cargo test -p petstore-infra --test pet_tag_repository_test -- --ignored
//! ```

mod common;

use common::{TID, database, new_pet, new_tag};
use petstore_domain::{
    pet::{PetChanges, PetFilter, PetStatus},
    tag::{PetTag, TagName},
};
use petstore_infra::{
    InfraErrorKind,
    repository::{PetRepository, PostgresPetRepository, PostgresTagRepository, TagRepository},
};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_同じ組の関連付けは一行だけ作られる(pool: PgPool) {
    let db = database(pool.clone());
    let pets = PostgresPetRepository::new(db.clone());
    let tags = PostgresTagRepository::new(db);
    let pet = pets.create(&new_pet("Pochi", PetStatus::Available), TID).await.unwrap();
    let tag = tags.create(&new_tag("cute"), TID).await.unwrap();
    let link = PetTag::new(pet.id(), tag.id());

    assert!(tags.attach(link, TID).await.unwrap());
    assert!(!tags.attach(link, TID).await.unwrap());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pet_tags")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(tags.find_by_pet(pet.id(), TID).await.unwrap(), vec![tag]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_タグ名の重複はconflictになる(pool: PgPool) {
    let tags = PostgresTagRepository::new(database(pool));
    tags.create(&new_tag("cute"), TID).await.unwrap();

    let err = tags.create(&new_tag("cute"), TID).await.unwrap_err();

    assert!(matches!(err.kind(), InfraErrorKind::Conflict { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_タグとステータスでペットを絞り込む(pool: PgPool) {
    let db = database(pool);
    let pets = PostgresPetRepository::new(db.clone());
    let tags = PostgresTagRepository::new(db);
    let pochi = pets.create(&new_pet("Pochi", PetStatus::Available), TID).await.unwrap();
    let tama = pets.create(&new_pet("Tama", PetStatus::Sold), TID).await.unwrap();
    pets.create(&new_pet("Hachi", PetStatus::Available), TID).await.unwrap();
    let cute = tags.create(&new_tag("cute"), TID).await.unwrap();
    let small = tags.create(&new_tag("small"), TID).await.unwrap();
    tags.attach(PetTag::new(pochi.id(), cute.id()), TID).await.unwrap();
    tags.attach(PetTag::new(pochi.id(), small.id()), TID).await.unwrap();
    tags.attach(PetTag::new(tama.id(), small.id()), TID).await.unwrap();

    let by_tags = PetFilter {
        tags: vec![TagName::new("cute").unwrap(), TagName::new("small").unwrap()],
        ..Default::default()
    };
    let found = pets.list(&by_tags, TID).await.unwrap();
    assert_eq!(found, vec![pochi.clone(), tama]);

    let by_both = PetFilter {
        status: Some(PetStatus::Available),
        ..by_tags
    };
    assert_eq!(pets.list(&by_both, TID).await.unwrap(), vec![pochi]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_ペット削除で関連も削除される(pool: PgPool) {
    let db = database(pool);
    let pets = PostgresPetRepository::new(db.clone());
    let tags = PostgresTagRepository::new(db);
    let pet = pets.create(&new_pet("Pochi", PetStatus::Available), TID).await.unwrap();
    let tag = tags.create(&new_tag("cute"), TID).await.unwrap();
    tags.attach(PetTag::new(pet.id(), tag.id()), TID).await.unwrap();

    assert!(pets.delete(pet.id(), TID).await.unwrap());

    assert!(!tags.detach(PetTag::new(pet.id(), tag.id()), TID).await.unwrap());
    assert!(tags.find_by_id(tag.id(), TID).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_ペットのステータスを更新できる(pool: PgPool) {
    let pets = PostgresPetRepository::new(database(pool));
    let pet = pets.create(&new_pet("Pochi", PetStatus::Available), TID).await.unwrap();

    let changes = PetChanges {
        status: Some(PetStatus::Pending),
        ..Default::default()
    };
    let updated = pets.update(pet.id(), &changes, TID).await.unwrap().unwrap();

    assert_eq!(updated.status(), PetStatus::Pending);
    assert_eq!(updated.name(), pet.name());
    assert!(updated.updated_at() >= pet.updated_at());
}
