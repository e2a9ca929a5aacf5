//! # ペット
//!
//! ペットエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## 識別子
//!
//! - [`PetId`]: DB が採番する主キー
//! - [`PetOid`]: 作成時にアプリケーションが生成する外部公開用識別子（UUID v7）
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use petstore_domain::pet::{Pet, PetId, PetName, PetOid, PetStatus};
//!
//! let now = chrono::Utc::now();
//! let pet = Pet::from_db(
//!     PetId::from_i64(1),
//!     PetOid::new(),
//!     PetName::new("Pochi")?,
//!     "available".parse::<PetStatus>()?,
//!     now,
//!     now,
//! );
//!
//! assert!(pet.is_available());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, pagination::PageRequest, tag::TagName};

define_serial_id! {
    /// ペット ID（DB 採番の主キー）
    pub struct PetId;
}

define_oid! {
    /// ペットの外部公開用識別子
    pub struct PetOid;
}

define_validated_string! {
    /// ペット名（値オブジェクト）
    ///
    /// 1〜100 文字。前後の空白はトリミングされる。
    pub struct PetName {
        label: "ペット名",
        max_length: 100,
    }
}

/// ペットの販売状況
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PetStatus {
    /// 販売可能
    #[default]
    Available,
    /// 商談中
    Pending,
    /// 販売済み
    Sold,
}

impl std::str::FromStr for PetStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "pending" => Ok(Self::Pending),
            "sold" => Ok(Self::Sold),
            _ => Err(DomainError::Validation(format!(
                "不正なペットステータス: {}",
                s
            ))),
        }
    }
}

/// ペットエンティティ
///
/// # 不変条件
///
/// - `oid` は作成後に変化しない
/// - `updated_at` は `created_at` 以降
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    id:         PetId,
    oid:        PetOid,
    name:       PetName,
    status:     PetStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Pet {
    /// データベースからペットを復元する
    pub fn from_db(
        id: PetId,
        oid: PetOid,
        name: PetName,
        status: PetStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            oid,
            name,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> PetId {
        self.id
    }

    pub fn oid(&self) -> PetOid {
        self.oid
    }

    pub fn name(&self) -> &PetName {
        &self.name
    }

    pub fn status(&self) -> PetStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 販売可能か
    pub fn is_available(&self) -> bool {
        self.status == PetStatus::Available
    }
}

/// ペット作成コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPet {
    pub name:   PetName,
    pub status: PetStatus,
}

/// ペット更新コマンド
///
/// `None` のフィールドは変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetChanges {
    pub name:   Option<PetName>,
    pub status: Option<PetStatus>,
}

impl PetChanges {
    /// 変更対象のフィールドがないか
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none()
    }
}

/// ペット一覧の絞り込み条件
///
/// `tags` を指定した場合、いずれかのタグが付いたペットを返す。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetFilter {
    pub status: Option<PetStatus>,
    pub tags:   Vec<TagName>,
    pub page:   PageRequest,
}
