/// UUID v7 ベースの外部公開用識別子（oid）を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`Uuid` をラップ）
/// - `derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: UUID v7 を生成
/// - `from_uuid()`: 既存 UUID から復元
/// - `as_uuid()`: 内部 UUID への参照
/// - `Default` impl（`new()` に委譲）
///
/// oid は主キー（`id`）とは独立して生成される。
///
/// # 使用例
///
/// ```rust
/// use petstore_domain::article::ArticleOid;
///
/// let oid = ArticleOid::new();
/// let restored = ArticleOid::from_uuid(*oid.as_uuid());
/// assert_eq!(oid, restored);
/// ```
macro_rules! define_oid {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい oid を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// 既存の UUID から oid を作成する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// DB の `BIGINT` identity 主キーをラップする ID 型を定義する宣言型マクロ
///
/// 値はデータベースが採番するため `new()` は持たない。
/// `from_i64()` で復元し、`as_i64()` で取り出す。
macro_rules! define_serial_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(i64);

        impl $Name {
            /// DB の値から ID を作成する
            pub fn from_i64(value: i64) -> Self {
                Self(value)
            }

            /// 内部の値を取得する
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }
    };
}

/// バリデーション付き String Newtype を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `new()`: trim + 空チェック + 最大長チェック
/// - `as_str()`: 文字列参照
/// - `into_string()`: 所有権を持つ文字列に変換
/// - `Display` impl
///
/// # 引数
///
/// - `$label`: エラーメッセージに使うラベル（例: `"ペット名"`）
/// - `$max_length`: 最大文字数（`chars().count()` でカウント）
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use petstore_domain::pet::PetName;
///
/// let name = PetName::new("  Pochi ")?;
/// assert_eq!(name.as_str(), "Pochi");
/// # Ok(())
/// # }
/// ```
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        $vis struct $Name(String);

        impl $Name {
            /// 最大文字数
            pub const MAX_LENGTH: usize = $max_length;

            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();

                if value.is_empty() {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は必須です",
                        $label
                    )));
                }

                if value.chars().count() > $max_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {} 文字以内である必要があります",
                        $label, $max_length
                    )));
                }

                Ok(Self(value))
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// 所有権を持つ文字列に変換する
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $Name {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$Name> for String {
            fn from(value: $Name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
