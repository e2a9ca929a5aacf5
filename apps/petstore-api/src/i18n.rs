//! # 多言語化
//!
//! 言語ごとの JSON カタログ（`resources/locales/{lang}.json`）を読み込み、
//! リクエストの言語解決とメッセージの翻訳を提供する。
//!
//! ## 翻訳の順序
//!
//! 1. 要求された言語のカタログ
//! 2. デフォルト言語のカタログ
//! 3. キーそのもの
//!
//! どの段階でも panic せず、必ず文字列を返す。
//!
//! ## カタログ形式
//!
//! ネストしたオブジェクトはドット区切りのキーに平坦化する。
//!
//! ```json
//! { "common": { "main": { "error": "An unexpected error occurred" } } }
//! ```
//!
//! は `common.main.error` として参照できる。差し込みは `{{name}}` 形式。

use std::{
    collections::HashMap,
    convert::Infallible,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::ACCEPT_LANGUAGE, request::Parts},
};
use petstore_shared::{ErrorResponse, InvalidParam};
use serde_json::Value;
use thiserror::Error;

use crate::error::ErrorReply;

/// カタログ読み込みエラー
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("カタログを読み込めません: {path}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("カタログの JSON が不正です: {path}")]
    Parse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("カタログのトップレベルがオブジェクトではありません: {0}")]
    NotObject(String),

    #[error("デフォルト言語のカタログがありません: {0}")]
    MissingDefault(String),
}

type Catalog = HashMap<String, String>;

/// 多言語化サービス
#[derive(Debug, Clone)]
pub struct I18n {
    default_language: String,
    fallback_key:     String,
    catalogs:         HashMap<String, Catalog>,
}

impl I18n {
    /// ディレクトリ内の `*.json` を言語カタログとして読み込む
    ///
    /// ファイル名（拡張子を除く）が言語コードになる。
    pub fn load(
        root: &Path,
        default_language: &str,
        fallback_key: &str,
    ) -> Result<Self, I18nError> {
        let entries = fs::read_dir(root).map_err(|source| I18nError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut sources = HashMap::new();
        for entry in entries {
            let path = entry
                .map_err(|source| I18nError::Io {
                    path: root.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path).map_err(|source| I18nError::Io {
                path: path.clone(),
                source,
            })?;
            let value: Value = serde_json::from_str(&text).map_err(|source| I18nError::Parse {
                path: path.clone(),
                source,
            })?;
            sources.insert(language.to_ascii_lowercase(), value);
        }

        let i18n = Self::from_sources(default_language, fallback_key, sources)?;
        tracing::info!(
            languages = ?i18n.languages(),
            default = %i18n.default_language,
            "言語カタログを読み込みました"
        );
        Ok(i18n)
    }

    /// JSON 値からカタログを構築する
    pub fn from_sources(
        default_language: &str,
        fallback_key: &str,
        sources: HashMap<String, Value>,
    ) -> Result<Self, I18nError> {
        let mut catalogs = HashMap::new();
        for (language, value) in sources {
            if !value.is_object() {
                return Err(I18nError::NotObject(language));
            }
            let mut catalog = Catalog::new();
            flatten(None, &value, &mut catalog);
            catalogs.insert(language.to_ascii_lowercase(), catalog);
        }

        let default_language = default_language.to_ascii_lowercase();
        if !catalogs.contains_key(&default_language) {
            return Err(I18nError::MissingDefault(default_language));
        }

        Ok(Self {
            default_language,
            fallback_key: fallback_key.to_string(),
            catalogs,
        })
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// 読み込み済みの言語コード（昇順）
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.catalogs.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// `Accept-Language` ヘッダから応答言語を決める
    ///
    /// q 値の高い順に、完全一致 → 主言語タグの一致で読み込み済みの言語を探す。
    /// 見つからなければデフォルト言語を返す。
    pub fn negotiate(&self, accept_language: Option<&str>) -> String {
        let Some(header) = accept_language else {
            return self.default_language.clone();
        };

        parse_accept_language(header)
            .into_iter()
            .find_map(|tag| {
                if self.catalogs.contains_key(&tag) {
                    return Some(tag);
                }
                let primary = tag.split('-').next().unwrap_or_default();
                self.catalogs
                    .contains_key(primary)
                    .then(|| primary.to_string())
            })
            .unwrap_or_else(|| self.default_language.clone())
    }

    /// リクエストヘッダから応答言語を決める
    pub fn language_from_headers(&self, headers: &HeaderMap) -> String {
        self.negotiate(
            headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        )
    }

    /// メッセージキーを翻訳する
    pub fn translate(&self, language: &str, key: &str, params: &[(String, String)]) -> String {
        let template = self
            .lookup(language, key)
            .map_or_else(|| key.to_string(), str::to_string);
        interpolate(&template, params)
    }

    /// 要求言語 → デフォルト言語の順でキーを探す
    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        [language, self.default_language.as_str()]
            .into_iter()
            .filter_map(|lang| self.catalogs.get(lang))
            .find_map(|catalog| catalog.get(key))
            .map(String::as_str)
    }

    /// 翻訳前のエラー応答を利用者の言語のエラーレスポンスにする
    ///
    /// メッセージキーを持たない、またはカタログにないキーのエラーは
    /// フォールバックメッセージで応答する。
    pub fn translate_error(&self, language: &str, reply: &ErrorReply) -> ErrorResponse {
        let code = reply
            .key
            .as_deref()
            .filter(|key| self.lookup(language, key).is_some())
            .unwrap_or(self.fallback_key.as_str());
        let detail = self.translate(language, code, &reply.params);

        let invalid_params = reply
            .violations
            .iter()
            .map(|v| InvalidParam {
                field:      v.field.clone(),
                constraint: v.constraint.clone(),
                message:    self.translate(language, &v.key, &v.params),
            })
            .collect();

        reply.to_response_body(code, detail, invalid_params)
    }
}

/// ネストしたオブジェクトをドット区切りのキーに平坦化する
fn flatten(prefix: Option<&str>, value: &Value, out: &mut Catalog) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}.{key}"),
                    None => key.clone(),
                };
                flatten(Some(&path), child, out);
            }
        }
        Value::String(text) => {
            if let Some(prefix) = prefix {
                out.insert(prefix.to_string(), text.clone());
            }
        }
        Value::Null => {}
        other => {
            if let Some(prefix) = prefix {
                out.insert(prefix.to_string(), other.to_string());
            }
        }
    }
}

/// `{{name}}` を差し込み値で置き換える
fn interpolate(template: &str, params: &[(String, String)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{{{name}}}}}"), value)
        })
}

/// `Accept-Language` を q 値の降順の言語タグ列にする
///
/// 小文字化し、`_` は `-` に揃える。`q=0` と `*` は除外する。
fn parse_accept_language(header: &str) -> Vec<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim().to_ascii_lowercase().replace('_', "-");
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .map_or(Some(1.0), |q| q.trim().parse::<f32>().ok())?;
            (quality > 0.0).then_some((tag, quality))
        })
        .collect();
    // 同じ q 値はヘッダ内の順序を保つ
    tags.sort_by(|a, b| b.1.total_cmp(&a.1));
    tags.into_iter().map(|(tag, _)| tag).collect()
}

/// リクエストに対して解決された言語
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLanguage(pub String);

impl<S> FromRequestParts<S> for RequestLanguage
where
    S: Send + Sync,
    Arc<I18n>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let i18n = Arc::<I18n>::from_ref(state);
        Ok(Self(i18n.language_from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::error::FieldViolation;

    fn i18n() -> I18n {
        let sources = HashMap::from([
            (
                "en".to_string(),
                json!({
                    "common": {
                        "main": { "error": "An unexpected error occurred" },
                        "error": { "validation": "Invalid request" }
                    },
                    "pet": { "error": { "not_found": "Pet {{id}} was not found" } },
                    "validation": { "length": "Length must be between {{min}} and {{max}}" },
                    "only": { "english": "English only" }
                }),
            ),
            (
                "ko".to_string(),
                json!({
                    "common": { "main": { "error": "알 수 없는 오류가 발생했습니다" } },
                    "pet": { "error": { "not_found": "{{id}}번 펫을 찾을 수 없습니다" } }
                }),
            ),
            (
                "ja".to_string(),
                json!({ "pet": { "error": { "not_found": "ペット {{id}} が見つかりません" } } }),
            ),
        ]);
        I18n::from_sources("en", "common.main.error", sources).unwrap()
    }

    #[rstest]
    #[case(None, "en")]
    #[case(Some(""), "en")]
    #[case(Some("fr-FR,fr;q=0.9"), "en")]
    #[case(Some("ko-KR,ko;q=0.9,en;q=0.8"), "ko")]
    #[case(Some("en;q=0.5,ja;q=0.9"), "ja")]
    #[case(Some("JA_jp"), "ja")]
    #[case(Some("ko;q=0,en"), "en")]
    #[case(Some("*"), "en")]
    #[case(Some("ko;q=abc,ja"), "ja")]
    fn test_accept_languageから言語を解決する(
        #[case] header: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(i18n().negotiate(header), expected);
    }

    #[test]
    fn test_要求言語のメッセージに値を差し込む() {
        let message = i18n().translate(
            "ko",
            "pet.error.not_found",
            &[("id".to_string(), "7".to_string())],
        );

        assert_eq!(message, "7번 펫을 찾을 수 없습니다");
    }

    #[test]
    fn test_要求言語にないキーはデフォルト言語で翻訳する() {
        assert_eq!(i18n().translate("ko", "only.english", &[]), "English only");
    }

    #[test]
    fn test_どこにもないキーはキーそのものを返す() {
        assert_eq!(i18n().translate("ja", "no.such.key", &[]), "no.such.key");
    }

    #[test]
    fn test_未読み込みの言語でもデフォルト言語で翻訳する() {
        assert_eq!(
            i18n().translate("fr", "common.main.error", &[]),
            "An unexpected error occurred"
        );
    }

    #[test]
    fn test_キーを持たないエラーはフォールバックメッセージになる() {
        let reply = ErrorReply {
            status:     StatusCode::INTERNAL_SERVER_ERROR,
            key:        None,
            params:     Vec::new(),
            violations: Vec::new(),
        };

        let body = i18n().translate_error("ko", &reply);

        assert_eq!(body.status, 500);
        assert_eq!(body.detail, "알 수 없는 오류가 발생했습니다");
        assert_eq!(body.code.as_deref(), Some("common.main.error"));
    }

    #[test]
    fn test_バリデーションエラーはフィールドごとに翻訳する() {
        let reply = ErrorReply {
            status:     StatusCode::BAD_REQUEST,
            key:        Some("common.error.validation".to_string()),
            params:     Vec::new(),
            violations: vec![
                FieldViolation::new("body.name", "length")
                    .with_param("max", "100")
                    .with_param("min", "1"),
            ],
        };

        let body = i18n().translate_error("en", &reply);

        assert_eq!(body.status, 400);
        assert_eq!(body.title, "Validation Error");
        assert_eq!(body.detail, "Invalid request");
        assert_eq!(body.invalid_params.len(), 1);
        assert_eq!(body.invalid_params[0].field, "body.name");
        assert_eq!(
            body.invalid_params[0].message,
            "Length must be between 1 and 100"
        );
    }

    #[test]
    fn test_デフォルト言語のカタログがないと構築に失敗する() {
        let sources = HashMap::from([("ko".to_string(), json!({}))]);

        let result = I18n::from_sources("en", "common.main.error", sources);

        assert!(matches!(result, Err(I18nError::MissingDefault(lang)) if lang == "en"));
    }

    #[test]
    fn test_ディレクトリからカタログを読み込む() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("en.json"),
            r#"{ "common": { "main": { "error": "Oops" } } }"#,
        )
        .unwrap();
        fs::write(dir.path().join("ko.json"), r#"{ "common": {} }"#).unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let i18n = I18n::load(dir.path(), "en", "common.main.error").unwrap();

        assert_eq!(i18n.languages(), vec!["en", "ko"]);
        assert_eq!(i18n.translate("ko", "common.main.error", &[]), "Oops");
    }

    #[test]
    fn test_不正なjsonのカタログはエラーになる() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en.json"), "{ broken").unwrap();

        let result = I18n::load(dir.path(), "en", "common.main.error");

        assert!(matches!(result, Err(I18nError::Parse { .. })));
    }
}
