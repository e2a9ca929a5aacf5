//! # アプリケーション設定
//!
//! 環境変数から起動時に一度だけ設定を読み込む。
//! 構築後は読み取り専用で、`Arc<AppConfig>` として共有する。
//!
//! 環境変数の読み取りは [`AppConfig::from_lookup`] に集約し、
//! テストでは環境変数を書き換えずに任意の値を差し込めるようにしている。

use std::{collections::HashSet, env, path::PathBuf};

use petstore_shared::observability::{LogFormat, LogLevel};
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 稼働環境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Local,
    Develop,
    Qa,
    Production,
}

impl EnvMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Develop => "develop",
            Self::Qa => "qa",
            Self::Production => "production",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Self::Local),
            "develop" => Some(Self::Develop),
            "qa" => Some(Self::Qa),
            "production" => Some(Self::Production),
            _ => None,
        }
    }
}

/// 実行形態
///
/// `Local` のときはログディレクトリを必要に応じて作成する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Local,
    Server,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Server => "server",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Self::Local),
            "server" => Some(Self::Server),
            _ => None,
        }
    }
}

/// サーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// バインドアドレス
    pub host:     String,
    /// ポート番号
    pub port:     u16,
    pub env_mode: EnvMode,
    pub run_mode: RunMode,
}

/// データベース設定
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// マスターの接続 URL
    pub url:         String,
    /// 読み取り専用レプリカの接続 URL
    pub replica_url: Option<String>,
}

/// 多言語化設定
#[derive(Debug, Clone)]
pub struct I18nConfig {
    /// 言語ごとの JSON カタログを置くディレクトリ
    pub locale_root:      PathBuf,
    pub default_language: String,
    /// 個別のメッセージキーを持たないエラーに使うキー
    pub fallback_key:     String,
}

/// ロガー設定
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level:           LogLevel,
    pub format:          LogFormat,
    /// `APP_INSPECT` が有効なら標準エラーへ直接出力する
    pub inspecting:      bool,
    /// レスポンスボディをリクエストログに含める
    pub reply_payload:   bool,
    /// リクエストログから除外するルート（`METHOD path` 形式）
    pub excluded_routes: HashSet<String>,
}

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server:           ServerConfig,
    pub database:         DatabaseConfig,
    pub i18n:             I18nConfig,
    pub logger:           LoggerConfig,
    /// 設定されていれば起動時に OpenAPI ドキュメントを書き出す
    pub schema_file_path: Option<PathBuf>,
}

/// エラー翻訳のフォールバックキー
pub const FALLBACK_MESSAGE_KEY: &str = "common.main.error";

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("APP_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "APP_PORT",
                value,
            })?,
            None => 7878,
        };
        let env_mode = match get("ENV_MODE") {
            Some(value) => EnvMode::parse(&value).ok_or(ConfigError::Invalid {
                name: "ENV_MODE",
                value,
            })?,
            None => EnvMode::Local,
        };
        let run_mode = match get("RUN_MODE") {
            Some(value) => RunMode::parse(&value).ok_or(ConfigError::Invalid {
                name: "RUN_MODE",
                value,
            })?,
            None => RunMode::Local,
        };

        let server = ServerConfig {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            env_mode,
            run_mode,
        };

        let database = DatabaseConfig {
            url:         get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            replica_url: get("DATABASE_REPLICA_URL"),
        };

        let i18n = I18nConfig {
            locale_root:      get("I18N_LOCALE_ROOT")
                .map_or_else(|| PathBuf::from("resources/locales"), PathBuf::from),
            default_language: get("I18N_DEFAULT_LANGUAGE")
                .map_or_else(|| "en".to_string(), |v| v.trim().to_ascii_lowercase()),
            fallback_key:     FALLBACK_MESSAGE_KEY.to_string(),
        };

        let logger = LoggerConfig {
            level:           LogLevel::parse(get("APP_LOG_LEVEL").as_deref()),
            format:          get("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            inspecting:      get("APP_INSPECT").is_some_and(|v| is_truthy(&v)),
            reply_payload:   get("LOG_REPLY_PAYLOAD").is_none_or(|v| is_truthy(&v)),
            excluded_routes: get("LOG_EXCLUDE_ROUTES")
                .map(|v| parse_route_keys(&v))
                .unwrap_or_default(),
        };

        Ok(Self {
            server,
            database,
            i18n,
            logger,
            schema_file_path: get("SCHEMA_FILE_PATH").map(PathBuf::from),
        })
    }

    /// ログディレクトリを作成してよいか
    pub fn is_local_run(&self) -> bool {
        self.server.run_mode == RunMode::Local
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// `GET /v1/pets, POST /v1/tags` 形式のルートキー一覧をパースする
///
/// メソッドは大文字に正規化し、メソッドとパスの間の空白は 1 つにまとめる。
fn parse_route_keys(value: &str) -> HashSet<String> {
    value
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let method = parts.next()?;
            let path = parts.next()?;
            Some(route_key(method, path))
        })
        .collect()
}

/// リクエストログの対象判定に使うルートキー
pub fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}
