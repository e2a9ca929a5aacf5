//! # Observability 基盤
//!
//! トレーシング初期化とログ出力先・ログレベルの解決を提供する。
//!
//! ## ログレベル
//!
//! 環境変数 `APP_LOG_LEVEL` で `fatal` / `error` / `warn` / `info` / `debug` / `trace` /
//! `silent` を指定する。未設定・不正値は `info` にフォールバックする。
//! `RUST_LOG` が設定されている場合はそちらの EnvFilter を優先する。
//!
//! ## 出力先
//!
//! - インスペクタ（デバッガ）実行中（`APP_INSPECT` が真値）: stderr に直接書き込む
//! - それ以外: ログファイルにレベル付きで書き込む。`/var/log/petstore` が存在すれば
//!   そこに、なければ `./logs/app.log` に出力する。`./logs` の作成は run mode が
//!   `local` のときだけ行う
//!
//! ファイルを開けない場合は stderr に警告を出して直接出力に切り替える。
//! ログ基盤の初期化失敗でサーバー起動を止めない。

use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// Request ID を運ぶ HTTP ヘッダー名
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// システムログディレクトリ（存在する場合のみ使用）
pub const SYSTEM_LOG_DIR: &str = "/var/log/petstore";

/// ローカル実行時のログディレクトリ（カレントディレクトリ相対）
pub const LOCAL_LOG_DIR: &str = "logs";

/// ログファイル名
pub const LOG_FILE_NAME: &str = "app.log";

// =============================================================================
// LogLevel
// =============================================================================

/// ログレベル
///
/// `Fatal` は tracing に対応するレベルがないため `ERROR` として出力し、
/// `Silent` はすべての出力を抑止する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
    Silent,
}

impl LogLevel {
    /// 文字列からログレベルを解決する
    ///
    /// 未設定・不正値は [`Info`](LogLevel::Info) にフォールバックする。
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("fatal") => Self::Fatal,
            Some("error") => Self::Error,
            Some("warn") => Self::Warn,
            Some("info") => Self::Info,
            Some("debug") => Self::Debug,
            Some("trace") => Self::Trace,
            Some("silent") => Self::Silent,
            _ => Self::Info,
        }
    }

    /// レベル名
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Silent => "silent",
        }
    }

    /// tracing のレベルフィルタに変換する
    #[cfg(feature = "observability")]
    pub fn as_level_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;

        match self {
            Self::Fatal | Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
            Self::Silent => LevelFilter::OFF,
        }
    }
}

// =============================================================================
// LogFormat
// =============================================================================

/// ログ出力形式
///
/// 環境変数 `LOG_FORMAT` で切り替える。
/// 値が未設定または不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすい形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// 不正な値の場合は [`Pretty`](LogFormat::Pretty) にフォールバックし、
    /// stderr に警告を出力する。
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown LOG_FORMAT={other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }
}

// =============================================================================
// LogSink
// =============================================================================

/// ログの出力先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// stderr に直接書き込む（インスペクタ実行中、またはファイルを開けなかった場合）
    Direct,
    /// ログファイルに書き込む
    File {
        path:       PathBuf,
        /// 親ディレクトリを必要に応じて作成するか（ローカル実行時のみ）
        create_dir: bool,
    },
}

impl LogSink {
    /// 実行状況から出力先を選択する
    ///
    /// - `inspecting`: インスペクタ実行中か
    /// - `local_run`: run mode が `local` か
    /// - `system_dir`: システムログディレクトリ（存在すれば優先）
    /// - `cwd`: カレントディレクトリ
    pub fn select(inspecting: bool, local_run: bool, system_dir: &Path, cwd: &Path) -> Self {
        if inspecting {
            return Self::Direct;
        }

        let path = if system_dir.is_dir() {
            system_dir.join(LOG_FILE_NAME)
        } else {
            cwd.join(LOCAL_LOG_DIR).join(LOG_FILE_NAME)
        };

        Self::File {
            path,
            create_dir: local_run,
        }
    }

    /// ログファイルを追記モードで開く
    ///
    /// `create_dir` が真のときだけ親ディレクトリを作成する。
    pub fn open(path: &Path, create_dir: bool) -> io::Result<File> {
        if create_dir && let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }
}

// =============================================================================
// TracingConfig
// =============================================================================

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// サービス名（JSON ログの `span.service` フィールドに出力）
    pub service_name: String,
    /// ログ出力形式
    pub log_format:   LogFormat,
    /// ログレベル
    pub level:        LogLevel,
    /// 出力先
    pub sink:         LogSink,
}

impl TracingConfig {
    /// 新しい設定を作成する
    pub fn new(
        service_name: impl Into<String>,
        log_format: LogFormat,
        level: LogLevel,
        sink: LogSink,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            level,
            sink,
        }
    }
}

// =============================================================================
// 初期化
// =============================================================================

/// トレーシングを初期化する
///
/// 実際に使用した出力先を返す（ファイルを開けなかった場合は [`LogSink::Direct`]）。
/// `RUST_LOG` 環境変数が設定されていればその EnvFilter を優先する。
///
/// JSON モードでは以下のフィールドがトップレベルに出力される:
/// - `timestamp`, `level`, `target`, `message`
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: TracingConfig,
) -> Result<LogSink, tracing_subscriber::util::TryInitError> {
    use std::sync::Mutex;

    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::default().add_directive(config.level.as_level_filter().into())
    });

    let file = match &config.sink {
        LogSink::Direct => None,
        LogSink::File { path, create_dir } => match LogSink::open(path, *create_dir) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!(
                    "WARNING: cannot open log file {}: {e}, falling back to stderr",
                    path.display()
                );
                None
            }
        },
    };
    let effective_sink = if file.is_some() {
        config.sink.clone()
    } else {
        LogSink::Direct
    };

    let fmt_layer = match (config.log_format, file) {
        (LogFormat::Json, Some(file)) => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .boxed(),
        (LogFormat::Pretty, Some(file)) => tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .boxed(),
        (LogFormat::Json, None) => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(io::stderr)
            .boxed(),
        (LogFormat::Pretty, None) => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;

    Ok(effective_sink)
}

// =============================================================================
// Request ID / スパン
// =============================================================================

/// UUID v7 で Request ID を生成する `MakeRequestId` 実装
#[cfg(feature = "observability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

#[cfg(feature = "observability")]
impl tower_http::request_id::MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(
        &mut self,
        _request: &http::Request<B>,
    ) -> Option<tower_http::request_id::RequestId> {
        let value = http::HeaderValue::from_str(&uuid::Uuid::now_v7().to_string()).ok()?;
        Some(tower_http::request_id::RequestId::new(value))
    }
}

/// TraceLayer 用のリクエストスパンを作成する
///
/// `x-request-id` ヘッダーの値を `request_id` フィールドとして記録する。
#[cfg(feature = "observability")]
pub fn make_request_span<B>(request: &http::Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
