//! # ロギングサービス
//!
//! 構造化ログの入口。`main` で一度だけ構築し、[`AppState`](crate::state::AppState)
//! 経由で各所に渡す。
//!
//! ```text
//! LoggingService ──component("pet")──▶ Logger ──info(LogRecord)──▶ tracing
//! ```
//!
//! ## レコードの正規化
//!
//! - `timestamp`: `HH:MM:SS.mmm` に揃える。未指定・解釈不能なら現在時刻
//! - `status`: 未指定なら 200
//! - `req_method`: 未指定なら `SYS`（リクエスト外のシステムログ）
//! - エラーオブジェクトがあれば、そのメッセージと原因の連鎖を
//!   `err_msg` / `err_stk` として手入力の値より優先する
//!
//! 正規化と出力は `catch_unwind` の内側で行い、失敗しても呼び出し元には伝播させない。

use std::{
    error::Error as StdError,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, Local, NaiveTime};
use petstore_shared::observability::LogLevel;
use serde_json::Value;

/// 時刻の出力形式
const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// システムログのメソッド名
const SYSTEM_METHOD: &str = "SYS";

/// ログレコード
///
/// 未指定のフィールドは出力時に既定値で補う。
#[derive(Debug, Default)]
pub struct LogRecord {
    pub timestamp:  Option<String>,
    pub status:     Option<u16>,
    pub req_method: Option<String>,
    pub req_url:    Option<String>,
    /// 処理時間（ミリ秒）
    pub duration:   Option<u128>,
    pub message:    Option<String>,
    pub body:       Option<Value>,
    pub err_msg:    Option<String>,
    pub err_stk:    Option<String>,
    pub err:        Option<Box<dyn StdError + Send + Sync>>,
}

impl LogRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn request(mut self, method: impl Into<String>, url: impl Into<String>) -> Self {
        self.req_method = Some(method.into());
        self.req_url = Some(url.into());
        self
    }

    pub fn duration(mut self, millis: u128) -> Self {
        self.duration = Some(millis);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn error(mut self, err: impl StdError + Send + Sync + 'static) -> Self {
        self.err = Some(Box::new(err));
        self
    }
}

/// 正規化済みのレコード
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    timestamp:  String,
    status:     u16,
    req_method: String,
    req_url:    Option<String>,
    duration:   Option<u128>,
    filename:   String,
    message:    String,
    body:       Option<String>,
    err_msg:    Option<String>,
    err_stk:    Option<String>,
}

impl Entry {
    fn from_record(record: LogRecord, filename: &str) -> Self {
        let (err_msg, err_stk) = match &record.err {
            Some(err) => (Some(err.to_string()), Some(error_chain(&**err))),
            None => (record.err_msg, record.err_stk),
        };

        Self {
            timestamp: normalize_timestamp(record.timestamp.as_deref()),
            status: record.status.unwrap_or(200),
            req_method: record
                .req_method
                .unwrap_or_else(|| SYSTEM_METHOD.to_string()),
            req_url: record.req_url,
            duration: record.duration,
            filename: filename.to_string(),
            message: record.message.unwrap_or_default(),
            body: record.body.map(|b| b.to_string()),
            err_msg,
            err_stk,
        }
    }
}

/// 時刻を `HH:MM:SS.mmm` に揃える
///
/// RFC 3339 と `HH:MM:SS(.fff)` を受け付け、それ以外は現在時刻にする。
fn normalize_timestamp(value: Option<&str>) -> String {
    let parsed = value.and_then(|v| {
        let v = v.trim();
        DateTime::parse_from_rfc3339(v)
            .map(|dt| dt.time())
            .or_else(|_| NaiveTime::parse_from_str(v, TIMESTAMP_FORMAT))
            .ok()
    });
    parsed
        .unwrap_or_else(|| Local::now().time())
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// エラーとその原因を 1 行ずつ連結する
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}

/// 失敗を呼び出し元に伝播させずに処理を実行する
fn guarded(f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        eprintln!("ログ出力に失敗しました: {reason}");
    }
}

/// レベルの重大度（小さいほど重大）
fn severity(level: LogLevel) -> u8 {
    match level {
        LogLevel::Silent => 0,
        LogLevel::Fatal => 1,
        LogLevel::Error => 2,
        LogLevel::Warn => 3,
        LogLevel::Info => 4,
        LogLevel::Debug => 5,
        LogLevel::Trace => 6,
    }
}

/// ロギングサービス
#[derive(Debug, Clone)]
pub struct LoggingService {
    level: LogLevel,
}

impl LoggingService {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// コンポーネント名付きのロガーを作る
    ///
    /// `file!()` を渡した場合はディレクトリと拡張子を除いたファイル名を使う。
    pub fn component(&self, name: &str) -> Logger {
        let path = Path::new(name);
        let filename = if path.extension().is_some_and(|e| e == "rs") {
            path.file_stem()
        } else {
            path.file_name()
        }
        .and_then(|s| s.to_str())
        .unwrap_or(name);

        Logger {
            level:    self.level,
            filename: Arc::from(filename),
        }
    }
}

/// コンポーネント単位のロガー
#[derive(Debug, Clone)]
pub struct Logger {
    level:    LogLevel,
    filename: Arc<str>,
}

impl Logger {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// 指定レベルのログを出力するか
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && severity(level) <= severity(self.level)
    }

    pub fn fatal(&self, record: LogRecord) {
        self.log(LogLevel::Fatal, record);
    }

    pub fn error(&self, record: LogRecord) {
        self.log(LogLevel::Error, record);
    }

    pub fn warn(&self, record: LogRecord) {
        self.log(LogLevel::Warn, record);
    }

    pub fn info(&self, record: LogRecord) {
        self.log(LogLevel::Info, record);
    }

    pub fn debug(&self, record: LogRecord) {
        self.log(LogLevel::Debug, record);
    }

    pub fn trace(&self, record: LogRecord) {
        self.log(LogLevel::Trace, record);
    }

    /// 何も出力しない
    pub fn silent(&self, _record: LogRecord) {}

    fn log(&self, level: LogLevel, record: LogRecord) {
        if !self.enabled(level) {
            return;
        }
        guarded(|| emit(level, &Entry::from_record(record, &self.filename)));
    }
}

macro_rules! emit_at {
    ($macro:ident, $entry:expr, $($extra:tt)*) => {
        tracing::$macro!(
            $($extra)*
            timestamp = %$entry.timestamp,
            status = $entry.status,
            req_method = %$entry.req_method,
            req_url = $entry.req_url.as_deref(),
            duration_ms = $entry.duration.map(|d| d as u64),
            filename = %$entry.filename,
            body = $entry.body.as_deref(),
            err_msg = $entry.err_msg.as_deref(),
            err_stk = $entry.err_stk.as_deref(),
            "{}",
            $entry.message
        )
    };
}

fn emit(level: LogLevel, entry: &Entry) {
    match level {
        LogLevel::Fatal => emit_at!(error, entry, fatal = true,),
        LogLevel::Error => emit_at!(error, entry,),
        LogLevel::Warn => emit_at!(warn, entry,),
        LogLevel::Info => emit_at!(info, entry,),
        LogLevel::Debug => emit_at!(debug, entry,),
        LogLevel::Trace => emit_at!(trace, entry,),
        LogLevel::Silent => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("接続に失敗しました")]
    struct Outer {
        #[source]
        source: Inner,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("タイムアウト")]
    struct Inner;

    fn is_hh_mm_ss_mmm(value: &str) -> bool {
        value.len() == 12 && NaiveTime::parse_from_str(value, TIMESTAMP_FORMAT).is_ok()
    }

    #[rstest]
    #[case("2026-09-01T12:34:56.789+09:00", "12:34:56.789")]
    #[case("2026-09-01T01:02:03Z", "01:02:03.000")]
    #[case("08:09:10.500", "08:09:10.500")]
    fn test_時刻をhh_mm_ss_mmmに正規化する(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_timestamp(Some(input)), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("yesterday"))]
    #[case(Some("25:61:61"))]
    fn test_不正な時刻は現在時刻になる(#[case] input: Option<&str>) {
        assert!(is_hh_mm_ss_mmm(&normalize_timestamp(input)));
    }

    #[test]
    fn test_未指定のフィールドは既定値で補う() {
        let entry = Entry::from_record(LogRecord::default(), "bootstrap");

        assert_eq!(entry.status, 200);
        assert_eq!(entry.req_method, "SYS");
        assert_eq!(entry.filename, "bootstrap");
        assert_eq!(entry.message, "");
        assert!(is_hh_mm_ss_mmm(&entry.timestamp));
    }

    #[test]
    fn test_エラーオブジェクトは手入力のエラー情報より優先する() {
        let record = LogRecord {
            err_msg: Some("手入力".to_string()),
            err_stk: Some("手入力の stack".to_string()),
            ..LogRecord::new("失敗")
        }
        .error(Outer { source: Inner });

        let entry = Entry::from_record(record, "pet");

        assert_eq!(entry.err_msg.as_deref(), Some("接続に失敗しました"));
        assert_eq!(
            entry.err_stk.as_deref(),
            Some("接続に失敗しました\ncaused by: タイムアウト")
        );
    }

    #[test]
    fn test_エラーオブジェクトがなければ手入力のエラー情報を使う() {
        let record = LogRecord {
            err_msg: Some("手入力".to_string()),
            ..LogRecord::default()
        };

        let entry = Entry::from_record(record, "pet");

        assert_eq!(entry.err_msg.as_deref(), Some("手入力"));
        assert_eq!(entry.err_stk, None);
    }

    #[test]
    fn test_ファイルパスからコンポーネント名を取り出す() {
        let service = LoggingService::new(LogLevel::Info);

        assert_eq!(
            service.component("apps/petstore-api/src/handler/pet.rs").filename(),
            "pet"
        );
        assert_eq!(service.component("request").filename(), "request");
    }

    #[rstest]
    #[case(LogLevel::Info, LogLevel::Warn, true)]
    #[case(LogLevel::Info, LogLevel::Info, true)]
    #[case(LogLevel::Info, LogLevel::Debug, false)]
    #[case(LogLevel::Fatal, LogLevel::Error, false)]
    #[case(LogLevel::Silent, LogLevel::Fatal, false)]
    #[case(LogLevel::Trace, LogLevel::Silent, false)]
    fn test_設定レベルより詳細なログは出力しない(
        #[case] configured: LogLevel,
        #[case] level: LogLevel,
        #[case] expected: bool,
    ) {
        let logger = LoggingService::new(configured).component("test");

        assert_eq!(logger.enabled(level), expected);
    }

    #[test]
    fn test_出力中のpanicは呼び出し元に伝播しない() {
        guarded(|| panic!("broken sink"));
    }

    #[test]
    fn test_全レベルの出力がpanicしない() {
        let logger = LoggingService::new(LogLevel::Trace).component("test");
        let record = || {
            LogRecord::new("message")
                .timestamp("not a timestamp")
                .status(500)
                .request("GET", "/v1/pets")
                .duration(12)
                .body(serde_json::json!({ "data": [1, 2, 3] }))
        };

        logger.fatal(record());
        logger.error(record());
        logger.warn(record());
        logger.info(record());
        logger.debug(record());
        logger.trace(record());
        logger.silent(record());
    }
}
