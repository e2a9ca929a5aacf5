//! # ミドルウェア
//!
//! - [`localize_errors`] - エラー応答を要求言語に翻訳する
//! - [`log_requests`] - 対象ルートのリクエストログを出力する

mod localize;
mod request_log;

pub use localize::localize_errors;
pub use request_log::{RequestLogState, log_requests};
