//! # Petstore API ライブラリ
//!
//! HTTP サーバーのコアモジュール。`main.rs` は設定とインフラの初期化だけを行い、
//! ルーターの構築はここに置く（ハンドラテストから同じルーターを使うため）。
//!
//! ## モジュール構成
//!
//! - `app`: ルーターとレイヤーの構築
//! - `config`: 環境変数から読む設定スナップショット
//! - `error`: API エラーと翻訳前のエラー応答
//! - `extract`: 検証付き抽出器と追跡 ID
//! - `handler`: HTTP ハンドラ
//! - `i18n`: 言語カタログ・言語交渉・翻訳
//! - `logging`: コンポーネント単位のロギングサービス
//! - `middleware`: エラー翻訳とリクエストログ
//! - `openapi`: OpenAPI ドキュメント
//! - `state`: 共有状態

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod i18n;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod state;
