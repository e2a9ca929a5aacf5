//! # Petstore API サーバー
//!
//! ペット・タグ・記事を管理する HTTP API。
//!
//! ## 起動の流れ
//!
//! 1. `.env` と環境変数から設定スナップショットを作る
//! 2. トレーシングを初期化する（出力先は `APP_INSPECT` と実行モードで決まる）
//! 3. データベースに接続し、マイグレーションを適用する
//! 4. 言語カタログとロギングサービスを用意して状態を組み立てる
//! 5. Ctrl-C / SIGTERM を受けるまでリクエストを処理する
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `APP_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `APP_PORT` | No | ポート番号（デフォルト: `7878`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `DATABASE_REPLICA_URL` | No | 読み取りレプリカの接続 URL |
//! | `SCHEMA_FILE_PATH` | No | 起動時に OpenAPI ドキュメントを書き出すパス |
//!
//! その他は [`AppConfig`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo run -p petstore-api
//! ```

use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context as _;
use petstore_api::{
    app::build_router,
    config::AppConfig,
    i18n::I18n,
    logging::LoggingService,
    openapi,
    state::AppState,
};
use petstore_infra::db::{Database, run_migrations};
use petstore_shared::observability::{LogSink, SYSTEM_LOG_DIR, TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tracing::Instrument as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::from_env().context("設定の読み込みに失敗しました")?);

    // トレーシング初期化
    let cwd = std::env::current_dir().context("カレントディレクトリを取得できません")?;
    let sink = LogSink::select(
        config.logger.inspecting,
        config.is_local_run(),
        Path::new(SYSTEM_LOG_DIR),
        &cwd,
    );
    let tracing_config = TracingConfig::new(
        "petstore-api",
        config.logger.format,
        config.logger.level,
        sink,
    );
    // 初期化に失敗してもサーバーは起動する
    let sink = init_tracing(tracing_config).unwrap_or_else(|e| {
        eprintln!("WARNING: tracing initialization failed: {e}");
        LogSink::Direct
    });

    run(config, sink)
        .instrument(tracing::info_span!("app", service = "petstore-api"))
        .await
}

/// 接続・状態の組み立てからシャットダウンまで
async fn run(config: Arc<AppConfig>, sink: LogSink) -> anyhow::Result<()> {
    tracing::info!(
        sink = ?sink,
        env_mode = config.server.env_mode.as_str(),
        run_mode = config.server.run_mode.as_str(),
        "Petstore API サーバーを起動します: {}:{}",
        config.server.host,
        config.server.port
    );

    // データベース
    let db = Database::connect(
        &config.database.url,
        config.database.replica_url.as_deref(),
    )
    .await
    .context("データベース接続に失敗しました")?;
    run_migrations(db.master())
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    if let Some(path) = &config.schema_file_path {
        openapi::write_schema(path)
            .with_context(|| format!("OpenAPI ドキュメントを書き出せません: {}", path.display()))?;
        tracing::info!(path = %path.display(), "OpenAPI ドキュメントを書き出しました");
    }

    let i18n = I18n::load(
        &config.i18n.locale_root,
        &config.i18n.default_language,
        &config.i18n.fallback_key,
    )
    .context("言語カタログの読み込みに失敗しました")?;
    let logging = LoggingService::new(config.logger.level);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let state = AppState::postgres(config, Arc::new(i18n), logging, db);
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} にバインドできません"))?;
    tracing::info!("{} でリッスン中", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーが異常終了しました")?;

    tracing::info!("サーバーを停止しました");
    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C ハンドラを登録できません");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM ハンドラを登録できません");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
