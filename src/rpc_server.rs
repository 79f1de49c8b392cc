//! tabsync RPC driver: runs one tab session per process over a shared SQLite store.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"video.pause", "params":{}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so stdout carries only protocol lines.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tabsync::platform;
use tabsync::rpc_handler::{handle_method, RpcContext, STOP_METHOD};
use tabsync::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use tabsync::store::SqliteStore;
use tabsync::types::errors::SessionError;
use tabsync::types::playback::PlaybackState;

const DEFAULT_PAGE_URL: &str = "https://www.youtube.com/watch";

async fn emit(stdout: &mut io::Stdout, value: Value) -> io::Result<()> {
    stdout.write_all(format!("{}\n", value).as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut settings_engine = SettingsEngine::new(std::env::var("TABSYNC_CONFIG").ok());
    let settings = settings_engine.load()?;

    let data_dir = std::env::var("TABSYNC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| platform::get_data_dir());
    let store_path = data_dir.join("tabsync.db");
    let url = std::env::var("TABSYNC_PAGE_URL").unwrap_or_else(|_| DEFAULT_PAGE_URL.to_string());

    info!("Opening shared store at {}", store_path.display());
    let store = Arc::new(SqliteStore::open(&store_path, settings.timing.store_poll_interval())?);

    let mut stdout = io::stdout();
    let ctx = match RpcContext::start(store, &settings, &url, PlaybackState::Playing) {
        Ok(ctx) => ctx,
        Err(SessionError::InactivePage(url)) => {
            emit(&mut stdout, json!({"event": "inactive", "url": url})).await?;
            return Ok(());
        }
        Err(e) => {
            error!("Failed to start tab session: {}", e);
            return Err(e.into());
        }
    };

    emit(
        &mut stdout,
        json!({"event": "ready", "tab_id": ctx.session.tab_id().as_str(), "version": env!("CARGO_PKG_VERSION")}),
    )
    .await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&mut stdout, json!({"id": null, "error": format!("parse error: {}", e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        if method == STOP_METHOD {
            emit(&mut stdout, json!({"id": id, "result": {"stopping": true}})).await?;
            break;
        }
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&ctx, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&mut stdout, response).await?;
    }

    ctx.session.shutdown().await;
    emit(&mut stdout, json!({"event": "stopped"})).await?;
    Ok(())
}
