#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::sync::Arc;

mod clipboard;
mod config;
mod logger;
mod popup;
mod translate;
mod ui;
mod watcher;

use popup::{PopupHandle, PopupState};
use translate::TranslationClient;

fn main() -> anyhow::Result<()> {
    logger::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "app starting");

    let cfg = config::Config::load();
    tracing::info!(
        endpoint = %cfg.endpoint,
        timeout_secs = cfg.request_timeout_secs,
        "config loaded"
    );

    // Network calls run here; the UI thread only spawns onto it.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("jaen-popup-net")
        .enable_all()
        .build()?;

    let translator = Arc::new(TranslationClient::new(
        cfg.endpoint.clone(),
        cfg.request_timeout(),
    )?);
    let popup = PopupHandle::new(PopupState::new(cfg.popup_offset_y, cfg.copy_feedback()));

    let result = ui::run(popup, translator, runtime.handle().clone());
    if let Err(err) = &result {
        tracing::error!(%err, "UI stopped with an error");
    }
    result
}
