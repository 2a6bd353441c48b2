//! Wiring: bridge transport + decision engine + HTTP front door.
//!
//! Inbound events arrive over the webhook, land in one mpsc queue, and are
//! processed strictly one at a time. The engine relies on that ordering;
//! there is deliberately no worker pool here.

use crate::config::AppConfig;
use crate::routes::{AppState, router};
use ag_channels::{ChatEvent, ChatId, ChatTransport, WhatsAppBridge};
use ag_engine::{
    Classifier, ContextStore, DecisionForwarder, DecisionProcessor, HttpBackendForwarder,
    PatternNameExtractor, ProcessorConfig,
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = AppConfig::load(config_path).await?;

    let transport: Arc<dyn ChatTransport> = Arc::new(WhatsAppBridge::new(&cfg.bridge.base_url)?);
    let forwarder: Arc<dyn DecisionForwarder> = Arc::new(HttpBackendForwarder::new(
        &cfg.backend.approval_endpoint,
        Arc::clone(&transport),
    )?);
    let store = Arc::new(ContextStore::new());

    let notification_chat = ChatId::new(cfg.chats.notification_chat_id.clone());
    let processor = Arc::new(DecisionProcessor::new(
        Arc::clone(&store),
        Arc::clone(&transport),
        forwarder,
        Classifier::new(notification_chat.clone(), Box::new(PatternNameExtractor)),
        ProcessorConfig {
            notification_chat,
            audit_chat: ChatId::new(cfg.audit_chat_id()),
            fallback_chat: ChatId::new(cfg.chats.fallback_chat_id.clone()),
        },
    ));

    let (events_tx, events_rx) = mpsc::channel::<ChatEvent>(256);
    spawn_event_pump(Arc::clone(&processor), events_rx);
    spawn_prune_task(&cfg, Arc::clone(&store));

    let state = AppState {
        transport,
        store,
        events_tx,
    };
    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.server.port)).await?;
    tracing::info!(port = cfg.server.port, "approvegate listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_event_pump(processor: Arc<DecisionProcessor>, mut rx: mpsc::Receiver<ChatEvent>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            processor.handle_event(&event).await;
        }
        tracing::info!("inbound event queue closed; pump exiting");
    });
}

fn spawn_prune_task(cfg: &AppConfig, store: Arc<ContextStore>) {
    let max_age_hours = cfg.retention.context_max_age_hours;
    let interval_secs = cfg.retention.prune_interval_secs;
    if max_age_hours == 0 || interval_secs == 0 {
        return;
    }
    let max_age = Duration::from_secs(max_age_hours * 3600);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.prune_stale(max_age);
            if removed > 0 {
                tracing::info!(removed, live = store.len(), "pruned stale contexts");
            }
        }
    });
}

/// Validate config and probe the bridge; exits non-zero on hard problems.
pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = AppConfig::load(config_path).await?;
    println!("config: ok");
    println!("  server.port = {}", cfg.server.port);
    println!("  bridge.base_url = {}", cfg.bridge.base_url);
    println!("  backend.approval_endpoint = {}", cfg.backend.approval_endpoint);
    println!("  chats.notification_chat_id = {}", cfg.chats.notification_chat_id);
    println!("  chats.audit_chat_id = {}", cfg.audit_chat_id());
    println!("  chats.fallback_chat_id = {}", cfg.chats.fallback_chat_id);

    let bridge = WhatsAppBridge::new(&cfg.bridge.base_url)?;
    if bridge.ready().await {
        println!("bridge: ready");
    } else {
        println!("bridge: not ready (is the sidecar running and logged in?)");
    }
    Ok(())
}
