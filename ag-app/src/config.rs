//! Approvegate configuration loader.
//!
//! A missing config file is not an error: every field has a default, so a
//! bare deployment runs on env overrides alone, the way the bridge was
//! originally operated.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chats: ChatsConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the whatsapp-web bridge sidecar.
    #[serde(default = "default_bridge_url")]
    pub base_url: String,
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3001/".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Decision endpoint; receives the approve/reject/show-leaves envelopes.
    #[serde(default = "default_approval_endpoint")]
    pub approval_endpoint: String,
}

fn default_approval_endpoint() -> String {
    "http://127.0.0.1:7041/atc/public/handle_approval_message".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            approval_endpoint: default_approval_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatsConfig {
    /// The chat decisions are accepted from.
    #[serde(default = "default_notification_chat")]
    pub notification_chat_id: String,
    /// Audit confirmations land here; defaults to the notification chat.
    #[serde(default)]
    pub audit_chat_id: Option<String>,
    /// Target chat of last resort for decisions that name no chat.
    #[serde(default = "default_fallback_chat")]
    pub fallback_chat_id: String,
}

fn default_notification_chat() -> String {
    "120363368545737149@g.us".to_string()
}

fn default_fallback_chat() -> String {
    "120363406616265454@g.us".to_string()
}

impl Default for ChatsConfig {
    fn default() -> Self {
        Self {
            notification_chat_id: default_notification_chat(),
            audit_chat_id: None,
            fallback_chat_id: default_fallback_chat(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Contexts older than this are pruned. 0 disables pruning.
    #[serde(default = "default_context_max_age_hours")]
    pub context_max_age_hours: u64,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

fn default_context_max_age_hours() -> u64 {
    7 * 24
}

fn default_prune_interval_secs() -> u64 {
    3600
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            context_max_age_hours: default_context_max_age_hours(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

impl AppConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(default_config_path);
        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
            Err(e) => {
                return Err(anyhow::anyhow!("read config {}: {e}", path.display()));
            }
        };

        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("APPROVEGATE_PORT") {
            if let Ok(port) = v.trim().parse() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("APPROVEGATE_BRIDGE_URL") {
            if !v.trim().is_empty() {
                self.bridge.base_url = v;
            }
        }
        // Both historical endpoint variable names stay honored.
        for key in ["APPROVAL_ENDPOINT", "LEAVE_APPROVAL_ENDPOINT"] {
            if let Ok(v) = std::env::var(key) {
                if !v.trim().is_empty() {
                    self.backend.approval_endpoint = v;
                    break;
                }
            }
        }
        if let Ok(v) = std::env::var("APPROVEGATE_NOTIFICATION_CHAT") {
            if !v.trim().is_empty() {
                self.chats.notification_chat_id = v;
            }
        }
        if let Ok(v) = std::env::var("APPROVEGATE_AUDIT_CHAT") {
            if !v.trim().is_empty() {
                self.chats.audit_chat_id = Some(v);
            }
        }
        if let Ok(v) = std::env::var("APPROVEGATE_FALLBACK_CHAT") {
            if !v.trim().is_empty() {
                self.chats.fallback_chat_id = v;
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server.port must be > 0"));
        }
        if self.bridge.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("bridge.base_url is required"));
        }
        if self.backend.approval_endpoint.trim().is_empty() {
            return Err(anyhow::anyhow!("backend.approval_endpoint is required"));
        }
        if self.chats.notification_chat_id.trim().is_empty() {
            return Err(anyhow::anyhow!("chats.notification_chat_id is required"));
        }
        if self.chats.fallback_chat_id.trim().is_empty() {
            return Err(anyhow::anyhow!("chats.fallback_chat_id is required"));
        }
        Ok(())
    }

    pub fn audit_chat_id(&self) -> &str {
        self.chats
            .audit_chat_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.chats.notification_chat_id)
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".approvegate").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn defaults_cover_every_section() {
        let cfg: AppConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.backend.approval_endpoint.contains("handle_approval_message"));
        assert_eq!(cfg.audit_chat_id(), cfg.chats.notification_chat_id);
        assert_eq!(cfg.retention.context_max_age_hours, 168);
    }

    #[test]
    fn partial_files_override_only_what_they_name() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [chats]
            notification_chat_id = "ops@g.us"
            audit_chat_id = "audit@g.us"
            "#,
        )
        .expect("should parse");
        assert_eq!(cfg.chats.notification_chat_id, "ops@g.us");
        assert_eq!(cfg.audit_chat_id(), "audit@g.us");
        assert_eq!(cfg.server.port, 3000);
    }
}
