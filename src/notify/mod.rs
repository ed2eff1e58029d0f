// src/notify/mod.rs
pub mod desktop;
pub mod email;

use anyhow::Result;

use crate::config::NotifyConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub title: String,
    pub message: String,
}

impl NotificationEvent {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, ev: &NotificationEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fans an event out to every channel. Fire-and-forget: a failing channel is
/// logged and never reported back to the caller.
#[derive(Default)]
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Box<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Desktop when enabled; email when SMTP env vars are present.
    pub fn from_config(cfg: &NotifyConfig) -> Self {
        let mut mux = Self::new();
        if cfg.desktop {
            mux = mux.with(Box::new(desktop::DesktopNotifier::new()));
        }
        match email::EmailNotifier::from_env(cfg.email_to.as_deref()) {
            Ok(Some(mailer)) => mux = mux.with(Box::new(mailer)),
            Ok(None) => tracing::debug!(target: "notify", "email disabled (no SMTP_HOST)"),
            Err(e) => tracing::warn!(target: "notify", error = %format!("{e:#}"), "email disabled"),
        }
        mux
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub async fn notify(&self, ev: &NotificationEvent) {
        tracing::info!(target: "notify", title = %ev.title, message = %ev.message, "notification");
        for ch in &self.channels {
            if let Err(e) = ch.send(ev).await {
                tracing::warn!(target: "notify", channel = ch.name(), error = %format!("{e:#}"), "notification failed");
            }
        }
    }
}
