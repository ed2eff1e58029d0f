use anyhow::{bail, Context, Result};
use tokio::process::Command;

use super::{NotificationEvent, Notifier};

/// `osascript` on macOS, `notify-send` elsewhere.
pub struct DesktopNotifier {
    program: &'static str,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        let program = if cfg!(target_os = "macos") {
            "osascript"
        } else {
            "notify-send"
        };
        Self { program }
    }

    fn command(&self, ev: &NotificationEvent) -> Command {
        let mut cmd = Command::new(self.program);
        if self.program == "osascript" {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(&ev.message),
                escape_applescript(&ev.title)
            );
            cmd.arg("-e").arg(script);
        } else {
            cmd.arg(&ev.title).arg(&ev.message);
        }
        cmd
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let status = self
            .command(ev)
            .status()
            .await
            .with_context(|| format!("spawning {}", self.program))?;
        if !status.success() {
            bail!("{} exited with {status}", self.program);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "desktop"
    }
}
