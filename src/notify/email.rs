use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{NotificationEvent, Notifier};

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} missing"))
}

impl EmailNotifier {
    /// `Ok(None)` when `SMTP_HOST` is unset (email off). Once it is set, the
    /// remaining variables are required. `recipient` overrides `NOTIFY_EMAIL_TO`.
    pub fn from_env(recipient: Option<&str>) -> Result<Option<Self>> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };
        let user = env_required("SMTP_USER")?;
        let pass = env_required("SMTP_PASS")?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").unwrap_or_else(|_| user.clone());
        let to_addr = match recipient {
            Some(r) => r.to_string(),
            None => env_required("NOTIFY_EMAIL_TO")?,
        };

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .with_context(|| format!("invalid SMTP_HOST {host}"))?
            .credentials(Credentials::new(user, pass))
            .build();

        let from: Mailbox = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to: Mailbox = to_addr.parse().context("invalid email recipient")?;

        Ok(Some(Self { mailer, from, to }))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(ev.title.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(ev.message.clone())
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(target: "notify", to = %self.to, "notification email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
