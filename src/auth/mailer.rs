//! Outbound Email
//! Mission: Deliver account emails through a narrow relay interface

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};

/// Sends account email through an HTTP mail relay. When no relay is
/// configured the message is logged instead, which is the development
/// behavior.
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    relay_url: Option<String>,
    from_address: String,
}

impl Mailer {
    pub fn new(http: reqwest::Client, relay_url: Option<String>, from_address: String) -> Self {
        Self {
            http,
            relay_url,
            from_address,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(url) = &self.relay_url else {
            info!("📧 [mail relay not configured] to={} subject={:?}", to, subject);
            debug!("Undelivered mail body: {}", body);
            return Ok(());
        };

        let payload = json!({
            "from": self.from_address,
            "to": to,
            "subject": subject,
            "body": body,
        });

        let resp = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("Mail relay request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Mail relay returned {}", resp.status());
        }

        debug!("Delivered mail to {} via relay", to);
        Ok(())
    }
}
