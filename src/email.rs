use color_eyre::Result;
use serde::Serialize;

use crate::services::auth::EmailSender;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const FROM_ADDRESS: &str = "EduConnect <noreply@educonnect.app>";

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

/// Sends transactional email through the Resend API. Without an API key
/// sending is disabled and sign-ups are confirmed immediately.
#[derive(Clone)]
pub struct ResendEmailSender {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl ResendEmailSender {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    async fn send(&self, request: &SendEmailRequest) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            color_eyre::eyre::bail!("email sending is not configured");
        };

        let resp = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("Resend API error: {status} - {text}");
            color_eyre::eyre::bail!("Resend API returned {status}");
        }

        Ok(())
    }
}

impl EmailSender for ResendEmailSender {
    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send_verification_email(&self, to_email: &str, verification_url: &str) -> Result<()> {
        let body = SendEmailRequest {
            from: FROM_ADDRESS.to_string(),
            to: vec![to_email.to_string()],
            subject: "Confirm your EduConnect account".to_string(),
            html: format!(
                r#"<h2>Welcome to EduConnect!</h2>
<p>Click the link below to confirm your email address:</p>
<p><a href="{verification_url}">{verification_url}</a></p>
<p>This link expires in 24 hours.</p>"#
            ),
        };

        self.send(&body).await?;

        tracing::info!("verification email sent to {to_email}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_disables_sending() {
        assert!(!ResendEmailSender::new(None).is_enabled());
        assert!(!ResendEmailSender::new(Some(String::new())).is_enabled());
        assert!(ResendEmailSender::new(Some("re_123".to_string())).is_enabled());
    }

    #[tokio::test]
    async fn sending_without_key_fails_fast() {
        let sender = ResendEmailSender::new(None);
        let result = sender
            .send_verification_email("a@b.com", "http://localhost/verify-email/x")
            .await;
        assert!(result.is_err());
    }
}
