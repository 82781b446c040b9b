//! Outgoing mail seam.
//!
//! Only the password-reset message is sent. Delivery is behind [`Mailer`];
//! the default [`LogMailer`] records the message through `tracing` instead of
//! opening an SMTP connection.

use async_trait::async_trait;

use crate::config::EmailConfig;
use crate::error::ApiResult;

pub const PASSWORD_RESET_SUBJECT: &str = "Reetro password reset";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, subject: &str, password: &str) -> ApiResult<()>;
}

/// Mailer that logs instead of delivering. The password itself is not logged.
#[derive(Debug, Clone)]
pub struct LogMailer {
    config: EmailConfig,
}

impl LogMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, subject: &str, password: &str) -> ApiResult<()> {
        tracing::info!(
            from = %self.config.from,
            smtp_host = %self.config.host,
            smtp_port = self.config.port,
            %to,
            %subject,
            password_len = password.len(),
            "password reset email queued"
        );
        Ok(())
    }
}
