use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::info;

/// Channel used when no mail relay is configured: every message is logged
/// and reported as delivered.
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        info!(recipient = %recipient, subject = %subject, body_len = html_body.len(), "Notification (log only)");
        Ok(())
    }
}
