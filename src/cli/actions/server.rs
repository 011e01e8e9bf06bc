use crate::cli::actions::Action;
use crate::konto;
use crate::konto::email::{LogMailer, Mailer, SmtpMailer};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Handle the server action
///
/// # Errors
///
/// Returns an error if the mailer configuration is invalid or the server
/// fails to start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            smtp_url,
            mail_from,
            require_activation,
        } => {
            let mailer: Arc<dyn Mailer> = match smtp_url {
                Some(url) => Arc::new(SmtpMailer::new(&url, &mail_from)?),
                None => {
                    warn!("no --smtp-url configured, activation mail will only be logged");
                    Arc::new(LogMailer)
                }
            };

            konto::new(port, &dsn, mailer, require_activation).await?;
        }
    }

    Ok(())
}
