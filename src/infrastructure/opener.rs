use crate::domain::ports::{RedirectOpener, RedirectOutcome};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Opens payment pages by handing the URL to an external program (`xdg-open`,
/// `open`, a browser binary).
///
/// A program that cannot be started or exits unsuccessfully is reported as a
/// blocked redirect.
#[derive(Debug, Clone)]
pub struct CommandOpener {
    program: String,
}

impl CommandOpener {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl RedirectOpener for CommandOpener {
    async fn open(&self, url: &str) -> RedirectOutcome {
        match Command::new(&self.program).arg(url).status().await {
            Ok(status) if status.success() => {
                debug!(program = %self.program, "Opened payment page");
                RedirectOutcome::Opened
            }
            Ok(status) => {
                warn!(program = %self.program, %status, "Opener exited unsuccessfully");
                RedirectOutcome::Blocked {
                    payment_url: url.to_string(),
                }
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "Could not start opener");
                RedirectOutcome::Blocked {
                    payment_url: url.to_string(),
                }
            }
        }
    }
}
