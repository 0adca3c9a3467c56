use log::{debug, info};

use crate::chat::ChatSink;
use crate::config::Config;
use crate::error::Result;
use crate::message;
use crate::models::{RunOutcome, TestSummary};
use crate::report;
use crate::ticket::{self, NotifyOutcome};

/// Parse the report, announce the result, then file a ticket for failed runs.
///
/// Only a failure to deliver the chat message is returned as an error;
/// ticketing problems are logged and reported through the outcome.
pub async fn run(config: Config, chat: &dyn ChatSink) -> Result<Option<NotifyOutcome>> {
    let summary = match &config.report_path {
        Some(path) => report::parse(path),
        None => {
            info!("No report path configured");
            TestSummary::not_run()
        }
    };

    let message = message::build(config.outcome, &summary, &config.run);
    chat.send(&message).await?;

    if !config.ticketing.enabled || config.outcome != RunOutcome::Failure {
        debug!(
            "Ticketing not requested (enabled={}, outcome={:?})",
            config.ticketing.enabled, config.outcome
        );
        return Ok(None);
    }

    let outcome = ticket::notify(&summary, &config.run.run_url, &config.ticketing).await;
    debug!("Ticketing finished: {outcome:?}");
    Ok(Some(outcome))
}
