use chrono::{Local, NaiveDate};
use log::{error, info};

use super::attachment::{AttachmentUploader, UploadOutcome};
use super::client::ClickUpClient;
use crate::config::TicketConfig;
use crate::models::{TestSummary, TicketHandle, TicketRequest, TICKET_STATUS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingCredentials,
    NoFailures,
}

/// Where a ticketing attempt ended. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Skipped(SkipReason),
    Created {
        task: TicketHandle,
        upload: Option<UploadOutcome>,
    },
    Failed,
}

pub fn ticket_request(summary: &TestSummary, run_url: &str, date: NaiveDate) -> TicketRequest {
    TicketRequest {
        title: format!("Release blocked on {}", date.format("%Y-%m-%d")),
        status: TICKET_STATUS,
        description: format!("{run_url}\n{}", summary.failed_identifiers.join("\n")),
    }
}

/// File a blocking task for a failed run and, if configured, attach the
/// compressed report to it. Errors never escape this function.
pub async fn notify(summary: &TestSummary, run_url: &str, config: &TicketConfig) -> NotifyOutcome {
    let token = config.token.as_ref().filter(|token| !token.is_empty());
    let list_id = config
        .list_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let (Some(token), Some(list_id)) = (token, list_id) else {
        error!("Ticketing token or list id was not provided, skipping ticket creation");
        return NotifyOutcome::Skipped(SkipReason::MissingCredentials);
    };

    if !summary.has_failures() {
        info!("No failed tests, skipping ticket creation");
        return NotifyOutcome::Skipped(SkipReason::NoFailures);
    }

    let client = match ClickUpClient::new(&config.api_url, token) {
        Ok(client) => client,
        Err(e) => {
            error!("Ticket creation failed: {e}");
            return NotifyOutcome::Failed;
        }
    };

    let request = ticket_request(summary, run_url, Local::now().date_naive());
    let task = match client.create_task(list_id, &request).await {
        Ok(task) => task,
        Err(e) => {
            error!("Ticket creation failed: {e}");
            return NotifyOutcome::Failed;
        }
    };
    info!(
        "Created ticket {} for {} failed test(s)",
        task.id, summary.total_failed
    );

    let upload = if !config.upload_report {
        None
    } else if let Some(report_path) = &config.report_path {
        Some(AttachmentUploader::new(&client).upload(report_path, &task).await)
    } else {
        error!("Report upload requested but no report path was provided");
        Some(UploadOutcome::MissingReport)
    };

    NotifyOutcome::Created { task, upload }
}
