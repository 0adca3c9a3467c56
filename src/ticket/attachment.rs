use std::io;
use std::path::Path;

use log::{error, info};
use reqwest::StatusCode;

use super::client::{AttachmentReceipt, ClickUpClient};
use crate::archive;
use crate::error::{NotifierError, Result};
use crate::models::TicketHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Rejected { status: StatusCode },
    Failed,
    MissingReport,
}

/// Compresses a report and attaches it to an existing task.
pub struct AttachmentUploader<'a> {
    client: &'a ClickUpClient,
}

impl<'a> AttachmentUploader<'a> {
    pub fn new(client: &'a ClickUpClient) -> Self {
        Self { client }
    }

    /// Best effort: every failure ends up in the log and the returned outcome.
    pub async fn upload(&self, report_path: &Path, task: &TicketHandle) -> UploadOutcome {
        match self.compress_and_send(report_path, task).await {
            Ok(receipt) if receipt.status == StatusCode::OK => {
                info!("Report upload successful");
                UploadOutcome::Uploaded
            }
            Ok(receipt) => {
                error!(
                    "Report upload failed with status {}: {}",
                    receipt.status, receipt.body
                );
                UploadOutcome::Rejected {
                    status: receipt.status,
                }
            }
            Err(e) => {
                error!("Report upload failed for {}: {e}", report_path.display());
                UploadOutcome::Failed
            }
        }
    }

    async fn compress_and_send(
        &self,
        report_path: &Path,
        task: &TicketHandle,
    ) -> Result<AttachmentReceipt> {
        let source = report_path.to_path_buf();
        let archive = tokio::task::spawn_blocking(move || archive::compress(&source))
            .await
            .map_err(|e| NotifierError::Io(io::Error::other(e)))??;
        info!("Report compressed successfully");

        let bytes = tokio::fs::read(archive.path()).await?;

        info!("Attempting report upload to task {}", task.id);
        self.client
            .add_attachment(task, archive.file_name().to_string(), bytes)
            .await
    }
}
