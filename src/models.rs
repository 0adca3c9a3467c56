use serde::{Deserialize, Serialize};

/// Terminal state of the test step as reported by the CI platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
    Cancelled,
    Skipped,
    Unknown,
}

impl RunOutcome {
    /// Absent, empty or unrecognized values map to `Unknown`.
    pub fn from_input(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("success") => Self::Success,
            Some("failure") => Self::Failure,
            Some("cancelled") => Self::Cancelled,
            Some("skipped") => Self::Skipped,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub ran: bool,
    pub total_failed: usize,
    pub failed_identifiers: Vec<String>,
    pub total_tests: usize,
    pub total_skipped: usize,
}

impl TestSummary {
    pub fn not_run() -> Self {
        Self::default()
    }

    pub fn has_failures(&self) -> bool {
        self.total_failed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    #[serde(rename = "text")]
    pub headline: String,
    #[serde(rename = "blocks")]
    pub detail_blocks: Vec<Block>,
}

/// Subset of Slack Block Kit used by the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    Section { text: TextObject },
    Divider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Markdown { text: String },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Self::Header {
            text: TextObject::Plain { text: text.into() },
        }
    }

    pub fn section(text: impl Into<String>) -> Self {
        Self::Section {
            text: TextObject::Markdown { text: text.into() },
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Header { text } | Self::Section { text } => match text {
                TextObject::Plain { text } | TextObject::Markdown { text } => Some(text.as_str()),
            },
            Self::Divider => None,
        }
    }
}

pub const TICKET_STATUS: &str = "BLOCKING";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRequest {
    #[serde(rename = "name")]
    pub title: String,
    pub status: &'static str,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TicketHandle {
    pub id: String,
}

/// Job identity resolved from the CI environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub job_name: String,
    pub run_url: String,
}
