use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use url::Url;

use crate::auth::Token;
use crate::chat::SlackWebhook;
use crate::config::{parse_flag, run_url, Config, TicketConfig};
use crate::error::NotifierError;
use crate::models::{RunContext, RunOutcome};
use crate::pipeline;
use crate::ticket::DEFAULT_API_URL;

/// Each option is taken from its flag, then from the matching GitHub Action
/// input, then from the plain environment variable named in its help.
#[derive(Parser)]
#[command(name = "ci-notify")]
#[command(author, version, about = "Report CI test results to Slack and ClickUp", long_about = None)]
pub struct Cli {
    /// Outcome of the test step: success, failure, cancelled or skipped [fallback: TEST_STEP_OUTCOME]
    #[arg(long, env = "INPUT_TEST-STEP-OUTCOME")]
    outcome: Option<String>,

    /// Slack incoming webhook URL [fallback: SLACK_WEBHOOK_URL]
    #[arg(long, env = "INPUT_SLACK-WEBHOOK-URL")]
    webhook_url: Option<String>,

    /// JUnit report file or directory, relative to the workspace [fallback: TEST_OUTPUT_FILE]
    #[arg(long, env = "INPUT_DIRECTORY-PATH")]
    report_path: Option<String>,

    /// Create a ClickUp task when the step failed ("true" to enable) [fallback: CLICKUP_CREATE_TASK]
    #[arg(long, env = "INPUT_CLICKUP-CREATE-TASK")]
    create_ticket: Option<String>,

    /// ClickUp API token [fallback: CLICKUP_TOKEN]
    #[arg(long, env = "INPUT_CLICKUP-TOKEN", hide_env_values = true)]
    clickup_token: Option<String>,

    /// ClickUp list that receives the task [fallback: CLICKUP_LIST_ID]
    #[arg(long, env = "INPUT_CLICKUP-LIST-ID")]
    list_id: Option<String>,

    /// Attach the compressed report to the task ("true" to enable) [fallback: CLICKUP_UPLOAD_REPORT]
    #[arg(long, env = "INPUT_CLICKUP-UPLOAD-REPORT")]
    upload_report: Option<String>,

    /// ClickUp API base URL
    #[arg(long, env = "CLICKUP_API_URL", default_value = DEFAULT_API_URL)]
    clickup_api_url: String,

    /// Name shown in the message headline
    #[arg(long, env = "GITHUB_WORKFLOW")]
    job_name: Option<String>,

    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    server_url: String,

    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    #[arg(long, env = "GITHUB_RUN_ID")]
    run_id: Option<String>,

    /// Base directory for a relative report path
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = self.resolve(|key| std::env::var(key).ok())?;
        info!(
            "Reporting {:?} outcome for {}",
            config.outcome, config.run.job_name
        );

        let webhook = SlackWebhook::new(&config.webhook_url)?;
        pipeline::run(config, &webhook).await?;

        Ok(())
    }

    /// Build the pipeline configuration. `env` looks up the fallback
    /// environment variables.
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let pick = |value: &Option<String>, fallback: &str| {
            non_empty(value.clone()).or_else(|| non_empty(env(fallback)))
        };

        let outcome = RunOutcome::from_input(pick(&self.outcome, "TEST_STEP_OUTCOME").as_deref());
        let webhook_url = pick(&self.webhook_url, "SLACK_WEBHOOK_URL").ok_or_else(|| {
            NotifierError::Config(
                "Slack webhook URL is required (--webhook-url or SLACK_WEBHOOK_URL)".to_string(),
            )
        })?;
        let report_path =
            pick(&self.report_path, "TEST_OUTPUT_FILE").map(|path| self.workspace_path(&path));

        let api_url = Url::parse(&self.clickup_api_url)
            .map_err(|e| NotifierError::Config(format!("Invalid ClickUp API URL: {e}")))?;
        let ticketing = TicketConfig {
            enabled: parse_flag(pick(&self.create_ticket, "CLICKUP_CREATE_TASK").as_deref()),
            token: pick(&self.clickup_token, "CLICKUP_TOKEN").map(|t| Token::from(t.as_str())),
            list_id: pick(&self.list_id, "CLICKUP_LIST_ID"),
            upload_report: parse_flag(pick(&self.upload_report, "CLICKUP_UPLOAD_REPORT").as_deref()),
            report_path: report_path.clone(),
            api_url,
        };

        let run = RunContext {
            job_name: non_empty(self.job_name.clone()).unwrap_or_else(|| "undefined".to_string()),
            run_url: run_url(
                &self.server_url,
                non_empty(self.repository.clone()).as_deref(),
                non_empty(self.run_id.clone()).as_deref(),
            ),
        };

        debug!("Resolved ticketing configuration: {ticketing:?}");

        Ok(Config {
            outcome,
            webhook_url,
            report_path,
            run,
            ticketing,
        })
    }

    fn workspace_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path.trim());
        match &self.workspace {
            Some(workspace) if path.is_relative() => workspace.join(path),
            _ => path.to_path_buf(),
        }
    }
}
