use std::path::PathBuf;

use url::Url;

use crate::auth::Token;
use crate::models::{RunContext, RunOutcome};

/// Everything the pipeline needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub outcome: RunOutcome,
    pub webhook_url: String,
    pub report_path: Option<PathBuf>,
    pub run: RunContext,
    pub ticketing: TicketConfig,
}

#[derive(Debug, Clone)]
pub struct TicketConfig {
    pub enabled: bool,
    pub token: Option<Token>,
    pub list_id: Option<String>,
    pub upload_report: bool,
    pub report_path: Option<PathBuf>,
    pub api_url: Url,
}

/// Action inputs are free-form strings; only `true` switches a feature on.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

pub fn run_url(server_url: &str, repository: Option<&str>, run_id: Option<&str>) -> String {
    format!(
        "{}/{}/actions/runs/{}",
        server_url.trim_end_matches('/'),
        repository.unwrap_or("undefined"),
        run_id.unwrap_or("undefined")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" TRUE ")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_run_url() {
        assert_eq!(
            run_url("https://github.com/", Some("acme/shop"), Some("123")),
            "https://github.com/acme/shop/actions/runs/123"
        );
        assert_eq!(
            run_url("https://github.com", None, None),
            "https://github.com/undefined/actions/runs/undefined"
        );
    }
}
