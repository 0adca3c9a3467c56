use async_trait::async_trait;
use log::info;
use reqwest::Client;
use url::Url;

use crate::error::{NotifierError, Result};
use crate::models::NotificationMessage;

#[async_trait]
pub trait ChatSink {
    async fn send(&self, message: &NotificationMessage) -> Result<()>;
}

/// Slack incoming webhook.
pub struct SlackWebhook {
    client: Client,
    url: Url,
}

impl SlackWebhook {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ci-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifierError::Config(format!("Failed to create HTTP client: {e}")))?;

        let url = Url::parse(webhook_url)
            .map_err(|e| NotifierError::Config(format!("Invalid webhook URL: {e}")))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl ChatSink for SlackWebhook {
    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Api(format!(
                "Webhook rejected message with status {status}: {body}"
            )));
        }

        info!("Chat notification sent: {}", message.headline);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Block;
    use mockito::Matcher;
    use serde_json::json;

    fn message() -> NotificationMessage {
        NotificationMessage {
            headline: "CI - Failed".to_string(),
            detail_blocks: vec![Block::section("SuiteA.testX")],
        }
    }

    #[tokio::test]
    async fn test_send_posts_slack_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/services/T000/B000/XXX")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "text": "CI - Failed",
                "blocks": [
                    {"type": "section", "text": {"type": "mrkdwn", "text": "SuiteA.testX"}}
                ]
            })))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let webhook = SlackWebhook::new(&format!("{}/services/T000/B000/XXX", server.url())).unwrap();
        webhook.send(&message()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_reports_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(404)
            .with_body("no_service")
            .create_async()
            .await;

        let webhook = SlackWebhook::new(&format!("{}/hook", server.url())).unwrap();
        let err = webhook.send(&message()).await.unwrap_err();

        assert!(matches!(err, NotifierError::Api(ref m) if m.contains("no_service")));
    }

    #[test]
    fn test_invalid_webhook_url_is_config_error() {
        let err = SlackWebhook::new("not a url").err().unwrap();

        assert!(matches!(err, NotifierError::Config(_)));
    }
}
