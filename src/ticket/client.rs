use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::auth::Token;
use crate::error::{NotifierError, Result};
use crate::models::{TicketHandle, TicketRequest};

pub const DEFAULT_API_URL: &str = "https://api.clickup.com/api/v2/";

pub struct ClickUpClient {
    client: Client,
    api_url: Url,
    headers: HeaderMap,
}

/// Response of an attachment upload, kept raw so the caller can log it.
#[derive(Debug)]
pub struct AttachmentReceipt {
    pub status: StatusCode,
    pub body: String,
}

/// Headers for a multipart request: the JSON content type of `base` must not
/// leak into it, reqwest sets the boundary type itself.
pub fn attachment_headers(base: &HeaderMap) -> HeaderMap {
    base.iter()
        .filter(|(name, _)| **name != CONTENT_TYPE)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

impl ClickUpClient {
    pub fn new(api_url: &Url, token: &Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ci-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifierError::Config(format!("Failed to create HTTP client: {e}")))?;

        // ClickUp personal tokens are sent as-is, without a scheme.
        let mut authorization = HeaderValue::from_str(token.as_str())
            .map_err(|_| NotifierError::Config("Ticketing token is not a valid header".into()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut api_url = api_url.clone();
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client,
            api_url,
            headers,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| NotifierError::Config(format!("Invalid ClickUp URL: {e}")))
    }

    pub async fn create_task(&self, list_id: &str, request: &TicketRequest) -> Result<TicketHandle> {
        let url = self.endpoint(&format!("list/{}/task", urlencoding::encode(list_id)))?;

        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Api(format!(
                "Task creation returned {status}: {body}"
            )));
        }

        Ok(response.json::<TicketHandle>().await?)
    }

    pub async fn add_attachment(
        &self,
        task: &TicketHandle,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<AttachmentReceipt> {
        let url = self.endpoint(&format!("task/{}/attachment", urlencoding::encode(&task.id)))?;

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/gzip")?;
        let form = Form::new().part("attachment", part);

        let response = self
            .client
            .post(url)
            .headers(attachment_headers(&self.headers))
            .multipart(form)
            .send()
            .await?;

        Ok(AttachmentReceipt {
            status: response.status(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}
