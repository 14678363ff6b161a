use thiserror::Error;

use crate::config::CloudConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait HttpTransport {
    fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub struct CloudClient<T> {
    config: CloudConfig,
    transport: T,
}

impl<T: HttpTransport> CloudClient<T> {
    pub fn new(config: CloudConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn update_url(&self, key: &str, value: &str) -> String {
        format!(
            "{}?token={}&{}={}",
            self.config.update_url,
            urlencoding::encode(&self.config.auth_token),
            urlencoding::encode(key),
            urlencoding::encode(value)
        )
    }

    pub fn fetch_url(&self, key: &str) -> String {
        format!(
            "{}?token={}&{}",
            self.config.get_url,
            urlencoding::encode(&self.config.auth_token),
            urlencoding::encode(key)
        )
    }

    pub fn send(&mut self, key: &str, value: &str) -> Result<(), CloudError> {
        let url = self.update_url(key, value);
        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(CloudError::Rejected {
                status: response.status,
                body: response.body.trim().to_string(),
            });
        }
        Ok(())
    }

    pub fn fetch(&mut self, key: &str) -> Result<Option<String>, CloudError> {
        let url = self.fetch_url(key);
        let response = self.transport.get(&url)?;
        if !response.is_success() {
            log::debug!("fetch of {key} returned HTTP {}", response.status);
            return Ok(None);
        }
        Ok(parse_fetch_body(&response.body, &self.config.error_marker))
    }
}

pub fn parse_fetch_body(body: &str, error_marker: &str) -> Option<String> {
    let text = body.trim();
    if text.is_empty() || text.contains(error_marker) {
        return None;
    }
    Some(text.to_string())
}
