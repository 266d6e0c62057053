//! [`HttpClient`] over `reqwest`.

use crate::config::ClientConfig;
use crate::error::{ConfigError, HttpError};
use crate::http::{CancelSignal, HttpClient, HttpRequest, HttpResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use super_api_core::Method;

/// JSON-over-HTTP transport.
///
/// Relative endpoint URLs are joined onto the call's `base_url` option, or
/// the configured base URL when the call has none. Bodies are decoded as
/// JSON; a body that is not JSON is kept as a JSON string and an empty body
/// becomes `null`.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: Client,
    config: ClientConfig,
}

impl ReqwestClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Wrap an existing `reqwest` client
    #[must_use]
    pub const fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// Transport configuration
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn absolute_url(&self, request: &HttpRequest) -> String {
        let base = request
            .options
            .base_url
            .as_deref()
            .or(self.config.base_url.as_deref());
        match base {
            Some(base) if !request.url.contains("://") => join_url(base, &request.url),
            _ => request.url.clone(),
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = self.absolute_url(&request);
        let mut builder = self.client.request(to_reqwest_method(request.method), &url);

        for (name, value) in &request.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.options.query.is_empty() {
            builder = builder.query(&request.options.query);
        }
        if let Some(timeout) = request.options.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(payload) = &request.payload {
            if request.method.has_body() {
                builder = builder.json(payload);
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::transport(e.to_string()))?;
        let data = decode_body(&text);

        if status.is_success() {
            Ok(HttpResponse {
                status: status.as_u16(),
                data,
            })
        } else {
            Err(HttpError::Response {
                status: status.as_u16(),
                body: data,
            })
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn request(
        &self,
        request: HttpRequest,
        cancel: CancelSignal,
    ) -> Result<HttpResponse, HttpError> {
        // Dropping the reqwest future aborts the connection
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(HttpError::Cancelled),
            result = self.send(request) => result,
        }
    }
}

/// `reqwest` verb for a [`Method`]
#[must_use]
pub fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn join_url(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) if !path.is_empty() => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://swapi.dev", "/api/people/"), "https://swapi.dev/api/people/");
        assert_eq!(join_url("https://swapi.dev/", "/api/people/"), "https://swapi.dev/api/people/");
        assert_eq!(join_url("https://swapi.dev", "api"), "https://swapi.dev/api");
        assert_eq!(join_url("https://swapi.dev/", ""), "https://swapi.dev/");
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(decode_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn test_method_mapping() {
        for method in Method::ALL {
            assert_eq!(to_reqwest_method(method).as_str(), method.as_str().to_ascii_uppercase());
        }
    }
}
