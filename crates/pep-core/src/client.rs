//! Remote decision client for the Keyrock policy decision point
//!
//! Issues a single GET per decision. Any outcome other than an explicit
//! `Permit` in a 200 response is a denial; transport and protocol failures
//! are kept apart as `Indeterminate` for logging only.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Decision value that grants access
pub const PERMIT: &str = "Permit";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid authorization endpoint {address}: {source}")]
    InvalidEndpoint {
        address: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to send authorization request: {0}")]
    Send(#[source] BoxError),
    #[error("authorization endpoint returned status {0}")]
    Status(u16),
    #[error("invalid authorization response body: {0}")]
    Body(#[from] serde_json::Error),
}

/// Outcome of a single decision query
#[derive(Debug)]
pub enum RemoteDecision {
    Permit,
    /// Valid response carrying any decision other than `Permit`
    Deny { decision: String },
    /// No usable answer; treated as a denial
    Indeterminate(Error),
}

impl RemoteDecision {
    pub fn is_permit(&self) -> bool {
        matches!(self, RemoteDecision::Permit)
    }
}

/// Raw response from the transport layer
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends a fully built decision query
#[async_trait]
pub trait DecisionTransport: Send + Sync {
    async fn send(&self, url: Url) -> Result<TransportResponse, Error>;
}

/// Production transport over a shared `reqwest` client
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    /// Bound each decision call; an elapsed timeout is a send failure
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DecisionTransport for ReqwestTransport {
    async fn send(&self, url: Url) -> Result<TransportResponse, Error> {
        let mut req = self.http.get(url);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let resp = req.send().await.map_err(|e| Error::Send(e.into()))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| Error::Send(e.into()))?;
        Ok(TransportResponse { status, body })
    }
}

#[derive(Deserialize, Default)]
struct KeyrockResponse {
    // a missing field is a plain deny, not a protocol error
    #[serde(default)]
    authorization_decision: String,
}

/// Client for the Keyrock decision endpoint
#[derive(Clone)]
pub struct KeyrockClient {
    endpoint_address: String,
    application_id: String,
    transport: Arc<dyn DecisionTransport>,
}

impl KeyrockClient {
    pub fn new(
        endpoint_address: impl Into<String>,
        application_id: impl Into<String>,
        transport: Arc<dyn DecisionTransport>,
    ) -> Self {
        Self {
            endpoint_address: endpoint_address.into(),
            application_id: application_id.into(),
            transport,
        }
    }

    pub fn endpoint_address(&self) -> &str {
        &self.endpoint_address
    }

    /// Build the decision query URL
    ///
    /// Parameters are appended to any query already on the endpoint address.
    pub fn query_url(&self, method: &str, path: &str, token: &str) -> Result<Url, Error> {
        let mut url =
            Url::parse(&self.endpoint_address).map_err(|source| Error::InvalidEndpoint {
                address: self.endpoint_address.clone(),
                source,
            })?;
        url.query_pairs_mut()
            .append_pair("action", method)
            .append_pair("resource", path)
            .append_pair("access_token", token)
            .append_pair("app-id", &self.application_id);
        Ok(url)
    }

    /// Ask the decision point whether `method` on `path` is allowed for `token`
    ///
    /// Never retries: a failed attempt is `Indeterminate` for this request.
    pub async fn authorize(&self, method: &str, path: &str, token: &str) -> RemoteDecision {
        match self.query(method, path, token).await {
            Ok(decision) => decision,
            Err(e) => RemoteDecision::Indeterminate(e),
        }
    }

    async fn query(&self, method: &str, path: &str, token: &str) -> Result<RemoteDecision, Error> {
        let url = self.query_url(method, path, token)?;
        let resp = self.transport.send(url).await?;
        if resp.status != 200 {
            return Err(Error::Status(resp.status));
        }
        // `null` carries no decision, same as a missing field
        let body: KeyrockResponse =
            serde_json::from_slice::<Option<KeyrockResponse>>(&resp.body)?.unwrap_or_default();
        if body.authorization_decision == PERMIT {
            Ok(RemoteDecision::Permit)
        } else {
            Ok(RemoteDecision::Deny {
                decision: body.authorization_decision,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;

    fn client(transport: Arc<ScriptedTransport>) -> KeyrockClient {
        KeyrockClient::new("http://keyrock.local/user", "app-1", transport)
    }

    #[test]
    fn test_query_url_parameters() {
        let c = client(ScriptedTransport::permit());
        let url = c.query_url("GET", "/orders", "tok 1&x").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/user");
        assert_eq!(
            pairs,
            vec![
                ("action".to_string(), "GET".to_string()),
                ("resource".to_string(), "/orders".to_string()),
                ("access_token".to_string(), "tok 1&x".to_string()),
                ("app-id".to_string(), "app-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_url_keeps_existing_query() {
        let c = KeyrockClient::new(
            "http://keyrock.local/user?tenant=a",
            "app-1",
            ScriptedTransport::permit(),
        );
        let url = c.query_url("GET", "/", "t").unwrap();
        assert_eq!(url.query_pairs().next().unwrap().0, "tenant");
        assert_eq!(url.query_pairs().count(), 5);
    }

    #[tokio::test]
    async fn test_permit() {
        let transport = ScriptedTransport::permit();
        let decision = client(transport.clone()).authorize("GET", "/orders", "tok1").await;

        assert!(decision.is_permit());
        assert_eq!(transport.calls(), 1);
        let url = transport.last_url().unwrap();
        assert!(url.as_str().contains("access_token=tok1"));
    }

    #[tokio::test]
    async fn test_other_decision_is_deny() {
        let transport = ScriptedTransport::decision("Deny");
        let decision = client(transport).authorize("GET", "/orders", "tok1").await;

        match decision {
            RemoteDecision::Deny { decision } => assert_eq!(decision, "Deny"),
            other => panic!("Expected Deny, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decision_is_case_sensitive() {
        let transport = ScriptedTransport::decision("permit");
        let decision = client(transport).authorize("GET", "/", "t").await;
        assert!(matches!(decision, RemoteDecision::Deny { .. }));
    }

    #[tokio::test]
    async fn test_missing_field_is_deny() {
        let transport = ScriptedTransport::respond(200, "{}");
        let decision = client(transport).authorize("GET", "/", "t").await;
        assert!(matches!(decision, RemoteDecision::Deny { decision } if decision.is_empty()));
    }

    #[tokio::test]
    async fn test_null_body_is_deny() {
        let transport = ScriptedTransport::respond(200, "null");
        let decision = client(transport).authorize("GET", "/", "t").await;
        assert!(matches!(decision, RemoteDecision::Deny { decision } if decision.is_empty()));
    }

    #[tokio::test]
    async fn test_non_200_is_indeterminate() {
        for status in [201, 204, 401, 403, 500, 503] {
            let transport = ScriptedTransport::respond(status, r#"{"authorization_decision":"Permit"}"#);
            let decision = client(transport).authorize("GET", "/", "t").await;
            assert!(
                matches!(decision, RemoteDecision::Indeterminate(Error::Status(s)) if s == status),
                "status {status}"
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_indeterminate() {
        let transport = ScriptedTransport::respond(200, "<html>oops</html>");
        let decision = client(transport).authorize("GET", "/", "t").await;
        assert!(matches!(decision, RemoteDecision::Indeterminate(Error::Body(_))));
    }

    #[tokio::test]
    async fn test_send_failure_is_indeterminate() {
        let transport = ScriptedTransport::unreachable();
        let decision = client(transport).authorize("GET", "/", "t").await;
        assert!(matches!(decision, RemoteDecision::Indeterminate(Error::Send(_))));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_skips_transport() {
        let transport = ScriptedTransport::permit();
        let c = KeyrockClient::new("not a url", "app-1", transport.clone());
        let decision = c.authorize("GET", "/", "t").await;

        assert!(matches!(
            decision,
            RemoteDecision::Indeterminate(Error::InvalidEndpoint { .. })
        ));
        assert_eq!(transport.calls(), 0);
    }
}
