//! `Host` implementation over `http::Request`

use http::header::{HeaderName, HeaderValue};
use http::{Request, Response, StatusCode};
use pep_core::{Host, HostError};
use std::collections::HashMap;

/// Adapts a borrowed request to the access controller's host seam
///
/// `exit` does not send anything; it records the response for the caller
/// to return instead of forwarding the request.
pub struct HttpHost<'a, B> {
    req: &'a Request<B>,
    response: Option<Response<String>>,
}

impl<'a, B> HttpHost<'a, B> {
    pub fn new(req: &'a Request<B>) -> Self {
        Self {
            req,
            response: None,
        }
    }

    pub fn is_exited(&self) -> bool {
        self.response.is_some()
    }

    /// The short-circuit response, if the request must not be forwarded
    pub fn into_response(self) -> Option<Response<String>> {
        self.response
    }
}

impl<B> Host for HttpHost<'_, B> {
    fn method(&self) -> Result<String, HostError> {
        Ok(self.req.method().as_str().to_string())
    }

    fn path(&self) -> Result<String, HostError> {
        let path = self.req.uri().path();
        if path.is_empty() {
            return Err(HostError::Unavailable("path"));
        }
        Ok(path.to_string())
    }

    fn header(&self, name: &str) -> Result<Option<String>, HostError> {
        // HeaderMap lookups are case-insensitive
        let Some(value) = self.req.headers().get(name) else {
            return Ok(None);
        };
        let value = value.to_str().map_err(|_| HostError::InvalidHeader {
            name: name.to_string(),
        })?;
        Ok(Some(value.to_string()))
    }

    fn exit(&mut self, status: u16, body: String, headers: HashMap<String, Vec<String>>) {
        let mut resp = Response::new(body);
        *resp.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::FORBIDDEN);
        for (name, values) in headers {
            let Ok(name) = HeaderName::try_from(name) else {
                continue;
            };
            for value in values {
                if let Ok(value) = HeaderValue::try_from(value) {
                    resp.headers_mut().append(name.clone(), value);
                }
            }
        }
        self.response = Some(resp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let req = Request::builder()
            .method("POST")
            .uri("http://svc.local/orders/7?expand=true")
            .header("Authorization", "Bearer tok1")
            .body(())
            .unwrap();
        let host = HttpHost::new(&req);

        assert_eq!(host.method().unwrap(), "POST");
        assert_eq!(host.path().unwrap(), "/orders/7");
        assert_eq!(
            host.header("authorization").unwrap(),
            Some("Bearer tok1".to_string())
        );
        assert_eq!(host.header("x-missing").unwrap(), None);
    }

    #[test]
    fn test_non_text_header() {
        let req = Request::builder()
            .uri("/")
            .header("authorization", HeaderValue::from_bytes(b"Bearer \xff").unwrap())
            .body(())
            .unwrap();
        let host = HttpHost::new(&req);

        assert!(matches!(
            host.header("authorization"),
            Err(HostError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_exit_builds_response() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let mut host = HttpHost::new(&req);
        assert!(!host.is_exited());

        let mut headers = HashMap::new();
        headers.insert("x-reason".to_string(), vec!["policy".to_string()]);
        host.exit(403, "nope".to_string(), headers);

        let resp = host.into_response().expect("should exit");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.body(), "nope");
        assert_eq!(resp.headers()["x-reason"], "policy");
    }
}
