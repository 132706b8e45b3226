//! Scripted transport for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{FetchError, Method, RequestBuilder, Response, Transport};

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Full URL including the encoded query string.
    pub url: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        let body = self.body.as_deref().unwrap_or(b"null");
        serde_json::from_slice(body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// First value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

enum Reply {
    Response(Response),
    Fail(String),
}

#[derive(Default)]
struct State {
    routes: HashMap<(Method, String), Reply>,
    requests: Vec<RecordedRequest>,
}

/// In-process transport answering from a route table keyed by method and
/// path. Hosts and query strings are ignored when matching. Unmatched
/// requests get a 404 with an `{"error": ...}` body.
///
/// Clones share the route table and the request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport").finish_non_exhaustive()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `status` and a JSON body.
    pub fn on_json<T: Serialize + ?Sized>(&self, method: Method, path: &str, status: u16, body: &T) {
        let response = match Response::with_json(status, body) {
            Ok(r) => r,
            Err(e) => Response::new(500, HashMap::new(), e.to_string().into_bytes()),
        };
        self.on(method, path, response);
    }

    /// Answer `method path` with a prepared response.
    pub fn on(&self, method: Method, path: &str, response: Response) {
        self.with_state(|s| {
            s.routes
                .insert((method, path.to_string()), Reply::Response(response));
        });
    }

    /// Fail `method path` at the transport level, as a dropped connection would.
    pub fn fail(&self, method: Method, path: &str, reason: &str) {
        self.with_state(|s| {
            s.routes
                .insert((method, path.to_string()), Reply::Fail(reason.to_string()));
        });
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with_state(|s| s.requests.clone())
    }

    /// Requests seen for one method and path.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: RequestBuilder) -> Result<Response, FetchError> {
        let url = request.full_url()?;
        let recorded = RecordedRequest {
            method: request.method,
            url: url.to_string(),
            path: url.path().to_string(),
            query: url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        };
        let key = (recorded.method, recorded.path.clone());

        self.with_state(|s| {
            s.requests.push(recorded);
            match s.routes.get(&key) {
                Some(Reply::Response(r)) => Ok(r.clone()),
                Some(Reply::Fail(reason)) => Err(FetchError::RequestError(reason.clone())),
                None => Ok(Response::new(
                    404,
                    HashMap::new(),
                    format!(r#"{{"error": "no mock route for {} {}"}}"#, key.0, key.1).into_bytes(),
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_routes_and_records() {
        let mock = MockTransport::new();
        mock.on_json(Method::Get, "/ping", 200, &serde_json::json!({"pong": true}));

        let req = RequestBuilder::new(Method::Get, "http://host/ping").query("a", "1");
        let resp = mock.execute(req).await.unwrap();
        assert_eq!(resp.status, 200);

        let seen = mock.requests_to(Method::Get, "/ping");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query_param("a"), Some("1"));
    }

    #[tokio::test]
    async fn test_mock_unmatched_is_404() {
        let mock = MockTransport::new();
        let resp = mock
            .execute(RequestBuilder::new(Method::Post, "http://host/nowhere"))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(resp.error_message().contains("/nowhere"));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockTransport::new();
        mock.fail(Method::Get, "/down", "connection refused");
        let err = mock
            .execute(RequestBuilder::new(Method::Get, "http://host/down"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RequestError(_)));
    }
}
