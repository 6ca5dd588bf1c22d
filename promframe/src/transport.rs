//! HTTP transport and response status classification.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::params::RequestParams;

/// Statuses Prometheus uses to deliver a structured error body.
pub const STRUCTURED_ERROR_STATUSES: [u16; 3] = [400, 422, 503];

/// Decide whether a response body should be handed to the JSON layer.
///
/// 2xx and [`STRUCTURED_ERROR_STATUSES`] pass; everything else is a
/// [`Error::Transport`].
pub fn check_status(status: u16, url: &str) -> Result<()> {
    if (200..300).contains(&status) || STRUCTURED_ERROR_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(Error::Transport {
            status,
            url: url.to_string(),
        })
    }
}

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

/// Issues GET requests against the API and returns raw bodies.
///
/// Implementations are used sequentially by one owner; no thread-safety is
/// promised.
pub trait Transport {
    /// GET `path` (relative to the API base) and return the body of any
    /// response that passes [`check_status`].
    fn get(&self, path: &str, params: &RequestParams) -> Result<String>;

    /// Release the underlying connection. Calling it again is a no-op.
    fn close(&mut self);
}

// ------------------------------------------------------------------ //
//  HttpTransport (production)                                         //
// ------------------------------------------------------------------ //

/// Blocking reqwest client with a reusable connection pool.
pub struct HttpTransport {
    base: Url,
    http: Option<reqwest::blocking::Client>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url)?;

        let mut builder = reqwest::blocking::Client::builder().timeout(config.request_timeout);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        Ok(Self {
            base,
            http: Some(builder.build()?),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL with relative-reference rules,
    /// so `http://h/prom/` + `api/v1/query` is `http://h/prom/api/v1/query`
    /// while `http://h/prom` + `api/v1/query` is `http://h/api/v1/query`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    pub fn is_closed(&self) -> bool {
        self.http.is_none()
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, params: &RequestParams) -> Result<String> {
        let http = self.http.as_ref().ok_or(Error::ClientClosed)?;
        let url = self.endpoint(path)?;

        debug!(url = %url, params = params.len(), "sending query request");
        let resp = http.get(url.clone()).query(&params.to_query()).send()?;

        let status = resp.status().as_u16();
        debug!(url = %url, status, "received query response");
        check_status(status, url.as_str())?;

        Ok(resp.text()?)
    }

    fn close(&mut self) {
        if self.http.take().is_some() {
            debug!(url = %self.base, "released HTTP connection pool");
        }
    }
}

// ------------------------------------------------------------------ //
//  FakeTransport (for tests)                                          //
// ------------------------------------------------------------------ //

/// A request captured by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub params: RequestParams,
}

#[derive(Debug, Default)]
struct FakeState {
    responses: VecDeque<(u16, String)>,
    requests: Vec<RecordedRequest>,
    closed: bool,
}

/// In-memory transport that replays canned `(status, body)` responses and
/// records every request.
///
/// Responses are served in order; the last one is repeated once the queue
/// is down to a single entry. Clones share state.
#[derive(Debug, Default, Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back((status, body.into()));
        self
    }

    /// Snapshot of every request made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

impl Transport for FakeTransport {
    fn get(&self, path: &str, params: &RequestParams) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(Error::ClientClosed);
        }
        state.requests.push(RecordedRequest {
            path: path.to_string(),
            params: params.clone(),
        });

        let next = if state.responses.len() > 1 {
            state.responses.pop_front()
        } else {
            state.responses.front().cloned()
        };
        let (status, body) = next.unwrap_or_else(|| (200, String::new()));

        check_status(status, path)?;
        Ok(body)
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed = true;
    }
}
