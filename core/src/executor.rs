//! Executes `HttpRequestInput` descriptors over the network.
//!
//! # Design
//! `HttpRequestExecutor` wraps a `ureq::Agent` built from an explicit
//! `ExecutorConfig`; there is no process-wide default configuration. Every
//! call to `execute` prepares the request, performs exactly one exchange on
//! tokio's blocking pool and resolves to exactly one `ResponseOutcome`.
//! The response buffer lives on the stack of that one call, so a single
//! executor can serve any number of requests at once.
//!
//! HTTP status codes are never treated as failures here. A 404 is a
//! `NoError` outcome with `status == Some(404)`; interpreting it is up to the
//! caller.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use ureq::typestate::{WithBody, WithoutBody};
use ureq::RequestBuilder;

use crate::http::{HttpMethod, HttpRequestInput, NetworkError, ResponseOutcome};
use crate::request::{prepare, PreparedRequest};

pub const DEFAULT_USER_AGENT: &str = concat!("petstore-core/", env!("CARGO_PKG_VERSION"));

/// Transport settings handed to `HttpRequestExecutor::new`.
///
/// Deserializable so it can be embedded in an application's own config
/// file; durations are given in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound for the whole exchange.
    #[serde(rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Option<Duration>,
    #[serde(rename = "connect_timeout_ms", deserialize_with = "millis")]
    pub connect_timeout: Option<Duration>,
    /// Sent unless the request already carries a `User-Agent`.
    pub user_agent: Option<String>,
    /// Skip TLS certificate verification. Only for test servers.
    pub accept_invalid_certs: bool,
    /// Responses larger than this end as `NetworkError::Protocol`.
    pub max_response_bytes: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            accept_invalid_certs: false,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// Performs HTTP exchanges described by `HttpRequestInput`.
#[derive(Debug, Clone)]
pub struct HttpRequestExecutor {
    agent: ureq::Agent,
    config: ExecutorConfig,
}

impl Default for HttpRequestExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl HttpRequestExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        let mut builder = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .timeout_connect(config.connect_timeout);
        if config.accept_invalid_certs {
            builder = builder.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        Self {
            agent: builder.build().new_agent(),
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Start executing `input` and return a handle that resolves to its outcome.
    ///
    /// Inside a tokio runtime the exchange runs on the blocking pool and the
    /// caller is free to do other work. Without a runtime the exchange runs
    /// inline and the returned handle is already complete.
    pub fn execute(&self, input: HttpRequestInput) -> Execution {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let executor = self.clone();
                Execution {
                    state: ExecutionState::Running(
                        handle.spawn_blocking(move || executor.execute_blocking(&input)),
                    ),
                }
            }
            Err(_) => {
                debug!("no tokio runtime, executing request inline");
                Execution {
                    state: ExecutionState::Ready(Some(self.execute_blocking(&input))),
                }
            }
        }
    }

    /// Execute `input` on the current thread.
    pub fn execute_blocking(&self, input: &HttpRequestInput) -> ResponseOutcome {
        let mut prepared = match prepare(input) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(url = %input.url, error = %e, "request rejected before sending");
                return ResponseOutcome::failed(NetworkError::InvalidRequest, e.to_string());
            }
        };
        self.apply_default_headers(&mut prepared);

        debug!(
            method = %prepared.method,
            url = %prepared.url,
            body_bytes = prepared.body.len(),
            "sending request"
        );

        let mut response = match self.send(&prepared) {
            Ok(response) => response,
            Err(e) => {
                let kind = classify(&e);
                warn!(url = %prepared.url, kind = %kind, error = %e, "request failed");
                return ResponseOutcome::failed(kind, e.to_string());
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        match response
            .body_mut()
            .with_config()
            .limit(self.config.max_response_bytes)
            .read_to_vec()
        {
            Ok(body) => {
                debug!(url = %prepared.url, status, body_bytes = body.len(), "request finished");
                ResponseOutcome {
                    status: Some(status),
                    headers,
                    body,
                    error: NetworkError::NoError,
                    error_str: String::new(),
                }
            }
            Err(e) => {
                let kind = classify(&e);
                warn!(url = %prepared.url, status, kind = %kind, error = %e, "reading response failed");
                ResponseOutcome {
                    status: Some(status),
                    headers,
                    body: Vec::new(),
                    error: kind,
                    error_str: e.to_string(),
                }
            }
        }
    }

    fn apply_default_headers(&self, prepared: &mut PreparedRequest) {
        if let Some(user_agent) = &self.config.user_agent {
            if prepared.header("user-agent").is_none() {
                prepared
                    .headers
                    .push(("User-Agent".to_string(), user_agent.clone()));
            }
        }
    }

    fn send(
        &self,
        prepared: &PreparedRequest,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = prepared.url.as_str();
        let headers = prepared.headers.as_slice();
        match prepared.method {
            HttpMethod::Get => without_body(self.agent.get(url), prepared),
            HttpMethod::Head => without_body(self.agent.head(url), prepared),
            HttpMethod::Delete => without_body(self.agent.delete(url), prepared),
            HttpMethod::Options => without_body(self.agent.options(url), prepared),
            HttpMethod::Post => send_body(with_headers(self.agent.post(url), headers), &prepared.body),
            HttpMethod::Put => send_body(with_headers(self.agent.put(url), headers), &prepared.body),
            HttpMethod::Patch => {
                send_body(with_headers(self.agent.patch(url), headers), &prepared.body)
            }
        }
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Bodies on GET, HEAD, DELETE and OPTIONS are unusual but sent as given.
fn without_body(
    builder: RequestBuilder<WithoutBody>,
    prepared: &PreparedRequest,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = with_headers(builder, &prepared.headers);
    if prepared.body.is_empty() {
        builder.call()
    } else {
        debug!(method = %prepared.method, "sending body with a method that usually has none");
        builder.force_send_body().send(prepared.body.as_slice())
    }
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    body: &[u8],
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    if body.is_empty() {
        builder.send_empty()
    } else {
        builder.send(body)
    }
}

/// Map a transport error onto the executor's classification.
fn classify(err: &ureq::Error) -> NetworkError {
    match err {
        ureq::Error::Timeout(_) => NetworkError::Timeout,
        ureq::Error::HostNotFound => NetworkError::HostNotFound,
        ureq::Error::ConnectionFailed => NetworkError::ConnectionRefused,
        ureq::Error::Io(e) => classify_io(e),
        ureq::Error::Tls(_) => NetworkError::Tls,
        ureq::Error::BadUri(_) => NetworkError::InvalidRequest,
        ureq::Error::Protocol(_) | ureq::Error::BodyExceedsLimit(_) => NetworkError::Protocol,
        _ => NetworkError::Unknown,
    }
}

fn classify_io(err: &io::Error) -> NetworkError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => NetworkError::ConnectionRefused,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => NetworkError::Timeout,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => NetworkError::RemoteHostClosed,
        io::ErrorKind::InvalidData => NetworkError::Protocol,
        _ => NetworkError::Unknown,
    }
}

/// Handle to one in-flight execution. Resolves exactly once.
#[must_use = "an execution does nothing useful unless awaited"]
pub struct Execution {
    state: ExecutionState,
}

enum ExecutionState {
    Ready(Option<ResponseOutcome>),
    Running(JoinHandle<ResponseOutcome>),
}

impl Future for Execution {
    type Output = ResponseOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            ExecutionState::Ready(outcome) => Poll::Ready(outcome.take().unwrap_or_else(|| {
                ResponseOutcome::failed(NetworkError::Unknown, "execution polled after completion")
            })),
            ExecutionState::Running(handle) => Pin::new(handle).poll(cx).map(|joined| {
                joined.unwrap_or_else(|e| {
                    ResponseOutcome::failed(NetworkError::Unknown, format!("request task failed: {e}"))
                })
            }),
        }
    }
}
