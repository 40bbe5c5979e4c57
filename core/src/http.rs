//! HTTP transport types shared by the request builder and the executor.
//!
//! # Design
//! `HttpRequestInput` describes one request as plain data: where it goes, how
//! its variables are laid out, which headers and attachments it carries.
//! `ResponseOutcome` is the single value an execution produces, successful or
//! not. Transport failures are classified into `NetworkError` and travel as
//! data alongside whatever bytes were received.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is empty or not one the executor can send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMethodError {
    #[error("HTTP method is empty")]
    Empty,
    #[error("unsupported HTTP method: {0}")]
    Unsupported(String),
}

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseMethodError::Empty);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(ParseMethodError::Unsupported(trimmed.to_string())),
        }
    }
}

/// How `HttpRequestInput::vars` end up on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VarLayout {
    /// Vars are ignored; the raw `request_body` is sent as-is.
    #[default]
    NotSet,
    /// Vars are appended to the URL as a query string.
    Address,
    /// Vars form an `application/x-www-form-urlencoded` body.
    UrlEncoded,
    /// Vars and files form a `multipart/form-data` body.
    Multipart,
}

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileElement {
    /// Form field name the file is submitted under.
    pub variable_name: String,
    /// Path the bytes are read from when the request is prepared.
    pub local_filename: PathBuf,
    /// File name announced to the server.
    pub request_filename: String,
    pub mime_type: String,
}

/// An HTTP request described as plain data.
///
/// Built by `PetstoreClient::build_*` methods or by hand, then handed to
/// `HttpRequestExecutor::execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestInput {
    pub url: String,
    pub method: HttpMethod,
    pub var_layout: VarLayout,
    pub vars: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub files: Vec<FileElement>,
    pub request_body: Vec<u8>,
}

impl HttpRequestInput {
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            var_layout: VarLayout::NotSet,
            vars: BTreeMap::new(),
            headers: BTreeMap::new(),
            files: Vec::new(),
            request_body: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: VarLayout) -> Self {
        self.var_layout = layout;
        self
    }

    /// Set the raw body sent when the layout is `NotSet`.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request_body = body.into();
        self
    }

    pub fn add_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn add_file(
        &mut self,
        variable_name: impl Into<String>,
        local_filename: impl Into<PathBuf>,
        request_filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) {
        self.files.push(FileElement {
            variable_name: variable_name.into(),
            local_filename: local_filename.into(),
            request_filename: request_filename.into(),
            mime_type: mime_type.into(),
        });
    }
}

/// Transport-level classification of how an execution ended.
///
/// `NoError` means a response was received, whatever its status code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NetworkError {
    #[default]
    NoError,
    Timeout,
    ConnectionRefused,
    HostNotFound,
    /// The peer closed the connection before the exchange completed.
    RemoteHostClosed,
    Tls,
    /// Malformed response, oversized body, redirect loop and the like.
    Protocol,
    /// The descriptor could not be turned into a request.
    InvalidRequest,
    Unknown,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkError::NoError => "no error",
            NetworkError::Timeout => "timeout",
            NetworkError::ConnectionRefused => "connection refused",
            NetworkError::HostNotFound => "host not found",
            NetworkError::RemoteHostClosed => "remote host closed connection",
            NetworkError::Tls => "TLS error",
            NetworkError::Protocol => "protocol error",
            NetworkError::InvalidRequest => "invalid request",
            NetworkError::Unknown => "unknown network error",
        };
        f.write_str(name)
    }
}

/// The result of one request execution.
///
/// Produced exactly once per `execute` call and owned by whoever awaited it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseOutcome {
    /// HTTP status, when a response was received at all.
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub error: NetworkError,
    pub error_str: String,
}

impl ResponseOutcome {
    pub fn failed(error: NetworkError, error_str: impl Into<String>) -> Self {
        Self {
            status: None,
            headers: Vec::new(),
            body: Vec::new(),
            error,
            error_str: error_str.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error == NetworkError::NoError
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!(" Delete ".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
    }

    #[test]
    fn empty_method_is_rejected() {
        assert_eq!("".parse::<HttpMethod>(), Err(ParseMethodError::Empty));
        assert!(matches!(
            "BREW".parse::<HttpMethod>(),
            Err(ParseMethodError::Unsupported(m)) if m == "BREW"
        ));
    }

    #[test]
    fn vars_are_kept_sorted_and_replaced() {
        let mut input = HttpRequestInput::new("http://localhost/pet", HttpMethod::Get);
        input.add_var("status", "sold");
        input.add_var("name", "rex");
        input.add_var("status", "available");
        let keys: Vec<_> = input.vars.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "status"]);
        assert_eq!(input.vars["status"], "available");
    }

    #[test]
    fn add_file_keeps_order() {
        let mut input = HttpRequestInput::new("http://localhost/upload", HttpMethod::Post);
        input.add_file("file", "/tmp/a.png", "a.png", "image/png");
        input.add_file("file", "/tmp/b.png", "b.png", "image/png");
        assert_eq!(input.files.len(), 2);
        assert_eq!(input.files[0].request_filename, "a.png");
        assert_eq!(input.files[1].request_filename, "b.png");
    }

    #[test]
    fn outcome_header_lookup_ignores_case() {
        let outcome = ResponseOutcome {
            status: Some(200),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            ..ResponseOutcome::default()
        };
        assert_eq!(outcome.header("content-type"), Some("application/json"));
        assert!(outcome.is_success());
    }

    #[test]
    fn failed_outcome_has_no_bytes() {
        let outcome = ResponseOutcome::failed(NetworkError::Timeout, "timed out");
        assert!(!outcome.is_success());
        assert!(outcome.body.is_empty());
        assert_eq!(outcome.status, None);
        assert_eq!(outcome.error.to_string(), "timeout");
    }
}
