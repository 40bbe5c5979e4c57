//! Turns an `HttpRequestInput` into the exact bytes that go on the wire.
//!
//! # Design
//! Preparation is separate from execution so the body layout can be checked
//! without a network. The only I/O here is reading multipart attachments.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::encoding::{append_query, form_urlencode, http_attribute_encode};
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequestInput, VarLayout};

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A request with its final URL, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Generate a fresh multipart boundary.
pub fn new_boundary() -> String {
    format!("__-----------------------{}", Uuid::new_v4().simple())
}

pub fn prepare(input: &HttpRequestInput) -> Result<PreparedRequest, RequestError> {
    prepare_with_boundary(input, &new_boundary())
}

/// Same as `prepare`, with a caller-chosen multipart boundary.
pub fn prepare_with_boundary(
    input: &HttpRequestInput,
    boundary: &str,
) -> Result<PreparedRequest, RequestError> {
    if input.url.trim().is_empty() {
        return Err(RequestError::EmptyUrl);
    }

    let mut headers = Vec::with_capacity(input.headers.len() + 1);
    for (name, value) in &input.headers {
        validate_header(name, value)?;
        headers.push((name.clone(), value.clone()));
    }

    if !input.files.is_empty() && input.var_layout != VarLayout::Multipart {
        warn!(
            url = %input.url,
            files = input.files.len(),
            "attachments ignored: layout is not multipart"
        );
    }

    let mut url = input.url.clone();
    let mut body = Vec::new();
    let mut content_type = None;

    match input.var_layout {
        VarLayout::NotSet => {}
        VarLayout::Address => url = append_query(&input.url, &input.vars),
        VarLayout::UrlEncoded => {
            body = form_urlencode(&input.vars).into_bytes();
            content_type = Some(FORM_URLENCODED.to_string());
        }
        VarLayout::Multipart => {
            body = multipart_body(input, boundary)?;
            content_type = Some(format!("multipart/form-data; boundary={boundary}"));
        }
    }

    if !input.request_body.is_empty() {
        if !body.is_empty() {
            debug!(url = %input.url, "raw request body replaces encoded vars");
        }
        body = input.request_body.clone();
    }

    if let Some(content_type) = content_type {
        if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
            headers.push(("Content-Type".to_string(), content_type));
        }
    }

    Ok(PreparedRequest {
        method: input.method,
        url,
        headers,
        body,
    })
}

fn multipart_body(input: &HttpRequestInput, boundary: &str) -> Result<Vec<u8>, RequestError> {
    for file in &input.files {
        if has_line_break(&file.mime_type) {
            return Err(RequestError::InvalidMimeType {
                variable: file.variable_name.clone(),
                mime_type: file.mime_type.clone(),
            });
        }
    }

    let mut body = Vec::new();

    for (key, value) in &input.vars {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; {}\r\n",
                http_attribute_encode("name", key)
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for file in &input.files {
        let data = match std::fs::read(&file.local_filename) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    path = %file.local_filename.display(),
                    error = %e,
                    "skipping unreadable attachment"
                );
                continue;
            }
        };
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; {}; {}\r\n",
                http_attribute_encode("name", &file.variable_name),
                http_attribute_encode("filename", &file.request_filename)
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n", file.mime_type).as_bytes());
        body.extend_from_slice(b"Content-Transfer-Encoding: binary\r\n\r\n");
        body.extend_from_slice(&data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--").as_bytes());
    Ok(body)
}

fn has_line_break(value: &str) -> bool {
    value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0)
}

fn validate_header(name: &str, value: &str) -> Result<(), RequestError> {
    let token = |b: u8| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b);
    if name.is_empty() || !name.bytes().all(token) {
        return Err(RequestError::InvalidHeader {
            name: name.to_string(),
            reason: "not a valid header name".to_string(),
        });
    }
    if has_line_break(value) {
        return Err(RequestError::InvalidHeader {
            name: name.to_string(),
            reason: "value contains a line break".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "__-----------------------test";

    fn input(method: HttpMethod) -> HttpRequestInput {
        HttpRequestInput::new("http://localhost:8080/v2/pet", method)
    }

    #[test]
    fn empty_url_is_rejected() {
        let req = HttpRequestInput::new("  ", HttpMethod::Get);
        assert!(matches!(prepare(&req), Err(RequestError::EmptyUrl)));
    }

    #[test]
    fn not_set_sends_raw_body_untouched() {
        let mut req = input(HttpMethod::Post).with_body(r#"{"id":7}"#);
        req.add_var("ignored", "yes");
        req.add_header("Content-Type", "application/json");
        let prepared = prepare(&req).unwrap();
        assert_eq!(prepared.url, "http://localhost:8080/v2/pet");
        assert_eq!(prepared.body, br#"{"id":7}"#);
        assert_eq!(prepared.header("content-type"), Some("application/json"));
    }

    #[test]
    fn address_layout_builds_query_and_no_body() {
        let mut req = input(HttpMethod::Get).with_layout(VarLayout::Address);
        req.add_var("status", "available,sold");
        req.add_var("a key", "x&y");
        let prepared = prepare(&req).unwrap();
        assert_eq!(
            prepared.url,
            "http://localhost:8080/v2/pet?a%20key=x%26y&status=available%2Csold"
        );
        assert!(prepared.body.is_empty());
        assert!(prepared.header("content-type").is_none());
    }

    #[test]
    fn urlencoded_layout_builds_form_body() {
        let mut req = input(HttpMethod::Post).with_layout(VarLayout::UrlEncoded);
        req.add_var("name", "Rex");
        req.add_var("status", "sold out");
        let prepared = prepare(&req).unwrap();
        assert_eq!(prepared.body, b"name=Rex&status=sold%20out");
        assert_eq!(prepared.header("Content-Type"), Some(FORM_URLENCODED));
    }

    #[test]
    fn explicit_content_type_is_not_overridden() {
        let mut req = input(HttpMethod::Post).with_layout(VarLayout::UrlEncoded);
        req.add_header("content-type", "text/plain");
        req.add_var("a", "b");
        let prepared = prepare(&req).unwrap();
        assert_eq!(prepared.headers.len(), 1);
        assert_eq!(prepared.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn multipart_layout_combines_vars_and_files() {
        let path = std::env::temp_dir().join(format!("petstore-{}.txt", Uuid::new_v4()));
        std::fs::write(&path, b"PNGDATA").unwrap();

        let mut req = input(HttpMethod::Post).with_layout(VarLayout::Multipart);
        req.add_var("additionalMetadata", "front view");
        req.add_file("file", &path, "dog.png", "image/png");
        let prepared = prepare_with_boundary(&req, BOUNDARY).unwrap();
        std::fs::remove_file(&path).unwrap();

        let expected = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"additionalMetadata\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             front view\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"dog.png\"\r\n\
             Content-Type: image/png\r\n\
             Content-Transfer-Encoding: binary\r\n\r\n\
             PNGDATA\r\n\
             --{b}--",
            b = BOUNDARY
        );
        assert_eq!(String::from_utf8(prepared.body.clone()).unwrap(), expected);
        assert_eq!(
            prepared.header("content-type"),
            Some(format!("multipart/form-data; boundary={BOUNDARY}").as_str())
        );
    }

    #[test]
    fn missing_attachment_is_skipped() {
        let mut req = input(HttpMethod::Post).with_layout(VarLayout::Multipart);
        req.add_file("file", "/definitely/not/here.png", "here.png", "image/png");
        let prepared = prepare_with_boundary(&req, BOUNDARY).unwrap();
        assert_eq!(prepared.body, format!("--{BOUNDARY}--").into_bytes());
    }

    #[test]
    fn multipart_field_names_are_escaped() {
        let mut req = input(HttpMethod::Post).with_layout(VarLayout::Multipart);
        req.add_var("we\"ird", "v");
        let prepared = prepare_with_boundary(&req, BOUNDARY).unwrap();
        let body = String::from_utf8(prepared.body).unwrap();
        assert!(body.contains("name=\"we\\\"ird\""), "{body}");
    }

    #[test]
    fn attachment_mime_type_with_line_break_is_rejected() {
        let mut req = input(HttpMethod::Post).with_layout(VarLayout::Multipart);
        req.add_file("file", "/tmp/dog.png", "dog.png", "image/png\r\nX-Injected: 1");
        assert!(matches!(
            prepare_with_boundary(&req, BOUNDARY),
            Err(RequestError::InvalidMimeType { variable, .. }) if variable == "file"
        ));
    }

    #[test]
    fn generated_boundaries_differ() {
        assert_ne!(new_boundary(), new_boundary());
    }

    #[test]
    fn header_injection_is_rejected() {
        let mut req = input(HttpMethod::Get);
        req.add_header("X-Evil", "a\r\nHost: other");
        assert!(matches!(
            prepare(&req),
            Err(RequestError::InvalidHeader { name, .. }) if name == "X-Evil"
        ));
        let mut req = input(HttpMethod::Get);
        req.add_header("Bad Name", "v");
        assert!(prepare(&req).is_err());
    }
}
