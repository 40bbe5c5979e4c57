//! Form and header encoding used when preparing request bodies.

use std::collections::BTreeMap;

use percent_encoding::{percent_encode, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except the RFC 3986 unreserved characters gets escaped.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path segments additionally keep sub-delimiters that servers accept verbatim.
const PATH_SEGMENT: &AsciiSet = &FORM.remove(b'@').remove(b':');

/// Percent-encode a single form key or value.
pub fn form_encode(input: &str) -> String {
    utf8_percent_encode(input, FORM).to_string()
}

/// Percent-encode a value that is interpolated into one URL path segment.
pub fn encode_path_segment(input: &str) -> String {
    utf8_percent_encode(input, PATH_SEGMENT).to_string()
}

/// Join `vars` as `k=v&k2=v2`, in key order.
pub fn form_urlencode(vars: &BTreeMap<String, String>) -> String {
    vars.iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append `vars` to `url` as a query string.
pub fn append_query(url: &str, vars: &BTreeMap<String, String>) -> String {
    if vars.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') {
        if url.ends_with('?') || url.ends_with('&') {
            ""
        } else {
            "&"
        }
    } else {
        "?"
    };
    format!("{url}{separator}{}", form_urlencode(vars))
}

/// Render `attribute_name="input"` for a `Content-Disposition` header.
///
/// Values that cannot travel as a quoted ASCII string (empty, control bytes,
/// `\`, `/`, anything outside printable ASCII) also get an RFC 5987
/// `attribute_name*=utf-8''...` form. The quoted part then carries only the
/// bytes that were safe.
pub fn http_attribute_encode(attribute_name: &str, input: &str) -> String {
    let mut plain = String::with_capacity(input.len());
    let mut needs_extended = false;
    for &b in input.as_bytes() {
        match b {
            b'\\' | b'/' => needs_extended = true,
            b'"' => plain.push_str("\\\""),
            b' '..=b'~' => plain.push(b as char),
            _ => needs_extended = true,
        }
    }
    if plain.is_empty() {
        needs_extended = true;
    }
    if !needs_extended {
        return format!("{attribute_name}=\"{plain}\"");
    }
    let extended = percent_encode(input.as_bytes(), NON_ALPHANUMERIC);
    format!("{attribute_name}=\"{plain}\"; {attribute_name}*=utf-8''{extended}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unreserved_characters_pass_through() {
        assert_eq!(form_encode("AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn reserved_and_unicode_are_escaped() {
        assert_eq!(form_encode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(form_encode("available,sold"), "available%2Csold");
        assert_eq!(form_encode("é"), "%C3%A9");
    }

    #[test]
    fn urlencode_joins_in_key_order() {
        let v = vars(&[("status", "sold"), ("name", "Rex the dog")]);
        assert_eq!(form_urlencode(&v), "name=Rex%20the%20dog&status=sold");
    }

    #[test]
    fn query_is_appended_with_the_right_separator() {
        let v = vars(&[("username", "bob")]);
        assert_eq!(append_query("http://h/user/login", &v), "http://h/user/login?username=bob");
        assert_eq!(append_query("http://h/x?a=1", &v), "http://h/x?a=1&username=bob");
        assert_eq!(append_query("http://h/x?", &v), "http://h/x?username=bob");
        assert_eq!(append_query("http://h/x", &BTreeMap::new()), "http://h/x");
    }

    #[test]
    fn path_segment_escapes_slashes() {
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_path_segment("user@example.com"), "user@example.com");
    }

    #[test]
    fn simple_attribute_is_quoted() {
        assert_eq!(http_attribute_encode("name", "file"), "name=\"file\"");
        assert_eq!(
            http_attribute_encode("filename", "say \"hi\".txt"),
            "filename=\"say \\\"hi\\\".txt\""
        );
    }

    #[test]
    fn unsafe_attribute_gets_extended_form() {
        assert_eq!(
            http_attribute_encode("filename", "dir/é.png"),
            "filename=\"dir.png\"; filename*=utf-8''dir%2F%C3%A9%2Epng"
        );
    }

    #[test]
    fn empty_attribute_gets_extended_form() {
        assert_eq!(http_attribute_encode("name", ""), "name=\"\"; name*=utf-8''");
    }
}
