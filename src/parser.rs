//! JSONP envelope handling and the probes' pattern extraction.

use crate::error::AuthError;
use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_IN_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"username=([-a-zA-Z0-9]+)").expect("username regex"));
static AC_ID_IN_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/index_([0-9]+)\.html").expect("ac_id regex"));
static DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("ipv4 regex"));

/// Strip the JSONP envelope: the body must literally be `callback(` ... `)`.
/// Anything else is a protocol-format failure.
pub fn extract_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str, AuthError> {
    if callback.is_empty() {
        return Err(AuthError::Malformed("empty JSONP callback name".into()));
    }
    body.strip_prefix(callback)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| AuthError::Malformed(format!("not a {callback}(...) JSONP envelope")))
}

/// Username carried in a success-redirect query string.
pub fn username_from_query(query: &str) -> Option<String> {
    USERNAME_IN_QUERY
        .captures(query)
        .map(|caps| caps[1].to_string())
}

/// Numeric access-controller id embedded in the landing page.
pub fn ac_id_from_html(html: &str) -> Option<String> {
    AC_ID_IN_PAGE.captures(html).map(|caps| caps[1].to_string())
}

/// First dotted-quad address in a loosely formatted online-check body.
pub fn ipv4_from_body(body: &str) -> Option<String> {
    DOTTED_QUAD.find(body).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonp_accepts_well_formed_envelopes() {
        assert_eq!(extract_jsonp("cb()", "cb").unwrap(), "");
        assert_eq!(extract_jsonp("C({})", "C").unwrap(), "{}");
        assert_eq!(
            extract_jsonp(r#"jQuery({"key1": 1234})"#, "jQuery").unwrap(),
            r#"{"key1": 1234}"#
        );
    }

    #[test]
    fn jsonp_rejects_bad_envelopes() {
        assert!(extract_jsonp("C({})", "").is_err());
        assert!(extract_jsonp("C({})", "Q").is_err());
        assert!(extract_jsonp("C({}", "C").is_err());
        assert!(extract_jsonp("", "C").is_err());
    }

    #[test]
    fn query_username_extraction() {
        assert_eq!(
            username_from_query("ac_id=1&username=alice-01&x=2"),
            Some("alice-01".to_string())
        );
        assert_eq!(username_from_query("ac_id=1"), None);
    }

    #[test]
    fn landing_page_ac_id_extraction() {
        let html = r#"<meta http-equiv="refresh" content="0;url=/index_7.html">"#;
        assert_eq!(ac_id_from_html(html), Some("7".to_string()));
        assert_eq!(ac_id_from_html("<html></html>"), None);
    }

    #[test]
    fn loose_body_ip_extraction() {
        assert_eq!(
            ipv4_from_body("x,y,166.111.8.21,whatever"),
            Some("166.111.8.21".to_string())
        );
        assert_eq!(ipv4_from_body("no address here"), None);
    }
}
