//! The SRUN challenge-response handshake.
//!
//! One attempt moves strictly through
//! `Start -> ChallengeRequested -> ChallengeReceived -> PayloadBuilt ->
//! SubmitRequested -> Completed`; the cipher key is the challenge token, so
//! no payload can exist before the challenge arrives. Each transition below
//! is a pure function over the previous step's body, the client only
//! sequences them around the two network calls. Nothing retries; a failed
//! attempt is resubmitted from the start by the caller if at all.

use crate::checksum::{self, FIELD_N, FIELD_TYPE, PASSWORD_TAG};
use crate::codec;
use crate::error::{describe_ecode, AuthError};
use crate::http;
use crate::models::{Action, ChallengeReply, InfoBlob, LoginIntent, PortalReply, ENC_VER};
use crate::urls::PortalEndpoint;

pub struct SrunClient {
    endpoint: PortalEndpoint,
}

impl SrunClient {
    pub fn new(endpoint: PortalEndpoint) -> Self {
        Self { endpoint }
    }

    /// Run one full handshake for the given intent.
    pub async fn run(&self, intent: &LoginIntent) -> Result<(), AuthError> {
        tracing::debug!(action = intent.action.as_str(), "requesting challenge");
        let challenge_params = [
            ("username", intent.username.clone()),
            ("ip", intent.ip.clone()),
            ("double_stack", "1".to_string()),
        ];
        let body = http::get_jsonp(&self.endpoint.challenge_url(), &challenge_params).await?;
        tracing::debug!(%body, "challenge response");
        let token = parse_challenge(&body)?;

        let form = build_login_form(intent, &token)?;
        tracing::debug!(action = intent.action.as_str(), "submitting request");
        let body = http::get_jsonp(&self.endpoint.portal_url(), &form).await?;
        tracing::debug!(%body, "portal response");
        classify_reply(&body)
    }
}

/// ChallengeRequested -> ChallengeReceived: require `res == "ok"` and a
/// non-empty token. Violations are terminal for this attempt.
fn parse_challenge(json: &str) -> Result<String, AuthError> {
    let reply: ChallengeReply = serde_json::from_str(json)
        .map_err(|e| AuthError::Malformed(format!("challenge JSON: {e}")))?;
    match reply.res.as_deref() {
        Some("ok") => {}
        Some(other) => return Err(AuthError::ChallengeRejected(other.to_string())),
        None => return Err(AuthError::Malformed("challenge response has no res field".into())),
    }
    match reply.challenge {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Malformed("challenge field missing".into())),
    }
}

/// ChallengeReceived -> PayloadBuilt: cipher the credential blob under the
/// token and assemble the outgoing form in the portal's field order.
fn build_login_form(
    intent: &LoginIntent,
    token: &str,
) -> Result<Vec<(&'static str, String)>, AuthError> {
    let blob = InfoBlob {
        username: &intent.username,
        password: (intent.action == Action::Login).then_some(intent.password.as_str()),
        ip: &intent.ip,
        acid: &intent.ac_id,
        enc_ver: ENC_VER,
    };
    let plain = serde_json::to_string(&blob)
        .map_err(|e| AuthError::Encoding(format!("info blob: {e}")))?;
    let info = codec::encode_info(&plain, token);

    let mut form = vec![
        ("action", intent.action.as_str().to_string()),
        ("ac_id", intent.ac_id.clone()),
        ("n", FIELD_N.to_string()),
        ("type", FIELD_TYPE.to_string()),
        ("ip", intent.ip.clone()),
        ("double_stack", "1".to_string()),
        ("username", intent.username.clone()),
    ];
    let password_hash = match intent.action {
        Action::Login => {
            let hash = checksum::md5_hex(&intent.password);
            form.push(("password", format!("{PASSWORD_TAG}{hash}")));
            Some(hash)
        }
        Action::Logout => None,
    };
    let chksum = checksum::portal_checksum(
        token,
        &intent.username,
        password_hash.as_deref(),
        &intent.ac_id,
        &intent.ip,
        &info,
    );
    form.push(("info", info));
    form.push(("chksum", chksum));
    Ok(form)
}

/// SubmitRequested -> Completed: `error == "ok"` is success; otherwise map
/// `ecode` through the catalog or surface the raw string. A reply with no
/// `error` field at all is malformed, not a rejection.
fn classify_reply(json: &str) -> Result<(), AuthError> {
    let reply: PortalReply = serde_json::from_str(json)
        .map_err(|e| AuthError::Malformed(format!("portal JSON: {e}")))?;
    let error = reply
        .error
        .ok_or_else(|| AuthError::Malformed("portal response has no error field".into()))?;
    if error == "ok" {
        return Ok(());
    }
    let ecode = reply.ecode.map(|v| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });
    match ecode.as_deref().and_then(describe_ecode) {
        Some(reason) => Err(AuthError::Rejected(reason.to_string())),
        None => Err(AuthError::Rejected(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_intent() -> LoginIntent {
        LoginIntent {
            action: Action::Login,
            username: "alice".to_string(),
            password: "secret".to_string(),
            ip: String::new(),
            ac_id: "1".to_string(),
        }
    }

    #[test]
    fn challenge_ok() {
        let token = parse_challenge(r#"{"res":"ok","challenge":"deadbeef"}"#).unwrap();
        assert_eq!(token, "deadbeef");
    }

    #[test]
    fn challenge_rejected_is_terminal() {
        let err = parse_challenge(r#"{"res":"sign_error","challenge":"x"}"#).unwrap_err();
        assert!(matches!(err, AuthError::ChallengeRejected(ref r) if r.as_str() == "sign_error"));
    }

    #[test]
    fn missing_challenge_field_stops_before_any_payload() {
        // The form builder takes the token returned here, so a missing field
        // means the cipher is never reached.
        let err = parse_challenge(r#"{"res":"ok"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
        let err = parse_challenge(r#"{"res":"ok","challenge":""}"#).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
        let err = parse_challenge("not json").unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[test]
    fn login_form_shape() {
        let form = build_login_form(&login_intent(), "tok").unwrap();
        let get = |k: &str| form.iter().find(|(f, _)| *f == k).map(|(_, v)| v.as_str());
        assert_eq!(get("action"), Some("login"));
        assert_eq!(get("ac_id"), Some("1"));
        assert_eq!(get("n"), Some("200"));
        assert_eq!(get("type"), Some("1"));
        assert_eq!(get("double_stack"), Some("1"));
        assert_eq!(get("username"), Some("alice"));
        let password = get("password").unwrap();
        assert!(password.starts_with("{MD5}"));
        assert_eq!(password.len(), "{MD5}".len() + 32);
        assert!(get("info").unwrap().starts_with("{SRBX1}"));
        assert_eq!(get("chksum").unwrap().len(), 40);
    }

    #[test]
    fn logout_form_has_no_password() {
        let mut intent = login_intent();
        intent.action = Action::Logout;
        intent.password.clear();
        let form = build_login_form(&intent, "tok").unwrap();
        assert!(form.iter().all(|(f, _)| *f != "password"));
        assert_eq!(form[0], ("action", "logout".to_string()));
    }

    #[test]
    fn login_and_logout_checksums_differ_in_shape() {
        let login_form = build_login_form(&login_intent(), "tok").unwrap();
        let mut intent = login_intent();
        intent.action = Action::Logout;
        let logout_form = build_login_form(&intent, "tok").unwrap();
        let chk = |form: &[(&str, String)]| {
            form.iter()
                .find(|(f, _)| *f == "chksum")
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_ne!(chk(&login_form), chk(&logout_form));
    }

    #[test]
    fn reply_classification() {
        assert!(classify_reply(r#"{"error":"ok"}"#).is_ok());

        let err = classify_reply(r#"{"error":"login_error","ecode":"E2620"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref r) if r.contains("already logged in")));

        // Unknown code falls back to the raw error string.
        let err = classify_reply(r#"{"error":"login_error","ecode":"E0000"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref r) if r.as_str() == "login_error"));

        // Numeric ecode is normalized before lookup.
        let err = classify_reply(r#"{"error":"login_error","ecode":64}"#).unwrap_err();
        assert!(matches!(err, AuthError::Rejected(ref r) if r.as_str() == "login_error"));

        // Absent error field is malformed, not a rejection.
        let err = classify_reply(r#"{"ecode":"E2620"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }
}
