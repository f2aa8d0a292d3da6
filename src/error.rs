//! Error taxonomy for the handshake, plus the portal's error-code catalog.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// Everything that can go wrong during one handshake attempt. None of these
/// trigger an automatic retry; the caller may resubmit from the start.
#[derive(Debug, Error)]
pub enum AuthError {
    /// DNS/connect/timeout/TLS trouble, surfaced as-is and never interpreted.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSONP envelope malformed, JSON unparsable, or an expected field missing.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The portal refused to issue a challenge (`res != "ok"`). Terminal.
    #[error("challenge rejected: {0}")]
    ChallengeRejected(String),

    /// Login/logout refused (`error != "ok"`), with the catalog message when
    /// the code is known, otherwise the raw portal string.
    #[error("portal rejected the request: {0}")]
    Rejected(String),

    /// The obfuscated payload could not be built. A partial payload must
    /// never be sent.
    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

/// Portal error code -> human-readable reason, consulted only when the reply
/// carries `error != "ok"`. These codes and meanings are fixed by the portal
/// firmware; the table itself never changes at runtime.
pub static ERROR_CATALOG: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("E2531", "E2531: user not found"),
        ("E2532", "E2532: two attempts within too short an interval"),
        ("E2533", "E2533: too many failed attempts, try again later"),
        ("E2553", "E2553: password error"),
        ("E2601", "E2601: not an IPv6 user"),
        ("E2606", "E2606: user is disabled"),
        ("E2616", "E2616: account is in arrears"),
        ("E2620", "E2620: already logged in"),
        ("E2806", "E2806: invalid ac_id, try another value such as 1"),
        ("E2807", "E2807: invalid ac_id"),
        ("E2833", "E2833: IP address does not match this session"),
        ("E2840", "E2840: wired account used on the wireless network"),
        ("E2842", "E2842: concurrent session limit reached"),
        ("E2843", "E2843: IP already online"),
        ("E2844", "E2844: login IP does not match the NAS IP"),
        ("E2901", "E2901: invalid username or password (possibly a wrong password)"),
        ("E2902", "E2902: invalid username or password (possibly a wrong username or a disabled account)"),
        ("E6603", "E6603: invalid username or password"),
        ("E6606", "E6606: account is suspended"),
    ])
});

pub fn describe_ecode(ecode: &str) -> Option<&'static str> {
    ERROR_CATALOG.get(ecode).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes() {
        assert!(describe_ecode("E2620").is_some());
        assert!(describe_ecode("E9999").is_none());
    }
}
