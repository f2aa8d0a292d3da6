//! Data model for one handshake attempt and the portal reply shapes.

use serde::{Deserialize, Serialize};

/// Value of the `enc_ver` field in the obfuscated credential blob.
pub const ENC_VER: &str = "srun_bx1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Logout => "logout",
        }
    }
}

/// Everything that determines the obfuscated payload and checksum for one
/// attempt. `ip` is empty when authenticating the caller's own address;
/// `password` is ignored for logout.
#[derive(Debug, Clone)]
pub struct LoginIntent {
    pub action: Action,
    pub username: String,
    pub password: String,
    pub ip: String,
    pub ac_id: String,
}

/// Result of an online probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineStatus {
    pub online: bool,
    pub username: Option<String>,
}

/// Challenge reply shape: `res` plus the one-time token.
#[derive(Debug, Deserialize)]
pub struct ChallengeReply {
    pub res: Option<String>,
    pub challenge: Option<String>,
}

/// Login/logout reply shape. Some portal builds send `ecode` as a string,
/// others as a number.
#[derive(Debug, Deserialize)]
pub struct PortalReply {
    pub error: Option<String>,
    #[serde(default)]
    pub ecode: Option<serde_json::Value>,
}

/// Plaintext credential blob that gets ciphered into the `info` form field.
/// The password is omitted for logout, not blanked.
#[derive(Debug, Serialize)]
pub struct InfoBlob<'a> {
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    pub ip: &'a str,
    pub acid: &'a str,
    pub enc_ver: &'a str,
}
