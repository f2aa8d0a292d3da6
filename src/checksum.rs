//! Digest helpers and the portal's SHA-1 checksum construction.

use md5::{Digest, Md5};
use sha1::Sha1;

/// Marker tag in front of the hashed password form field.
pub const PASSWORD_TAG: &str = "{MD5}";
/// Fixed retry-count field the portal requires.
pub const FIELD_N: &str = "200";
/// Fixed type field the portal requires.
pub const FIELD_TYPE: &str = "1";

pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

pub fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// Checksum binding every outgoing field to the challenge token, which is
/// interleaved as the separator in front of each segment.
///
/// Order is fixed: `username, [password_hash], ac_id, ip, n, type, info`.
/// For logout no password is asserted and the hash segment is omitted
/// entirely rather than blanked; the portal hashes the same asymmetric shape
/// on its side. Reordering anything here fails non-diagnostically with a
/// generic rejection.
pub fn portal_checksum(
    token: &str,
    username: &str,
    password_hash: Option<&str>,
    ac_id: &str,
    ip: &str,
    info: &str,
) -> String {
    let mut buf = String::new();
    buf.push_str(token);
    buf.push_str(username);
    if let Some(hash) = password_hash {
        buf.push_str(token);
        buf.push_str(hash);
    }
    for field in [ac_id, ip, FIELD_N, FIELD_TYPE, info] {
        buf.push_str(token);
        buf.push_str(field);
    }
    sha1_hex(&buf)
}
