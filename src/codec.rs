//! The portal's private obfuscation codec: a TEA-family block cipher plus a
//! base64 variant with a scrambled alphabet and reversed byte order.
//!
//! This is legacy obfuscation inherited from the portal's JavaScript, not a
//! security primitive. The portal decodes what we send, so every quirk here
//! has to match it byte for byte; a single wrong bit makes logins fail with a
//! generic error. Only the encoding direction exists, the protocol never
//! requires us to decode.

/// 64-symbol alphabet in the portal's scrambled order. Not RFC 4648.
const ALPHABET: &[u8; 64] = b"LVoJPiCN2R8G90yg+hmFHuacZ1OWMnrsSTXkYpUq/3dlbfKwv6xztjI7DeBE45QA";

const DELTA: u32 = 0x9E37_79B9;

/// Marker tag the portal expects in front of the encoded `info` field.
pub const INFO_TAG: &str = "{SRBX1}";

/// Base64 variant: 4 output symbols per 3 input bytes, but the bytes of each
/// triplet are consumed in reverse (the third byte lands in the high bits).
/// An output symbol becomes `'='` when its 6-bit window lies entirely past
/// the end of the input.
pub fn portal_base64(input: &[u8]) -> String {
    let a = input.len();
    let mut out = String::with_capacity(a.div_ceil(3) * 4);
    for o in (0..a).step_by(3) {
        let b2 = input[o] as u32;
        let b1 = if o + 1 < a { input[o + 1] as u32 } else { 0 };
        let b0 = if o + 2 < a { input[o + 2] as u32 } else { 0 };
        let h = b2 << 16 | b1 << 8 | b0;
        for i in 0..4 {
            if o * 8 + i * 6 > a * 8 {
                out.push('=');
            } else {
                out.push(ALPHABET[(h >> (6 * (3 - i)) & 0x3f) as usize] as char);
            }
        }
    }
    out
}

/// Pack bytes into little-endian u32 words. The payload variant appends one
/// trailing word holding the original byte length; the key variant does not.
fn pack_words(bytes: &[u8], append_len: bool) -> Vec<u32> {
    let mut words: Vec<u32> = bytes
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u32, |w, (i, b)| w | (*b as u32) << (8 * i))
        })
        .collect();
    if append_len {
        words.push(bytes.len() as u32);
    }
    words
}

/// The portal's TEA-variant cipher, keyed by the challenge token.
///
/// `6 + 52/(n+1)` mixing rounds over the packed words, where `n` is the index
/// of the last payload word. Each round walks every word once, mixing in both
/// cyclic neighbors and a key word selected by `(p & 3) ^ ((delta >> 2) & 3)`.
/// All arithmetic wraps at 32 bits; that is the contract, not an overflow bug.
/// The embedded length word is serialized along with everything else since
/// only the portal-side decoder cares about it.
pub fn xencode(msg: &str, key: &str) -> Vec<u8> {
    if msg.is_empty() {
        return Vec::new();
    }
    let mut v = pack_words(msg.as_bytes(), true);
    let mut k = pack_words(key.as_bytes(), false);
    if k.len() < 4 {
        k.resize(4, 0);
    }
    let n = v.len() - 1;
    let mut z = v[n];
    let mut d: u32 = 0;
    let rounds = 6 + 52 / (n + 1);
    for _ in 0..rounds {
        d = d.wrapping_add(DELTA);
        let e = (d >> 2 & 3) as usize;
        for p in 0..=n {
            let y = v[(p + 1) % (n + 1)];
            let mut m = (z >> 5) ^ (y << 2);
            m = m.wrapping_add((y >> 3 ^ z << 4) ^ (d ^ y));
            m = m.wrapping_add(k[(p & 3) ^ e] ^ z);
            v[p] = v[p].wrapping_add(m);
            z = v[p];
        }
    }
    let mut out = Vec::with_capacity(v.len() * 4);
    for w in v {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// Full `info`-field pipeline: cipher under the challenge token, then the
/// base64 variant, then the marker tag.
pub fn encode_info(plain: &str, key: &str) -> String {
    format!("{INFO_TAG}{}", portal_base64(&xencode(plain, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const KEY: &str = "aa0edd0fff7dd9f1f0ae4e981ec0114c7b0bf6f67c4895bed4f4ac634e97ecf2";

    #[test]
    fn base64_known_answers() {
        assert_eq!(portal_base64(b"1"), "9+==");
        assert_eq!(portal_base64(b"2"), "9S==");
        assert_eq!(portal_base64(b"34"), "9z+=");
        assert_eq!(portal_base64(b"567"), "0FZ7");
        assert_eq!(portal_base64(b"\x00"), "LL==");
        assert_eq!(portal_base64(b"\x00\x00"), "LLL=");
        assert_eq!(portal_base64(b"\xff\x00\x00"), "AvLL");
        assert_eq!(portal_base64(b"\x01"), "L+==");
        assert_eq!(portal_base64(b"\x01==!@#$%^&*()"), "LFt52HLkRourRX//8+==");
        assert_eq!(portal_base64(b"\x01aAbB_+=-\x11"), "LaiVZYRs8ztfP+==");
    }

    #[test]
    fn base64_empty_and_length() {
        assert_eq!(portal_base64(b""), "");
        for len in 1..32usize {
            let data = vec![0xa5u8; len];
            assert_eq!(portal_base64(&data).len(), len.div_ceil(3) * 4);
        }
    }

    #[test]
    fn cipher_known_answer() {
        assert_eq!(xencode("1", KEY), hex!("1d27d624db464bd5"));
    }

    #[test]
    fn cipher_is_deterministic() {
        let a = xencode("some plaintext", KEY);
        let b = xencode("some plaintext", KEY);
        assert_eq!(a, b);
    }

    #[test]
    fn cipher_empty_input_short_circuits() {
        assert!(xencode("", KEY).is_empty());
        assert_eq!(encode_info("", KEY), INFO_TAG);
    }

    #[test]
    fn info_pipeline_fixture() {
        assert_eq!(encode_info("1", KEY), "{SRBX1}NmsaR0fCm5H=");
    }
}
