//! Protocol engine for SRUN-family campus captive portals.
//!
//! The portal speaks a proprietary challenge-response handshake: fetch a
//! one-time challenge token, obfuscate the credentials with a legacy block
//! cipher and a scrambled-alphabet base64, bind everything together with a
//! SHA-1 checksum, and submit the result as a JSONP-wrapped GET. The modules
//! here reproduce that wire behavior bit for bit; the CLI front-end lives in
//! the binary.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod http;
pub mod models;
pub mod parser;
pub mod portal;
pub mod probe;
pub mod urls;
