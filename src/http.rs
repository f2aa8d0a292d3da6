//! Per-call HTTP plumbing.
//!
//! Every protocol call builds its own short-timeout client and drops it
//! afterwards; concurrent probes share no state. Requests fail fast rather
//! than hang, and nothing here retries the handshake itself.

use crate::error::AuthError;
use crate::parser;
use reqwest::{redirect, Client, Url};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Callback name the portal echoes back around its JSON.
pub const CALLBACK: &str = "C_a_l_l_b_a_c_k";

const CALL_TIMEOUT: Duration = Duration::from_secs(2);
/// Some portal builds occasionally answer with an empty body; ride that out
/// with a couple of extra attempts. This is transport resilience only, a
/// non-empty reply is never re-requested.
const EMPTY_BODY_ATTEMPTS: u32 = 3;
const MAX_REDIRECT_HOPS: usize = 10;

/// Short-timeout client with the given redirect policy, optionally carrying
/// a cookie jar (the NAS-id probe needs one across its two POSTs).
pub fn client_with(redirects: redirect::Policy, cookies: bool) -> Result<Client, AuthError> {
    let mut builder = Client::builder().timeout(CALL_TIMEOUT).redirect(redirects);
    if cookies {
        builder = builder.cookie_store(true);
    }
    Ok(builder.build()?)
}

/// GET a JSONP endpoint and return the inner JSON text.
pub async fn get_jsonp(url: &str, params: &[(&str, String)]) -> Result<String, AuthError> {
    let client = client_with(redirect::Policy::default(), false)?;
    let mut query: Vec<(&str, String)> = params.to_vec();
    query.push(("callback", CALLBACK.to_string()));

    let mut body = String::new();
    for attempt in 1..=EMPTY_BODY_ATTEMPTS {
        let resp = client.get(url).query(&query).send().await?;
        tracing::debug!(%url, status = %resp.status(), attempt, "portal GET");
        body = resp.text().await?;
        if !body.is_empty() {
            break;
        }
        tracing::debug!(%url, attempt, "empty portal response body");
    }
    Ok(parser::extract_jsonp(&body, CALLBACK)?.to_string())
}

/// GET without following redirects, returning the body text. Used by the
/// probes that scrape loosely formatted pages.
pub async fn get_text(url: &str, params: &[(&str, String)]) -> Result<String, AuthError> {
    let client = client_with(redirect::Policy::none(), false)?;
    let resp = client.get(url).query(params).send().await?;
    tracing::debug!(%url, status = %resp.status(), "probe GET");
    Ok(resp.text().await?)
}

/// GET while recording every redirect target the server sends before it is
/// followed. The recorded chain is what the online probe classifies.
pub async fn get_with_redirect_trace(
    url: &str,
    params: &[(&str, String)],
) -> Result<Vec<Url>, AuthError> {
    let seen: Arc<Mutex<Vec<Url>>> = Arc::new(Mutex::new(Vec::new()));
    let trace = Arc::clone(&seen);
    let policy = redirect::Policy::custom(move |attempt| {
        tracing::debug!(target = %attempt.url(), "redirect");
        if let Ok(mut hops) = trace.lock() {
            hops.push(attempt.url().clone());
        }
        if attempt.previous().len() > MAX_REDIRECT_HOPS {
            attempt.stop()
        } else {
            attempt.follow()
        }
    });
    let client = client_with(policy, false)?;
    client.get(url).query(params).send().await?;
    let hops = seen.lock().map(|h| h.clone()).unwrap_or_default();
    Ok(hops)
}
