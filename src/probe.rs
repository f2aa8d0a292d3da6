//! Session-state and portal-id probes.
//!
//! Two portal generations detect an online session differently, so the
//! strategy is a config-selected variant. The ac-id and NAS-id probes are
//! best-effort helpers so callers do not have to know portal-internal ids
//! up front; their failure degrades to defaults instead of aborting.

use crate::checksum;
use crate::error::AuthError;
use crate::http;
use crate::models::OnlineStatus;
use crate::parser;
use crate::urls::PortalEndpoint;
use reqwest::{redirect, Url};
use serde::Deserialize;

/// Path marker the portal redirects through once a session is live.
const SUCCESS_PAGE: &str = "succeed_wired.php";

/// Which online-detection contract the target portal speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnlineStrategy {
    /// Older portals redirect through a success page carrying the username.
    #[default]
    Redirect,
    /// Newer portals expose a user-info endpoint keyed by the public IP.
    UserInfo,
}

pub async fn probe_online(
    endpoint: &PortalEndpoint,
    ac_id: &str,
    strategy: OnlineStrategy,
) -> Result<OnlineStatus, AuthError> {
    match strategy {
        OnlineStrategy::Redirect => redirect_probe(endpoint, ac_id).await,
        OnlineStrategy::UserInfo => user_info_probe(endpoint).await,
    }
}

async fn redirect_probe(endpoint: &PortalEndpoint, ac_id: &str) -> Result<OnlineStatus, AuthError> {
    let params = [("ac_id", ac_id.to_string())];
    let hops = http::get_with_redirect_trace(&endpoint.online_check_url(), &params).await?;
    Ok(classify_redirects(&hops))
}

/// Pure classification of a recorded redirect chain: a hop through the
/// success page means online, and its query may name the session's user.
/// No such hop means offline, which is not an error.
fn classify_redirects(hops: &[Url]) -> OnlineStatus {
    for hop in hops {
        if hop.path().contains(SUCCESS_PAGE) {
            let username = hop.query().and_then(parser::username_from_query);
            return OnlineStatus { online: true, username };
        }
    }
    OnlineStatus::default()
}

#[derive(Debug, Deserialize)]
struct UserInfoReply {
    error: Option<String>,
    user_name: Option<String>,
}

async fn user_info_probe(endpoint: &PortalEndpoint) -> Result<OnlineStatus, AuthError> {
    let body = http::get_text(&endpoint.online_check_url(), &[]).await?;
    let Some(ip) = parser::ipv4_from_body(&body) else {
        // Nothing resembling our address in the page: not authenticated.
        return Ok(OnlineStatus::default());
    };
    let json = http::get_jsonp(&endpoint.user_info_url(), &[("ip", ip)]).await?;
    let reply: UserInfoReply = serde_json::from_str(&json)
        .map_err(|e| AuthError::Malformed(format!("user info JSON: {e}")))?;
    Ok(OnlineStatus {
        online: reply.error.as_deref() == Some("ok"),
        username: reply.user_name,
    })
}

/// Scrape the numeric access-controller id off the portal's landing page.
/// Best effort; the caller falls back to ac_id "1" when this fails.
pub async fn probe_ac_id(landing_url: &str) -> Result<String, AuthError> {
    let body = http::get_text(landing_url, &[]).await?;
    let ac_id = parser::ac_id_from_html(&body)
        .ok_or_else(|| AuthError::Malformed("ac_id not found on landing page".into()))?;
    tracing::debug!(%ac_id, "probed ac_id");
    Ok(ac_id)
}

/// Look up the NAS id required to authenticate an IP other than our own.
/// Two POSTs against the registration service: the first establishes a
/// session cookie, the second queries the id for the target address.
pub async fn probe_nas_id(
    usereg_base: &str,
    ip: &str,
    username: &str,
    password: &str,
) -> Result<String, AuthError> {
    let client = http::client_with(redirect::Policy::none(), true)?;

    let login = [
        ("action", "login".to_string()),
        ("user_login_name", username.to_string()),
        ("user_password", checksum::md5_hex(password)),
    ];
    let url = format!("{usereg_base}/do.php");
    tracing::debug!(%url, "NAS probe login");
    client.post(&url).form(&login).send().await?;

    let query = [
        ("actionType", "searchNasId".to_string()),
        ("ip", ip.to_string()),
    ];
    let url = format!("{usereg_base}/ip_login_import.php");
    tracing::debug!(%url, %ip, "NAS id lookup");
    let body = client.post(&url).form(&query).send().await?.text().await?;

    if body == "fail" {
        return Err(AuthError::Rejected("NAS id lookup answered 'fail'".into()));
    }
    if body.parse::<u64>().is_err() {
        return Err(AuthError::Malformed(format!("NAS id is not numeric: {body:?}")));
    }
    tracing::debug!(nas_id = %body, "probed NAS id");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn redirect_chain_with_success_marker_is_online() {
        let hops = vec![
            url("http://portal.example.edu/check.php"),
            url("http://portal.example.edu/succeed_wired.php?ac_id=1&username=alice"),
        ];
        let status = classify_redirects(&hops);
        assert!(status.online);
        assert_eq!(status.username.as_deref(), Some("alice"));
    }

    #[test]
    fn redirect_chain_without_marker_is_offline() {
        let hops = vec![
            url("http://portal.example.edu/check.php"),
            url("http://portal.example.edu/index_1.html?username=alice"),
        ];
        let status = classify_redirects(&hops);
        assert!(!status.online);
        assert_eq!(status.username, None);
    }

    #[test]
    fn empty_chain_is_offline() {
        assert_eq!(classify_redirects(&[]), OnlineStatus::default());
    }

    #[test]
    fn success_hop_without_username_still_counts() {
        let hops = vec![url("http://portal.example.edu/succeed_wired.php?ac_id=1")];
        let status = classify_redirects(&hops);
        assert!(status.online);
        assert_eq!(status.username, None);
    }
}
