//! Portal endpoint resolution.

/// A portal host plus scheme choice; immutable once constructed. Host
/// reachability is not checked here, that surfaces when a request is issued.
#[derive(Debug, Clone)]
pub struct PortalEndpoint {
    scheme: &'static str,
    host: String,
}

impl PortalEndpoint {
    pub fn new(host: impl Into<String>, insecure: bool) -> Self {
        Self {
            scheme: if insecure { "http" } else { "https" },
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn challenge_url(&self) -> String {
        format!("{}://{}/cgi-bin/get_challenge", self.scheme, self.host)
    }

    pub fn portal_url(&self) -> String {
        format!("{}://{}/cgi-bin/srun_portal", self.scheme, self.host)
    }

    pub fn online_check_url(&self) -> String {
        format!("{}://{}/srun_portal_pc.php", self.scheme, self.host)
    }

    /// Newer portal generations expose session details here.
    pub fn user_info_url(&self) -> String {
        format!("{}://{}/cgi-bin/rad_user_info", self.scheme, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_by_default() {
        let ep = PortalEndpoint::new("auth4.example.edu", false);
        assert_eq!(ep.challenge_url(), "https://auth4.example.edu/cgi-bin/get_challenge");
        assert_eq!(ep.portal_url(), "https://auth4.example.edu/cgi-bin/srun_portal");
        assert_eq!(ep.online_check_url(), "https://auth4.example.edu/srun_portal_pc.php");
        assert_eq!(ep.user_info_url(), "https://auth4.example.edu/cgi-bin/rad_user_info");
    }

    #[test]
    fn insecure_switches_scheme_only() {
        let ep = PortalEndpoint::new("portal.example.edu", true);
        assert_eq!(ep.challenge_url(), "http://portal.example.edu/cgi-bin/get_challenge");
    }
}
