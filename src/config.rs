//! Configuration loading.
//!
//! Settings come from a TOML file and are overridden field by field with CLI
//! flags (string flags win when non-empty, boolean flags OR in). Daemon mode
//! refuses to run without a file since it cannot prompt.

use anyhow::{Context, Result};
use serde::Deserialize;
use srun_auth::probe::OnlineStrategy;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Portal account name.
    pub username: String,
    /// Portal account password; ignored for logout.
    pub password: String,
    /// Portal hostname; empty means the built-in default.
    pub host: String,
    /// Authenticate this IP instead of the caller's own address.
    pub ip: String,
    /// Fixed access-controller id; empty means probe, falling back to "1".
    pub ac_id: String,
    /// Use http:// instead of https:// towards the portal.
    pub insecure: bool,
    /// Skip the online pre-check and always send the request.
    pub no_check: bool,
    /// Stay in the keep-alive loop after a successful login.
    pub keep_online: bool,
    /// Never prompt on stdin and keep the log quiet.
    pub daemonize: bool,
    /// Print debug messages.
    pub debug: bool,
    /// Shell command executed after a successful login/logout.
    pub hook_success: String,
    /// Which online-detection contract the portal speaks.
    pub online_strategy: OnlineStrategy,
    /// Landing page scraped by the ac-id probe.
    pub landing_page: String,
    /// Base URL of the registration service used by the NAS-id probe.
    pub usereg_base: String,
    /// Reachability target polled by the keep-alive loop.
    pub keepalive_target: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: String::new(),
            ip: String::new(),
            ac_id: String::new(),
            insecure: false,
            no_check: false,
            keep_online: false,
            daemonize: false,
            debug: false,
            hook_success: String::new(),
            online_strategy: OnlineStrategy::default(),
            landing_page: "http://net.tsinghua.edu.cn/".to_string(),
            usereg_base: "http://usereg.tsinghua.edu.cn".to_string(),
            keepalive_target: "https://www.tsinghua.edu.cn/".to_string(),
        }
    }
}

impl Settings {
    pub fn default_host(&self) -> &str {
        if self.host.is_empty() {
            "auth4.tsinghua.edu.cn"
        } else {
            &self.host
        }
    }

    /// Load from an explicit path, or the first file found in the usual
    /// places. No file at all just yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::search_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn config_file_exists(explicit: Option<&Path>) -> bool {
        match explicit {
            Some(path) => path.exists(),
            None => Self::search_paths().iter().any(|p| p.exists()),
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("srun-auth.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("srun-auth/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".srun-auth.toml"));
        }
        paths.push(PathBuf::from("/etc/srun-auth/config.toml"));
        paths
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let settings = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_parses_with_defaults() {
        let settings: Settings =
            toml::from_str(r#"username = "alice""#).unwrap();
        assert_eq!(settings.username, "alice");
        assert!(!settings.insecure);
        assert_eq!(settings.online_strategy, OnlineStrategy::Redirect);
        assert_eq!(settings.default_host(), "auth4.tsinghua.edu.cn");
    }

    #[test]
    fn strategy_key_is_kebab_case() {
        let settings: Settings =
            toml::from_str(r#"online_strategy = "user-info""#).unwrap();
        assert_eq!(settings.online_strategy, OnlineStrategy::UserInfo);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Settings>(r#"usrname = "typo""#).is_err());
    }
}
