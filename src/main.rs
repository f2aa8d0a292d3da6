//! srun-auth - authenticating client for SRUN-family campus captive portals.
//!
//! The protocol/codec core lives in the library; this binary is the CLI
//! front-end: flags, config file, prompting, the success hook and the
//! keep-alive loop.

mod config;
mod keepalive;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Settings;
use srun_auth::models::{Action, LoginIntent};
use srun_auth::portal::SrunClient;
use srun_auth::probe;
use srun_auth::urls::PortalEndpoint;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "srun-auth")]
#[command(about = "Authenticating client for SRUN campus portals", version)]
struct Cli {
    /// Portal account name
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Portal account password
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Command line executed in a shell after a successful login/logout
    #[arg(long, global = true)]
    hook_success: Option<String>,

    /// Never prompt on stdin; keep the log quiet
    #[arg(short = 'D', long, global = true)]
    daemonize: bool,

    /// Print debug messages
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    auth: AuthFlags,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
struct AuthFlags {
    /// Authenticate the specified IP address instead of this host
    #[arg(long)]
    ip: Option<String>,

    /// Hostname of the portal
    #[arg(long)]
    host: Option<String>,

    /// Use the specified ac_id instead of probing for one
    #[arg(long)]
    ac_id: Option<String>,

    /// Use http instead of https towards the portal
    #[arg(long)]
    insecure: bool,

    /// Skip the online pre-check, always send the request
    #[arg(short, long)]
    no_check: bool,

    /// Keep the session online after a successful login
    #[arg(short, long)]
    keep_online: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate this host (default)
    Auth {
        #[command(flatten)]
        flags: AuthFlags,
        /// Send a logout request instead (same as the deauth command)
        #[arg(short = 'o', long)]
        logout: bool,
    },
    /// De-authenticate
    Deauth {
        #[command(flatten)]
        flags: AuthFlags,
    },
    /// Report whether the session is online and as whom
    Status {
        #[command(flatten)]
        flags: AuthFlags,
    },
    /// Keep the session online without authenticating first
    Online,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.daemonize && !Settings::config_file_exists(cli.config.as_deref()) {
        bail!("cannot find a config file (required in daemon mode)");
    }
    let mut settings = Settings::load(cli.config.as_deref())?;
    merge_global_flags(&mut settings, &cli);

    init_logging(&settings);

    match cli.command {
        None => {
            merge_auth_flags(&mut settings, &cli.auth);
            run_auth(&mut settings, false).await
        }
        Some(Command::Auth { flags, logout }) => {
            merge_auth_flags(&mut settings, &flags);
            run_auth(&mut settings, logout).await
        }
        Some(Command::Deauth { flags }) => {
            merge_auth_flags(&mut settings, &flags);
            run_auth(&mut settings, true).await
        }
        Some(Command::Status { flags }) => {
            merge_auth_flags(&mut settings, &flags);
            run_status(&settings).await
        }
        Some(Command::Online) => keepalive::keep_alive_loop(&settings.keepalive_target).await,
    }
}

fn init_logging(settings: &Settings) {
    let level = if settings.daemonize {
        "error"
    } else if settings.debug {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// CLI flags win over file values: strings when given, booleans OR in.
fn merge_global_flags(settings: &mut Settings, cli: &Cli) {
    if let Some(username) = &cli.username {
        settings.username = username.clone();
    }
    if let Some(password) = &cli.password {
        settings.password = password.clone();
    }
    if let Some(hook) = &cli.hook_success {
        settings.hook_success = hook.clone();
    }
    settings.daemonize |= cli.daemonize;
    settings.debug |= cli.debug;
}

fn merge_auth_flags(settings: &mut Settings, flags: &AuthFlags) {
    if let Some(ip) = &flags.ip {
        settings.ip = ip.clone();
    }
    if let Some(host) = &flags.host {
        settings.host = host.clone();
    }
    if let Some(ac_id) = &flags.ac_id {
        settings.ac_id = ac_id.clone();
    }
    settings.insecure |= flags.insecure;
    settings.no_check |= flags.no_check;
    settings.keep_online |= flags.keep_online;
}

/// The full login/logout flow: optional online pre-check, best-effort id
/// probes, then one handshake through the protocol client.
async fn run_auth(settings: &mut Settings, logout: bool) -> Result<()> {
    let action = if logout { "logout" } else { "login" };
    let mut ac_id = if settings.ac_id.is_empty() {
        "1".to_string()
    } else {
        settings.ac_id.clone()
    };

    // Probe the ac_id only when the caller pinned neither an id nor an IP.
    if settings.ip.is_empty() && settings.ac_id.is_empty() {
        match probe::probe_ac_id(&settings.landing_page).await {
            Ok(probed) => ac_id = probed,
            Err(e) => {
                tracing::debug!("ac_id probe failed: {e}");
                if !logout {
                    tracing::debug!("login may fail with an IP address mismatch");
                }
            }
        }
    }

    let endpoint = PortalEndpoint::new(settings.default_host(), settings.insecure);

    if settings.ip.is_empty() && !settings.no_check {
        let status = probe::probe_online(&endpoint, &ac_id, settings.online_strategy)
            .await
            .unwrap_or_default();
        if status.online && logout {
            // Borrow the probed identity so logout works without prompting.
            if let Some(name) = status.username {
                settings.username = name;
            }
        }
        if status.online && !logout {
            tracing::info!("currently online");
            if settings.keep_online {
                return keepalive::keep_alive_loop(&settings.keepalive_target).await;
            }
            return Ok(());
        }
        if !status.online && logout {
            tracing::info!("currently offline");
            return Ok(());
        }
    }

    prompt_username(settings)?;
    if !logout {
        prompt_password(settings)?;
        // Authenticating another IP needs its NAS id as the ac_id, unless the
        // caller pinned either value already.
        if !settings.ip.is_empty() && settings.host.is_empty() && settings.ac_id.is_empty() {
            match probe::probe_nas_id(
                &settings.usereg_base,
                &settings.ip,
                &settings.username,
                &settings.password,
            )
            .await
            {
                Ok(nas_id) => ac_id = nas_id,
                Err(e) => tracing::debug!("NAS id probe failed: {e}"),
            }
        }
    }

    let intent = LoginIntent {
        action: if logout { Action::Logout } else { Action::Login },
        username: settings.username.clone(),
        password: settings.password.clone(),
        ip: settings.ip.clone(),
        ac_id,
    };
    SrunClient::new(endpoint)
        .run(&intent)
        .await
        .with_context(|| format!("{action} failed"))?;
    tracing::info!("{action} succeeded");
    run_hook(settings);

    if settings.keep_online && !logout {
        if settings.ip.is_empty() {
            return keepalive::keep_alive_loop(&settings.keepalive_target).await;
        }
        tracing::error!("cannot keep another IP online");
    }
    Ok(())
}

async fn run_status(settings: &Settings) -> Result<()> {
    let ac_id = if settings.ac_id.is_empty() { "1" } else { &settings.ac_id };
    let endpoint = PortalEndpoint::new(settings.default_host(), settings.insecure);
    let status = probe::probe_online(&endpoint, ac_id, settings.online_strategy).await?;
    match (status.online, status.username) {
        (true, Some(name)) => println!("online as {name}"),
        (true, None) => println!("online"),
        (false, _) => println!("offline"),
    }
    Ok(())
}

fn prompt_username(settings: &mut Settings) -> Result<()> {
    if settings.username.is_empty() && !settings.daemonize {
        print!("Username: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        settings.username = line.trim().to_string();
    }
    if settings.username.is_empty() {
        bail!("username can't be empty");
    }
    Ok(())
}

fn prompt_password(settings: &mut Settings) -> Result<()> {
    if settings.password.is_empty() && !settings.daemonize {
        print!("Password: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        settings.password = line.trim_end_matches(['\r', '\n']).to_string();
    }
    if settings.password.is_empty() {
        bail!("password can't be empty");
    }
    Ok(())
}

fn run_hook(settings: &Settings) {
    if settings.hook_success.is_empty() {
        return;
    }
    tracing::debug!("running hook {:?}", settings.hook_success);
    match std::process::Command::new("sh")
        .arg("-c")
        .arg(&settings.hook_success)
        .status()
    {
        Ok(status) if !status.success() => tracing::error!("hook exited with {status}"),
        Ok(_) => {}
        Err(e) => tracing::error!("hook execution failed: {e}"),
    }
}
