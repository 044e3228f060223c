//! lipbridge - Lutron bridge monitor
//!
//! This is the command-line entry point. It logs in to a bridge, prints every
//! response line the bridge sends, and logs out on Ctrl+C.

use lipbridge::inventory::load_integration_report;
use lipbridge::session::{Endpoint, KeepAlive, Session, SessionConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Pause before re-opening a session whose automatic reconnect failed
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Monitor configuration
struct Config {
    /// Bridge host
    host: Option<String>,
    /// Bridge port
    port: u16,
    /// Integration username
    username: String,
    /// Integration password
    password: String,
    /// Post-login prompt
    prompt: String,
    /// Integration report to print before connecting
    report: Option<String>,
    /// Keepalive interval
    keepalive: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: lipbridge::DEFAULT_PORT,
            username: "lutron".to_string(),
            password: "integration".to_string(),
            prompt: "GNET> ".to_string(),
            report: None,
            keepalive: None,
        }
    }
}

/// Why argument parsing stopped
#[derive(Debug, PartialEq, thiserror::Error)]
enum ArgError {
    #[error("help requested")]
    Help,
    #[error("version requested")]
    Version,
    #[error("Unknown argument: {0}")]
    Unknown(String),
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("invalid {0}")]
    Invalid(&'static str),
}

/// Flags that take a value
const VALUE_FLAGS: &[&str] = &[
    "--host",
    "-h",
    "--port",
    "-p",
    "--user",
    "-u",
    "--password",
    "-P",
    "--prompt",
    "--report",
    "-r",
    "--keepalive",
    "-k",
];

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();

        match Self::parse(&args) {
            Ok(config) => config,
            Err(ArgError::Help) => {
                print_help();
                std::process::exit(0);
            }
            Err(ArgError::Version) => {
                println!("lipbridge version {}", lipbridge::VERSION);
                std::process::exit(0);
            }
            Err(e @ ArgError::Unknown(_)) => {
                eprintln!("{}", e);
                print_help();
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let mut config = Config::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--help" => return Err(ArgError::Help),
                "--version" | "-v" => return Err(ArgError::Version),
                _ if !VALUE_FLAGS.contains(&flag) => {
                    return Err(ArgError::Unknown(flag.to_string()))
                }
                _ => {}
            }
            let value = args
                .get(i + 1)
                .cloned()
                .ok_or_else(|| ArgError::MissingValue(flag.to_string()))?;

            match flag {
                "--host" | "-h" => config.host = Some(value),
                "--port" | "-p" => {
                    config.port = value.parse().map_err(|_| ArgError::Invalid("port number"))?;
                }
                "--user" | "-u" => config.username = value,
                "--password" | "-P" => config.password = value,
                "--prompt" => config.prompt = value,
                "--report" | "-r" => config.report = Some(value),
                _ => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| ArgError::Invalid("keepalive interval"))?;
                    if secs == 0 {
                        return Err(ArgError::Invalid("keepalive interval (must be at least 1)"));
                    }
                    config.keepalive = Some(Duration::from_secs(secs));
                }
            }
            i += 2;
        }

        Ok(config)
    }

    fn endpoint(&self, host: &str) -> Endpoint {
        Endpoint::new(host)
            .with_port(self.port)
            .with_credentials(self.username.clone(), self.password.clone())
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new().with_prompt(self.prompt.clone())
    }
}

fn print_help() {
    println!(
        r#"
lipbridge - Lutron Integration Protocol monitor

USAGE:
    lipbridge --host <HOST> [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Bridge host or IP address
    -p, --port <PORT>          Telnet integration port (default: 23)
    -u, --user <USER>          Integration username (default: lutron)
    -P, --password <PASS>      Integration password (default: integration)
        --prompt <PROMPT>      Post-login prompt (default: "GNET> ")
    -r, --report <FILE>        Print devices from an integration report first
    -k, --keepalive <SECS>     Send #PING every SECS seconds
    -v, --version              Print version information
        --help                 Print this help message

EXAMPLES:
    lipbridge -h 192.168.1.20
    lipbridge -h 192.168.1.20 -k 60 -r report.json
    RUST_LOG=lipbridge=debug lipbridge -h bridge.local
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Some(path) = &config.report {
        let devices = load_integration_report(path)?;
        info!(count = devices.len(), "Loaded integration report");
        println!("{}", serde_json::to_string_pretty(&devices)?);
    }

    let Some(host) = config.host.clone() else {
        if config.report.is_some() {
            return Ok(());
        }
        eprintln!("Error: --host is required");
        print_help();
        std::process::exit(1);
    };

    let endpoint = config.endpoint(&host);
    let session = Arc::new(Session::with_config(config.session_config()));
    session.open(endpoint.clone()).await?;

    let _keepalive = config
        .keepalive
        .map(|interval| KeepAlive::start(Arc::clone(&session), interval));

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, logging out...");
    };

    tokio::select! {
        _ = monitor_loop(Arc::clone(&session), endpoint) => {}
        _ = shutdown => {}
    }

    session.logout().await;
    Ok(())
}

/// Prints responses until the task is cancelled.
async fn monitor_loop(session: Arc<Session>, endpoint: Endpoint) {
    loop {
        if let Some(response) = session.read().await {
            println!("{}", response);
            continue;
        }

        if !session.is_connected() {
            warn!(
                retry_secs = RETRY_DELAY.as_secs(),
                "Bridge unreachable, retrying"
            );
            tokio::time::sleep(RETRY_DELAY).await;
            let _ = session.open(endpoint.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::parse(&args(&["-h", "10.0.0.5", "-p", "2323", "-k", "30"])).unwrap();
        assert_eq!(config.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.port, 2323);
        assert_eq!(config.keepalive, Some(Duration::from_secs(30)));
        assert_eq!(config.username, "lutron");
    }

    #[test]
    fn test_unknown_trailing_flag() {
        let result = Config::parse(&args(&["-h", "bridge", "--foo"]));
        assert!(matches!(result, Err(ArgError::Unknown(ref f)) if f == "--foo"));
    }

    #[test]
    fn test_missing_value() {
        let result = Config::parse(&args(&["--host"]));
        assert!(matches!(result, Err(ArgError::MissingValue(ref f)) if f == "--host"));
    }

    #[test]
    fn test_zero_keepalive_rejected() {
        let result = Config::parse(&args(&["-h", "bridge", "--keepalive", "0"]));
        assert!(matches!(result, Err(ArgError::Invalid(_))));
    }
}
