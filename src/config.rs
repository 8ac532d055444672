//! Startup configuration, validated once before the server binds.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::apply::ApplyStrategy;
use crate::error::{Result, SyncError};

pub const DEFAULT_GATEWAY_ADDR: &str = "http://localhost:4122";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:12000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(SyncError::Config(format!(
                "unknown log format ({other}), expected json or text"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "error" => Ok(Self::Error),
            other => Err(SyncError::Config(format!(
                "invalid log level ({other}) provided, expected debug, info or error"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub admin_secret: String,
    pub gateway_addr: Url,
    pub bind_addr: SocketAddr,
    pub strategy: ApplyStrategy,
    pub sync_timeout: Duration,
}

impl SyncConfig {
    pub fn new(
        admin_secret: &str,
        gateway_addr: &str,
        bind_addr: &str,
        strategy: &str,
        sync_timeout_secs: u64,
    ) -> Result<Self> {
        if admin_secret.is_empty() {
            return Err(SyncError::Config(
                "cannot start sc config sync, admin secret not provided".into(),
            ));
        }

        Ok(Self {
            admin_secret: admin_secret.to_string(),
            gateway_addr: parse_gateway_addr(gateway_addr)?,
            bind_addr: bind_addr
                .parse()
                .map_err(|e| SyncError::Config(format!("invalid bind address ({bind_addr}): {e}")))?,
            strategy: strategy.parse()?,
            sync_timeout: match sync_timeout_secs {
                0 => return Err(SyncError::Config("sync timeout must be positive".into())),
                secs => Duration::from_secs(secs),
            },
        })
    }
}

/// The gateway must be an absolute `http`/`https` URL,
/// e.g. `http://gateway.space-cloud.svc.cluster.local:4122`.
pub fn parse_gateway_addr(addr: &str) -> Result<Url> {
    let url = Url::parse(addr)
        .map_err(|e| SyncError::Config(format!("invalid gateway address ({addr}): {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(SyncError::Config(format!(
            "gateway address ({addr}) should use the http or https scheme, \
             e.g. http://gateway.space-cloud.svc.cluster.local:4122"
        ))),
    }
}
