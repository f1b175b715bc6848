use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

/// Real-time room relay for collaborative editing.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, env = "RELAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Origin allowed by CORS (the frontend dev server)
    #[arg(long, env = "RELAY_CORS_ORIGIN", default_value = "http://localhost:5173")]
    pub cors_origin: String,

    /// Directory of static assets served under `/`
    #[arg(long, env = "RELAY_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

impl Config {
    /// Rejects values that would only fail once the server is running.
    pub fn validate(&self) -> Result<()> {
        self.addr()?;
        match self.cors_origin.split_once("://") {
            Some((scheme, host)) if !scheme.is_empty() && !host.is_empty() && !host.contains('/') => {}
            _ => bail!("invalid CORS origin {:?}, expected scheme://host[:port]", self.cors_origin),
        }
        Ok(())
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
