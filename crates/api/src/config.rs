//! Runtime configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Unset selects the in-memory store.
    pub database_url: Option<String>,
    /// Unset keeps uploaded media in memory.
    pub media_root: Option<PathBuf>,
    /// Base URL recorded in stored image links.
    pub public_base_url: String,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().context("PORT must be a port number")?,
            Err(_) => 8080,
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
        }

        let media_root = std::env::var("MEDIA_ROOT").ok().map(PathBuf::from);
        if media_root.is_none() {
            tracing::warn!("MEDIA_ROOT not set, keeping uploads in memory");
        }

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            database_url,
            media_root,
            public_base_url,
        })
    }
}
