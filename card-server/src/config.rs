//! Server configuration from command-line arguments and environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default port for the card server.
pub const DEFAULT_PORT: u16 = 9474;

/// Command-line arguments for the card server.
#[derive(Debug, Clone, Parser)]
#[command(name = "arbiz-viewer")]
#[command(about = "ARbiz business card viewer service")]
#[command(version)]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(long, env = "CARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "CARD_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// JSON file with cards to serve (array of card records)
    #[arg(long, env = "CARD_SEED_FILE")]
    pub cards: Option<PathBuf>,

    /// Time budget per image fetch attempt, in milliseconds
    #[arg(long, env = "CARD_IMAGE_TIMEOUT_MS", default_value_t = 5000)]
    pub image_timeout_ms: u64,
}

impl ServerArgs {
    /// Socket address to listen on.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Time budget per image fetch attempt.
    #[must_use]
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    /// Whether the server only accepts local connections.
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.bind.is_loopback()
    }
}
