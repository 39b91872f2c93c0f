use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_DB_PATH: &str = "/tmp/echo-sample-db.bin";
pub const DEFAULT_PORT: u16 = 1323;

/// Todo API - a small JSON service for keeping a todo list in SQLite
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to bind to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file, created on first start
    #[arg(short, long, default_value = DEFAULT_DB_PATH)]
    pub database: PathBuf,

    /// Directory served for every path outside /api
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,
}

impl Cli {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
