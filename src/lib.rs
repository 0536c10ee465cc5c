pub mod protocol;

pub mod policy;

pub mod socket_server;

pub mod http_server;

pub mod client;

pub mod problem;

pub mod session;

pub mod app;

pub mod error;

pub use crate::client::{ClientConfig, HttpClient, NumberSource, SocketClient, Transport};
pub use crate::error::{NumgenError, Result};
pub use crate::policy::Difficulty;
pub use crate::socket_server::NumberServer;

/// Install the stderr log subscriber used by the binaries.
///
/// `log` records are forwarded through the subscriber's `tracing-log` bridge.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
