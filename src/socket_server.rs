//! Request/reply number server over TCP.
//!
//! Each connection carries exactly one exchange: a newline terminated label,
//! either plain text (`easy`) or a JSON string (`"easy"`), answered with one
//! JSON [`Response`] line before the connection is closed. Connections are
//! accepted one at a time, so requests from concurrent clients are served in
//! turn.

use std::{
    io::{BufRead, BufReader, BufWriter, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use log::{debug, error, info, warn};

use crate::error::Result;
use crate::policy;
use crate::protocol::Response;

/// Default time a client has to deliver its request after connecting.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest request line read from a client.
const MAX_REQUEST_LEN: u64 = 1024;

/// Number server
pub struct NumberServer {
    listener: TcpListener,
    request_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl NumberServer {
    /// Bind a new number server
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        // non-blocking so the shutdown flag is checked between accepts
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Give up on a connection that has not sent its request within `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The address the server listens on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops [`NumberServer::run`] once set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Run the accept loop until shutdown is requested.
    pub fn run(&self) -> Result<()> {
        info!("Number server listening on {}", self.local_addr()?);

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Stopping server...");
                break;
            }

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {peer}");
                    if let Err(e) = self.serve(stream) {
                        warn!("Error handling connection from {peer}: {e}");
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                    continue;
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        error!("Accept failed: {e}");
                        return Err(e.into());
                    }
                    break;
                }
            }
        }

        info!("Number server stopped");
        Ok(())
    }

    fn serve(&self, stream: TcpStream) -> Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(self.request_timeout))?;
        stream.set_write_timeout(Some(self.request_timeout))?;
        handle_stream(stream)
    }
}

/// Set `shutdown` when the process receives ctrl-c.
///
/// The handler is installed before this returns.
pub fn shutdown_on_ctrl_c(shutdown: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());
    // the first poll registers the signal handler
    let early = runtime.block_on(async {
        tokio::select! {
            biased;
            result = &mut ctrl_c => Some(result),
            _ = std::future::ready(()) => None,
        }
    });
    if let Some(result) = early {
        result?;
        shutdown.store(true, Ordering::Relaxed);
        return Ok(());
    }

    thread::spawn(move || {
        match runtime.block_on(ctrl_c) {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Unable to listen for ctrl-c: {e}"),
        }
    });
    Ok(())
}

/// The label carried by one request line.
fn parse_label(line: &str) -> String {
    let line = line.trim();
    serde_json::from_str::<String>(line).unwrap_or_else(|_| line.to_string())
}

fn handle_stream(stream: TcpStream) -> Result<()> {
    let mut buf_reader = BufReader::new(stream.try_clone()?).take(MAX_REQUEST_LEN);
    let mut buf_writer = BufWriter::new(stream);
    let mut line = String::new();
    let response = match buf_reader.read_line(&mut line) {
        Ok(0) => {
            debug!("Connection closed before a request arrived");
            return Ok(());
        }
        Ok(_) => {
            let label = parse_label(&line);
            let response = policy::respond(&label, &mut rand::rng());
            debug!("Request {label:?} -> {response:?}");
            response
        }
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Response::Err {
            error: "Invalid request: not valid UTF-8".to_string(),
        },
        Err(e) => return Err(e.into()),
    };
    serde_json::to_writer(&mut buf_writer, &response)?;
    buf_writer.write_all(b"\n")?;
    buf_writer.flush()?;
    Ok(())
}
