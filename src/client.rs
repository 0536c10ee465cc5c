//! Clients of the number service.
//!
//! A client is built once at startup, shared by whoever needs numbers, and
//! closed at shutdown. Both transports bound every exchange by
//! [`ClientConfig::timeout`] and retry transport failures at most
//! [`ClientConfig::retries`] times.

use std::{
    io::{self, BufReader, BufWriter, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use clap::ValueEnum;
use log::{debug, warn};
use serde_json::Deserializer;

use crate::error::{NumgenError, Result};
use crate::http_server::GENERATE_PATH;
use crate::policy::Difficulty;
use crate::protocol::{NumberPair, Response};

/// A source of number pairs.
pub trait NumberSource: Send + Sync {
    /// Obtain a pair for the given difficulty label.
    fn fetch(&self, difficulty: &str) -> Result<NumberPair>;

    /// Stop using the service. Later fetches fail with [`NumgenError::ClientClosed`].
    fn close(&self);
}

/// Transport used to reach the service.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// JSON request/reply over a TCP socket.
    Socket,
    /// HTTP GET with a `difficulty` query parameter.
    Http,
}

/// Client tuning.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// Upper bound for connecting, sending and waiting for the reply.
    pub timeout: Duration,
    /// Extra attempts after a transport failure.
    pub retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            retries: 1,
        }
    }
}

/// Build the client for `transport`.
pub fn connect(
    transport: Transport,
    addr: &str,
    config: ClientConfig,
) -> Result<Box<dyn NumberSource>> {
    Ok(match transport {
        Transport::Socket => Box::new(SocketClient::new(addr, config)?),
        Transport::Http => Box::new(HttpClient::new(addr, config)),
    })
}

fn with_retries<T>(config: &ClientConfig, mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
    let mut tries = 0;
    loop {
        match attempt() {
            Err(e) if e.is_retryable() && tries < config.retries => {
                tries += 1;
                warn!("Number service request failed ({e}), retry {tries}/{}", config.retries);
            }
            result => return result,
        }
    }
}

fn from_io(e: io::Error) -> NumgenError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NumgenError::Timeout,
        _ => NumgenError::IOError(e),
    }
}

fn from_reply(response: Response) -> Result<NumberPair> {
    match response {
        Response::Numbers(pair) => Ok(pair),
        Response::Err { error } => Err(NumgenError::ServiceError(error)),
    }
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    fn open(addr: &SocketAddr, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout).map_err(from_io)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    fn exchange(mut self, difficulty: Difficulty) -> Result<NumberPair> {
        serde_json::to_writer(&mut self.writer, difficulty.as_str())?;
        self.writer.write_all(b"\n").map_err(from_io)?;
        self.writer.flush().map_err(from_io)?;
        let response = Deserializer::from_reader(&mut self.reader)
            .into_iter::<Response>()
            .next()
            .ok_or_else(|| NumgenError::MalformedResponse("connection closed".to_string()))?;
        match response {
            Ok(response) => from_reply(response),
            Err(e) => match e.io_error_kind() {
                Some(kind) => Err(from_io(kind.into())),
                None => Err(NumgenError::MalformedResponse(e.to_string())),
            },
        }
    }
}

/// Client for [`crate::NumberServer`].
///
/// Every request opens its own connection, which the server closes after
/// replying, so no connection sits idle between requests.
pub struct SocketClient {
    addr: SocketAddr,
    config: ClientConfig,
    closed: AtomicBool,
}

impl SocketClient {
    /// Create a client for the server at `addr`.
    pub fn new(addr: impl ToSocketAddrs, config: ClientConfig) -> Result<Self> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            NumgenError::IOError(io::Error::new(
                io::ErrorKind::InvalidInput,
                "address resolved to nothing",
            ))
        })?;
        Ok(Self {
            addr,
            config,
            closed: AtomicBool::new(false),
        })
    }

    fn attempt(&self, difficulty: Difficulty) -> Result<NumberPair> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(NumgenError::ClientClosed);
        }
        debug!("Requesting {difficulty} numbers from {}", self.addr);
        Connection::open(&self.addr, self.config.timeout)?.exchange(difficulty)
    }
}

impl NumberSource for SocketClient {
    fn fetch(&self, difficulty: &str) -> Result<NumberPair> {
        let difficulty: Difficulty = difficulty.parse()?;
        with_retries(&self.config, || self.attempt(difficulty))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Client for the HTTP adapter.
pub struct HttpClient {
    url: String,
    config: ClientConfig,
    agent: ureq::Agent,
    closed: AtomicBool,
}

impl HttpClient {
    /// `base` is either `host:port` or a full `http://` base URL.
    pub fn new(base: &str, config: ClientConfig) -> Self {
        let base = base.trim_end_matches('/');
        let url = if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}{GENERATE_PATH}")
        } else {
            format!("http://{base}{GENERATE_PATH}")
        };
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            url,
            config,
            agent,
            closed: AtomicBool::new(false),
        }
    }

    fn attempt(&self, difficulty: Difficulty) -> Result<NumberPair> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(NumgenError::ClientClosed);
        }
        let call = self
            .agent
            .get(&self.url)
            .query("difficulty", difficulty.as_str())
            .call();
        match call {
            Ok(response) => {
                let body = response.into_string().map_err(from_io)?;
                serde_json::from_str::<Response>(&body)
                    .map_err(|e| NumgenError::MalformedResponse(e.to_string()))
                    .and_then(from_reply)
            }
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                match serde_json::from_str::<Response>(&body) {
                    Ok(Response::Err { error }) => Err(NumgenError::ServiceError(error)),
                    _ => Err(NumgenError::HttpError(format!("status {code}"))),
                }
            }
            Err(ureq::Error::Transport(e)) => Err(NumgenError::HttpError(e.to_string())),
        }
    }
}

impl NumberSource for HttpClient {
    fn fetch(&self, difficulty: &str) -> Result<NumberPair> {
        let difficulty: Difficulty = difficulty.parse()?;
        with_retries(&self.config, || self.attempt(difficulty))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retries_are_bounded() {
        let config = ClientConfig {
            timeout: Duration::from_millis(10),
            retries: 3,
        };
        let calls = Cell::new(0);
        let result: Result<()> = with_retries(&config, || {
            calls.set(calls.get() + 1);
            Err(NumgenError::Timeout)
        });
        assert!(matches!(result, Err(NumgenError::Timeout)));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn rejected_requests_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retries(&ClientConfig::default(), || {
            calls.set(calls.get() + 1);
            Err(NumgenError::ServiceError("Invalid request".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn success_after_retry() {
        let calls = Cell::new(0);
        let result = with_retries(&ClientConfig::default(), || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(NumgenError::MalformedResponse("garbage".to_string()))
            } else {
                Ok(5)
            }
        });
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn invalid_label_fails_before_any_connection() {
        // nothing listens on port 9 here, so a connection attempt would fail differently
        let client = SocketClient::new("127.0.0.1:9", ClientConfig::default()).unwrap();
        assert!(matches!(
            client.fetch("extreme"),
            Err(NumgenError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn http_url_from_host_port() {
        let client = HttpClient::new("127.0.0.1:8000", ClientConfig::default());
        assert_eq!(client.url, "http://127.0.0.1:8000/api/generate_numbers");
        let client = HttpClient::new("http://numbers.local/", ClientConfig::default());
        assert_eq!(client.url, "http://numbers.local/api/generate_numbers");
    }

    #[test]
    fn closed_client_refuses_requests() {
        let client = HttpClient::new("127.0.0.1:9", ClientConfig::default());
        client.close();
        assert!(matches!(client.fetch("easy"), Err(NumgenError::ClientClosed)));
    }
}
