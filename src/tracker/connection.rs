//! A single socket to one tracker

use crate::common::{ConnectionSettings, Error, Result, TrackerEndpoint};
use futures_util::FutureExt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Live connection to a tracker.
///
/// Any I/O failure leaves the connection unusable; the owner is expected to
/// drop it and reconnect.
pub struct TrackerConnection {
    endpoint: TrackerEndpoint,
    stream: Option<BufReader<TcpStream>>,
    io_timeout: Duration,
    eof: bool,
}

impl TrackerConnection {
    /// Open a connection bounded by `connect_timeout`.
    ///
    /// Failures come back as `io::Error` so the OS errno survives for logging.
    pub async fn connect(
        endpoint: &TrackerEndpoint,
        settings: &ConnectionSettings,
    ) -> io::Result<Self> {
        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match timeout(settings.connect_timeout, connect).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", settings.connect_timeout),
                ))
            }
        };
        stream.set_nodelay(true)?;

        Ok(Self {
            endpoint: endpoint.clone(),
            stream: Some(BufReader::new(stream)),
            io_timeout: settings.io_timeout,
            eof: false,
        })
    }

    pub fn endpoint(&self) -> &TrackerEndpoint {
        &self.endpoint
    }

    /// Open, not at end-of-stream, and with nothing waiting to be read.
    ///
    /// Only meaningful between requests. Probes the socket without waiting, so
    /// a tracker that hung up while we were idle is noticed before the next
    /// command is written. Bytes nobody asked for mean the reply stream is out
    /// of step with our requests, and the connection is no longer usable.
    pub fn is_alive(&self) -> bool {
        let Some(reader) = &self.stream else {
            return false;
        };
        if self.eof || !reader.buffer().is_empty() {
            return false;
        }

        let mut probe = [0u8; 1];
        match reader.get_ref().peek(&mut probe).now_or_never() {
            None => true,
            Some(Ok(_)) | Some(Err(_)) => false,
        }
    }

    /// Write one full command line
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let io_timeout = self.io_timeout;
        let reader = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Transport("connection is closed".into()))?;

        let write = async {
            let stream = reader.get_mut();
            stream.write_all(line.as_bytes()).await?;
            stream.flush().await
        };

        match timeout(io_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::Transport(format!(
                "unable to write to {}: {}",
                self.endpoint, e
            ))),
            Err(_) => Err(Error::Transport(format!(
                "write to {} timed out after {:?}",
                self.endpoint, io_timeout
            ))),
        }
    }

    /// Read one line, terminator included
    pub async fn read_line(&mut self) -> Result<String> {
        let io_timeout = self.io_timeout;
        let reader = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Transport("connection is closed".into()))?;

        let mut line = String::new();
        match timeout(io_timeout, reader.read_line(&mut line)).await {
            Ok(Ok(0)) => {
                self.eof = true;
                Err(Error::Transport(format!(
                    "connection closed by {}",
                    self.endpoint
                )))
            }
            Ok(Ok(_)) if !line.ends_with('\n') => {
                self.eof = true;
                Err(Error::Transport(format!(
                    "truncated response from {}",
                    self.endpoint
                )))
            }
            Ok(Ok(_)) => Ok(line),
            Ok(Err(e)) => Err(Error::Transport(format!(
                "unable to read from {}: {}",
                self.endpoint, e
            ))),
            Err(_) => Err(Error::Transport(format!(
                "read from {} timed out after {:?}",
                self.endpoint, io_timeout
            ))),
        }
    }

    /// Release the socket. Safe to call more than once.
    pub fn close(&mut self) {
        self.stream.take();
    }
}
