//! Shared fakes for integration tests: a scripted tracker and a recording transfer

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use mogilefs::store::{Method, Transfer, TransferBody, TransferRequest, TransferResponse};
use mogilefs::tracker::protocol::{err_line, ok_line, Fields};
use mogilefs::{ConnectionSettings, TrackerEndpoint};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// What the fake tracker does with the next request line
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send this raw line
    Line(String),
    /// Send this raw line after a pause
    Delayed(Duration, String),
    /// Drop the connection without answering
    Close,
    /// Never answer
    Hang,
}

pub fn ok<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Reply {
    let fields: Fields = fields.into_iter().collect();
    Reply::Line(ok_line(&fields))
}

pub fn err(code: &str) -> Reply {
    Reply::Line(err_line(code, code))
}

pub fn slow<'a>(
    delay: Duration,
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Reply {
    let fields: Fields = fields.into_iter().collect();
    Reply::Delayed(delay, ok_line(&fields))
}

pub fn raw(line: &str) -> Reply {
    Reply::Line(line.to_string())
}

/// A tracker on 127.0.0.1 that answers requests from a script, in order,
/// across however many connections the client opens.
pub struct FakeTracker {
    pub endpoint: TrackerEndpoint,
    requests: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
}

impl FakeTracker {
    pub async fn start(script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let script = Arc::new(Mutex::new(VecDeque::from(script)));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let (script_task, requests_task, accepted_task) =
            (script.clone(), requests.clone(), accepted.clone());
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accepted_task.fetch_add(1, Ordering::SeqCst);
                let script = script_task.clone();
                let requests = requests_task.clone();
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut lines = BufReader::new(read).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        requests.lock().unwrap().push(line);
                        let reply = script.lock().unwrap().pop_front();
                        match reply {
                            Some(Reply::Line(out)) => {
                                if write.write_all(out.as_bytes()).await.is_err() {
                                    break;
                                }
                            }
                            Some(Reply::Delayed(delay, out)) => {
                                tokio::time::sleep(delay).await;
                                if write.write_all(out.as_bytes()).await.is_err() {
                                    break;
                                }
                            }
                            Some(Reply::Hang) => continue,
                            Some(Reply::Close) | None => break,
                        }
                    }
                });
            }
        });

        Self {
            endpoint: TrackerEndpoint::new("127.0.0.1", port),
            requests,
            accepted,
        }
    }

    /// Request lines received so far, terminators stripped
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// An address nothing listens on
pub async fn unreachable_endpoint() -> TrackerEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    TrackerEndpoint::new("127.0.0.1", port)
}

pub fn settings() -> ConnectionSettings {
    ConnectionSettings {
        connect_timeout: Duration::from_secs(1),
        io_timeout: Duration::from_secs(2),
    }
}

/// A transfer call as the fake saw it
#[derive(Debug, Clone)]
pub struct RecordedTransfer {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub streamed: bool,
}

impl RecordedTransfer {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transfer that answers from a per-URL table (404 otherwise) and records calls
#[derive(Default)]
pub struct FakeTransfer {
    responses: Mutex<HashMap<String, (u16, Bytes)>>,
    unreachable: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedTransfer>>,
}

impl FakeTransfer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, Bytes::from(body.to_string())));
    }

    /// Make calls to `url` fail as if the node were down
    pub fn fail(&self, url: &str) {
        self.unreachable.lock().unwrap().push(url.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedTransfer> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transfer for FakeTransfer {
    async fn execute(&self, request: TransferRequest) -> mogilefs::Result<TransferResponse> {
        let (body, streamed) = match request.body {
            Some(TransferBody::Bytes(bytes)) => (Some(bytes.to_vec()), false),
            Some(TransferBody::Stream(mut reader)) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                (Some(buf), true)
            }
            None => (None, false),
        };

        self.calls.lock().unwrap().push(RecordedTransfer {
            url: request.url.clone(),
            method: request.method.clone(),
            headers: request.headers.clone(),
            body,
            streamed,
        });

        if self.unreachable.lock().unwrap().contains(&request.url) {
            return Err(mogilefs::Error::Http(format!(
                "connection refused: {}",
                request.url
            )));
        }

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or((404, Bytes::new()));
        Ok(TransferResponse { status, body })
    }
}
