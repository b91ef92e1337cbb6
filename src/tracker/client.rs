//! Tracker client with ordered failover
//!
//! The client owns at most one [`TrackerConnection`]. It is opened lazily on
//! the first request, kept for as long as it stays healthy, and dropped on any
//! transport or protocol failure so the next request reconnects. Trackers are
//! always tried in configured order.
//!
//! The wire protocol has no request ids, so the connection sits behind an
//! async mutex that is held for the whole send-then-read exchange.

use crate::common::{ClientConfig, ConnectionSettings, Error, Result, TrackerEndpoint};
use crate::tracker::connection::TrackerConnection;
use crate::tracker::protocol::{self, Command, Fields, Response};
use crate::tracker::taxonomy::map_tracker_error;
use tokio::sync::Mutex;

pub struct TrackerClient {
    endpoints: Vec<TrackerEndpoint>,
    settings: ConnectionSettings,
    connection: Mutex<Option<TrackerConnection>>,
}

impl TrackerClient {
    pub fn new(endpoints: Vec<TrackerEndpoint>, settings: ConnectionSettings) -> Self {
        Self {
            endpoints,
            settings,
            connection: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(config.endpoints()?, config.connection_settings()?))
    }

    pub fn endpoints(&self) -> &[TrackerEndpoint] {
        &self.endpoints
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Connect now instead of on the first request. No-op when already connected.
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.connection.lock().await;
        let conn = self.checkout(&mut slot).await?;
        *slot = Some(conn);
        Ok(())
    }

    /// Drop the current connection, if any
    pub async fn disconnect(&self) {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.take() {
            Self::release(conn);
        }
    }

    pub async fn is_connected(&self) -> bool {
        let slot = self.connection.lock().await;
        slot.as_ref().is_some_and(TrackerConnection::is_alive)
    }

    /// Endpoint of the live connection
    pub async fn current_endpoint(&self) -> Option<TrackerEndpoint> {
        let slot = self.connection.lock().await;
        slot.as_ref()
            .filter(|conn| conn.is_alive())
            .map(|conn| conn.endpoint().clone())
    }

    /// Send one command and return the decoded `OK` fields.
    ///
    /// `ERR` replies become typed errors and leave the connection open.
    /// Transport failures and unrecognized replies drop the connection.
    ///
    /// The connection is out of the slot while the exchange runs and only goes
    /// back once a full reply has been read. If this future is dropped midway
    /// the socket is closed with it, so no stale reply is left for the next
    /// request.
    pub async fn request(&self, command: &Command) -> Result<Fields> {
        let mut slot = self.connection.lock().await;
        let mut conn = self.checkout(&mut slot).await?;

        tracing::trace!(tracker = %conn.endpoint(), "-> {}", command.name());
        let exchange = async {
            conn.send_line(&command.encode()).await?;
            conn.read_line().await
        };
        let line = match exchange.await {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!("{} failed: {}", command.name(), e);
                Self::release(conn);
                return Err(e);
            }
        };

        match protocol::decode(&line) {
            Ok(Response::Ok(fields)) => {
                *slot = Some(conn);
                Ok(fields)
            }
            Ok(Response::Err { code, raw_line }) => {
                tracing::debug!("{} rejected by tracker: {}", command.name(), raw_line);
                *slot = Some(conn);
                Err(map_tracker_error(
                    code.as_deref(),
                    &raw_line,
                    command.subject_key(),
                ))
            }
            Err(e) => {
                tracing::warn!("{} got an unusable reply: {}", command.name(), e);
                Self::release(conn);
                Err(e)
            }
        }
    }

    /// Take the cached connection if it is still healthy, else open a new one
    async fn checkout(&self, slot: &mut Option<TrackerConnection>) -> Result<TrackerConnection> {
        match slot.take() {
            Some(conn) if conn.is_alive() => Ok(conn),
            stale => {
                if let Some(conn) = stale {
                    Self::release(conn);
                }
                self.connect_any().await
            }
        }
    }

    /// One pass over the trackers in order; the first that accepts wins
    async fn connect_any(&self) -> Result<TrackerConnection> {
        for endpoint in &self.endpoints {
            match TrackerConnection::connect(endpoint, &self.settings).await {
                Ok(conn) => {
                    tracing::debug!("Successfully connected to tracker {}", endpoint);
                    return Ok(conn);
                }
                Err(e) => {
                    tracing::warn!(
                        tracker = %endpoint,
                        errno = ?e.raw_os_error(),
                        "Unable to connect to tracker: {}",
                        e
                    );
                }
            }
        }

        tracing::error!(
            "Unable to obtain connection to any of {} tracker(s)",
            self.endpoints.len()
        );
        Err(Error::NoTracker)
    }

    fn release(mut conn: TrackerConnection) {
        tracing::debug!("Closing connection to tracker {}", conn.endpoint());
        conn.close();
    }
}
