//! Public file operations
//!
//! Writes are a two-phase handshake with the tracker:
//!
//! 1. `CREATE_OPEN` reserves a device and returns the URL to write to
//! 2. the bytes are PUT to that URL
//! 3. `CREATE_CLOSE` tells the tracker the upload finished
//!
//! The tracker cannot see the PUT, so step 3 is only sent when it returned
//! 2xx. Reads ask for the replica paths and take the first that answers 200.

use crate::common::{ClientConfig, DomainConfig, Error, Result};
use crate::store::transfer::{HttpTransfer, Transfer, TransferBody, TransferRequest};
use crate::tracker::{Command, FileLocation, TrackerClient};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncRead;

pub struct FileStore {
    tracker: TrackerClient,
    domain: DomainConfig,
    transfer: Arc<dyn Transfer>,
}

impl FileStore {
    pub fn new(tracker: TrackerClient, domain: DomainConfig, transfer: Arc<dyn Transfer>) -> Self {
        Self {
            tracker,
            domain,
            transfer,
        }
    }

    /// Build a store that transfers over HTTP
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            TrackerClient::from_config(config)?,
            config.domain_config(),
            Arc::new(HttpTransfer::new()?),
        ))
    }

    pub fn tracker(&self) -> &TrackerClient {
        &self.tracker
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    /// Store `content` under `key`. `class = None` uses the default class.
    pub async fn store(
        &self,
        key: &str,
        content: impl Into<Bytes>,
        class: Option<&str>,
    ) -> Result<()> {
        let content = content.into();
        let length = content.len() as u64;
        self.store_body(key, TransferBody::Bytes(content), class, Some(length))
            .await
    }

    /// Store the contents of `reader`. Without a `length` the upload is chunked.
    pub async fn store_reader<R>(
        &self,
        key: &str,
        reader: R,
        class: Option<&str>,
        length: Option<u64>,
    ) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        self.store_body(key, TransferBody::Stream(Box::new(reader)), class, length)
            .await
    }

    /// Store a local file, streaming it with its on-disk length
    pub async fn store_file(
        &self,
        key: &str,
        path: impl AsRef<Path>,
        class: Option<&str>,
    ) -> Result<()> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        let length = file.metadata().await?.len();
        self.store_reader(key, file, class, Some(length)).await
    }

    async fn store_body(
        &self,
        key: &str,
        body: TransferBody,
        class: Option<&str>,
        length: Option<u64>,
    ) -> Result<()> {
        let class = class.unwrap_or(&self.domain.default_class);

        let fields = self
            .tracker
            .request(
                &Command::new("CREATE_OPEN")
                    .arg("key", key)
                    .arg("domain", &self.domain.domain)
                    .arg("class", class),
            )
            .await?;
        let location = FileLocation::from_fields(&fields)?;

        let mut request = TransferRequest::put(&location.path, body);
        if let Some(length) = length {
            request = request.header("Content-Length", length);
        }

        let response = self.transfer.execute(request).await?;
        if !response.is_success() {
            // The reservation is abandoned; CREATE_CLOSE is never sent.
            tracing::warn!(
                "Upload of '{}' to {} failed with status {}",
                key,
                location.path,
                response.status
            );
            return Err(Error::Transfer {
                status: response.status,
                url: location.path,
            });
        }

        self.tracker
            .request(
                &Command::new("CREATE_CLOSE")
                    .arg("key", key)
                    .arg("domain", &self.domain.domain)
                    .arg("devid", &location.devid)
                    .arg("fid", &location.fid)
                    .arg("path", &location.path),
            )
            .await?;

        tracing::debug!("Stored '{}' as fid {}", key, location.fid);
        Ok(())
    }

    /// Fetch the contents of `key` from the first replica that returns 200
    pub async fn fetch(&self, key: &str) -> Result<Bytes> {
        let paths = self.list_paths(key, true).await?;

        for path in &paths {
            match self.transfer.execute(TransferRequest::get(path)).await {
                Ok(response) if response.status == 200 => return Ok(response.body),
                Ok(response) => {
                    tracing::debug!("Replica {} returned status {}", path, response.status)
                }
                Err(e) => tracing::debug!("Replica {} unreachable: {}", path, e),
            }
        }

        Err(Error::NotFound {
            key: key.to_string(),
        })
    }

    /// Replica URLs for `key`, in the order the tracker listed them
    pub async fn list_paths(&self, key: &str, verify: bool) -> Result<Vec<String>> {
        let mut fields = self
            .tracker
            .request(
                &Command::new("GET_PATHS")
                    .arg("key", key)
                    .arg("domain", &self.domain.domain)
                    .arg("noverify", u8::from(!verify)),
            )
            .await?;

        // "paths" is the replica count, not a path
        fields.remove("paths");
        Ok(fields.into_iter().map(|(_, path)| path).collect())
    }

    pub async fn rename(&self, from_key: &str, to_key: &str) -> Result<()> {
        self.tracker
            .request(
                &Command::new("RENAME")
                    .arg("from_key", from_key)
                    .arg("to_key", to_key)
                    .arg("domain", &self.domain.domain),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.tracker
            .request(
                &Command::new("DELETE")
                    .arg("key", key)
                    .arg("domain", &self.domain.domain),
            )
            .await?;
        Ok(())
    }
}
