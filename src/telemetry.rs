// src/telemetry.rs
//! Fire-and-forget usage reporting.
//!
//! Request handlers hand a [`UsageEvent`] to a [`UsageReporter`], which only enqueues it on a
//! bounded channel. A single background worker drains the channel and appends hashed rows to a
//! [`UsageSink`]. A slow or broken sink never reaches the request path: a full queue drops the
//! event, and sink errors are logged and counted.

use anyhow::{Context, Result};
use metrics::counter;
use rusqlite::{params, Connection};
use sha2::{Digest, Sha224};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS actions (
    ipAddressHash TEXT,
    userAgent TEXT,
    page TEXT,
    query TEXT,
    timestampStr TEXT
)";

const INSERT_SQL: &str =
    "INSERT INTO actions (ipAddressHash, userAgent, page, query, timestampStr) VALUES (?1, ?2, ?3, ?4, ?5)";

/// A single page view or search, as seen by the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    pub ip_address: String,
    pub user_agent: String,
    pub page: String,
    pub query: String,
    pub timestamp: String,
}

impl UsageEvent {
    /// Stamp an event with the current UTC time.
    pub fn now(
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        page: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            page: page.into(),
            query: query.into(),
            timestamp: iso_timestamp_now(),
        }
    }
}

#[derive(Debug)]
pub enum TelemetryMessage {
    Usage(UsageEvent),
    Terminate,
}

/// What actually gets stored. The raw IP never leaves the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    pub ip_address_hash: String,
    pub user_agent: String,
    pub page: String,
    pub query: String,
    pub timestamp: String,
}

impl From<UsageEvent> for UsageRow {
    fn from(ev: UsageEvent) -> Self {
        Self {
            ip_address_hash: hash_identity(&ev.ip_address, &ev.user_agent),
            user_agent: ev.user_agent,
            page: ev.page,
            query: ev.query,
            timestamp: ev.timestamp,
        }
    }
}

/// Lowercase hex SHA-224 of `ip_address + user_agent`; the user agent acts as salt.
pub fn hash_identity(ip_address: &str, user_agent: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(ip_address.as_bytes());
    hasher.update(user_agent.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// UTC ISO-8601 with microseconds and no offset, e.g. `2024-05-01T12:00:00.123456`.
pub fn iso_timestamp_now() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[async_trait::async_trait]
pub trait UsageSink: Send + Sync {
    async fn append(&self, row: UsageRow) -> Result<()>;
}

/// Append-only SQLite store. Opens a fresh connection per write on the blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    /// Open (or create) the database and make sure the `actions` table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .with_context(|| format!("opening usage db at {}", path.display()))?;
        conn.execute(CREATE_TABLE_SQL, [])
            .context("creating actions table")?;
        Ok(Self { path })
    }
}

#[async_trait::async_trait]
impl UsageSink for SqliteSink {
    async fn append(&self, row: UsageRow) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&path)?;
            conn.execute(
                INSERT_SQL,
                params![
                    row.ip_address_hash,
                    row.user_agent,
                    row.page,
                    row.query,
                    row.timestamp
                ],
            )?;
            Ok(())
        })
        .await
        .context("usage write task panicked")?
    }
}

/// Cheap, cloneable handle used by request handlers.
#[derive(Clone, Debug)]
pub struct UsageReporter {
    tx: mpsc::Sender<TelemetryMessage>,
}

impl UsageReporter {
    /// Enqueue an event without waiting. Returns whether it was accepted.
    pub fn report(&self, event: UsageEvent) -> bool {
        match self.tx.try_send(TelemetryMessage::Usage(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                counter!("telemetry_events_dropped_total").increment(1);
                warn!(target: "telemetry", "usage queue full; event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                counter!("telemetry_events_dropped_total").increment(1);
                debug!(target: "telemetry", "usage worker gone; event dropped");
                false
            }
        }
    }

    pub fn report_usage(
        &self,
        ip_address: &str,
        user_agent: &str,
        page: &str,
        query: &str,
    ) -> bool {
        self.report(UsageEvent::now(ip_address, user_agent, page, query))
    }
}

/// Owner of the background worker; keep it in `main` and terminate on shutdown.
pub struct UsageWorker {
    tx: mpsc::Sender<TelemetryMessage>,
    handle: JoinHandle<()>,
}

impl UsageWorker {
    /// Queue a terminate marker behind pending events and wait for the worker to drain them.
    pub async fn terminate(self) {
        if self.tx.send(TelemetryMessage::Terminate).await.is_err() {
            debug!(target: "telemetry", "usage worker already stopped");
        }
        if let Err(e) = self.handle.await {
            warn!(target: "telemetry", error = ?e, "usage worker ended abnormally");
        }
    }
}

/// Spawn the worker on the current Tokio runtime.
pub fn spawn_usage_worker<S>(sink: S, capacity: usize) -> (UsageReporter, UsageWorker)
where
    S: UsageSink + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(run_worker(sink, rx));
    (
        UsageReporter { tx: tx.clone() },
        UsageWorker { tx, handle },
    )
}

async fn run_worker<S: UsageSink>(sink: S, mut rx: mpsc::Receiver<TelemetryMessage>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            TelemetryMessage::Terminate => break,
            TelemetryMessage::Usage(event) => {
                let page = event.page.clone();
                match sink.append(UsageRow::from(event)).await {
                    Ok(()) => {
                        counter!("telemetry_events_written_total").increment(1);
                    }
                    Err(e) => {
                        counter!("telemetry_write_errors_total").increment(1);
                        warn!(
                            target: "telemetry",
                            error = %format!("{e:#}"),
                            %page,
                            "usage write failed"
                        );
                    }
                }
            }
        }
    }
    debug!(target: "telemetry", "usage worker stopped");
}
