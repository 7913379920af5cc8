use std::fmt;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::{AppError, AppResult};

/// Namespace shared by every key this service writes
const KEY_PREFIX: &str = "newsmart";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Canonical form of a top-headlines query
    Headlines(String),
    /// Canonical form of a search query
    Search(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, query) = match self {
            CacheKey::Headlines(query) => ("headlines", query),
            CacheKey::Search(query) => ("search", query),
        };
        write!(f, "{}:{}:{}", KEY_PREFIX, kind, query.to_lowercase())
    }
}

/// Opens a Redis client; no connection is made until `Cache::connect`
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// A serialized entry waiting for the writer task
struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

/// JSON cache for news responses backed by Redis
///
/// Reads go straight to Redis. Writes are queued to a background task so a
/// request never waits on them.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the writer task once the queued writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Connects to Redis and starts the writer task
    pub async fn connect(client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;
        let (writes, pending) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(run_writer(conn.clone(), pending, shutdown_rx));
        tracing::info!("Redis cache connected");

        Ok((Self { conn, writes }, CacheWriterHandle { shutdown_tx, task }))
    }

    /// Looks up `key`, `None` on a miss
    pub async fn get_from_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.to_string()).await?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Internal(format!("Corrupt cache entry {}: {}", key, e)))
        })
        .transpose()
    }

    /// Queues `value` under `key` for `ttl` seconds
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl,
        };
        if self.writes.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}

async fn run_writer(
    mut conn: ConnectionManager,
    mut pending: mpsc::UnboundedReceiver<PendingWrite>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        tokio::select! {
            Some(write) = pending.recv() => store(&mut conn, write).await,
            _ = shutdown_rx.recv() => break,
        }
    }

    pending.close();
    let mut flushed = 0usize;
    while let Some(write) = pending.recv().await {
        store(&mut conn, write).await;
        flushed += 1;
    }
    tracing::info!(flushed, "Cache writer stopped");
}

async fn store(conn: &mut ConnectionManager, write: PendingWrite) {
    let result: redis::RedisResult<()> = conn.set_ex(&write.key, write.json, write.ttl).await;
    if let Err(e) = result {
        tracing::error!(key = %write.key, error = %e, "Cache write failed");
    }
}
