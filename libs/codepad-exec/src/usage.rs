// Usage counter collaborator
// The executor reports successful runs here; failures are logged, never returned

use async_trait::async_trait;
use chrono::Utc;
use codepad_common::redis as usage_store;
use codepad_common::types::{Language, StatusKind};
use redis::aio::ConnectionManager;
use tracing::debug;

/// Emitted once per successful execution made on behalf of an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent {
    pub identity: String,
    pub language: Option<Language>,
    pub token: String,
    pub status: StatusKind,
}

#[async_trait]
pub trait UsageNotifier: Send + Sync {
    async fn record(&self, event: UsageEvent) -> anyhow::Result<()>;
}

/// Used when usage tracking is not configured
pub struct NoopUsage;

#[async_trait]
impl UsageNotifier for NoopUsage {
    async fn record(&self, _event: UsageEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Increments per-identity counters in Redis
#[derive(Clone)]
pub struct RedisUsageCounter {
    conn: ConnectionManager,
}

impl RedisUsageCounter {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl UsageNotifier for RedisUsageCounter {
    async fn record(&self, event: UsageEvent) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let total =
            usage_store::record_execution(&mut conn, &event.identity, Utc::now()).await?;
        debug!(
            identity = %event.identity,
            token = %event.token,
            total_executions = total,
            "Usage recorded"
        );
        Ok(())
    }
}
