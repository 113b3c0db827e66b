use crate::types::UsageStats;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, RedisResult};
use std::collections::HashMap;

/// Redis key semantics for the usage counter collaborator.
/// Keeps the API and any reporting tools agreeing on key layout.

pub const USAGE_PREFIX: &str = "codepad:usage";
pub const FIELD_TOTAL_EXECUTIONS: &str = "total_executions";
pub const FIELD_LAST_EXECUTION_AT: &str = "last_execution_at";

/// Generate the usage hash key for an identity
pub fn usage_key(identity: &str) -> String {
    format!("{}:{}", USAGE_PREFIX, identity)
}

/// MULTI/EXEC block that bumps the counter and stamps the time together.
/// Only the new total is returned.
pub fn record_execution_pipeline(identity: &str, at: DateTime<Utc>) -> redis::Pipeline {
    let key = usage_key(identity);
    let mut pipe = redis::pipe();
    pipe.atomic()
        .hincr(&key, FIELD_TOTAL_EXECUTIONS, 1u64)
        .hset(&key, FIELD_LAST_EXECUTION_AT, at.to_rfc3339())
        .ignore();
    pipe
}

/// Increment the execution counter for an identity and stamp the time.
/// Returns the new total.
pub async fn record_execution(
    conn: &mut redis::aio::ConnectionManager,
    identity: &str,
    at: DateTime<Utc>,
) -> RedisResult<u64> {
    let (total,): (u64,) = record_execution_pipeline(identity, at)
        .query_async(conn)
        .await?;
    Ok(total)
}

/// Read usage counters for an identity; `None` if it never executed anything
pub async fn get_usage(
    conn: &mut redis::aio::ConnectionManager,
    identity: &str,
) -> RedisResult<Option<UsageStats>> {
    let fields: HashMap<String, String> = conn.hgetall(usage_key(identity)).await?;
    Ok(usage_from_fields(identity, &fields))
}

/// Decode a usage hash. Malformed fields degrade to zero/none.
pub fn usage_from_fields(identity: &str, fields: &HashMap<String, String>) -> Option<UsageStats> {
    if fields.is_empty() {
        return None;
    }

    let total_executions = fields
        .get(FIELD_TOTAL_EXECUTIONS)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let last_execution_at = fields
        .get(FIELD_LAST_EXECUTION_AT)
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc));

    Some(UsageStats {
        identity: identity.to_string(),
        total_executions,
        last_execution_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_key_format() {
        assert_eq!(usage_key("user-42"), "codepad:usage:user-42");
        assert_eq!(usage_key("a"), usage_key("a"));
    }

    #[test]
    fn test_usage_from_empty_hash() {
        assert!(usage_from_fields("nobody", &HashMap::new()).is_none());
    }

    #[test]
    fn test_usage_from_fields() {
        let mut fields = HashMap::new();
        fields.insert(FIELD_TOTAL_EXECUTIONS.to_string(), "7".to_string());
        fields.insert(
            FIELD_LAST_EXECUTION_AT.to_string(),
            "2026-01-02T03:04:05+00:00".to_string(),
        );

        let stats = usage_from_fields("u1", &fields).unwrap();
        assert_eq!(stats.identity, "u1");
        assert_eq!(stats.total_executions, 7);
        assert_eq!(
            stats.last_execution_at.map(|t| t.to_rfc3339()),
            Some("2026-01-02T03:04:05+00:00".to_string())
        );
    }

    #[test]
    fn test_usage_tolerates_garbage() {
        let mut fields = HashMap::new();
        fields.insert(FIELD_TOTAL_EXECUTIONS.to_string(), "lots".to_string());
        fields.insert(FIELD_LAST_EXECUTION_AT.to_string(), "yesterday".to_string());

        let stats = usage_from_fields("u2", &fields).unwrap();
        assert_eq!(stats.total_executions, 0);
        assert!(stats.last_execution_at.is_none());
    }

    #[test]
    fn test_record_execution_is_one_transaction() {
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let packed = record_execution_pipeline("u3", at).get_packed_pipeline();
        let text = String::from_utf8_lossy(&packed);

        let multi = text.find("MULTI").unwrap();
        let incr = text.find("HINCRBY").unwrap();
        let set = text.find("HSET").unwrap();
        let exec = text.find("EXEC").unwrap();
        assert!(multi < incr && incr < set && set < exec);
        assert!(text.contains("codepad:usage:u3"));
        assert!(text.contains("2026-01-02T03:04:05+00:00"));
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_record_and_read_usage() {
        let client = redis::Client::open("redis://127.0.0.1:6379").expect("Failed to create Redis client");
        let mut conn = client
            .get_connection_manager()
            .await
            .expect("Failed to connect to Redis");
        let identity = format!("test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());

        let first = record_execution(&mut conn, &identity, Utc::now()).await.unwrap();
        let second = record_execution(&mut conn, &identity, Utc::now()).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let stats = get_usage(&mut conn, &identity).await.unwrap().unwrap();
        assert_eq!(stats.total_executions, 2);
        assert!(stats.last_execution_at.is_some());

        let _: () = conn.del(usage_key(&identity)).await.unwrap();
    }
}
