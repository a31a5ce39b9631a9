//! Relationship sub-index: directed, labeled edges between keys already
//! present in the KV store, persisted as ordinary records under a reserved
//! key namespace.
//!
//! A relationship is stored twice — once under a `forward` key so outgoing
//! queries from `from_key` are a prefix scan, and once under a `reverse` key
//! so incoming queries into `to_key` are too. Both records carry an
//! identical JSON payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::store::KvStore;

pub const FORWARD_PREFIX: &str = "relationship:forward:";
pub const REVERSE_PREFIX: &str = "relationship:reverse:";

const DEFAULT_LIMIT: usize = 100;

/// A directed, labeled edge between two keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_key: String,
    pub to_key: String,
    pub relation: String,
    /// Nanoseconds since the Unix epoch.
    pub created_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Which side of a relationship a query should traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Both
    }
}

/// Parameters for [`KvStore::get_relationships`].
#[derive(Debug, Clone)]
pub struct RelationshipQuery {
    pub key: String,
    pub direction: Direction,
    pub relation: Option<String>,
    pub limit: usize,
}

impl RelationshipQuery {
    pub fn new(key: impl Into<String>) -> Self {
        RelationshipQuery {
            key: key.into(),
            direction: Direction::Both,
            relation: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One relationship surfaced by [`KvStore::get_relationships`], tagged with
/// the "other" endpoint and the direction the result came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipResult {
    pub relationship: Relationship,
    pub other_key: String,
    pub direction: Direction,
}

/// Colons in endpoint keys would be ambiguous against the `:`-delimited
/// composed key, so they're swapped for `|` before embedding and restored
/// on the way back out.
fn escape(key: &str) -> String {
    key.replace(':', "|")
}

fn unescape(key: &str) -> String {
    key.replace('|', ":")
}

fn check_relation_name(relation: &str) -> Result<(), Error> {
    if relation.contains(':') {
        return Err(Error::InvalidKey);
    }
    Ok(())
}

fn forward_key(from: &str, relation: &str, to: &str) -> String {
    format!("{FORWARD_PREFIX}{}:{relation}:{}", escape(from), escape(to))
}

fn reverse_key(to: &str, relation: &str, from: &str) -> String {
    format!("{REVERSE_PREFIX}{}:{relation}:{}", escape(to), escape(from))
}

fn now_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_nanos() as u64
}

impl KvStore {
    /// Records a directed `relation` edge from `from` to `to`. Both
    /// endpoints must already exist as live keys in the store.
    ///
    /// Writes the forward record, then the reverse record; a failure on the
    /// second write leaves a partially persisted relationship visible only
    /// from one direction (see the error-handling notes on propagation).
    pub fn put_relationship(&self, from: &str, to: &str, relation: &str) -> Result<(), Error> {
        check_relation_name(relation)?;
        self.get(from.as_bytes())?;
        self.get(to.as_bytes())?;

        let payload = Relationship {
            from_key: from.to_string(),
            to_key: to.to_string(),
            relation: relation.to_string(),
            created_at: now_ns(),
            metadata: None,
        };
        let encoded = serde_json::to_vec(&payload)
            .expect("Relationship serializes without error");

        self.put_raw(forward_key(from, relation, to).as_bytes(), &encoded)?;
        self.put_raw(reverse_key(to, relation, from).as_bytes(), &encoded)?;
        Ok(())
    }

    /// Removes a relationship, tolerating either side already being absent.
    pub fn delete_relationship(&self, from: &str, to: &str, relation: &str) -> Result<(), Error> {
        check_relation_name(relation)?;
        self.delete_raw(forward_key(from, relation, to).as_bytes())?;
        self.delete_raw(reverse_key(to, relation, from).as_bytes())?;
        Ok(())
    }

    /// Returns up to `query.limit` relationships touching `query.key`, in
    /// the requested direction(s). Records that fail to read or deserialize
    /// are silently skipped so a single bad entry can't fail the whole scan.
    pub fn get_relationships(&self, query: &RelationshipQuery) -> Result<Vec<RelationshipResult>, Error> {
        let limit = if query.limit == 0 { DEFAULT_LIMIT } else { query.limit };
        let key_esc = escape(&query.key);
        let mut results = Vec::new();

        let directions: &[Direction] = match query.direction {
            Direction::Both => &[Direction::Outgoing, Direction::Incoming],
            Direction::Outgoing => &[Direction::Outgoing],
            Direction::Incoming => &[Direction::Incoming],
        };

        for &direction in directions {
            if results.len() >= limit {
                break;
            }
            let prefix = match direction {
                Direction::Outgoing => match &query.relation {
                    Some(r) => format!("{FORWARD_PREFIX}{key_esc}:{r}:"),
                    None => format!("{FORWARD_PREFIX}{key_esc}:"),
                },
                Direction::Incoming => match &query.relation {
                    Some(r) => format!("{REVERSE_PREFIX}{key_esc}:{r}:"),
                    None => format!("{REVERSE_PREFIX}{key_esc}:"),
                },
                Direction::Both => unreachable!("expanded above"),
            };

            let scanned = self.scan_prefix(prefix.as_bytes())?;
            for (raw_key, value) in scanned {
                if results.len() >= limit {
                    break;
                }
                let Ok(relationship) = serde_json::from_slice::<Relationship>(&value) else {
                    continue;
                };
                let Ok(key_str) = String::from_utf8(raw_key) else {
                    continue;
                };
                let other_key = other_key_from_composed(&key_str, direction, &relationship);
                results.push(RelationshipResult {
                    relationship,
                    other_key,
                    direction,
                });
            }
        }

        Ok(results)
    }
}

/// Recovers the "other" endpoint from the composed key's trailing escaped
/// segment, falling back to the payload's own fields (always correct, just
/// redundant with the key) if the key shape is ever unexpected.
fn other_key_from_composed(composed: &str, direction: Direction, relationship: &Relationship) -> String {
    let prefix = match direction {
        Direction::Outgoing => FORWARD_PREFIX,
        Direction::Incoming => REVERSE_PREFIX,
        Direction::Both => unreachable!("callers always pass a resolved direction"),
    };
    if let Some(rest) = composed.strip_prefix(prefix) {
        if let Some((_, after_relation)) = rest.split_once(':').and_then(|(_, r)| r.split_once(':')) {
            return unescape(after_relation);
        }
    }
    match direction {
        Direction::Outgoing => relationship.to_key.clone(),
        Direction::Incoming => relationship.from_key.clone(),
        Direction::Both => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Config;
    use tempfile::tempdir;

    fn open_store(dir: &std::path::Path) -> KvStore {
        let (store, _) = KvStore::open(Config::new(dir)).unwrap();
        store
    }

    #[test]
    fn put_relationship_requires_existing_endpoints() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"alice", b"{}").unwrap();
        let err = store.put_relationship("alice", "bob", "follows").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound));
    }

    #[test]
    fn put_then_query_both_directions() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"alice", b"{}").unwrap();
        store.put(b"bob", b"{}").unwrap();
        store.put_relationship("alice", "bob", "follows").unwrap();

        let outgoing = store
            .get_relationships(&RelationshipQuery {
                key: "alice".into(),
                direction: Direction::Outgoing,
                relation: None,
                limit: 10,
            })
            .unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].other_key, "bob");
        assert_eq!(outgoing[0].relationship.relation, "follows");

        let incoming = store
            .get_relationships(&RelationshipQuery {
                key: "bob".into(),
                direction: Direction::Incoming,
                relation: None,
                limit: 10,
            })
            .unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].other_key, "alice");
    }

    #[test]
    fn delete_relationship_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"alice", b"{}").unwrap();
        store.put(b"bob", b"{}").unwrap();
        store.put_relationship("alice", "bob", "follows").unwrap();

        store.delete_relationship("alice", "bob", "follows").unwrap();
        store.delete_relationship("alice", "bob", "follows").unwrap();

        let results = store
            .get_relationships(&RelationshipQuery::new("alice"))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn colon_in_endpoint_keys_is_escaped() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"user:alice", b"{}").unwrap();
        store.put(b"user:bob", b"{}").unwrap();
        store.put_relationship("user:alice", "user:bob", "follows").unwrap();

        let outgoing = store
            .get_relationships(&RelationshipQuery {
                key: "user:alice".into(),
                direction: Direction::Outgoing,
                relation: None,
                limit: 10,
            })
            .unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].other_key, "user:bob");
    }

    #[test]
    fn relation_name_with_colon_rejected() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"alice", b"{}").unwrap();
        store.put(b"bob", b"{}").unwrap();
        assert!(matches!(
            store.put_relationship("alice", "bob", "fol:lows"),
            Err(Error::InvalidKey)
        ));
    }

    #[test]
    fn relation_filter_narrows_results() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"alice", b"{}").unwrap();
        store.put(b"bob", b"{}").unwrap();
        store.put(b"carol", b"{}").unwrap();
        store.put_relationship("alice", "bob", "follows").unwrap();
        store.put_relationship("alice", "carol", "blocks").unwrap();

        let follows_only = store
            .get_relationships(&RelationshipQuery {
                key: "alice".into(),
                direction: Direction::Outgoing,
                relation: Some("follows".into()),
                limit: 10,
            })
            .unwrap();
        assert_eq!(follows_only.len(), 1);
        assert_eq!(follows_only[0].other_key, "bob");
    }

    #[test]
    fn limit_is_respected() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put(b"alice", b"{}").unwrap();
        for i in 0..5 {
            let target = format!("target{i}");
            store.put(target.as_bytes(), b"{}").unwrap();
            store.put_relationship("alice", &target, "follows").unwrap();
        }

        let limited = store
            .get_relationships(&RelationshipQuery {
                key: "alice".into(),
                direction: Direction::Outgoing,
                relation: None,
                limit: 2,
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }
}
