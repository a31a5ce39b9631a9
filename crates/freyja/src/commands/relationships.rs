//! `relationships` command implementation.

use anyhow::{bail, Context, Result};
use freyja_core::{Config, Direction, KvStore, RelationshipQuery};

use crate::style::print_query_table;

fn parse_direction(raw: &str) -> Result<Direction> {
    match raw {
        "outgoing" | "out" => Ok(Direction::Outgoing),
        "incoming" | "in" => Ok(Direction::Incoming),
        "both" => Ok(Direction::Both),
        other => bail!("invalid direction {other:?}: expected outgoing, incoming, or both"),
    }
}

pub fn run(
    config: &Config,
    key: &str,
    direction: Option<&str>,
    relation: Option<&str>,
    limit: usize,
) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;

    let mut query = RelationshipQuery::new(key);
    if let Some(raw) = direction {
        query.direction = parse_direction(raw)?;
    }
    query.relation = relation.map(str::to_string);
    query.limit = limit;

    let results = store
        .get_relationships(&query)
        .context("failed to query relationships")?;
    store.close().context("failed to close store")?;

    let columns = vec![
        "direction".to_string(),
        "other_key".to_string(),
        "relation".to_string(),
        "created_at".to_string(),
    ];
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            let direction = match r.direction {
                Direction::Outgoing => "outgoing",
                Direction::Incoming => "incoming",
                Direction::Both => "both",
            };
            vec![
                direction.to_string(),
                r.other_key.clone(),
                r.relationship.relation.clone(),
                r.relationship.created_at.to_string(),
            ]
        })
        .collect();
    print_query_table(&columns, &rows);
    Ok(())
}
