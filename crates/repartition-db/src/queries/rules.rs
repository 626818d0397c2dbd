//! Distribution rule store.
//!
//! Holds the single active rule set shared by every computation. Changes
//! are validated and written as a whole, in one transaction.

use rusqlite::Connection;

use repartition_engine::{
    DistributionRule, LevyRule, RuleCategory, RuleConditions, RuleError, RuleSet, RuleSource,
};

use crate::{from_sql_time, to_sql_time, DbError, Result};

/// Load the active rule set.
pub fn load(conn: &Connection) -> Result<RuleSet> {
    let mut stmt = conn.prepare(
        "SELECT category, base_bp, max_bp, min_amount, max_amount, min_headcount
         FROM distribution_rules",
    )?;

    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<i64>>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut rules = Vec::with_capacity(raw.len());
    for (key, base_bp, max_bp, min_amount, max_amount, min_headcount) in raw {
        rules.push(DistributionRule {
            category: RuleCategory::from_key(&key)?,
            base_bp: to_bp(base_bp)?,
            max_bp: to_bp(max_bp)?,
            conditions: RuleConditions {
                min_amount,
                max_amount,
                min_headcount: min_headcount
                    .map(|n| {
                        u32::try_from(n)
                            .map_err(|_| DbError::Serialization(format!("bad headcount {n}")))
                    })
                    .transpose()?,
            },
        });
    }
    rules.sort_by_key(|r| r.category);

    let levy = conn
        .query_row(
            "SELECT threshold, rate_bp, reduced_rate_bp FROM levy_rule WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("levy rule".into()),
            other => DbError::Sqlite(other),
        })?;

    Ok(RuleSet {
        rules,
        levy: LevyRule {
            threshold: levy.0,
            rate_bp: to_bp(levy.1)?,
            reduced_rate_bp: to_bp(levy.2)?,
        },
    })
}

/// Replace the active rule set.
///
/// # Errors
///
/// - [`DbError::Rules`] if the set does not validate; nothing is written
pub fn save(conn: &Connection, rules: &RuleSet, updated_at: u64) -> Result<()> {
    rules.validate()?;
    let stamp = to_sql_time(updated_at)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM distribution_rules", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO distribution_rules
             (category, base_bp, max_bp, min_amount, max_amount, min_headcount, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for rule in &rules.rules {
            stmt.execute(rusqlite::params![
                rule.category.key(),
                rule.base_bp,
                rule.max_bp,
                rule.conditions.min_amount,
                rule.conditions.max_amount,
                rule.conditions.min_headcount,
                stamp,
            ])?;
        }
    }
    tx.execute(
        "INSERT OR REPLACE INTO levy_rule (id, threshold, rate_bp, reduced_rate_bp, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4)",
        rusqlite::params![
            rules.levy.threshold,
            rules.levy.rate_bp,
            rules.levy.reduced_rate_bp,
            stamp,
        ],
    )?;
    tx.commit()?;

    tracing::info!(
        rules = rules.rules.len(),
        total_bp = rules.total_base_bp(),
        updated_at,
        "rule set saved"
    );
    Ok(())
}

/// Change the base (and optionally the ceiling) of one rule of the active
/// set.
pub fn update_rule(
    conn: &Connection,
    category: RuleCategory,
    base_bp: u32,
    max_bp: Option<u32>,
    updated_at: u64,
) -> Result<RuleSet> {
    let updated = load(conn)?.with_percentages(category, base_bp, max_bp)?;
    save(conn, &updated, updated_at)?;
    Ok(updated)
}

/// Last modification time of the rule set, as Unix seconds.
pub fn last_updated(conn: &Connection) -> Result<u64> {
    let ts: i64 = conn.query_row(
        "SELECT MAX(updated_at) FROM (
             SELECT updated_at FROM distribution_rules
             UNION ALL SELECT updated_at FROM levy_rule
         )",
        [],
        |row| row.get::<_, Option<i64>>(0).map(|v| v.unwrap_or(0)),
    )?;
    from_sql_time(ts)
}

fn to_bp(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| DbError::Serialization(format!("bad basis points {value}")))
}

/// [`RuleSource`] reading the active rules from the store on every call.
#[derive(Clone, Copy, Debug)]
pub struct SqliteRuleStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRuleStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RuleSource for SqliteRuleStore<'_> {
    fn active_rules(&self) -> std::result::Result<RuleSet, RuleError> {
        load(self.conn).map_err(|e| match e {
            DbError::Rules(inner) => inner,
            other => RuleError::Source(other.to_string()),
        })
    }
}
