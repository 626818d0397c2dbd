//! Distribution history.
//!
//! Every stored computation keeps its inputs, its full line-item list and
//! its verification outcome, so any past distribution can be audited or
//! re-verified later.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use repartition_types::{BeneficiaryCategory, BeneficiaryRoster, CaseAmounts, DistributionResult};

use crate::{from_sql_time, to_sql_time, DbError, Result};

/// Whether unverified distributions may be stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Refuse results with `verified == false`.
    #[default]
    RequireVerified,
    AllowUnverified,
}

/// Inputs of a computation, stored verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationParams {
    pub amounts: CaseAmounts,
    pub roster: BeneficiaryRoster,
}

/// A computation to store.
#[derive(Clone, Copy, Debug)]
pub struct HistoryRecord<'a> {
    pub case_id: &'a str,
    /// Identity of the user who ran the computation.
    pub actor: &'a str,
    pub computed_at: u64,
    pub params: &'a ComputationParams,
    pub result: &'a DistributionResult,
}

/// A stored computation.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub case_id: String,
    pub actor: String,
    pub computed_at: u64,
    pub params: ComputationParams,
    pub result: DistributionResult,
}

/// Categories with a dedicated amount column, in column order.
const FIXED_COLUMNS: [BeneficiaryCategory; 6] = [
    BeneficiaryCategory::Treasury,
    BeneficiaryCategory::MutualFund,
    BeneficiaryCategory::SolidarityFund,
    BeneficiaryCategory::TrainingFund,
    BeneficiaryCategory::EquipmentFund,
    BeneficiaryCategory::PerformanceBonus,
];

/// Store a computation and return its id.
///
/// # Errors
///
/// - [`DbError::Unverified`] if the result is not verified and `policy`
///   requires it
pub fn record(conn: &Connection, record: &HistoryRecord<'_>, policy: HistoryPolicy) -> Result<i64> {
    let result = record.result;
    if !result.verified && policy == HistoryPolicy::RequireVerified {
        return Err(DbError::Unverified {
            case_id: record.case_id.to_string(),
            messages: result.messages.clone(),
        });
    }
    if record.case_id.trim().is_empty() {
        return Err(DbError::Constraint("case_id must not be empty".into()));
    }

    let computed_at = to_sql_time(record.computed_at)?;
    let fixed = FIXED_COLUMNS.map(|category| result.amount_for(category));

    conn.execute(
        "INSERT INTO distribution_history (
             case_id, actor, computed_at, total_amount, net_amount, levy_amount,
             treasury_amount, mutual_fund_amount, solidarity_fund_amount,
             training_fund_amount, equipment_fund_amount, performance_bonus_amount,
             line_items, params, verified, messages
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            record.case_id,
            record.actor,
            computed_at,
            result.total_amount,
            result.net_amount,
            result.levy_amount,
            fixed[0],
            fixed[1],
            fixed[2],
            fixed[3],
            fixed[4],
            fixed[5],
            serde_json::to_string(&result.line_items)?,
            serde_json::to_string(record.params)?,
            result.verified,
            serde_json::to_string(&result.messages)?,
        ],
    )?;
    let id = conn.last_insert_rowid();

    tracing::info!(
        id,
        case_id = record.case_id,
        actor = record.actor,
        verified = result.verified,
        "distribution recorded"
    );
    Ok(id)
}

const SELECT_ENTRY: &str = "SELECT id, case_id, actor, computed_at, total_amount, net_amount,
     levy_amount, line_items, params, verified, messages FROM distribution_history";

/// Get one stored computation.
pub fn get(conn: &Connection, id: i64) -> Result<HistoryEntry> {
    let row = conn
        .query_row(&format!("{SELECT_ENTRY} WHERE id = ?1"), [id], read_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("distribution {id}"))
            }
            other => DbError::Sqlite(other),
        })?;
    row.into_entry()
}

/// All computations stored for a case, oldest first.
pub fn list_for_case(conn: &Connection, case_id: &str) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ENTRY} WHERE case_id = ?1 ORDER BY computed_at ASC, id ASC"
    ))?;
    let rows = stmt
        .query_map([case_id], read_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(HistoryRow::into_entry).collect()
}

/// Most recent computations across all cases.
pub fn recent(conn: &Connection, limit: u32) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ENTRY} ORDER BY computed_at DESC, id DESC LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit], read_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(HistoryRow::into_entry).collect()
}

/// Raw history row with JSON columns still encoded.
struct HistoryRow {
    id: i64,
    case_id: String,
    actor: String,
    computed_at: i64,
    total_amount: i64,
    net_amount: i64,
    levy_amount: i64,
    line_items: String,
    params: String,
    verified: bool,
    messages: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok(HistoryRow {
        id: row.get(0)?,
        case_id: row.get(1)?,
        actor: row.get(2)?,
        computed_at: row.get(3)?,
        total_amount: row.get(4)?,
        net_amount: row.get(5)?,
        levy_amount: row.get(6)?,
        line_items: row.get(7)?,
        params: row.get(8)?,
        verified: row.get(9)?,
        messages: row.get(10)?,
    })
}

impl HistoryRow {
    fn into_entry(self) -> Result<HistoryEntry> {
        Ok(HistoryEntry {
            id: self.id,
            case_id: self.case_id,
            actor: self.actor,
            computed_at: from_sql_time(self.computed_at)?,
            params: serde_json::from_str(&self.params)?,
            result: DistributionResult {
                total_amount: self.total_amount,
                net_amount: self.net_amount,
                levy_amount: self.levy_amount,
                line_items: serde_json::from_str(&self.line_items)?,
                verified: self.verified,
                messages: serde_json::from_str(&self.messages)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repartition_engine::compute_distribution;
    use repartition_types::PursuerGroup;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn params(principal: i64, agents: &[&str]) -> ComputationParams {
        ComputationParams {
            amounts: CaseAmounts::principal(principal),
            roster: BeneficiaryRoster {
                agents: PursuerGroup::named(agents.iter().copied()),
                ..BeneficiaryRoster::default()
            },
        }
    }

    fn compute(params: &ComputationParams) -> DistributionResult {
        compute_distribution(&params.amounts, &params.roster, None)
    }

    #[test]
    fn test_record_and_get() {
        let conn = test_db();
        let params = params(600_000, &["Awa", "Moussa"]);
        let result = compute(&params);
        assert!(result.verified);

        let id = record(
            &conn,
            &HistoryRecord {
                case_id: "CT-2024-001",
                actor: "agent.diallo",
                computed_at: 1_700_000_000,
                params: &params,
                result: &result,
            },
            HistoryPolicy::RequireVerified,
        )
        .expect("record");

        let entry = get(&conn, id).expect("get");
        assert_eq!(entry.case_id, "CT-2024-001");
        assert_eq!(entry.actor, "agent.diallo");
        assert_eq!(entry.computed_at, 1_700_000_000);
        assert_eq!(entry.params, params);
        assert_eq!(entry.result.net_amount, result.net_amount);
        assert_eq!(entry.result.levy_amount, result.levy_amount);
        assert!(entry.result.verified);
        let amounts = |r: &DistributionResult| -> Vec<(String, i64)> {
            r.line_items
                .iter()
                .map(|i| (i.id.clone(), i.computed_amount))
                .collect()
        };
        assert_eq!(amounts(&entry.result), amounts(&result));
    }

    #[test]
    fn test_fixed_columns_stored() {
        let conn = test_db();
        let params = params(600_000, &["A"]);
        let result = compute(&params);
        let id = record(
            &conn,
            &HistoryRecord {
                case_id: "CT-1",
                actor: "u",
                computed_at: 1,
                params: &params,
                result: &result,
            },
            HistoryPolicy::RequireVerified,
        )
        .expect("record");

        let (treasury, bonus): (i64, i64) = conn
            .query_row(
                "SELECT treasury_amount, performance_bonus_amount FROM distribution_history WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("query");
        assert_eq!(treasury, 229_200);
        assert_eq!(bonus, 28_650);
    }

    #[test]
    fn test_unverified_refused_by_default() {
        let conn = test_db();
        let params = params(600_000, &[]);
        let result = compute(&params);
        assert!(!result.verified);

        let rec = HistoryRecord {
            case_id: "CT-2",
            actor: "u",
            computed_at: 1,
            params: &params,
            result: &result,
        };
        assert!(matches!(
            record(&conn, &rec, HistoryPolicy::default()),
            Err(DbError::Unverified { .. })
        ));
        assert!(list_for_case(&conn, "CT-2").expect("list").is_empty());

        let id = record(&conn, &rec, HistoryPolicy::AllowUnverified).expect("record anyway");
        let entry = get(&conn, id).expect("get");
        assert!(!entry.result.verified);
        assert_eq!(entry.result.messages, result.messages);
    }

    #[test]
    fn test_empty_case_id_rejected() {
        let conn = test_db();
        let params = params(600_000, &["A"]);
        let result = compute(&params);
        let rec = HistoryRecord {
            case_id: " ",
            actor: "u",
            computed_at: 1,
            params: &params,
            result: &result,
        };
        assert!(matches!(
            record(&conn, &rec, HistoryPolicy::RequireVerified),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_list_and_recent() {
        let conn = test_db();
        for (i, principal) in [600_000, 700_000, 800_000].into_iter().enumerate() {
            let params = params(principal, &["A"]);
            let result = compute(&params);
            let case_id = if i == 1 { "CT-B" } else { "CT-A" };
            record(
                &conn,
                &HistoryRecord {
                    case_id,
                    actor: "u",
                    computed_at: 100 + i as u64,
                    params: &params,
                    result: &result,
                },
                HistoryPolicy::RequireVerified,
            )
            .expect("record");
        }

        let case_a = list_for_case(&conn, "CT-A").expect("list");
        assert_eq!(case_a.len(), 2);
        assert_eq!(case_a[0].result.total_amount, 600_000);
        assert_eq!(case_a[1].result.total_amount, 800_000);

        let latest = recent(&conn, 2).expect("recent");
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].computed_at, 102);
        assert_eq!(latest[1].case_id, "CT-B");
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert!(matches!(get(&conn, 99), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let conn = test_db();
        let params = params(600_000, &["Awa"]);
        let result = compute(&params);
        let err = record(
            &conn,
            &HistoryRecord {
                case_id: "CT-T",
                actor: "u",
                computed_at: u64::MAX,
                params: &params,
                result: &result,
            },
            HistoryPolicy::RequireVerified,
        );
        assert!(matches!(err, Err(DbError::Constraint(_))));
        assert!(list_for_case(&conn, "CT-T").expect("list").is_empty());

        let id = record(
            &conn,
            &HistoryRecord {
                case_id: "CT-T",
                actor: "u",
                computed_at: 5,
                params: &params,
                result: &result,
            },
            HistoryPolicy::RequireVerified,
        )
        .expect("record");
        conn.execute(
            "UPDATE distribution_history SET computed_at = -1 WHERE id = ?1",
            [id],
        )
        .expect("corrupt row");
        assert!(matches!(get(&conn, id), Err(DbError::Serialization(_))));
    }
}
