//! `repartition history`

use clap::Args;

use repartition_db::queries::history::{self, HistoryEntry};
use repartition_engine::verifier::verify_result;

use super::Context;
use crate::render::{self, format_amount};

#[derive(Args, Debug, Default)]
pub struct HistoryArgs {
    /// Only list computations of this case
    pub case_id: Option<String>,
    /// Maximum number of entries when no case is given
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
    /// Print the entries as JSON
    #[arg(long)]
    pub json: bool,
    /// Re-verify every entry against the current tolerance
    #[arg(long)]
    pub recheck: bool,
}

pub fn run(ctx: &Context, args: HistoryArgs) -> anyhow::Result<()> {
    let entries = load(ctx, &args)?;

    if args.json {
        let json: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id,
                    "case_id": e.case_id,
                    "actor": e.actor,
                    "computed_at": e.computed_at,
                    "params": e.params,
                    "result": e.result,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No recorded distributions");
        return Ok(());
    }

    let tolerance = ctx.tolerance()?;
    for entry in &entries {
        println!("{}", summary_line(entry));
        if args.recheck {
            let check = verify_result(&entry.result, tolerance);
            if check.verified {
                println!("  recheck: OK");
            } else {
                for message in &check.messages {
                    println!("  recheck: {message}");
                }
            }
        }
        if args.case_id.is_some() {
            print!("{}", render::breakdown(&entry.result));
            println!();
        }
    }
    Ok(())
}

fn load(ctx: &Context, args: &HistoryArgs) -> anyhow::Result<Vec<HistoryEntry>> {
    let entries = match args.case_id.as_deref() {
        Some(case_id) => history::list_for_case(&ctx.conn, case_id)?,
        None => history::recent(&ctx.conn, args.limit)?,
    };
    Ok(entries)
}

fn summary_line(entry: &HistoryEntry) -> String {
    format!(
        "#{:<5} {:<16} {:<12} t={:<12} total {:>16}  net {:>16}  {}",
        entry.id,
        entry.case_id,
        entry.actor,
        entry.computed_at,
        format_amount(entry.result.total_amount),
        format_amount(entry.result.net_amount),
        if entry.result.verified { "verified" } else { "UNVERIFIED" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::compute::{execute, ComputeArgs};
    use crate::commands::test_context;
    use crate::config::Config;

    fn record(ctx: &Context, case_id: &str, principal: i64) {
        let args = ComputeArgs {
            principal,
            agent_names: vec!["A".into()],
            case_id: Some(case_id.into()),
            actor: Some("clerk".into()),
            ..ComputeArgs::default()
        };
        execute(ctx, &args).expect("compute");
    }

    #[test]
    fn test_load_by_case_and_recent() {
        let ctx = test_context(Config::default());
        record(&ctx, "C-1", 600_000);
        record(&ctx, "C-2", 200_000);
        record(&ctx, "C-1", 700_000);

        let by_case = HistoryArgs {
            case_id: Some("C-1".into()),
            ..HistoryArgs::default()
        };
        let entries = load(&ctx, &by_case).expect("load");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.case_id == "C-1"));

        let recent = HistoryArgs {
            limit: 2,
            ..HistoryArgs::default()
        };
        assert_eq!(load(&ctx, &recent).expect("load").len(), 2);
    }

    #[test]
    fn test_summary_line() {
        let ctx = test_context(Config::default());
        record(&ctx, "C-9", 600_000);
        let entries = load(&ctx, &HistoryArgs { limit: 1, ..HistoryArgs::default() }).expect("load");
        let line = summary_line(&entries[0]);
        assert!(line.contains("C-9"));
        assert!(line.contains("600 000"));
        assert!(line.contains("573 000"));
        assert!(line.contains("verified"));
    }
}
