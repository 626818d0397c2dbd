//! `repartition compute`

use anyhow::{bail, Context as _};
use clap::Args;
use tracing::debug;

use repartition_db::queries::history::{self, ComputationParams, HistoryPolicy, HistoryRecord};
use repartition_db::queries::rules::SqliteRuleStore;
use repartition_engine::Engine;
use repartition_types::{Amount, BeneficiaryRoster, CaseAmounts, DistributionResult, PursuerGroup};

use super::{now, Context};
use crate::render;

#[derive(Args, Debug, Default)]
pub struct ComputeArgs {
    /// Principal amount recovered
    #[arg(long)]
    pub principal: Amount,
    /// Fines
    #[arg(long, default_value_t = 0)]
    pub fine: Amount,
    /// Proceeds of the sale of seized goods
    #[arg(long, default_value_t = 0)]
    pub sale: Amount,
    /// Miscellaneous fees, deducted before distribution
    #[arg(long, default_value_t = 0)]
    pub misc: Amount,

    /// Seizing agent name (repeatable)
    #[arg(long = "agent")]
    pub agent_names: Vec<String>,
    /// Number of seizing agents [default: number of names]
    #[arg(long = "agents")]
    pub agent_count: Option<u32>,
    /// Chief name (repeatable)
    #[arg(long = "chief")]
    pub chief_names: Vec<String>,
    /// Number of chiefs [default: number of names]
    #[arg(long = "chiefs")]
    pub chief_count: Option<u32>,
    /// Informant name (repeatable)
    #[arg(long = "informant")]
    pub informant_names: Vec<String>,
    /// Number of informants [default: number of names]
    #[arg(long = "informants")]
    pub informant_count: Option<u32>,

    /// Record the result in the history under this case id
    #[arg(long = "case")]
    pub case_id: Option<String>,
    /// Actor recorded with the history entry [default: $USER]
    #[arg(long)]
    pub actor: Option<String>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
    /// Record the result even when it does not verify
    #[arg(long)]
    pub allow_unverified: bool,
}

impl ComputeArgs {
    fn params(&self) -> anyhow::Result<ComputationParams> {
        let amounts = CaseAmounts {
            principal: self.principal,
            fine: self.fine,
            sale: self.sale,
            misc_fees: self.misc,
        };
        amounts.validate()?;

        let roster = BeneficiaryRoster {
            agents: group(&self.agent_names, self.agent_count)?,
            chiefs: group(&self.chief_names, self.chief_count)?,
            informants: group(&self.informant_names, self.informant_count)?,
        };
        roster.validate()?;

        Ok(ComputationParams { amounts, roster })
    }
}

fn group(names: &[String], count: Option<u32>) -> anyhow::Result<PursuerGroup> {
    let count = match count {
        Some(n) => n,
        None => u32::try_from(names.len()).context("too many names")?,
    };
    Ok(PursuerGroup {
        count,
        names: names.to_vec(),
    })
}

/// Outcome of a compute run.
#[cfg(test)]
#[derive(Debug)]
pub struct Computed {
    pub result: DistributionResult,
    /// History id, when the result was recorded.
    pub history_id: Option<i64>,
}

/// Validate the arguments and compute under the stored rules.
pub fn evaluate(ctx: &Context, args: &ComputeArgs) -> anyhow::Result<(ComputationParams, DistributionResult)> {
    let params = args.params()?;
    debug!(
        principal = params.amounts.principal,
        headcount = params.roster.headcount(),
        "computing distribution"
    );
    let engine = Engine::new(SqliteRuleStore::new(&ctx.conn)).with_tolerance(ctx.tolerance()?);
    let result = engine.compute(&params.amounts, &params.roster)?;
    Ok((params, result))
}

/// Record `result` when a case id was given. Returns the history id.
pub fn record(
    ctx: &Context,
    args: &ComputeArgs,
    params: &ComputationParams,
    result: &DistributionResult,
) -> anyhow::Result<Option<i64>> {
    let Some(case_id) = args.case_id.as_deref() else {
        return Ok(None);
    };

    let policy = if args.allow_unverified || ctx.persist_unverified()? {
        HistoryPolicy::AllowUnverified
    } else {
        HistoryPolicy::RequireVerified
    };
    let actor = args
        .actor
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "unknown".to_string());

    let id = history::record(
        &ctx.conn,
        &HistoryRecord {
            case_id,
            actor: &actor,
            computed_at: now(),
            params,
            result,
        },
        policy,
    )
    .with_context(|| format!("recording distribution for case {case_id}"))?;
    Ok(Some(id))
}

/// Compute, and record when a case id was given.
#[cfg(test)]
pub fn execute(ctx: &Context, args: &ComputeArgs) -> anyhow::Result<Computed> {
    let (params, result) = evaluate(ctx, args)?;
    let history_id = record(ctx, args, &params, &result)?;
    Ok(Computed { result, history_id })
}

fn report(result: &DistributionResult, json: bool) -> anyhow::Result<String> {
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(result)?))
    } else {
        Ok(render::breakdown(result))
    }
}

pub fn run(ctx: &Context, args: ComputeArgs) -> anyhow::Result<()> {
    let (params, result) = evaluate(ctx, &args)?;
    // Shown before recording, so a refused record still leaves the breakdown.
    print!("{}", report(&result, args.json)?);

    let history_id = record(ctx, &args, &params, &result)?;
    if let (Some(id), false) = (history_id, args.json) {
        println!("Recorded as history entry {id}");
    }

    if !result.verified && history_id.is_none() {
        bail!("distribution did not verify");
    }
    Ok(())
}
