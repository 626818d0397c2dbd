//! `repartition rules`

use clap::Subcommand;

use repartition_db::queries::rules;
use repartition_engine::rules::{bp_to_percent, percent_to_bp};
use repartition_engine::{RuleCategory, RuleSet};

use super::{now, Context};

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// Show the active rules
    Show {
        /// Print the rule set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the base percentage of one rule
    Set {
        /// Rule key, e.g. `treasury` or `pursuers`
        category: String,
        /// New base percentage
        percent: f64,
        /// New maximum percentage
        #[arg(long)]
        max: Option<f64>,
    },
}

pub fn run(ctx: &Context, command: RulesCommands) -> anyhow::Result<()> {
    match command {
        RulesCommands::Show { json } => {
            let set = rules::load(&ctx.conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&set)?);
            } else {
                print!("{}", describe(&set));
            }
        }
        RulesCommands::Set {
            category,
            percent,
            max,
        } => {
            let updated = set(ctx, &category, percent, max)?;
            print!("{}", describe(&updated));
        }
    }
    Ok(())
}

/// Apply a `rules set` change and return the new active set.
pub fn set(ctx: &Context, category: &str, percent: f64, max: Option<f64>) -> anyhow::Result<RuleSet> {
    let category = RuleCategory::from_key(category)?;
    let base_bp = percent_to_bp(percent)?;
    let max_bp = max.map(percent_to_bp).transpose()?;
    Ok(rules::update_rule(&ctx.conn, category, base_bp, max_bp, now())?)
}

fn describe(set: &RuleSet) -> String {
    let mut out = format!("{:<20}{:>10}{:>10}\n", "rule", "base %", "max %");
    for rule in &set.rules {
        out.push_str(&format!(
            "{:<20}{:>10.2}{:>10.2}",
            rule.category.key(),
            bp_to_percent(rule.base_bp),
            bp_to_percent(rule.max_bp)
        ));
        if !rule.conditions.is_empty() {
            out.push_str("  (conditional)");
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "{:<20}{:>10.2}\n",
        "total",
        bp_to_percent(set.total_base_bp())
    ));
    out.push_str(&format!(
        "FSP levy: {:.2} % below {}, {:.2} % from it\n",
        bp_to_percent(set.levy.rate_bp),
        set.levy.threshold,
        bp_to_percent(set.levy.reduced_rate_bp)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use crate::config::Config;

    #[test]
    fn test_describe_defaults() {
        let text = describe(&RuleSet::default());
        assert!(text.contains("treasury"));
        assert!(text.contains("40.00"));
        assert!(text.contains("100.00"));
        assert!(text.contains("FSP levy: 5.00 % below 500000, 4.50 % from it"));
    }

    #[test]
    fn test_set_updates_store() {
        let ctx = test_context(Config::default());
        let updated = set(&ctx, "treasury", 38.0, None).expect("set");
        assert_eq!(
            updated.rule(RuleCategory::Treasury).map(|r| r.base_bp),
            Some(3_800)
        );
        assert_eq!(rules::load(&ctx.conn).expect("load"), updated);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let ctx = test_context(Config::default());
        assert!(set(&ctx, "lottery", 5.0, None).is_err());
        assert!(set(&ctx, "treasury", 120.0, None).is_err());
        // Above the current ceiling without raising it.
        assert!(set(&ctx, "treasury", 45.0, None).is_err());
        assert_eq!(rules::load(&ctx.conn).expect("load"), RuleSet::default());
    }

    #[test]
    fn test_set_with_max() {
        let ctx = test_context(Config::default());
        // Make room first: 40 + 5 more would exceed 100 %.
        set(&ctx, "pursuers", 20.0, None).expect("lower pursuers");
        let updated = set(&ctx, "treasury", 45.0, Some(50.0)).expect("raise");
        let treasury = updated.rule(RuleCategory::Treasury).expect("rule");
        assert_eq!((treasury.base_bp, treasury.max_bp), (4_500, 5_000));
    }
}
