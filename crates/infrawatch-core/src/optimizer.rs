use std::collections::HashSet;

use crate::scoring::round1;

/// Anything carrying an identifier and an already computed FPI.
pub trait Scored {
    fn asset_id(&self) -> &str;
    fn fpi(&self) -> i64;
}

/// How many assets a repair cycle may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairBudget {
    /// Use [`OptimizerPolicy::default_budget`].
    #[default]
    Default,
    Count(usize),
}

impl RepairBudget {
    /// Budget as sent by dashboard clients: a missing or zero count falls
    /// back to the policy default.
    pub fn from_requested(requested: Option<u64>) -> Self {
        match requested {
            None | Some(0) => Self::Default,
            Some(n) => Self::Count(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizerPolicy {
    pub default_budget: usize,
    /// FPI a bridge is assumed to have right after repair.
    pub repaired_fpi: i64,
}

impl Default for OptimizerPolicy {
    fn default() -> Self {
        Self {
            default_budget: 3,
            repaired_fpi: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepairPlan<A> {
    /// Selected assets, highest FPI first.
    pub to_repair: Vec<A>,
    pub budget: usize,
    pub current_total_risk: i64,
    pub new_total_risk: i64,
    /// Percent, one decimal. Zero when the portfolio carries no risk at all.
    pub risk_reduction: f64,
    pub message: String,
}

pub struct RepairOptimizer {
    policy: OptimizerPolicy,
}

impl RepairOptimizer {
    pub fn new(policy: OptimizerPolicy) -> Self {
        Self { policy }
    }

    pub fn effective_budget(&self, budget: RepairBudget) -> usize {
        match budget {
            RepairBudget::Default => self.policy.default_budget,
            RepairBudget::Count(n) => n,
        }
    }

    pub fn optimize<A>(&self, assets: &[A], budget: RepairBudget) -> RepairPlan<A>
    where
        A: Scored + Clone,
    {
        let budget = self.effective_budget(budget);

        let mut ranked: Vec<&A> = assets.iter().collect();
        // sort_by is stable: equal FPIs keep their input order.
        ranked.sort_by(|a, b| b.fpi().cmp(&a.fpi()));
        let to_repair: Vec<A> = ranked.into_iter().take(budget).cloned().collect();

        let repaired_ids: HashSet<&str> = to_repair.iter().map(Scored::asset_id).collect();
        let current_total_risk = saturating_total(assets.iter().map(Scored::fpi));
        let new_total_risk = saturating_total(assets.iter().map(|asset| {
            if repaired_ids.contains(asset.asset_id()) {
                self.policy.repaired_fpi
            } else {
                asset.fpi()
            }
        }));

        let risk_reduction = reduction_percent(current_total_risk, new_total_risk);
        let message =
            format!("Fix {budget} assets to reduce total risk by {risk_reduction:.1}%");

        RepairPlan {
            to_repair,
            budget,
            current_total_risk,
            new_total_risk,
            risk_reduction,
            message,
        }
    }
}

/// Unvalidated callers may pass any fpi; totals pin at the i64 bounds.
fn saturating_total(fpis: impl Iterator<Item = i64>) -> i64 {
    fpis.fold(0, i64::saturating_add)
}

#[allow(clippy::cast_precision_loss)]
fn reduction_percent(current: i64, new: i64) -> f64 {
    if current == 0 {
        return 0.0;
    }
    round1(current.saturating_sub(new) as f64 / current as f64 * 100.0)
}
