//! Revenue expectations: what each validator was expected to deliver and what it delivered

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::FixtureConfig,
    domain::{Behavior, EpochScenario, Pmpe, Pubkey, ValidatorScenario},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueExpectationCollection {
    pub epoch: u64,
    pub slot: u64,
    pub revenue_expectations: Vec<RevenueExpectation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueExpectation {
    pub vote_account: Pubkey,
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_inflation_commission: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_inflation_commission: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub past_inflation_commission: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_mev_commission: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_mev_commission: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub past_mev_commission: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_non_bid_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_non_bid_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_sam_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub before_sam_commission_increase_pmpe: Pmpe,
    /// Total stake in SOL, bidding validators only
    pub max_sam_stake: Option<u64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub sam_stake_share: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub loss_per_stake: Decimal,
}

pub(crate) fn build_revenue_expectations(
    scenario: &EpochScenario,
    config: &FixtureConfig,
) -> RevenueExpectationCollection {
    let revenue_expectations = scenario
        .validators
        .iter()
        .map(|validator| revenue_expectation(validator, config))
        .collect();

    RevenueExpectationCollection {
        epoch: scenario.epoch,
        slot: scenario.slot,
        revenue_expectations,
    }
}

fn revenue_expectation(
    validator: &ValidatorScenario,
    config: &FixtureConfig,
) -> RevenueExpectation {
    let baseline = config.expected_non_bid_pmpe;
    let commission = validator.commission_or_zero();
    let bid = validator.behavior.bid();

    RevenueExpectation {
        vote_account: validator.vote_account.clone(),
        expected_inflation_commission: Decimal::ZERO,
        actual_inflation_commission: commission.inflation_fraction(),
        past_inflation_commission: Decimal::ZERO,
        expected_mev_commission: Decimal::ZERO,
        actual_mev_commission: commission.mev_fraction(),
        past_mev_commission: None,
        expected_non_bid_pmpe: baseline,
        actual_non_bid_pmpe: actual_non_bid_pmpe(validator, config),
        expected_sam_pmpe: bid.map_or(baseline, |bid| baseline + bid.effective_bid),
        before_sam_commission_increase_pmpe: commission.before_sam_increase_pmpe,
        max_sam_stake: bid.map(|_| validator.total_stake_sol()),
        sam_stake_share: if bid.is_some() {
            Decimal::ONE
        } else {
            Decimal::ZERO
        },
        loss_per_stake: Decimal::ZERO,
    }
}

/// Revenue actually delivered: proportional to uptime for downtime, reduced by the commission
/// haircut for a commission increase, equal to the baseline otherwise.
fn actual_non_bid_pmpe(validator: &ValidatorScenario, config: &FixtureConfig) -> Pmpe {
    let baseline = config.expected_non_bid_pmpe;
    match &validator.behavior {
        Behavior::SamDowntime { downtime, .. } => {
            let expected = Decimal::from(config.expected_credits.max(1));
            (baseline * Decimal::from(downtime.credits) / expected).round_dp(16)
        }
        Behavior::SamCommission { commission, .. } => {
            (baseline * (Decimal::ONE - commission.inflation_fraction())).round_dp(10)
        }
        Behavior::Sam(_) | Behavior::Passive | Behavior::Institutional(_) => baseline,
    }
}
