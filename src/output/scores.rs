//! Auction scores published for the bidding validators

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::FixtureConfig,
    domain::{Bid, EpochScenario, Pmpe, Pubkey, ValidatorScenario},
};

const MAX_STAKE_WANTED_SOL: u64 = 400_000;
const BOND_BALANCE_SOL: u64 = 100;
const MAX_PRIORITY: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamScore {
    pub vote_account: Pubkey,
    pub marinade_sam_target_sol: u64,
    pub rev_share: RevShare,
    pub stake_priority: u32,
    pub unstake_priority: u32,
    pub max_stake_wanted: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_bid: Pmpe,
    pub constraints: String,
    pub metadata: ScoreMetadata,
    pub scoring_run_id: u64,
    pub epoch: u64,
    pub values: ScoreValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevShare {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub inflation_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub mev_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub bid_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub auction_effective_bid_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub bid_too_low_penalty_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub blacklist_penalty_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub eff_participating_bid_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub expected_max_eff_bid_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub block_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub onchain_distributed_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub bond_obligation_pmpe: Pmpe,
    #[serde(with = "rust_decimal::serde::float")]
    pub auction_effective_static_bid_pmpe: Pmpe,
}

impl RevShare {
    /// The effective bid appears twice here and once at the top level of [`SamScore`]; all three
    /// are the same value.
    fn from_bid(bid: &Bid, inflation_pmpe: Pmpe) -> Self {
        Self {
            total_pmpe: bid.total_pmpe,
            inflation_pmpe,
            mev_pmpe: Decimal::ZERO,
            bid_pmpe: bid.bid_pmpe,
            auction_effective_bid_pmpe: bid.effective_bid,
            bid_too_low_penalty_pmpe: Decimal::ZERO,
            blacklist_penalty_pmpe: Decimal::ZERO,
            eff_participating_bid_pmpe: bid.effective_bid,
            expected_max_eff_bid_pmpe: (bid.effective_bid * Decimal::new(12, 1)).round_dp(4),
            block_pmpe: Decimal::ZERO,
            onchain_distributed_pmpe: Decimal::ZERO,
            bond_obligation_pmpe: Decimal::ZERO,
            auction_effective_static_bid_pmpe: bid.static_bid_pmpe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetadata {
    pub scoring_id: String,
    pub tvl: Tvl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tvl {
    pub marinade_sam_tvl_sol: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreValues {
    pub bond_balance_sol: u64,
    pub marinade_activated_stake_sol: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub bond_risk_fee_sol: Decimal,
    pub paid_undelegation_sol: u64,
    pub sam_blacklisted: bool,
    pub commissions: Commissions,
}

/// Commission figures as known to the auction. Only the on-chain values are ever non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commissions {
    #[serde(with = "rust_decimal::serde::float")]
    pub inflation_commission_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub mev_commission_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub block_rewards_commission_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub inflation_commission_onchain_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub inflation_commission_in_bond_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub inflation_commission_override_dec: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub mev_commission_onchain_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub mev_commission_in_bond_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub mev_commission_override_dec: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub block_rewards_commission_in_bond_dec: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub block_rewards_commission_override_dec: Option<Decimal>,
}

impl Commissions {
    fn onchain(validator: &ValidatorScenario) -> Self {
        let commission = validator.commission_or_zero();
        Self {
            inflation_commission_dec: Decimal::ZERO,
            mev_commission_dec: Decimal::ZERO,
            block_rewards_commission_dec: Decimal::ZERO,
            inflation_commission_onchain_dec: commission.inflation_fraction(),
            inflation_commission_in_bond_dec: Decimal::ZERO,
            inflation_commission_override_dec: None,
            mev_commission_onchain_dec: commission.mev_fraction(),
            mev_commission_in_bond_dec: Decimal::ZERO,
            mev_commission_override_dec: None,
            block_rewards_commission_in_bond_dec: Decimal::ZERO,
            block_rewards_commission_override_dec: None,
        }
    }
}

pub(crate) fn build_sam_scores(scenario: &EpochScenario, config: &FixtureConfig) -> Vec<SamScore> {
    scenario
        .validators
        .iter()
        .filter_map(|validator| {
            let bid = validator.behavior.bid()?;
            Some(sam_score(scenario.epoch, validator, bid, config))
        })
        .collect()
}

fn sam_score(
    epoch: u64,
    validator: &ValidatorScenario,
    bid: &Bid,
    config: &FixtureConfig,
) -> SamScore {
    let stake_sol = validator.total_stake_sol();
    SamScore {
        vote_account: validator.vote_account.clone(),
        marinade_sam_target_sol: stake_sol,
        rev_share: RevShare::from_bid(bid, config.inflation_pmpe),
        stake_priority: validator.index + 1,
        unstake_priority: MAX_PRIORITY.saturating_sub(validator.index),
        max_stake_wanted: MAX_STAKE_WANTED_SOL,
        effective_bid: bid.effective_bid,
        constraints: String::new(),
        metadata: ScoreMetadata {
            scoring_id: format!("test-scoring-{epoch}-{}", validator.index),
            tvl: Tvl {
                marinade_sam_tvl_sol: stake_sol,
            },
        },
        scoring_run_id: 1,
        epoch,
        values: ScoreValues {
            bond_balance_sol: BOND_BALANCE_SOL,
            marinade_activated_stake_sol: stake_sol,
            bond_risk_fee_sol: Decimal::new(5, 1),
            paid_undelegation_sol: 0,
            sam_blacklisted: false,
            commissions: Commissions::onchain(validator),
        },
    }
}
