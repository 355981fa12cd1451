//! Institutional payout bundle.
//!
//! Only emitted when the epoch has institutional validators. Next to them it always lists the
//! first bidding validator as a non-institutional entry, so that the consumer's
//! "not institutional" path is covered as well.

use std::ops::RangeInclusive;

use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::FixtureConfig,
    domain::{EpochScenario, Lamports, Pubkey, StakeAccount, ValidatorScenario},
    engine::EpochRng,
    output::{StakeMeta, StakeSnapshot, amount_string},
};

const VALIDATOR_REWARDS: RangeInclusive<u64> = 100_000..=1_000_000;
const STAKERS_INFLATION_REWARDS: RangeInclusive<u64> = 1_000_000..=10_000_000;
const STAKERS_MEV_REWARDS: RangeInclusive<u64> = 500_000..=5_000_000;

const PAYOUT_TYPE: &str = "institutional";

#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionalBundle {
    /// `institutional/institutional-payouts.json`
    pub payouts: InstitutionalPayouts,
    /// `institutional/stakes.json`
    pub stakes: StakeSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalPayouts {
    pub epoch: u64,
    #[serde(with = "amount_string")]
    pub slot: u64,
    pub config: PayoutConfig,
    pub institutional_validators: InstitutionalValidators,
    pub distributor_fee_bps: u16,
    pub validator_max_fee_bps: u16,
    pub institutional_staker_authorities: Vec<Pubkey>,
    pub psr_percentile_data: PsrPercentileData,
    pub payout_stakers: Vec<PayoutStaker>,
    pub payout_distributors: Vec<PayoutDistributor>,
    pub validators: Vec<ValidatorSummary>,
    pub validator_payout_info: Vec<ValidatorPayoutInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutConfig {
    pub staker_authority_filter: Vec<Pubkey>,
    pub psr_percentile: u8,
    pub psr_grace_downtime_bps: u16,
    pub validator_max_fee_bps: u16,
    pub distributor_fee_bps: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstitutionalValidators {
    pub validators: Vec<NamedValidator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValidator {
    pub name: String,
    pub vote_pubkey: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PsrPercentileData {
    pub psr_percentile: u8,
    #[serde(with = "rust_decimal::serde::str")]
    pub psr_percentile_apy: Decimal,
    #[serde(with = "amount_string")]
    pub psr_percentile_effective_stake: Lamports,
    pub psr_grace_downtime_bps: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveStake {
    pub address: Pubkey,
    #[serde(with = "amount_string")]
    pub effective_stake: Lamports,
}

impl From<&StakeAccount> for EffectiveStake {
    fn from(account: &StakeAccount) -> Self {
        Self {
            address: account.pubkey.clone(),
            effective_stake: account.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutStaker {
    pub vote_account: Pubkey,
    pub stake_accounts: Vec<EffectiveStake>,
    pub staker: Pubkey,
    pub withdrawer: Pubkey,
    #[serde(with = "amount_string")]
    pub active_stake: Lamports,
    #[serde(with = "amount_string")]
    pub activating_stake: Lamports,
    #[serde(with = "amount_string")]
    pub deactivating_stake: Lamports,
    #[serde(with = "amount_string")]
    pub effective_stake: Lamports,
    #[serde(with = "amount_string")]
    pub balance_lamports: Lamports,
    pub share_institutional: u8,
    pub share_deactivation: u8,
    #[serde(with = "amount_string")]
    pub effective_payout_lamports: Lamports,
    #[serde(with = "amount_string")]
    pub deactivating_payout_lamports: Lamports,
    #[serde(with = "amount_string")]
    pub payout_lamports: Lamports,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutDistributor {
    pub vote_account: Pubkey,
    pub stake_accounts: Vec<EffectiveStake>,
    #[serde(with = "amount_string")]
    pub payout_lamports: Lamports,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakedAmounts {
    pub vote_account: Pubkey,
    pub stake_accounts: Vec<EffectiveStake>,
    #[serde(with = "amount_string")]
    pub total_active: Lamports,
    #[serde(with = "amount_string")]
    pub total_activating: Lamports,
    #[serde(with = "amount_string")]
    pub total_deactivating: Lamports,
    #[serde(with = "amount_string")]
    pub total_effective: Lamports,
    #[serde(with = "amount_string")]
    pub institutional_active: Lamports,
    #[serde(with = "amount_string")]
    pub institutional_activating: Lamports,
    #[serde(with = "amount_string")]
    pub institutional_deactivating: Lamports,
    #[serde(with = "amount_string")]
    pub institutional_effective: Lamports,
}

/// Per-validator summary of the institutional evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSummary {
    pub vote_account: Pubkey,
    pub staked_amounts: StakedAmounts,
    #[serde(with = "amount_string")]
    pub validator_rewards: Lamports,
    #[serde(with = "amount_string")]
    pub stakers_inflation_rewards: Lamports,
    #[serde(with = "amount_string")]
    pub stakers_mev_rewards: Lamports,
    #[serde(with = "amount_string")]
    pub stakers_rewards: Lamports,
    #[serde(with = "amount_string")]
    pub total_rewards: Lamports,
    pub is_institutional: bool,
    pub name: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub apy: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub institutional_staked_ratio: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub apy_percentile_diff: Decimal,
    pub commission: u8,
    pub mev_commission: Option<u16>,
    #[serde(with = "amount_string")]
    pub credits: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub uptime: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub uptime_deviation_bps: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorPayoutInfo {
    pub vote_account: Pubkey,
    pub is_institutional: bool,
    pub stake_accounts: Vec<EffectiveStake>,
    pub payout_type: String,
    #[serde(with = "amount_string")]
    pub distributor_fee_lamports: Lamports,
    #[serde(with = "amount_string")]
    pub validator_fee_lamports: Lamports,
    #[serde(with = "amount_string")]
    pub distribute_to_stakers_lamports: Lamports,
    #[serde(with = "amount_string")]
    pub psr_fee_lamports: Lamports,
}

/// Reward figures of a validator summary. Stakers get inflation plus MEV; the total adds the
/// validator's own share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SummaryRewards {
    validator: Lamports,
    stakers_inflation: Lamports,
    stakers_mev: Lamports,
}

impl SummaryRewards {
    fn sample(rng: &mut EpochRng) -> Self {
        Self {
            validator: rng.random_range(VALIDATOR_REWARDS),
            stakers_inflation: rng.random_range(STAKERS_INFLATION_REWARDS),
            stakers_mev: rng.random_range(STAKERS_MEV_REWARDS),
        }
    }

    /// Fixed figures of the non-institutional coverage entry.
    fn coverage() -> Self {
        Self {
            validator: 22,
            stakers_inflation: 936_000,
            stakers_mev: 424_000,
        }
    }

    fn stakers(&self) -> Lamports {
        self.stakers_inflation + self.stakers_mev
    }

    fn total(&self) -> Lamports {
        self.stakers() + self.validator
    }
}

/// APY and uptime figures reported next to the rewards. They are opaque to the settlement
/// computation and kept fixed.
struct SummaryFigures {
    apy: Decimal,
    apy_percentile_diff: Decimal,
    uptime: Decimal,
    uptime_deviation_bps: Decimal,
}

impl SummaryFigures {
    fn institutional() -> Self {
        Self {
            apy: Decimal::from_i128_with_scale(3351098545862417967, 19),
            apy_percentile_diff: Decimal::from_i128_with_scale(320321072484937439, 20),
            ..Self::coverage()
        }
    }

    fn coverage() -> Self {
        Self {
            apy: Decimal::from_i128_with_scale(2817230091720860017, 19),
            apy_percentile_diff: Decimal::from_i128_with_scale(-5018363468930642061, 20),
            uptime: Decimal::from_i128_with_scale(13987038626875478458, 19),
            uptime_deviation_bps: Decimal::from_i128_with_scale(-39870386268754784581, 16),
        }
    }
}

pub(crate) fn build_institutional_bundle(
    scenario: &EpochScenario,
    config: &FixtureConfig,
    rng: &mut EpochRng,
) -> Option<InstitutionalBundle> {
    let institutional: Vec<&ValidatorScenario> = scenario.institutional().collect();
    if institutional.is_empty() {
        return None;
    }

    let mut payout_stakers = Vec::with_capacity(institutional.len());
    let mut payout_distributors = Vec::with_capacity(institutional.len());
    let mut validators = Vec::with_capacity(institutional.len() + 1);
    let mut validator_payout_info = Vec::with_capacity(institutional.len());
    let mut stake_metas = Vec::new();

    for validator in &institutional {
        let payout = validator.payout_or_zero();
        let stake_accounts = effective_stakes(validator);
        let total_stake = validator.total_stake();

        payout_stakers.push(PayoutStaker {
            vote_account: validator.vote_account.clone(),
            stake_accounts: stake_accounts.clone(),
            staker: config.institutional_staker_authority.clone(),
            withdrawer: validator.withdraw_authority.clone(),
            active_stake: total_stake,
            activating_stake: 0,
            deactivating_stake: 0,
            effective_stake: total_stake,
            balance_lamports: total_stake + config.institutional_balance_buffer_lamports,
            share_institutional: 1,
            share_deactivation: 0,
            effective_payout_lamports: payout.payout_stakers,
            deactivating_payout_lamports: 0,
            payout_lamports: payout.payout_stakers,
        });

        payout_distributors.push(PayoutDistributor {
            vote_account: validator.vote_account.clone(),
            stake_accounts: stake_accounts.clone(),
            payout_lamports: payout.payout_distributor,
        });

        validators.push(validator_summary(
            validator,
            staked_amounts(validator, stake_accounts.clone(), total_stake),
            SummaryRewards::sample(rng),
            SummaryFigures::institutional(),
            Some(institutional_name(validator)),
            config,
        ));

        validator_payout_info.push(ValidatorPayoutInfo {
            vote_account: validator.vote_account.clone(),
            is_institutional: true,
            stake_accounts,
            payout_type: PAYOUT_TYPE.to_string(),
            distributor_fee_lamports: payout.payout_distributor,
            validator_fee_lamports: payout.payout_distributor,
            distribute_to_stakers_lamports: payout.payout_stakers,
            psr_fee_lamports: 0,
        });

        stake_metas.extend(validator.stake_accounts.iter().map(|account| {
            StakeMeta::active(
                account,
                validator,
                &config.institutional_staker_authority,
                config.stake_buffer_lamports,
            )
        }));
    }

    if let Some(bidder) = scenario.bidders().next() {
        validators.push(validator_summary(
            bidder,
            staked_amounts(bidder, Vec::new(), 0),
            SummaryRewards::coverage(),
            SummaryFigures::coverage(),
            None,
            config,
        ));
        if let Some(account) = bidder.stake_accounts.first() {
            stake_metas.push(StakeMeta::active(
                account,
                bidder,
                config.whitelisted_authority(0),
                config.stake_buffer_lamports,
            ));
        }
    }

    let settings = &config.institutional;
    let payouts = InstitutionalPayouts {
        epoch: scenario.epoch,
        slot: scenario.slot,
        config: PayoutConfig {
            staker_authority_filter: config.institutional_authority_filter.clone(),
            psr_percentile: settings.psr_percentile,
            psr_grace_downtime_bps: settings.psr_grace_downtime_bps,
            validator_max_fee_bps: settings.validator_max_fee_bps,
            distributor_fee_bps: settings.distributor_fee_bps,
        },
        institutional_validators: InstitutionalValidators {
            validators: institutional
                .iter()
                .map(|v| NamedValidator {
                    name: institutional_name(v),
                    vote_pubkey: v.vote_account.clone(),
                })
                .collect(),
        },
        distributor_fee_bps: settings.distributor_fee_bps,
        validator_max_fee_bps: settings.validator_max_fee_bps,
        institutional_staker_authorities: config.institutional_authority_filter.clone(),
        psr_percentile_data: PsrPercentileData {
            psr_percentile: settings.psr_percentile,
            psr_percentile_apy: settings.psr_percentile_apy,
            psr_percentile_effective_stake: settings.psr_percentile_effective_stake_lamports,
            psr_grace_downtime_bps: settings.psr_grace_downtime_bps,
        },
        payout_stakers,
        payout_distributors,
        validators,
        validator_payout_info,
    };

    Some(InstitutionalBundle {
        payouts,
        stakes: StakeSnapshot {
            epoch: scenario.epoch,
            slot: scenario.slot,
            stake_metas,
        },
    })
}

fn institutional_name(validator: &ValidatorScenario) -> String {
    format!("Test Institutional {}", validator.index)
}

fn effective_stakes(validator: &ValidatorScenario) -> Vec<EffectiveStake> {
    validator.stake_accounts.iter().map(EffectiveStake::from).collect()
}

/// `institutional_stake` is the part of the total stake delegated by institutional stakers.
fn staked_amounts(
    validator: &ValidatorScenario,
    stake_accounts: Vec<EffectiveStake>,
    institutional_stake: Lamports,
) -> StakedAmounts {
    let total_stake = validator.total_stake();
    StakedAmounts {
        vote_account: validator.vote_account.clone(),
        stake_accounts,
        total_active: total_stake,
        total_activating: 0,
        total_deactivating: 0,
        total_effective: total_stake,
        institutional_active: institutional_stake,
        institutional_activating: 0,
        institutional_deactivating: 0,
        institutional_effective: institutional_stake,
    }
}

fn validator_summary(
    validator: &ValidatorScenario,
    staked_amounts: StakedAmounts,
    rewards: SummaryRewards,
    figures: SummaryFigures,
    name: Option<String>,
    config: &FixtureConfig,
) -> ValidatorSummary {
    let is_institutional = name.is_some();
    ValidatorSummary {
        vote_account: validator.vote_account.clone(),
        staked_amounts,
        validator_rewards: rewards.validator,
        stakers_inflation_rewards: rewards.stakers_inflation,
        stakers_mev_rewards: rewards.stakers_mev,
        stakers_rewards: rewards.stakers(),
        total_rewards: rewards.total(),
        is_institutional,
        name,
        apy: figures.apy,
        institutional_staked_ratio: if is_institutional {
            Decimal::ONE
        } else {
            Decimal::ZERO
        },
        apy_percentile_diff: figures.apy_percentile_diff,
        commission: validator.commission_or_zero().inflation_commission_pct,
        mev_commission: None,
        credits: validator.credits(config.expected_credits),
        uptime: figures.uptime,
        uptime_deviation_bps: figures.uptime_deviation_bps,
    }
}
