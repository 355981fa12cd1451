//! Module deciding the shape of an epoch: how many validators of each role exist and which
//! parameters each of them carries.
//!
//! All randomness comes from a single stream seeded by the epoch number. The draw order is fixed
//! (role counts, then validators in role-group order, each drawing stake accounts first and its
//! role parameters second), so regenerating an epoch always yields the same scenario.

use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;

use crate::{
    config::{FixtureConfig, ReferencePlan},
    domain::{
        Behavior, Bid, CommissionIncrease, Downtime, EpochScenario, InstitutionalPayout, KeyRole,
        LAMPORTS_PER_SOL, Role, StakeAccount, ValidatorScenario,
    },
    error::Error,
};

/// Random stream of one epoch.
pub type EpochRng = ChaCha8Rng;

const SAM_COUNT: RangeInclusive<u32> = 1..=4;
const SAM_DOWNTIME_COUNT: RangeInclusive<u32> = 0..=3;
const SAM_COMMISSION_COUNT: RangeInclusive<u32> = 0..=2;
const PASSIVE_COUNT: RangeInclusive<u32> = 0..=2;
const INSTITUTIONAL_COUNT: RangeInclusive<u32> = 0..=2;

const STAKE_ACCOUNTS: RangeInclusive<usize> = 1..=3;
const STAKE_SOL: RangeInclusive<u64> = 10_000..=120_000;

// PMPE draws are made in units of 0.0001 so that every figure is an exact 4-dp decimal
const PMPE_SCALE: u32 = 4;
const BID_PMPE: RangeInclusive<i64> = 2_000..=9_000;
const STATIC_BID_FACTOR: RangeInclusive<i64> = 3_000..=6_000;
const EFFECTIVE_BID_FACTOR: RangeInclusive<i64> = 4_000..=7_000;
const BEFORE_INCREASE_PMPE: RangeInclusive<i64> = 200..=800;

/// Downtime must stay above the 1% grace period and below a pathological 40%.
pub(crate) const DOWNTIME_BPS: RangeInclusive<u32> = 500..=4_000;

const INFLATION_COMMISSION_PCT: [u8; 4] = [3, 5, 7, 10];
const MEV_COMMISSION_BPS: [u16; 4] = [500, 800, 1_000, 1_500];

const PAYOUT_STAKERS: RangeInclusive<u64> = 5_000_000..=50_000_000;
const PAYOUT_DISTRIBUTOR: RangeInclusive<u64> = 200_000..=2_000_000;

/// Creates the random stream of an epoch. It depends on nothing but the epoch number.
pub fn epoch_rng(epoch: u64) -> EpochRng {
    ChaCha8Rng::seed_from_u64(epoch)
}

/// Number of validators per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RoleCounts {
    sam: u32,
    sam_downtime: u32,
    sam_commission: u32,
    passive: u32,
    institutional: u32,
}

impl RoleCounts {
    fn sample(rng: &mut EpochRng) -> Self {
        Self {
            sam: rng.random_range(SAM_COUNT),
            sam_downtime: rng.random_range(SAM_DOWNTIME_COUNT),
            sam_commission: rng.random_range(SAM_COMMISSION_COUNT),
            passive: rng.random_range(PASSIVE_COUNT),
            institutional: rng.random_range(INSTITUTIONAL_COUNT),
        }
        .with_bidder()
    }

    fn reference() -> Self {
        Self {
            sam: 1,
            sam_downtime: 1,
            sam_commission: 1,
            passive: 1,
            institutional: 1,
        }
    }

    /// Every epoch has to contain a bidding validator.
    fn with_bidder(mut self) -> Self {
        if self.sam + self.sam_downtime + self.sam_commission == 0 {
            self.sam = 1;
        }
        self
    }

    fn of(&self, role: Role) -> u32 {
        match role {
            Role::Sam => self.sam,
            Role::SamDowntime => self.sam_downtime,
            Role::SamCommission => self.sam_commission,
            Role::Passive => self.passive,
            Role::Institutional => self.institutional,
        }
    }

    /// Roles in build order: all bidders first, institutional validators last.
    fn roles(self) -> impl Iterator<Item = Role> {
        Role::ALL
            .into_iter()
            .flat_map(move |role| std::iter::repeat_n(role, self.of(role) as usize))
    }
}

/// Samples the validators of `epoch`, drawing from `rng`.
///
/// When the config pins a reference plan for this epoch, the role counts and the pinned
/// severities are taken from the plan and only the remaining quantities are drawn.
pub(crate) fn sample_epoch(
    epoch: u64,
    config: &FixtureConfig,
    rng: &mut EpochRng,
) -> Result<EpochScenario, Error> {
    let slot = config
        .slot_for(epoch)
        .ok_or(Error::SlotOverflow { epoch })?;
    let plan = config.reference_plan(epoch);

    let counts = match plan {
        Some(_) => RoleCounts::reference(),
        None => RoleCounts::sample(rng),
    };

    let validators = counts
        .roles()
        .zip(0u32..)
        .map(|(role, index)| sample_validator(epoch, index, role, config, plan, rng))
        .collect();

    Ok(EpochScenario {
        epoch,
        slot,
        validators,
    })
}

fn sample_validator(
    epoch: u64,
    index: u32,
    role: Role,
    config: &FixtureConfig,
    plan: Option<&ReferencePlan>,
    rng: &mut EpochRng,
) -> ValidatorScenario {
    let key_index = u64::from(index);

    let num_stakes = match (role, plan) {
        (Role::Institutional, Some(plan)) => plan.institutional_stake_accounts,
        _ => rng.random_range(STAKE_ACCOUNTS),
    };
    let stake_accounts = (0..num_stakes as u64)
        .map(|stake_index| StakeAccount {
            pubkey: KeyRole::Stake.key(epoch, key_index * 10 + stake_index),
            amount: rng.random_range(STAKE_SOL) * LAMPORTS_PER_SOL,
        })
        .collect();

    let (stake_authority, withdraw_authority) = match role {
        Role::Passive => {
            let authority = KeyRole::NonWhitelistedAuthority.key(epoch, key_index);
            (authority.clone(), authority)
        }
        Role::Institutional => (
            config.institutional_staker_authority.clone(),
            KeyRole::InstitutionalWithdraw.key(epoch, key_index),
        ),
        Role::Sam | Role::SamDowntime | Role::SamCommission => (
            config.whitelisted_authority(index).clone(),
            KeyRole::MarinadeWithdraw.key(epoch, key_index),
        ),
    };

    ValidatorScenario {
        index,
        vote_account: KeyRole::Vote.key(epoch, key_index),
        identity: KeyRole::Identity.key(epoch, key_index),
        stake_accounts,
        stake_authority,
        withdraw_authority,
        behavior: sample_behavior(role, config, plan, rng),
    }
}

fn sample_behavior(
    role: Role,
    config: &FixtureConfig,
    plan: Option<&ReferencePlan>,
    rng: &mut EpochRng,
) -> Behavior {
    match role {
        Role::Sam => Behavior::Sam(sample_bid(config, rng)),
        Role::SamDowntime => {
            let bid = sample_bid(config, rng);
            let downtime_bps = match plan {
                Some(plan) => plan.downtime_bps,
                None => rng.random_range(DOWNTIME_BPS),
            };
            let downtime = Downtime::new(config.expected_credits, downtime_bps);
            debug_assert!(
                downtime.credits * 100 < config.expected_credits * 99,
                "downtime does not exceed the grace period"
            );
            Behavior::SamDowntime { bid, downtime }
        }
        Role::SamCommission => {
            let bid = sample_bid(config, rng);
            let commission = sample_commission(plan, rng);
            Behavior::SamCommission { bid, commission }
        }
        Role::Passive => Behavior::Passive,
        Role::Institutional => Behavior::Institutional(InstitutionalPayout {
            payout_stakers: rng.random_range(PAYOUT_STAKERS),
            payout_distributor: rng.random_range(PAYOUT_DISTRIBUTOR),
        }),
    }
}

fn sample_bid(config: &FixtureConfig, rng: &mut EpochRng) -> Bid {
    let bid_pmpe = pmpe(rng.random_range(BID_PMPE));
    let static_bid_pmpe =
        (bid_pmpe * pmpe(rng.random_range(STATIC_BID_FACTOR))).round_dp(PMPE_SCALE);
    let effective_bid =
        (bid_pmpe * pmpe(rng.random_range(EFFECTIVE_BID_FACTOR))).round_dp(PMPE_SCALE);
    Bid {
        bid_pmpe,
        static_bid_pmpe,
        effective_bid,
        total_pmpe: config.inflation_pmpe + bid_pmpe,
    }
}

fn sample_commission(plan: Option<&ReferencePlan>, rng: &mut EpochRng) -> CommissionIncrease {
    let (inflation_commission_pct, mev_commission_bps) = match plan {
        Some(plan) => (plan.inflation_commission_pct, plan.mev_commission_bps),
        None => (
            INFLATION_COMMISSION_PCT[rng.random_range(0..INFLATION_COMMISSION_PCT.len())],
            MEV_COMMISSION_BPS[rng.random_range(0..MEV_COMMISSION_BPS.len())],
        ),
    };
    CommissionIncrease {
        inflation_commission_pct,
        mev_commission_bps,
        before_sam_increase_pmpe: pmpe(rng.random_range(BEFORE_INCREASE_PMPE)),
    }
}

fn pmpe(units: i64) -> Decimal {
    Decimal::new(units, PMPE_SCALE)
}
