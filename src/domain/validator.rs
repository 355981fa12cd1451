//! Module defining the fabricated validators and the role-specific parameters they carry

use rust_decimal::Decimal;

use crate::domain::{LAMPORTS_PER_SOL, Lamports, Pmpe, Pubkey};

/// Behavioural role of a fabricated validator. Decides which settlement path it exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Bids in the stake auction, nothing else
    Sam,
    /// Bids and loses credits to downtime
    SamDowntime,
    /// Bids and raises its on-chain commission
    SamCommission,
    /// Not whitelisted, no bid
    Passive,
    Institutional,
}

impl Role {
    /// All roles, in the order the sampler builds them.
    pub const ALL: [Role; 5] = [
        Role::Sam,
        Role::SamDowntime,
        Role::SamCommission,
        Role::Passive,
        Role::Institutional,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Sam => "SAM-only",
            Role::SamDowntime => "SAM+downtime",
            Role::SamCommission => "SAM+commission",
            Role::Passive => "passive",
            Role::Institutional => "institutional",
        }
    }

    pub fn is_bidding(self) -> bool {
        matches!(self, Role::Sam | Role::SamDowntime | Role::SamCommission)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeAccount {
    pub pubkey: Pubkey,
    /// Delegated amount
    pub amount: Lamports,
}

impl StakeAccount {
    /// Delegated amount in whole SOL (truncating).
    pub fn sol(&self) -> u64 {
        self.amount / LAMPORTS_PER_SOL
    }
}

/// Auction economics of a bidding validator, in PMPE (lamports per 1000 SOL per epoch, in SOL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bid {
    pub bid_pmpe: Pmpe,
    pub static_bid_pmpe: Pmpe,
    pub effective_bid: Pmpe,
    pub total_pmpe: Pmpe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downtime {
    /// Share of the expected credits that was lost, in basis points
    pub downtime_bps: u32,
    /// Credits actually earned in the epoch
    pub credits: u64,
}

impl Downtime {
    /// Credits earned after losing `downtime_bps` of `expected_credits`, rounded up so that the
    /// loss never exceeds `downtime_bps`.
    pub fn new(expected_credits: u64, downtime_bps: u32) -> Self {
        let kept_bps = 10_000u64.saturating_sub(downtime_bps.into());
        Self {
            downtime_bps,
            credits: (expected_credits * kept_bps).div_ceil(10_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommissionIncrease {
    /// On-chain inflation commission, in percent
    pub inflation_commission_pct: u8,
    /// On-chain MEV commission, in basis points
    pub mev_commission_bps: u16,
    /// Revenue the validator delivered before the increase
    pub before_sam_increase_pmpe: Pmpe,
}

impl CommissionIncrease {
    /// Inflation commission as a fraction, e.g. `0.05` for 5%.
    pub fn inflation_fraction(&self) -> Decimal {
        Decimal::new(self.inflation_commission_pct.into(), 2)
    }

    /// MEV commission as a fraction, e.g. `0.08` for 800 bps.
    pub fn mev_fraction(&self) -> Decimal {
        Decimal::new(self.mev_commission_bps.into(), 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstitutionalPayout {
    pub payout_stakers: Lamports,
    pub payout_distributor: Lamports,
}

/// Role together with the parameters only that role carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    Sam(Bid),
    SamDowntime {
        bid: Bid,
        downtime: Downtime,
    },
    SamCommission {
        bid: Bid,
        commission: CommissionIncrease,
    },
    Passive,
    Institutional(InstitutionalPayout),
}

impl Behavior {
    pub fn role(&self) -> Role {
        match self {
            Behavior::Sam(_) => Role::Sam,
            Behavior::SamDowntime { .. } => Role::SamDowntime,
            Behavior::SamCommission { .. } => Role::SamCommission,
            Behavior::Passive => Role::Passive,
            Behavior::Institutional(_) => Role::Institutional,
        }
    }

    pub fn bid(&self) -> Option<&Bid> {
        match self {
            Behavior::Sam(bid)
            | Behavior::SamDowntime { bid, .. }
            | Behavior::SamCommission { bid, .. } => Some(bid),
            Behavior::Passive | Behavior::Institutional(_) => None,
        }
    }

    pub fn downtime(&self) -> Option<&Downtime> {
        match self {
            Behavior::SamDowntime { downtime, .. } => Some(downtime),
            _ => None,
        }
    }

    pub fn commission(&self) -> Option<&CommissionIncrease> {
        match self {
            Behavior::SamCommission { commission, .. } => Some(commission),
            _ => None,
        }
    }

    pub fn institutional_payout(&self) -> Option<&InstitutionalPayout> {
        match self {
            Behavior::Institutional(payout) => Some(payout),
            _ => None,
        }
    }
}

/// One fabricated validator of one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorScenario {
    /// Position within the epoch, assigned in role-group order
    pub index: u32,
    pub vote_account: Pubkey,
    pub identity: Pubkey,
    pub stake_accounts: Vec<StakeAccount>,
    pub stake_authority: Pubkey,
    pub withdraw_authority: Pubkey,
    pub behavior: Behavior,
}

impl ValidatorScenario {
    pub fn role(&self) -> Role {
        self.behavior.role()
    }

    pub fn total_stake(&self) -> Lamports {
        self.stake_accounts.iter().map(|s| s.amount).sum()
    }

    pub fn total_stake_sol(&self) -> u64 {
        self.total_stake() / LAMPORTS_PER_SOL
    }

    /// Bid economics, zeroed for roles that do not bid.
    pub fn bid_or_zero(&self) -> Bid {
        self.behavior.bid().copied().unwrap_or_default()
    }

    /// Commission figures, zeroed for roles that keep their commission.
    pub fn commission_or_zero(&self) -> CommissionIncrease {
        self.behavior.commission().copied().unwrap_or_default()
    }

    /// Institutional payouts, zeroed for non-institutional validators.
    pub fn payout_or_zero(&self) -> InstitutionalPayout {
        self.behavior
            .institutional_payout()
            .copied()
            .unwrap_or_default()
    }

    /// Credits earned this epoch; only downtime reduces them below the expected value.
    pub fn credits(&self, expected_credits: u64) -> u64 {
        self.behavior
            .downtime()
            .map_or(expected_credits, |downtime| downtime.credits)
    }
}

/// Sampled shape of one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochScenario {
    pub epoch: u64,
    pub slot: u64,
    pub validators: Vec<ValidatorScenario>,
}

impl EpochScenario {
    /// Number of validators per role, in [`Role::ALL`] order.
    pub fn role_counts(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for validator in &self.validators {
            let slot = match validator.role() {
                Role::Sam => 0,
                Role::SamDowntime => 1,
                Role::SamCommission => 2,
                Role::Passive => 3,
                Role::Institutional => 4,
            };
            counts[slot] += 1;
        }
        counts
    }

    pub fn bidders(&self) -> impl Iterator<Item = &ValidatorScenario> {
        self.validators.iter().filter(|v| v.role().is_bidding())
    }

    pub fn institutional(&self) -> impl Iterator<Item = &ValidatorScenario> {
        self.validators
            .iter()
            .filter(|v| v.role() == Role::Institutional)
    }
}
