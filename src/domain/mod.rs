//! Module for the types describing the fabricated validators of an epoch.

mod keys;
mod validator;

use rust_decimal::Decimal;

pub use keys::{KeyRole, Pubkey};
pub use validator::{
    Behavior, Bid, CommissionIncrease, Downtime, EpochScenario, InstitutionalPayout, Role,
    StakeAccount, ValidatorScenario,
};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Amount in base units.
pub type Lamports = u64;

/// Revenue rate per 1000 SOL of stake per epoch, in SOL.
pub type Pmpe = Decimal;
