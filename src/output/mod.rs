//! Module turning a sampled epoch into the documents consumed by the settlement pipeline.
//!
//! Each sub-module owns one document family. The builders never re-derive a value that the
//! scenario already holds; they copy it, so every document agrees on stake, credits, bids and
//! commissions by construction.

mod evaluation;
mod institutional;
mod rewards;
mod scores;
mod stakes;
mod validators;

use std::path::PathBuf;

use serde::Serialize;

use crate::{
    config::FixtureConfig,
    domain::EpochScenario,
    engine::EpochRng,
    error::{Error, json_error},
};

pub use evaluation::{RevenueExpectation, RevenueExpectationCollection};
pub use institutional::{
    InstitutionalBundle, InstitutionalPayouts, PayoutDistributor, PayoutStaker, ValidatorSummary,
};
pub use rewards::{
    BlockReward, RewardLedgers, RewardRates, StakeReward, ValidatorReward, priority_fee_cap,
};
pub use scores::{Commissions, RevShare, SamScore};
pub use stakes::{StakeMeta, StakeSnapshot};
pub use validators::{ValidatorMeta, ValidatorMetaCollection};


/// The full set of documents of one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochDocuments {
    pub scenario: EpochScenario,
    pub stakes: StakeSnapshot,
    pub sam_scores: Vec<SamScore>,
    pub validators: ValidatorMetaCollection,
    pub evaluation: RevenueExpectationCollection,
    pub rewards: RewardLedgers,
    /// Present iff the epoch has at least one institutional validator
    pub institutional: Option<InstitutionalBundle>,
}

/// A serialized document together with its path relative to the epoch's `inputs` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub relative_path: PathBuf,
    pub contents: Vec<u8>,
}

impl EpochDocuments {
    /// Builds every document of the epoch. `rng` must be the epoch's stream, positioned right after
    /// the sampler's draws: reward rates, priority fees and institutional figures continue it.
    pub(crate) fn synthesize(
        scenario: EpochScenario,
        config: &FixtureConfig,
        rng: &mut EpochRng,
    ) -> Self {
        let stakes = stakes::build_stake_snapshot(&scenario, config);
        let sam_scores = scores::build_sam_scores(&scenario, config);
        let validators = validators::build_validator_metas(&scenario, config);
        let evaluation = evaluation::build_revenue_expectations(&scenario, config);
        let rewards = rewards::build_reward_ledgers(&scenario, rng);
        let institutional = institutional::build_institutional_bundle(&scenario, config, rng);

        Self {
            scenario,
            stakes,
            sam_scores,
            validators,
            evaluation,
            rewards,
            institutional,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.scenario.epoch
    }

    /// Serializes every document as pretty-printed JSON, in a fixed order.
    pub fn render(&self) -> Result<Vec<RenderedDocument>, Error> {
        let rewards = &self.rewards;
        let mut documents = vec![
            render("stakes.json", &self.stakes)?,
            render("sam-scores.json", &self.sam_scores)?,
            render("validators.json", &self.validators)?,
            render("evaluation.json", &self.evaluation)?,
            render("rewards/inflation.json", &rewards.inflation)?,
            render("rewards/mev.json", &rewards.mev)?,
            render("rewards/jito_priority_fee.json", &rewards.jito_priority_fee)?,
            render(
                "rewards/validators_inflation.json",
                &rewards.validators_inflation,
            )?,
            render("rewards/validators_mev.json", &rewards.validators_mev)?,
            render("rewards/validators_blocks.json", &rewards.validators_blocks)?,
        ];
        if let Some(bundle) = &self.institutional {
            documents.push(render(
                "institutional/institutional-payouts.json",
                &bundle.payouts,
            )?);
            documents.push(render("institutional/stakes.json", &bundle.stakes)?);
        }
        Ok(documents)
    }
}

fn render(relative_path: &str, document: &impl Serialize) -> Result<RenderedDocument, Error> {
    let contents =
        serde_json::to_vec_pretty(document).map_err(|e| json_error(relative_path, e))?;
    Ok(RenderedDocument {
        relative_path: PathBuf::from(relative_path),
        contents,
    })
}

/// Serializes lamport amounts as decimal strings, which the pipeline reads without precision loss.
pub(crate) mod amount_string {
    use serde::Serializer;

    pub(crate) fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}
