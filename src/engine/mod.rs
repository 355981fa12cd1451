//! Module for the core logic of the generator: sampling an epoch and driving runs over epochs

mod orchestration;
mod sampler;

use tracing::info;

use crate::{config::FixtureConfig, error::Error, output::EpochDocuments};

pub use orchestration::{EpochSummary, RunReport, epoch_inputs_dir, run, run_parallel, write_epoch};
pub(crate) use sampler::DOWNTIME_BPS;
pub use sampler::{EpochRng, epoch_rng};

///
/// Generates the complete document set of one epoch, in memory.
///
/// The result depends only on `epoch` and `config`: sampling and every random draw of the document
/// builders consume one stream seeded by the epoch number, in a fixed order.
///
pub fn generate_epoch(epoch: u64, config: &FixtureConfig) -> Result<EpochDocuments, Error> {
    let mut rng = epoch_rng(epoch);
    let scenario = sampler::sample_epoch(epoch, config, &mut rng)?;
    info!(
        epoch,
        slot = scenario.slot,
        validators = scenario.validators.len(),
        "sampled epoch scenario"
    );
    Ok(EpochDocuments::synthesize(scenario, config, &mut rng))
}
