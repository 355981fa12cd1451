mod config;
mod domain;
mod engine;
mod error;
mod input;
mod output;
mod telemetry;

pub use config::{EpochEconomics, FixtureConfig, InstitutionalSettings, ReferencePlan};
pub use domain::{
    Behavior, Bid, CommissionIncrease, Downtime, EpochScenario, InstitutionalPayout, KeyRole,
    LAMPORTS_PER_SOL, Lamports, Pmpe, Pubkey, Role, StakeAccount, ValidatorScenario,
};
pub use engine::{
    EpochRng, EpochSummary, RunReport, epoch_inputs_dir, epoch_rng, generate_epoch, run,
    run_parallel, write_epoch,
};
pub use error::Error;
pub use input::{Cli, DEFAULT_OUTPUT_ROOT, EpochSelection, REFERENCE_EPOCH, RunTarget};
pub use output::{
    BlockReward, Commissions, EpochDocuments, InstitutionalBundle, InstitutionalPayouts,
    PayoutDistributor, PayoutStaker, RenderedDocument, RevShare, RevenueExpectation,
    RevenueExpectationCollection, RewardLedgers, RewardRates, SamScore, StakeMeta, StakeReward,
    StakeSnapshot, ValidatorMeta, ValidatorMetaCollection, ValidatorReward, ValidatorSummary,
    priority_fee_cap,
};
pub use telemetry::{LogFormat, setup_logging};

/// Generates the fixtures of every selected epoch below `output_root`.
///
/// This is the entry point used by the binary. Each epoch is fully determined by its number and
/// `config`, so the same call always produces byte-identical files. With `workers > 1` the epochs
/// are generated concurrently; the files and the order of the summaries do not change.
///
/// `on_summary` receives one [`EpochSummary`] per generated epoch, in epoch order. The first
/// failing epoch aborts the run and its error is returned.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use settlement_fixtures::{EpochSelection, FixtureConfig, generate};
///
/// let selection = EpochSelection::new(100, 104).unwrap();
/// let report = generate(
///     selection,
///     Path::new("./regression-data-fabricated"),
///     &FixtureConfig::default(),
///     4,
///     |summary| println!("  {summary}"),
/// )
/// .unwrap();
/// println!("{report}");
/// ```
pub fn generate(
    selection: EpochSelection,
    output_root: &std::path::Path,
    config: &FixtureConfig,
    workers: usize,
    on_summary: impl FnMut(&EpochSummary),
) -> Result<RunReport, Error> {
    if workers > 1 {
        run_parallel(selection, output_root, config, workers, on_summary)
    } else {
        run(selection, output_root, config, on_summary)
    }
}
