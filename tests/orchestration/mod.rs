//! Tests of multi-epoch runs, sequential and parallel.

use claims::{assert_matches, assert_ok};
use rstest::rstest;
use settlement_fixtures::{
    EpochSelection, EpochSummary, Error, FixtureConfig, generate, run, run_parallel,
};

use crate::read_tree;

#[test]
fn sequential_run_reports_every_epoch_in_order() {
    let root = tempfile::tempdir().unwrap();
    let selection = assert_ok!(EpochSelection::new(10, 14));

    let mut summaries: Vec<EpochSummary> = Vec::new();
    let report = run(selection, root.path(), &FixtureConfig::default(), |s| {
        summaries.push(s.clone())
    })
    .unwrap();

    let epochs: Vec<_> = summaries.iter().map(|s| s.epoch).collect();
    assert_eq!(epochs, [10, 11, 12, 13, 14]);
    assert_eq!(report.epochs, 5);
    assert_eq!(
        report.validators,
        summaries.iter().map(|s| s.validators() as u64).sum::<u64>()
    );
    for epoch in 10..=14 {
        assert!(root.path().join(epoch.to_string()).join("inputs").is_dir());
    }
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(8)]
fn parallel_run_matches_sequential_run(#[case] workers: usize) {
    let config = FixtureConfig::default();
    let selection = assert_ok!(EpochSelection::new(200, 211));

    let sequential_root = tempfile::tempdir().unwrap();
    let mut sequential = Vec::new();
    let sequential_report = run(selection, sequential_root.path(), &config, |s| {
        sequential.push(s.clone())
    })
    .unwrap();

    let parallel_root = tempfile::tempdir().unwrap();
    let mut parallel = Vec::new();
    let parallel_report = run_parallel(selection, parallel_root.path(), &config, workers, |s| {
        parallel.push(s.clone())
    })
    .unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel_report, sequential_report);
    assert_eq!(
        read_tree(parallel_root.path()),
        read_tree(sequential_root.path())
    );
}

#[test]
fn generate_dispatches_on_worker_count() {
    let config = FixtureConfig::default();
    let selection = assert_ok!(EpochSelection::new(0, 3));

    let single = tempfile::tempdir().unwrap();
    let many = tempfile::tempdir().unwrap();
    let one = generate(selection, single.path(), &config, 1, |_| {}).unwrap();
    let four = generate(selection, many.path(), &config, 4, |_| {}).unwrap();

    assert_eq!(one, four);
    assert_eq!(read_tree(single.path()), read_tree(many.path()));
}

#[test]
fn reversed_range_is_rejected() {
    assert_matches!(
        EpochSelection::new(5, 4),
        Err(Error::InvalidRange { start: 5, end: 4 })
    );
}

#[rstest]
#[case(1)]
#[case(4)]
fn io_failure_aborts_the_run(#[case] workers: usize) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("occupied");
    std::fs::write(&file, b"").unwrap();

    let selection = assert_ok!(EpochSelection::new(1, 6));
    let mut reported = 0;
    let result = generate(selection, &file, &FixtureConfig::default(), workers, |_| {
        reported += 1
    });

    assert_matches!(result, Err(Error::Io { .. }));
    assert_eq!(reported, 0);
}

#[test]
fn slot_overflow_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let selection = EpochSelection::single(u64::MAX);
    assert_matches!(
        run(selection, root.path(), &FixtureConfig::default(), |_| {}),
        Err(Error::SlotOverflow { epoch: u64::MAX })
    );
}
