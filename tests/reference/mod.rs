//! Regression tests of the reference epoch 99999, which exercises every settlement path once.

use std::path::PathBuf;

use claims::assert_some;
use rust_decimal_macros::dec;
use settlement_fixtures::{FixtureConfig, LAMPORTS_PER_SOL, REFERENCE_EPOCH, Role};
use sha2::{Digest, Sha256};

use crate::documents;

fn digests_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(format!("reference-{REFERENCE_EPOCH}.sha256"))
}

/// One `<sha256>  <relative path>` line per rendered document, in render order.
fn reference_digests() -> String {
    documents(REFERENCE_EPOCH)
        .render()
        .unwrap()
        .iter()
        .map(|document| {
            let digest = Sha256::digest(&document.contents);
            let path = document.relative_path.to_string_lossy().replace('\\', "/");
            format!("{digest:x}  {path}\n")
        })
        .collect()
}

fn write_digests(content: &str) {
    let path = digests_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    eprintln!("  wrote {}", path.display());
}

#[test]
fn one_validator_per_role() {
    let docs = documents(REFERENCE_EPOCH);
    assert_eq!(docs.scenario.validators.len(), 5);
    assert_eq!(docs.scenario.role_counts(), [1; 5]);
    let roles: Vec<_> = docs.scenario.validators.iter().map(|v| v.role()).collect();
    assert_eq!(roles, Role::ALL);
}

#[test]
fn reference_slot() {
    let docs = documents(REFERENCE_EPOCH);
    assert_eq!(docs.scenario.slot, 400_000_000 + 99_999 * 432_000);
    assert_eq!(docs.stakes.slot, docs.scenario.slot);
    assert_eq!(docs.validators.slot, docs.scenario.slot);
}

#[test]
fn downtime_validator_earns_74_percent() {
    let docs = documents(REFERENCE_EPOCH);
    let meta = &docs.validators.validator_metas[1];
    assert_eq!(meta.credits, 5_032_000);
    assert_eq!(
        docs.evaluation.revenue_expectations[1].actual_non_bid_pmpe,
        dec!(0.239316)
    );
}

#[test]
fn commission_validator_raises_to_5_percent_and_800_bps() {
    let docs = documents(REFERENCE_EPOCH);
    let meta = &docs.validators.validator_metas[2];
    assert_eq!(meta.commission, 5);
    assert_eq!(meta.mev_commission, 800);

    let score = &docs.sam_scores[2];
    assert_eq!(score.values.commissions.inflation_commission_onchain_dec, dec!(0.05));
    assert_eq!(score.values.commissions.mev_commission_onchain_dec, dec!(0.08));
}

#[test]
fn passive_validator_is_not_whitelisted() {
    let docs = documents(REFERENCE_EPOCH);
    let config = FixtureConfig::default();
    let passive = &docs.scenario.validators[3];
    let metas: Vec<_> = docs
        .stakes
        .stake_metas
        .iter()
        .filter(|m| m.validator == passive.vote_account)
        .collect();
    assert!(!metas.is_empty());
    for meta in metas {
        assert!(!config.whitelist_stake_authorities.contains(&meta.stake_authority));
        assert_eq!(meta.stake_authority, meta.withdraw_authority);
    }
}

#[test]
fn institutional_validator_has_two_stake_accounts() {
    let docs = documents(REFERENCE_EPOCH);
    let institutional = &docs.scenario.validators[4];
    assert_eq!(institutional.stake_accounts.len(), 2);

    let bundle = assert_some!(&docs.institutional);
    let staker = &bundle.payouts.payout_stakers[0];
    assert_eq!(staker.vote_account, institutional.vote_account);
    assert_eq!(staker.stake_accounts.len(), 2);
    assert_eq!(
        staker.balance_lamports,
        institutional.total_stake() + 4 * LAMPORTS_PER_SOL
    );
    assert_eq!(bundle.payouts.validators.len(), 2);
}

#[test]
fn reference_keys_are_stable() {
    let docs = documents(REFERENCE_EPOCH);
    let sam = &docs.scenario.validators[0];
    assert_eq!(
        sam.vote_account.as_str(),
        "DU3TPzSkuB3xEZUNd6ecsidLdjcd85UDtuSMommPiACu"
    );
    assert_eq!(
        sam.identity.as_str(),
        "CSvsKMbtAbni4YqTGBvxqbf1LxJhoMykqapsL5fgLabV"
    );
}

/// Pins every byte of the reference epoch against the checked-in digests, so that a change of the
/// random stream, of field order or of number formatting shows up here. The digests are recorded
/// when the file does not exist yet and can be (re)generated using
/// `cargo test --test integration -- --ignored record_reference_digests`.
#[test]
fn reference_documents_match_recorded_digests() {
    let actual = reference_digests();
    match std::fs::read_to_string(digests_path()) {
        Ok(recorded) => assert_eq!(
            actual, recorded,
            "reference epoch output changed; re-record the digests if this is intended"
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => write_digests(&actual),
        Err(e) => panic!("failed to read {}: {e}", digests_path().display()),
    }
}

#[test]
#[ignore]
fn record_reference_digests() {
    write_digests(&reference_digests());
}

#[test]
fn reference_digests_cover_every_document() {
    let digests = reference_digests();
    let lines: Vec<_> = digests.lines().collect();
    assert_eq!(lines.len(), 12);
    assert!(lines[0].ends_with("  stakes.json"));
    for line in lines {
        let (digest, _) = line.split_once("  ").unwrap();
        assert_eq!(digest.len(), 64);
    }
}
