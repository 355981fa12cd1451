//! Tests writing epochs to a temporary directory and reading them back.

use std::path::Path;

use serde_json::Value;
use settlement_fixtures::{epoch_inputs_dir, write_epoch};

use crate::{documents, read_tree};

const BASE_FILES: [&str; 10] = [
    "stakes.json",
    "sam-scores.json",
    "validators.json",
    "evaluation.json",
    "rewards/inflation.json",
    "rewards/mev.json",
    "rewards/jito_priority_fee.json",
    "rewards/validators_inflation.json",
    "rewards/validators_mev.json",
    "rewards/validators_blocks.json",
];

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn reference_epoch_writes_all_documents() {
    let root = tempfile::tempdir().unwrap();
    let docs = documents(99_999);

    let inputs = write_epoch(&docs, root.path()).unwrap();
    assert_eq!(inputs, root.path().join("99999").join("inputs"));
    assert_eq!(inputs, epoch_inputs_dir(root.path(), 99_999));

    for name in BASE_FILES {
        assert!(inputs.join(name).is_file(), "{name} missing");
    }
    assert!(inputs.join("institutional/institutional-payouts.json").is_file());
    assert!(inputs.join("institutional/stakes.json").is_file());
}

#[test]
fn written_files_match_rendered_documents() {
    let root = tempfile::tempdir().unwrap();
    let docs = documents(4_321);
    let inputs = write_epoch(&docs, root.path()).unwrap();

    let rendered = docs.render().unwrap();
    let written = read_tree(&inputs);
    assert_eq!(written.len(), rendered.len());
    for document in rendered {
        assert_eq!(written[&document.relative_path], document.contents);
    }
}

#[test]
fn documents_parse_back_with_expected_shapes() {
    let root = tempfile::tempdir().unwrap();
    let docs = documents(99_999);
    let inputs = write_epoch(&docs, root.path()).unwrap();

    let stakes = read_json(&inputs.join("stakes.json"));
    assert_eq!(stakes["epoch"], 99_999);
    assert_eq!(
        stakes["stake_metas"].as_array().unwrap().len(),
        docs.stakes.stake_metas.len()
    );

    let validators = read_json(&inputs.join("validators.json"));
    assert_eq!(validators["validator_metas"][1]["credits"], 5_032_000);
    assert!(validators["validator_metas"][0]["jito_priority_fee_commission"].is_null());

    let evaluation = read_json(&inputs.join("evaluation.json"));
    let expectations = evaluation["revenueExpectations"].as_array().unwrap();
    assert_eq!(expectations.len(), 5);
    assert!(expectations[3]["maxSamStake"].is_null());
    assert!(expectations[0]["maxSamStake"].is_u64());

    let blocks = read_json(&inputs.join("rewards/validators_blocks.json"));
    let first = &blocks[0];
    assert_eq!(first["identity_account"], first["node_pubkey"]);
    assert_eq!(first["identity_account"], first["authorized_voter"]);
    assert!(first["amount"].is_string());

    let payouts = read_json(&inputs.join("institutional/institutional-payouts.json"));
    assert_eq!(payouts["validatorPayoutInfo"][0]["payoutType"], "institutional");
    assert_eq!(payouts["validators"][1]["isInstitutional"], false);
}

#[test]
fn epoch_without_institutional_validators_has_no_institutional_dir() {
    let root = tempfile::tempdir().unwrap();
    let docs = (0..500)
        .map(documents)
        .find(|docs| docs.institutional.is_none())
        .unwrap();

    let inputs = write_epoch(&docs, root.path()).unwrap();
    assert!(!inputs.join("institutional").exists());
    assert_eq!(read_tree(&inputs).len(), BASE_FILES.len());
}

#[test]
fn rewriting_an_epoch_is_byte_identical() {
    let root = tempfile::tempdir().unwrap();
    write_epoch(&documents(77), root.path()).unwrap();
    let first = read_tree(root.path());

    write_epoch(&documents(77), root.path()).unwrap();
    assert_eq!(read_tree(root.path()), first);
}

#[test]
fn unwritable_root_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"").unwrap();

    let result = write_epoch(&documents(1), &file);
    claims::assert_matches!(result, Err(settlement_fixtures::Error::Io { .. }));
}
