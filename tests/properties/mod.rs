//! Property tests over arbitrary epochs: every generated epoch has to be consumable by the
//! settlement pipeline without tripping any of its consistency checks.

use std::collections::HashMap;

use proptest::prelude::*;
use settlement_fixtures::{
    Behavior, EpochDocuments, FixtureConfig, LAMPORTS_PER_SOL, Role, generate_epoch,
};

// keeps the derived slot far away from u64 overflow
const MAX_EPOCH: u64 = 10_000_000_000;

fn generate(epoch: u64) -> EpochDocuments {
    generate_epoch(epoch, &FixtureConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn generation_is_deterministic(epoch in 0..MAX_EPOCH) {
        let first = generate(epoch);
        let second = generate(epoch);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.render().unwrap(), second.render().unwrap());
    }

    #[test]
    fn stake_agrees_across_documents(epoch in 0..MAX_EPOCH) {
        let docs = generate(epoch);

        let mut delegated: HashMap<_, u64> = HashMap::new();
        for meta in &docs.stakes.stake_metas {
            *delegated.entry(&meta.validator).or_default() += meta.active_delegation_lamports;
        }

        let pairs = docs.scenario.validators.iter().zip(&docs.validators.validator_metas);
        for (validator, meta) in pairs {
            prop_assert_eq!(&meta.vote_account, &validator.vote_account);
            prop_assert_eq!(meta.stake, validator.total_stake());
            prop_assert_eq!(delegated[&validator.vote_account], validator.total_stake());
        }

        for score in &docs.sam_scores {
            let validator = docs
                .scenario
                .validators
                .iter()
                .find(|v| v.vote_account == score.vote_account)
                .unwrap();
            let target_sol = validator.total_stake() / LAMPORTS_PER_SOL;
            prop_assert_eq!(score.marinade_sam_target_sol, target_sol);
        }

        for expectation in &docs.evaluation.revenue_expectations {
            if let Some(max_sam_stake) = expectation.max_sam_stake {
                prop_assert!(max_sam_stake >= 10_000);
            }
        }
    }

    #[test]
    fn priority_fees_never_reach_block_rewards(epoch in 0..MAX_EPOCH) {
        let docs = generate(epoch);
        let mut fees = docs.scenario.validators.iter().map(|v| {
            v.stake_accounts
                .iter()
                .map(|s| {
                    docs.rewards
                        .jito_priority_fee
                        .iter()
                        .find(|fee| fee.stake_account == s.pubkey)
                        .map_or(0, |fee| fee.amount)
                })
                .sum::<u64>()
        });
        for block in &docs.rewards.validators_blocks {
            let validator_fees = fees.next().unwrap();
            prop_assert!(validator_fees < block.amount);
        }
    }

    #[test]
    fn downtime_exceeds_grace_and_stays_moderate(epoch in 0..MAX_EPOCH) {
        let docs = generate(epoch);
        let expected = FixtureConfig::default().expected_credits;
        let pairs = docs.scenario.validators.iter().zip(&docs.validators.validator_metas);
        for (validator, meta) in pairs {
            if validator.role() == Role::SamDowntime {
                prop_assert!(meta.credits * 100 < expected * 99);
                prop_assert!(meta.credits * 100 >= expected * 60);
            } else {
                prop_assert_eq!(meta.credits, expected);
            }
        }
    }

    #[test]
    fn role_parameters_are_exclusive(epoch in 0..MAX_EPOCH) {
        let docs = generate(epoch);
        let pairs = docs.scenario.validators.iter().zip(&docs.validators.validator_metas);
        for (validator, meta) in pairs {
            let scored = docs.sam_scores.iter().any(|s| s.vote_account == validator.vote_account);
            prop_assert_eq!(scored, validator.role().is_bidding());

            match &validator.behavior {
                Behavior::SamCommission { commission, .. } => {
                    prop_assert!(commission.inflation_commission_pct > 0);
                    prop_assert_eq!(meta.commission, commission.inflation_commission_pct);
                }
                _ => {
                    prop_assert_eq!(meta.commission, 0);
                    prop_assert_eq!(meta.mev_commission, 0);
                }
            }
        }
    }

    #[test]
    fn every_epoch_has_a_bidder(epoch in 0..MAX_EPOCH) {
        let docs = generate(epoch);
        prop_assert!(!docs.sam_scores.is_empty());
        prop_assert!(docs.scenario.validators[0].role().is_bidding());
    }

    #[test]
    fn institutional_documents_iff_institutional_validators(epoch in 0..MAX_EPOCH) {
        let docs = generate(epoch);
        let has_institutional = docs.scenario.institutional().next().is_some();
        prop_assert_eq!(docs.institutional.is_some(), has_institutional);

        let rendered = docs.render().unwrap();
        let expected_files = if has_institutional { 12 } else { 10 };
        prop_assert_eq!(rendered.len(), expected_files);
    }
}
