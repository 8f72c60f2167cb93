use std::collections::BTreeMap;

use stf_bls::PubKey;
use stf_consensus::{
    constants::FAR_FUTURE_EPOCH, validator::Validator, validator_update::ValidatorUpdate,
};

use crate::{error::StateTransitionError, processor::StateProcessor, state_db::StateDB};

/// Changes between two active validator sets. Added or rebalanced validators come first, then
/// removals, each ordered by pubkey.
pub fn validator_set_diff(previous: &[Validator], next: &[Validator]) -> Vec<ValidatorUpdate> {
    let previous: BTreeMap<&PubKey, u64> = previous
        .iter()
        .map(|validator| (&validator.pubkey, validator.effective_balance))
        .collect();
    let next: BTreeMap<&PubKey, u64> = next
        .iter()
        .map(|validator| (&validator.pubkey, validator.effective_balance))
        .collect();

    let mut updates = vec![];
    for (pubkey, balance) in &next {
        if previous.get(pubkey) != Some(balance) {
            updates.push(ValidatorUpdate {
                pubkey: (*pubkey).clone(),
                effective_balance: *balance,
            });
        }
    }
    for pubkey in previous.keys() {
        if !next.contains_key(pubkey) {
            updates.push(ValidatorUpdate::removal((*pubkey).clone()));
        }
    }
    updates
}

impl StateProcessor {
    pub fn get_current_epoch(&self, st: &StateDB) -> u64 {
        self.chain_spec.slot_to_epoch(st.slot())
    }

    /// Return the epoch during which validator activations and exits initiated in ``epoch``
    /// take effect.
    pub fn compute_activation_exit_epoch(&self, epoch: u64) -> u64 {
        epoch + 1
    }

    /// Validators active at ``epoch``, in registry order.
    pub fn active_validators(&self, st: &StateDB, epoch: u64) -> Vec<Validator> {
        st.validators()
            .iter()
            .filter(|validator| validator.is_active_validator(epoch))
            .cloned()
            .collect()
    }

    /// Return the combined effective balance of the active validators, floored at
    /// ``effective_balance_increment`` to avoid divisions by zero.
    pub fn get_total_active_balance(&self, st: &StateDB) -> u64 {
        let epoch = self.get_current_epoch(st);
        let total: u64 = st
            .validators()
            .iter()
            .filter(|validator| validator.is_active_validator(epoch))
            .map(|validator| validator.effective_balance)
            .sum();
        total.max(self.chain_spec.effective_balance_increment)
    }

    pub fn get_balance_churn_limit(&self, st: &StateDB) -> u64 {
        let churn = self
            .chain_spec
            .min_per_epoch_churn_limit_electra
            .max(self.get_total_active_balance(st) / self.chain_spec.churn_limit_quotient);
        churn - churn % self.chain_spec.effective_balance_increment
    }

    pub fn get_activation_exit_churn_limit(&self, st: &StateDB) -> u64 {
        self.chain_spec
            .max_per_epoch_activation_exit_churn_limit
            .min(self.get_balance_churn_limit(st))
    }

    pub fn compute_exit_epoch_and_update_churn(&self, st: &mut StateDB, exit_balance: u64) -> u64 {
        let mut earliest_exit_epoch = st
            .earliest_exit_epoch()
            .max(self.compute_activation_exit_epoch(self.get_current_epoch(st)));
        let per_epoch_churn = self.get_activation_exit_churn_limit(st);

        // New epoch for exits.
        let mut exit_balance_to_consume = if st.earliest_exit_epoch() < earliest_exit_epoch {
            per_epoch_churn
        } else {
            st.exit_balance_to_consume()
        };

        // Exit doesn't fit in the current earliest epoch.
        if exit_balance > exit_balance_to_consume {
            let balance_to_process = exit_balance - exit_balance_to_consume;
            let additional_epochs = (balance_to_process - 1) / per_epoch_churn + 1;
            earliest_exit_epoch += additional_epochs;
            exit_balance_to_consume += additional_epochs * per_epoch_churn;
        }

        // Consume the balance and update state variables.
        st.set_exit_balance_to_consume(exit_balance_to_consume - exit_balance);
        st.set_earliest_exit_epoch(earliest_exit_epoch);

        earliest_exit_epoch
    }

    /// Initiate the exit of the validator with index ``index``.
    pub fn initiate_validator_exit(
        &self,
        st: &mut StateDB,
        index: u64,
    ) -> Result<(), StateTransitionError> {
        let mut validator = st.validator_by_index(index)?.clone();

        // Return if validator already initiated exit
        if validator.exit_epoch != FAR_FUTURE_EPOCH {
            return Ok(());
        }

        // Compute exit queue epoch
        let exit_queue_epoch =
            self.compute_exit_epoch_and_update_churn(st, validator.effective_balance);

        // Set validator exit epoch and withdrawable epoch
        validator.exit_epoch = exit_queue_epoch;
        validator.withdrawable_epoch =
            exit_queue_epoch + self.chain_spec.min_validator_withdrawability_delay;
        st.update_validator_at_index(index, validator)
    }

    /// Schedule ``index`` to leave the active set at the start of the next epoch, bypassing the
    /// exit queue. No-op if the validator is already exiting.
    pub(crate) fn force_exit_next_epoch(
        &self,
        st: &mut StateDB,
        index: u64,
    ) -> Result<(), StateTransitionError> {
        let mut validator = st.validator_by_index(index)?.clone();
        if validator.exit_epoch != FAR_FUTURE_EPOCH {
            return Ok(());
        }
        let next_epoch = self.get_current_epoch(st) + 1;
        validator.exit_epoch = next_epoch;
        validator.withdrawable_epoch = next_epoch + 1;
        st.update_validator_at_index(index, validator)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;
    use crate::test_utils::{pubkey, test_processor, validator};

    #[test]
    fn test_diff_orders_updates_before_removals() {
        let previous = vec![validator(3, 10), validator(1, 10), validator(2, 10)];
        let next = vec![validator(4, 10), validator(2, 20), validator(1, 10)];

        let updates = validator_set_diff(&previous, &next);
        assert_eq!(
            updates,
            vec![
                ValidatorUpdate {
                    pubkey: pubkey(2),
                    effective_balance: 20
                },
                ValidatorUpdate {
                    pubkey: pubkey(4),
                    effective_balance: 10
                },
                ValidatorUpdate::removal(pubkey(3)),
            ]
        );
    }

    #[test]
    fn test_diff_of_identical_sets_is_empty() {
        let set = vec![validator(1, 10), validator(2, 10)];
        assert!(validator_set_diff(&set, &set).is_empty());
    }

    #[test]
    fn test_exit_churn_spills_into_later_epochs() {
        let processor = test_processor();
        let spec = processor.chain_spec().clone();
        let mut st = StateDB::default();
        for byte in 1..=3 {
            let mut v = validator(byte, spec.max_effective_balance);
            v.activation_epoch = 0;
            v.withdrawal_credentials = B256::ZERO;
            st.add_validator(v, spec.max_effective_balance).unwrap();
        }

        // Churn is the electra minimum, which is exactly one max balance per epoch.
        assert_eq!(processor.get_activation_exit_churn_limit(&st), spec.max_effective_balance);

        processor.initiate_validator_exit(&mut st, 0).unwrap();
        processor.initiate_validator_exit(&mut st, 1).unwrap();
        processor.initiate_validator_exit(&mut st, 1).unwrap();

        assert_eq!(st.validator_by_index(0).unwrap().exit_epoch, 1);
        assert_eq!(st.validator_by_index(1).unwrap().exit_epoch, 2);
        assert_eq!(
            st.validator_by_index(1).unwrap().withdrawable_epoch,
            2 + spec.min_validator_withdrawability_delay
        );
        assert_eq!(st.exit_balance_to_consume(), 0);
    }

    #[test]
    fn test_force_exit_is_idempotent() {
        let processor = test_processor();
        let mut st = StateDB::default();
        let mut v = validator(1, 10);
        v.activation_epoch = 0;
        st.add_validator(v, 10).unwrap();

        processor.force_exit_next_epoch(&mut st, 0).unwrap();
        processor.force_exit_next_epoch(&mut st, 0).unwrap();
        let v = st.validator_by_index(0).unwrap();
        assert_eq!((v.exit_epoch, v.withdrawable_epoch), (1, 2));
    }
}
