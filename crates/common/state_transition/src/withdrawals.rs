use anyhow::anyhow;
use stf_consensus::{
    constants::{
        EVM_INFLATION_WITHDRAWAL_INDEX, EVM_INFLATION_WITHDRAWAL_VALIDATOR_INDEX, FAR_FUTURE_EPOCH,
    },
    execution_payload::ExecutionPayload,
    pending_partial_withdrawal::PendingPartialWithdrawal,
    validator::Validator,
    withdrawal::Withdrawal,
    withdrawal_request::WithdrawalRequest,
};
use tracing::{info, warn};

use crate::{error::StateTransitionError, processor::StateProcessor, state_db::StateDB};

fn withdrawal_address(
    validator: &Validator,
    index: u64,
) -> Result<alloy_primitives::Address, StateTransitionError> {
    validator
        .withdrawal_address()
        .ok_or_else(|| anyhow!("validator {index} has no execution withdrawal credential").into())
}

impl StateProcessor {
    /// The fixed withdrawal that funds the EVM inflation address in every payload.
    pub fn evm_inflation_withdrawal(&self) -> Withdrawal {
        Withdrawal {
            index: EVM_INFLATION_WITHDRAWAL_INDEX,
            validator_index: EVM_INFLATION_WITHDRAWAL_VALIDATOR_INDEX,
            address: self.chain_spec.evm_inflation_address,
            amount: self.chain_spec.evm_inflation_per_block,
        }
    }

    /// Return the withdrawals the next payload must carry, and how many pending partial
    /// withdrawals they consume.
    ///
    /// The list always starts with the EVM inflation withdrawal, followed by matured pending
    /// partial withdrawals (Electra only) and then a bounded sweep of the registry.
    pub fn get_expected_withdrawals(
        &self,
        st: &StateDB,
    ) -> Result<(Vec<Withdrawal>, usize), StateTransitionError> {
        let spec = &self.chain_spec;
        let epoch = self.get_current_epoch(st);
        let max_withdrawals = spec.max_withdrawals_per_payload as usize;
        let min_activation_balance = spec.min_activation_balance();
        let mut withdrawal_index = st.next_withdrawal_index();
        let mut withdrawals = vec![self.evm_inflation_withdrawal()];

        // Consume pending partial withdrawals
        let mut processed_partial_withdrawals_count = 0;
        if spec.is_post_electra(st.fork().current_version) {
            for withdrawal in st.pending_partial_withdrawals() {
                if withdrawal.withdrawable_epoch > epoch
                    || processed_partial_withdrawals_count
                        == spec.max_pending_partials_per_withdrawals_sweep as usize
                    || withdrawals.len() == max_withdrawals
                {
                    break;
                }

                let validator = st.validator_by_index(withdrawal.validator_index)?;
                let balance = st.balance(withdrawal.validator_index)?;
                if validator.exit_epoch == FAR_FUTURE_EPOCH
                    && validator.effective_balance >= min_activation_balance
                    && balance > min_activation_balance
                {
                    withdrawals.push(Withdrawal {
                        index: withdrawal_index,
                        validator_index: withdrawal.validator_index,
                        address: withdrawal_address(validator, withdrawal.validator_index)?,
                        amount: (balance - min_activation_balance).min(withdrawal.amount),
                    });
                    withdrawal_index += 1;
                }
                processed_partial_withdrawals_count += 1;
            }
        }

        // Sweep for remaining
        let total_validators = st.total_validators();
        let bound = total_validators.min(spec.max_validators_per_withdrawals_sweep);
        let mut validator_index = st.next_withdrawal_validator_index();
        for _ in 0..bound {
            if withdrawals.len() == max_withdrawals {
                break;
            }

            let validator = st.validator_by_index(validator_index)?;
            let already_withdrawn: u64 = withdrawals[1..]
                .iter()
                .filter(|withdrawal| withdrawal.validator_index == validator_index)
                .map(|withdrawal| withdrawal.amount)
                .sum();
            let balance = st.balance(validator_index)?.saturating_sub(already_withdrawn);

            if validator.is_fully_withdrawable_validator(balance, epoch) {
                withdrawals.push(Withdrawal {
                    index: withdrawal_index,
                    validator_index,
                    address: withdrawal_address(validator, validator_index)?,
                    amount: balance,
                });
                withdrawal_index += 1;
            } else if validator
                .is_partially_withdrawable_validator(balance, spec.max_effective_balance)
            {
                withdrawals.push(Withdrawal {
                    index: withdrawal_index,
                    validator_index,
                    address: withdrawal_address(validator, validator_index)?,
                    amount: balance - spec.max_effective_balance,
                });
                withdrawal_index += 1;
            }

            validator_index = (validator_index + 1) % total_validators;
        }

        Ok((withdrawals, processed_partial_withdrawals_count))
    }

    pub fn process_withdrawals(
        &self,
        st: &mut StateDB,
        payload: &ExecutionPayload,
    ) -> Result<(), StateTransitionError> {
        let (expected_withdrawals, processed_partial_withdrawals_count) =
            self.get_expected_withdrawals(st)?;
        let payload_withdrawals = &payload.withdrawals;

        if expected_withdrawals.len() != payload_withdrawals.len() {
            return Err(StateTransitionError::NumWithdrawalsMismatch {
                expected: expected_withdrawals.len(),
                actual: payload_withdrawals.len(),
            });
        }

        // The first withdrawal is always the EVM inflation
        let Some(first_withdrawal) = payload_withdrawals.first() else {
            return Err(StateTransitionError::ZeroWithdrawals);
        };
        if *first_withdrawal != self.evm_inflation_withdrawal() {
            return Err(StateTransitionError::FirstWithdrawalNotEvmInflation);
        }

        for (position, (expected, actual)) in expected_withdrawals
            .iter()
            .zip(payload_withdrawals.iter())
            .enumerate()
            .skip(1)
        {
            if expected != actual {
                return Err(StateTransitionError::WithdrawalMismatch { position });
            }
            st.decrease_balance(expected.validator_index, expected.amount)?;
        }

        // Update pending partial withdrawals
        if processed_partial_withdrawals_count > 0 {
            let remaining = st.pending_partial_withdrawals()[processed_partial_withdrawals_count..]
                .to_vec();
            st.set_pending_partial_withdrawals(remaining)?;
        }

        // Update the next withdrawal index if this block contained withdrawals
        let num_withdrawals = expected_withdrawals.len();
        if num_withdrawals > 1 {
            st.set_next_withdrawal_index(expected_withdrawals[num_withdrawals - 1].index + 1);
        }

        // Update the next validator index to start the next withdrawal sweep
        let total_validators = st.total_validators();
        if total_validators > 0 {
            let next_validator_index =
                if num_withdrawals == self.chain_spec.max_withdrawals_per_payload as usize {
                    // Next sweep starts after the latest withdrawal's validator index
                    expected_withdrawals[num_withdrawals - 1].validator_index + 1
                } else {
                    // Advance sweep by the max length of the sweep if there was not a full set
                    // of withdrawals
                    st.next_withdrawal_validator_index()
                        + self.chain_spec.max_validators_per_withdrawals_sweep
                };
            st.set_next_withdrawal_validator_index(next_validator_index % total_validators);
        }

        info!(
            num_withdrawals,
            evm_inflation = first_withdrawal.amount,
            "Processed withdrawals"
        );
        Ok(())
    }

    pub fn process_withdrawal_requests(
        &self,
        st: &mut StateDB,
        requests: &[WithdrawalRequest],
    ) -> Result<(), StateTransitionError> {
        for request in requests {
            self.process_withdrawal_request(st, request)?;
        }
        Ok(())
    }

    /// Apply one execution-layer withdrawal request. Requests that cannot be honoured are
    /// dropped with a warning; only state faults are errors.
    pub fn process_withdrawal_request(
        &self,
        st: &mut StateDB,
        request: &WithdrawalRequest,
    ) -> Result<(), StateTransitionError> {
        let spec = &self.chain_spec;
        let is_full_exit_request = request.is_full_exit_request();

        // If partial withdrawal queue is full, only full exits are processed
        if st.pending_partial_withdrawals().len() as u64 >= spec.pending_partial_withdrawals_limit
            && !is_full_exit_request
        {
            warn!(pubkey = ?request.validator_pubkey, "Pending partial withdrawal queue is full");
            return Ok(());
        }

        let Some(index) = st.validator_index_by_pubkey(&request.validator_pubkey) else {
            warn!(pubkey = ?request.validator_pubkey, "Withdrawal request for unknown validator");
            return Ok(());
        };
        let validator = st.validator_by_index(index)?.clone();

        // Verify withdrawal credentials
        if validator.withdrawal_address() != Some(request.source_address) {
            warn!(
                validator_index = index,
                source_address = %request.source_address,
                "Withdrawal request source does not match withdrawal credentials"
            );
            return Ok(());
        }

        let current_epoch = self.get_current_epoch(st);
        // Verify the validator is active and has not initiated an exit. The shard committee
        // period is not enforced.
        if !validator.is_active_validator(current_epoch)
            || validator.exit_epoch != FAR_FUTURE_EPOCH
            || current_epoch < validator.activation_epoch
        {
            warn!(
                validator_index = index,
                exit_epoch = validator.exit_epoch,
                "Withdrawal request for a validator that cannot withdraw"
            );
            return Ok(());
        }

        let pending_balance_to_withdraw = st.get_pending_balance_to_withdraw(index);

        if is_full_exit_request {
            // Only exit validator if it has no pending withdrawals in the queue
            if pending_balance_to_withdraw == 0 {
                self.initiate_validator_exit(st, index)?;
            } else {
                info!(
                    validator_index = index,
                    pending_balance = pending_balance_to_withdraw,
                    "Validator has pending balance and cannot full exit"
                );
            }
            return Ok(());
        }

        let min_activation_balance = spec.min_activation_balance();
        let balance = st.balance(index)?;
        let has_sufficient_effective_balance =
            validator.effective_balance >= min_activation_balance;
        let has_excess_balance = balance > min_activation_balance + pending_balance_to_withdraw;

        // Only allow partial withdrawals with compounding withdrawal credentials
        if !(validator.has_compounding_withdrawal_credential()
            && has_sufficient_effective_balance
            && has_excess_balance)
        {
            warn!(validator_index = index, "Partial withdrawal request cannot be satisfied");
            return Ok(());
        }

        let to_withdraw =
            (balance - min_activation_balance - pending_balance_to_withdraw).min(request.amount);
        let mut pending_partial_withdrawals = st.pending_partial_withdrawals().to_vec();
        pending_partial_withdrawals.push(PendingPartialWithdrawal {
            validator_index: index,
            amount: to_withdraw,
            withdrawable_epoch: current_epoch + 1 + spec.min_validator_withdrawability_delay,
        });
        st.set_pending_partial_withdrawals(pending_partial_withdrawals)
    }
}
