use itertools::Itertools;
use stf_consensus::{
    constants::GENESIS_EPOCH,
    validator::compute_effective_balance,
    validator_update::ValidatorUpdate,
};
use stf_metrics::{STATE_TRANSITION_TIME, start_timer_vec, stop_timer};
use tracing::{debug, info};

use crate::{
    error::StateTransitionError, processor::StateProcessor, state_db::StateDB,
    validators::validator_set_diff,
};

impl StateProcessor {
    /// Run end-of-epoch processing and return how the active set of the next epoch differs from
    /// the current one.
    pub fn process_epoch(
        &self,
        st: &mut StateDB,
    ) -> Result<Vec<ValidatorUpdate>, StateTransitionError> {
        let timer = start_timer_vec(&STATE_TRANSITION_TIME, &["process_epoch"]);
        let current_epoch = self.get_current_epoch(st);
        let current_active = self.active_validators(st, current_epoch);

        if self.chain_spec.invoke_inert_epoch_hooks {
            self.process_rewards_and_penalties(st)?;
        }
        self.process_registry_updates(st)?;
        self.process_effective_balance_updates(st)?;
        if self.chain_spec.invoke_inert_epoch_hooks {
            self.process_slashings_reset(st)?;
        }
        self.process_randao_mixes_reset(st)?;
        self.process_validator_set_cap(st)?;

        let next_active = self.active_validators(st, current_epoch + 1);
        let validator_updates = validator_set_diff(&current_active, &next_active);
        stop_timer(timer);

        debug!(
            epoch = current_epoch,
            active = next_active.len(),
            updates = validator_updates.len(),
            "Processed epoch"
        );
        Ok(validator_updates)
    }

    /// Rewards and penalties are always zero on this chain. The pass still walks the registry so
    /// networks that ran it keep the same state history.
    pub fn process_rewards_and_penalties(
        &self,
        st: &mut StateDB,
    ) -> Result<(), StateTransitionError> {
        if self.get_current_epoch(st) == GENESIS_EPOCH {
            return Ok(());
        }
        for index in 0..st.total_validators() {
            st.increase_balance(index, 0)?;
            st.decrease_balance(index, 0)?;
        }
        Ok(())
    }

    pub fn process_registry_updates(&self, st: &mut StateDB) -> Result<(), StateTransitionError> {
        let current_epoch = self.get_current_epoch(st);
        let activation_epoch = self.compute_activation_exit_epoch(current_epoch);
        let min_activation_balance = self.chain_spec.min_activation_balance();

        for index in 0..st.total_validators() {
            let mut validator = st.validator_by_index(index)?.clone();
            let mut changed = false;

            if validator.is_eligible_for_activation_queue(min_activation_balance) {
                validator.activation_eligibility_epoch = activation_epoch;
                changed = true;
            }
            if validator.is_eligible_for_activation(current_epoch) {
                validator.activation_epoch = activation_epoch;
                changed = true;
            }

            if changed {
                st.update_validator_at_index(index, validator)?;
            }
        }
        Ok(())
    }

    /// Move effective balances toward actual balances once they drift outside the hysteresis
    /// band.
    pub fn process_effective_balance_updates(
        &self,
        st: &mut StateDB,
    ) -> Result<(), StateTransitionError> {
        let spec = &self.chain_spec;
        let hysteresis_increment = spec.effective_balance_increment / spec.hysteresis_quotient;
        let downward_threshold = hysteresis_increment * spec.hysteresis_downward_multiplier;
        let upward_threshold = hysteresis_increment * spec.hysteresis_upward_multiplier;

        for index in 0..st.total_validators() {
            let balance = st.balance(index)?;
            let mut validator = st.validator_by_index(index)?.clone();
            if balance + downward_threshold < validator.effective_balance
                || validator.effective_balance + upward_threshold < balance
            {
                validator.effective_balance = compute_effective_balance(
                    balance,
                    spec.effective_balance_increment,
                    spec.max_effective_balance,
                );
                st.update_validator_at_index(index, validator)?;
            }
        }
        Ok(())
    }

    pub fn process_slashings_reset(&self, st: &mut StateDB) -> Result<(), StateTransitionError> {
        let next_epoch = self.get_current_epoch(st) + 1;
        st.update_slashing_at_index(next_epoch % self.chain_spec.epochs_per_slashings_vector, 0)
    }

    pub fn process_randao_mixes_reset(&self, st: &mut StateDB) -> Result<(), StateTransitionError> {
        let length = self.chain_spec.epochs_per_historical_vector;
        let current_epoch = self.get_current_epoch(st);
        let mix = st.randao_mix_at_index(current_epoch % length)?;
        st.update_randao_mix_at_index((current_epoch + 1) % length, mix)
    }

    /// Keep at most ``validator_set_cap`` validators active in the next epoch. The smallest
    /// effective balances leave first, ties broken by pubkey.
    pub fn process_validator_set_cap(&self, st: &mut StateDB) -> Result<(), StateTransitionError> {
        let next_epoch = self.get_current_epoch(st) + 1;
        let cap = self.chain_spec.validator_set_cap as usize;
        let next_active = st
            .validators()
            .iter()
            .enumerate()
            .filter(|(_, validator)| validator.is_active_validator(next_epoch))
            .collect::<Vec<_>>();
        if next_active.len() <= cap {
            return Ok(());
        }

        let evicted = next_active.len() - cap;
        let evictions = next_active
            .into_iter()
            .sorted_by(|(_, a), (_, b)| {
                a.effective_balance
                    .cmp(&b.effective_balance)
                    .then_with(|| a.pubkey.cmp(&b.pubkey))
            })
            .take(evicted)
            .map(|(index, _)| index as u64)
            .collect::<Vec<_>>();

        for index in evictions {
            let mut validator = st.validator_by_index(index)?.clone();
            validator.exit_epoch = next_epoch;
            validator.withdrawable_epoch = next_epoch + 1;
            info!(
                validator_index = index,
                effective_balance = validator.effective_balance,
                "Evicting validator above the validator set cap"
            );
            st.update_validator_at_index(index, validator)?;
        }
        Ok(())
    }
}
