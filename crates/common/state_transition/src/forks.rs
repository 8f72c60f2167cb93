use std::sync::atomic::Ordering;

use alloy_primitives::aliases::B32;
use anyhow::anyhow;
use stf_chain_spec::spec::{fork_name, fork_order};
use stf_consensus::fork::Fork;
use tracing::info;

use crate::{error::StateTransitionError, processor::StateProcessor, state_db::StateDB};

/// State changes run when the chain enters a fork version.
type Migration = fn(&StateProcessor, &mut StateDB, u64, bool) -> Result<(), StateTransitionError>;

impl StateProcessor {
    fn migrations(&self) -> [(B32, Migration); 3] {
        [
            (self.chain_spec.genesis_fork_version, Self::enter_genesis_fork),
            (self.chain_spec.deneb1_fork_version, Self::enter_deneb1),
            (self.chain_spec.electra_fork_version, Self::upgrade_to_electra),
        ]
    }

    /// Prepare ``st`` for the fork version active at ``timestamp``.
    ///
    /// Past genesis this is a no-op while the version stays the same. Moving to an earlier
    /// version is an error. ``ProcessSlots`` must already have advanced the state to the slot
    /// of the block carrying ``timestamp``.
    pub fn process_fork(
        &self,
        st: &mut StateDB,
        timestamp: u64,
        log_upgrade: bool,
    ) -> Result<(), StateTransitionError> {
        let current_version = st.fork().current_version;
        let target_version = self.chain_spec.active_fork_version_for_timestamp(timestamp);

        if fork_order(target_version) < fork_order(current_version) {
            return Err(StateTransitionError::ForkDowngrade {
                current: current_version,
                target: target_version,
            });
        }
        if st.slot() > 0 && target_version == current_version {
            return Ok(());
        }

        let Some((_, migration)) = self
            .migrations()
            .into_iter()
            .find(|(version, _)| *version == target_version)
        else {
            return Err(anyhow!("unsupported fork version {target_version}").into());
        };
        migration(self, st, timestamp, log_upgrade)
    }

    fn enter_genesis_fork(
        &self,
        st: &mut StateDB,
        timestamp: u64,
        log_upgrade: bool,
    ) -> Result<(), StateTransitionError> {
        if log_upgrade {
            let version = st.fork().current_version;
            info!(
                fork = fork_name(version),
                version = %version,
                genesis_time = timestamp,
                "Starting chain at genesis fork"
            );
        }
        Ok(())
    }

    /// Deneb1 leaves the state untouched, including the fork struct. Every Deneb1 block therefore
    /// looks like a fork transition, so the upgrade is only logged once.
    fn enter_deneb1(
        &self,
        st: &mut StateDB,
        timestamp: u64,
        log_upgrade: bool,
    ) -> Result<(), StateTransitionError> {
        if log_upgrade && !self.deneb1_logged.swap(true, Ordering::Relaxed) {
            let previous_version = st.fork().previous_version;
            info!(
                previous_fork = fork_name(previous_version),
                fork_time = self.chain_spec.deneb1_fork_time,
                slot = st.slot(),
                timestamp,
                epoch = self.get_current_epoch(st),
                "Entered the deneb1 fork"
            );
        }
        Ok(())
    }

    fn upgrade_to_electra(
        &self,
        st: &mut StateDB,
        timestamp: u64,
        log_upgrade: bool,
    ) -> Result<(), StateTransitionError> {
        let fork = st.fork();
        st.set_fork(Fork {
            previous_version: fork.current_version,
            current_version: self.chain_spec.electra_fork_version,
            epoch: self.get_current_epoch(st),
        });
        st.set_pending_partial_withdrawals(vec![])?;

        if log_upgrade {
            info!(
                previous_fork = fork_name(fork.previous_version),
                fork_time = self.chain_spec.electra_fork_time,
                slot = st.slot(),
                timestamp,
                epoch = self.get_current_epoch(st),
                "Entered the electra fork"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stf_chain_spec::{ChainSpec, networks::DEVNET};
    use stf_consensus::constants::{DENEB_FORK_VERSION, DENEB1_FORK_VERSION, ELECTRA_FORK_VERSION};

    use super::*;
    use crate::test_utils::processor_with;

    fn staged_spec() -> ChainSpec {
        ChainSpec {
            genesis_fork_version: DENEB_FORK_VERSION,
            deneb1_fork_time: 100,
            electra_fork_time: 200,
            ..(**DEVNET).clone()
        }
    }

    fn deneb_state(slot: u64) -> StateDB {
        let mut st = StateDB::default();
        st.set_slot(slot);
        st.set_fork(Fork {
            previous_version: DENEB_FORK_VERSION,
            current_version: DENEB_FORK_VERSION,
            epoch: 0,
        });
        st
    }

    #[test]
    fn test_deneb1_keeps_fork_struct() {
        let processor = processor_with(staged_spec());
        let mut st = deneb_state(5);

        processor.process_fork(&mut st, 150, true).unwrap();
        processor.process_fork(&mut st, 151, true).unwrap();
        assert_eq!(st.fork().current_version, DENEB_FORK_VERSION);
        assert!(processor.deneb1_logged.load(Ordering::Relaxed));
    }

    #[test]
    fn test_electra_upgrade_sets_fork() {
        let processor = processor_with(staged_spec());
        let mut st = deneb_state(64);

        processor.process_fork(&mut st, 250, false).unwrap();
        assert_eq!(
            st.fork(),
            Fork {
                previous_version: DENEB_FORK_VERSION,
                current_version: ELECTRA_FORK_VERSION,
                epoch: 2,
            }
        );

        // Later electra blocks leave the fork alone
        st.set_slot(65);
        processor.process_fork(&mut st, 251, false).unwrap();
        assert_eq!(st.fork().epoch, 2);
    }

    #[test]
    fn test_downgrade_is_rejected() {
        let processor = processor_with(staged_spec());
        let mut st = deneb_state(64);
        processor.process_fork(&mut st, 250, false).unwrap();

        let err = processor.process_fork(&mut st, 150, false).unwrap_err();
        assert!(matches!(
            err,
            StateTransitionError::ForkDowngrade { current, target }
                if current == ELECTRA_FORK_VERSION && target == DENEB1_FORK_VERSION
        ));
    }
}
