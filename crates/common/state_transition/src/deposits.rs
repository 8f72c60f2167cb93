use alloy_primitives::B256;
use stf_bls::traits::Verifiable;
use stf_consensus::{
    beacon_block::BeaconBlockBody,
    deposit::Deposit,
    misc::{compute_domain, compute_signing_root},
    validator::Validator,
};
use stf_metrics::{DEPOSIT_SIGNATURE_FAILURES, inc_int_counter_vec};
use tracing::{info, warn};

use crate::{error::StateTransitionError, processor::StateProcessor, state_db::StateDB};

impl StateProcessor {
    pub fn process_operations(
        &self,
        st: &mut StateDB,
        body: &BeaconBlockBody,
    ) -> Result<(), StateTransitionError> {
        // Block deposits are compared with the local deposit store rather than derived from
        // the eth1 data deposit count.
        let max_deposits = self.chain_spec.max_deposits_per_block;
        if body.deposits.len() as u64 > max_deposits {
            return Err(StateTransitionError::ExceedsBlockDepositLimit {
                max: max_deposits,
                actual: body.deposits.len() as u64,
            });
        }
        self.validate_non_genesis_deposits(st, body)?;
        st.set_eth1_data(body.eth1_data.clone());
        for deposit in body.deposits.iter() {
            self.process_deposit(st, deposit)?;
        }

        let requests = &body.execution_requests;
        let fork_version = st.fork().current_version;
        if self.chain_spec.is_post_electra(fork_version) {
            self.process_withdrawal_requests(st, &requests.withdrawals)?;
        } else if !requests.is_empty() {
            return Err(StateTransitionError::ExecutionRequestsBeforeElectra(fork_version));
        }

        Ok(())
    }

    /// Check the block's deposits against the local deposit store.
    fn validate_non_genesis_deposits(
        &self,
        st: &StateDB,
        body: &BeaconBlockBody,
    ) -> Result<(), StateTransitionError> {
        let deposit_index = st.eth1_deposit_index();
        let (local_deposits, local_root) = self
            .deposit_store
            .get_deposits_by_index(deposit_index, self.chain_spec.max_deposits_per_block)?;

        for (offset, deposit) in body.deposits.iter().enumerate() {
            let expected = deposit_index + offset as u64;
            if deposit.index != expected {
                return Err(StateTransitionError::DepositIndexOutOfOrder {
                    expected,
                    actual: deposit.index,
                });
            }
        }

        if local_deposits.len() != body.deposits.len() {
            return Err(StateTransitionError::DepositsLengthMismatch {
                expected: deposit_index + body.deposits.len() as u64,
                local: deposit_index + local_deposits.len() as u64,
            });
        }

        for (local, deposit) in local_deposits.iter().zip(body.deposits.iter()) {
            if local != deposit {
                return Err(StateTransitionError::DepositMismatch(deposit.index));
            }
        }

        if local_root != body.eth1_data.deposit_root {
            return Err(StateTransitionError::DepositRootMismatch {
                local: local_root,
                block: body.eth1_data.deposit_root,
            });
        }

        Ok(())
    }

    pub fn process_deposit(
        &self,
        st: &mut StateDB,
        deposit: &Deposit,
    ) -> Result<(), StateTransitionError> {
        st.set_eth1_deposit_index(deposit.index + 1);
        self.apply_deposit(st, deposit)
    }

    pub fn apply_deposit(
        &self,
        st: &mut StateDB,
        deposit: &Deposit,
    ) -> Result<(), StateTransitionError> {
        // Increase balance by deposit amount
        if let Some(index) = st.validator_index_by_pubkey(&deposit.pubkey) {
            st.increase_balance(index, deposit.amount)?;
            info!(
                validator_index = index,
                amount = deposit.amount,
                "Processed deposit to increase balance"
            );
            return Ok(());
        }

        // Verify the deposit signature (proof of possession) which is not checked by the
        // deposit contract
        if !self.is_valid_deposit_signature(st, deposit) {
            warn!(
                deposit_index = deposit.index,
                pubkey = ?deposit.pubkey,
                "Dropping deposit with invalid signature"
            );
            inc_int_counter_vec(&DEPOSIT_SIGNATURE_FAILURES, 1, &[]);
            return Ok(());
        }

        self.add_validator_to_registry(st, deposit)
    }

    /// Signing root of ``deposit``'s message. Deposits processed at genesis sign over an empty
    /// genesis validators root.
    pub fn deposit_signing_root(&self, st: &StateDB, deposit: &Deposit) -> B256 {
        let genesis_validators_root = if st.slot() == 0 {
            B256::ZERO
        } else {
            st.genesis_validators_root()
        };
        let domain = compute_domain(
            self.chain_spec.domain_type_deposit,
            self.chain_spec
                .active_fork_version_for_epoch(self.get_current_epoch(st)),
            genesis_validators_root,
        );
        compute_signing_root(deposit.message(), domain)
    }

    fn is_valid_deposit_signature(&self, st: &StateDB, deposit: &Deposit) -> bool {
        let signing_root = self.deposit_signing_root(st, deposit);
        matches!(
            deposit
                .signature
                .verify(&deposit.pubkey, signing_root.as_slice()),
            Ok(true)
        )
    }

    pub(crate) fn add_validator_to_registry(
        &self,
        st: &mut StateDB,
        deposit: &Deposit,
    ) -> Result<(), StateTransitionError> {
        let validator = Validator::from_deposit(
            deposit.pubkey.clone(),
            deposit.withdrawal_credentials,
            deposit.amount,
            self.chain_spec.effective_balance_increment,
            self.chain_spec.max_effective_balance,
        );
        let index = st.add_validator(validator, deposit.amount)?;
        info!(
            validator_index = index,
            amount = deposit.amount,
            "Processed deposit to create new validator"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stf_bls::{PrivateKey, traits::Signable};
    use stf_chain_spec::networks::DEVNET;
    use stf_consensus::{constants::DENEB_FORK_VERSION, fork::Fork, withdrawal_request::WithdrawalRequest};
    use stf_storage::deposit_store::{DepositStore, InMemoryDepositStore};
    use tracing_test::traced_test;

    use super::*;
    use crate::test_utils::{eth1_credentials, processor_with_deposits};

    const AMOUNT: u64 = 250_000_000_000_000;

    fn signed_deposit(processor: &StateProcessor, st: &StateDB, seed: u8, index: u64) -> Deposit {
        let signer = PrivateKey::from_ikm(&[seed; 32]).unwrap();
        let mut deposit = Deposit {
            pubkey: signer.public_key().unwrap(),
            withdrawal_credentials: eth1_credentials(seed),
            amount: AMOUNT,
            signature: Default::default(),
            index,
        };
        let signing_root = processor.deposit_signing_root(st, &deposit);
        deposit.signature = signer.sign(signing_root.as_slice()).unwrap();
        deposit
    }

    fn setup() -> (StateProcessor, Arc<InMemoryDepositStore>, StateDB) {
        let store = Arc::new(InMemoryDepositStore::new());
        let processor = processor_with_deposits((**DEVNET).clone(), store.clone());
        let mut st = StateDB::default();
        st.set_slot(1);
        (processor, store, st)
    }

    fn body_with(deposits: &[Deposit], store: &InMemoryDepositStore, start: u64) -> BeaconBlockBody {
        let mut body = BeaconBlockBody::default();
        for deposit in deposits {
            body.deposits.push(deposit.clone()).unwrap();
        }
        let (_, root) = store.get_deposits_by_index(start, 16).unwrap();
        body.eth1_data.deposit_root = root;
        body
    }

    #[test]
    fn test_deposits_create_and_top_up_validators() {
        let (processor, store, mut st) = setup();
        let first = signed_deposit(&processor, &st, 1, 0);
        let mut top_up = first.clone();
        top_up.index = 1;
        store.enqueue_deposits(&[first.clone(), top_up.clone()]).unwrap();

        let body = body_with(&[first, top_up], &store, 0);
        processor.process_operations(&mut st, &body).unwrap();

        assert_eq!(st.total_validators(), 1);
        assert_eq!(st.balance(0).unwrap(), 2 * AMOUNT);
        assert_eq!(st.eth1_deposit_index(), 2);
        assert_eq!(st.eth1_data(), &body.eth1_data);
    }

    #[traced_test]
    #[test]
    fn test_bad_signature_drops_only_that_deposit() {
        let (processor, store, mut st) = setup();
        let good = signed_deposit(&processor, &st, 1, 0);
        let mut bad = signed_deposit(&processor, &st, 2, 1);
        bad.amount += 1;
        store.enqueue_deposits(&[good.clone(), bad.clone()]).unwrap();

        let body = body_with(&[good, bad], &store, 0);
        processor.process_operations(&mut st, &body).unwrap();

        assert_eq!(st.total_validators(), 1);
        assert_eq!(st.eth1_deposit_index(), 2);
        assert!(logs_contain("Dropping deposit with invalid signature"));
    }

    #[test]
    fn test_out_of_order_deposit_is_rejected() {
        let (processor, store, mut st) = setup();
        let deposits: Vec<Deposit> = (0..5)
            .map(|index| signed_deposit(&processor, &st, index as u8 + 1, index))
            .collect();
        store.enqueue_deposits(&deposits).unwrap();
        st.set_eth1_deposit_index(3);

        let body = body_with(&deposits[4..], &store, 3);
        assert!(matches!(
            processor.process_operations(&mut st, &body),
            Err(StateTransitionError::DepositIndexOutOfOrder { expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn test_missing_and_tampered_deposits_are_rejected() {
        let (processor, store, mut st) = setup();
        let deposits: Vec<Deposit> = (0..2)
            .map(|index| signed_deposit(&processor, &st, index as u8 + 1, index))
            .collect();
        store.enqueue_deposits(&deposits).unwrap();

        // The block must include every pending deposit
        let body = body_with(&deposits[..1], &store, 0);
        assert!(matches!(
            processor.process_operations(&mut st, &body),
            Err(StateTransitionError::DepositsLengthMismatch { expected: 1, local: 2 })
        ));

        let mut tampered = deposits.clone();
        tampered[1].amount += 1;
        let body = body_with(&tampered, &store, 0);
        assert!(matches!(
            processor.process_operations(&mut st, &body),
            Err(StateTransitionError::DepositMismatch(1))
        ));

        let mut body = body_with(&deposits, &store, 0);
        body.eth1_data.deposit_root = B256::repeat_byte(1);
        assert!(matches!(
            processor.process_operations(&mut st, &body),
            Err(StateTransitionError::DepositRootMismatch { .. })
        ));
    }

    #[test]
    fn test_execution_requests_before_electra_are_rejected() {
        let (processor, store, mut st) = setup();
        st.set_fork(Fork {
            previous_version: DENEB_FORK_VERSION,
            current_version: DENEB_FORK_VERSION,
            epoch: 0,
        });

        let mut body = body_with(&[], &store, 0);
        body.execution_requests
            .withdrawals
            .push(WithdrawalRequest {
                source_address: Default::default(),
                validator_pubkey: Default::default(),
                amount: 0,
            })
            .unwrap();
        assert!(matches!(
            processor.process_operations(&mut st, &body),
            Err(StateTransitionError::ExecutionRequestsBeforeElectra(version)) if version == DENEB_FORK_VERSION
        ));
    }
}
