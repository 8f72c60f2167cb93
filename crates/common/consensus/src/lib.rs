pub mod beacon_block;
pub mod beacon_block_header;
pub mod beacon_state;
pub mod consolidation_request;
pub mod constants;
pub mod deposit;
pub mod deposit_message;
pub mod deposit_request;
pub mod eth_1_data;
pub mod execution_payload;
pub mod execution_payload_header;
pub mod execution_requests;
pub mod fork;
pub mod fork_data;
pub mod kzg_commitment;
pub mod misc;
pub mod pending_partial_withdrawal;
pub mod signing_data;
pub mod validator;
pub mod validator_update;
pub mod withdrawal;
pub mod withdrawal_request;
