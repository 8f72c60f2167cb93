pub mod block_header;
pub mod context;
pub mod corrections;
pub mod deposits;
pub mod epoch;
pub mod error;
pub mod forks;
pub mod genesis;
pub mod payload;
pub mod processor;
pub mod randao;
pub mod slot;
pub mod state_db;
pub mod validators;
pub mod withdrawals;

#[cfg(test)]
pub(crate) mod test_utils;

pub use context::TransitionContext;
pub use error::{ErrorKind, StateTransitionError};
pub use processor::{ProposerAddressFn, StateProcessor, cometbft_address};
pub use state_db::StateDB;
pub use validators::validator_set_diff;
