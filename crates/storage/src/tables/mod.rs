pub mod beacon_state;
pub mod deposit;
pub mod field;
pub mod head_slot;
pub mod ssz_encoder;
pub mod table;

pub use field::Field;
pub use ssz_encoder::SSZEncoding;
pub use table::Table;
