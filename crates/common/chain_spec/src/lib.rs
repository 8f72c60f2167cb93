pub mod b32_hex;
pub mod cli;
pub mod corrections;
pub mod networks;
pub mod spec;

pub use spec::ChainSpec;
