pub mod db;
pub mod deposit_store;
pub mod deposit_tree;
pub mod dir;
pub mod errors;
pub mod tables;
