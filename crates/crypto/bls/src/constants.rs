/// Domain separation tag of the Ethereum proof-of-possession ciphersuite.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

pub const PUBKEY_BYTES_LEN: usize = 48;

pub const SIGNATURE_BYTES_LEN: usize = 96;
