use std::{fs, sync::Arc};

use crate::{
    networks::{BEPOLIA, DEVNET, MAINNET},
    spec::ChainSpec,
};

/// Resolve a named network or load a YAML chain spec from ``network_string``. Loaded specs are
/// validated before they are handed out.
pub fn chain_spec_parser(network_string: &str) -> Result<Arc<ChainSpec>, String> {
    match network_string {
        "mainnet" => Ok(MAINNET.clone()),
        "bepolia" => Ok(BEPOLIA.clone()),
        "devnet" => Ok(DEVNET.clone()),
        path => read_chain_spec(path),
    }
}

fn read_chain_spec(path: &str) -> Result<Arc<ChainSpec>, String> {
    let contents = fs::read_to_string(path).map_err(|err| format!("Failed to read file: {err}"))?;
    let chain_spec: ChainSpec = serde_yaml::from_str(&contents)
        .map_err(|err| format!("Failed to parse YAML from: {err}"))?;
    chain_spec
        .validate()
        .map_err(|err| format!("Invalid chain spec: {err}"))?;
    Ok(Arc::new(chain_spec))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempdir::TempDir;

    use super::*;
    use crate::spec::Network;

    const DEVNET_YAML: &str = r#"
CONFIG_NAME: local
DEPOSIT_ETH1_CHAIN_ID: 80087
GENESIS_TIME: 0
SECONDS_PER_SLOT: 2
SLOTS_PER_EPOCH: 4
MIN_EPOCHS_FOR_BLOBS_SIDECARS_REQUEST: 4096
GENESIS_FORK_VERSION: "0x04000000"
DENEB1_FORK_VERSION: "0x04010000"
ELECTRA_FORK_VERSION: "0x05000000"
DENEB1_FORK_TIME: 10
ELECTRA_FORK_TIME: 20
MAX_EFFECTIVE_BALANCE: 10000000000000000
EJECTION_BALANCE: 240000000000000
EFFECTIVE_BALANCE_INCREMENT: 10000000000000
HYSTERESIS_QUOTIENT: 4
HYSTERESIS_DOWNWARD_MULTIPLIER: 1
HYSTERESIS_UPWARD_MULTIPLIER: 5
SLOTS_PER_HISTORICAL_ROOT: 8
EPOCHS_PER_HISTORICAL_VECTOR: 8
EPOCHS_PER_SLASHINGS_VECTOR: 8
MAX_DEPOSITS_PER_BLOCK: 16
MAX_WITHDRAWALS_PER_PAYLOAD: 16
MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP: 31
MAX_PENDING_PARTIALS_PER_WITHDRAWALS_SWEEP: 8
PENDING_PARTIAL_WITHDRAWALS_LIMIT: 64
MIN_VALIDATOR_WITHDRAWABILITY_DELAY: 256
MAX_BLOBS_PER_BLOCK: 6
VALIDATOR_SET_CAP: 8
EVM_INFLATION_ADDRESS: "0x6942069420694206942069420694206942069420"
EVM_INFLATION_PER_BLOCK: 10000000000
MIN_PER_EPOCH_CHURN_LIMIT_ELECTRA: 10000000000000000
MAX_PER_EPOCH_ACTIVATION_EXIT_CHURN_LIMIT: 20000000000000000
CHURN_LIMIT_QUOTIENT: 65536
DOMAIN_TYPE_PROPOSER: "0x00000000"
DOMAIN_TYPE_RANDAO: "0x02000000"
DOMAIN_TYPE_DEPOSIT: "0x03000000"
INVOKE_INERT_EPOCH_HOOKS: false
CORRECTIONS:
  - deposit_eth1_chain_id: 80087
    trigger:
      at_slot: 5
    action:
      force_exit:
        pubkey: "0xa0aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
"#;

    #[test]
    fn test_named_networks() {
        assert_eq!(chain_spec_parser("mainnet").unwrap().network, Network::Mainnet);
        assert_eq!(chain_spec_parser("bepolia").unwrap().network, Network::Bepolia);
        assert_eq!(chain_spec_parser("devnet").unwrap().network, Network::Devnet);
    }

    #[test]
    fn test_load_from_yaml() {
        let dir = TempDir::new("chain_spec").unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(DEVNET_YAML.as_bytes()).unwrap();

        let chain_spec = chain_spec_parser(path.to_str().unwrap()).unwrap();
        assert_eq!(chain_spec.network, Network::Custom("local".to_string()));
        assert_eq!(chain_spec.slots_per_epoch, 4);
        assert_eq!(chain_spec.validator_set_cap, 8);
        assert_eq!(chain_spec.corrections.len(), 1);
    }

    #[test]
    fn test_rejects_invalid_yaml_spec() {
        let dir = TempDir::new("chain_spec").unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, DEVNET_YAML.replace("SLOTS_PER_EPOCH: 4", "SLOTS_PER_EPOCH: 0"))
            .unwrap();

        let err = chain_spec_parser(path.to_str().unwrap()).unwrap_err();
        assert!(err.contains("Invalid chain spec"));
    }

    #[test]
    fn test_missing_file() {
        assert!(chain_spec_parser("/does/not/exist.yaml").is_err());
    }
}
