use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use common::errors::InvalidLengthError;
use config::Config;

/// Minimum blob gas price (EIP-4844).
pub const MIN_BLOB_GASPRICE: u64 = 1;
pub const BLOB_GASPRICE_UPDATE_FRACTION: u64 = 3_338_477;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Env {
    pub cfg: CfgEnv,
    pub block: BlockEnv,
    pub tx: TxEnv,
}

impl Env {
    pub fn with_tx(tx: TxEnv) -> Self {
        Self {
            tx,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfgEnv {
    pub chain_id: u64,
    pub disable_base_fee: bool,
    pub memory_limit: u64,
    pub limit_contract_code_size: Option<usize>,
}

impl Default for CfgEnv {
    fn default() -> Self {
        Self {
            chain_id: 1,
            disable_base_fee: false,
            memory_limit: (1 << 32) - 1,
            limit_contract_code_size: None,
        }
    }
}

impl From<&Config> for CfgEnv {
    fn from(config: &Config) -> Self {
        Self {
            chain_id: config.chain_id,
            disable_base_fee: config.disable_base_fee,
            memory_limit: config.memory_limit,
            limit_contract_code_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobExcessGasAndPrice {
    pub excess_blob_gas: u64,
    pub blob_gasprice: u128,
}

impl BlobExcessGasAndPrice {
    pub fn new(excess_blob_gas: u64) -> Self {
        Self {
            excess_blob_gas,
            blob_gasprice: calc_blob_gasprice(excess_blob_gas),
        }
    }
}

/// Blob gas price for the given excess blob gas (EIP-4844).
pub fn calc_blob_gasprice(excess_blob_gas: u64) -> u128 {
    fake_exponential(
        MIN_BLOB_GASPRICE,
        excess_blob_gas,
        BLOB_GASPRICE_UPDATE_FRACTION,
    )
}

/// Integer approximation of `factor * e ** (numerator / denominator)`.
pub fn fake_exponential(factor: u64, numerator: u64, denominator: u64) -> u128 {
    if denominator == 0 {
        return 0;
    }

    let factor = factor as u128;
    let numerator = numerator as u128;
    let denominator = denominator as u128;

    let mut i = 1;
    let mut output = 0;
    let mut accum = factor * denominator;
    while accum > 0 {
        output += accum;
        accum = accum.saturating_mul(numerator) / (denominator * i);
        i += 1;
    }
    output / denominator
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEnv {
    pub number: U256,
    pub coinbase: Address,
    pub timestamp: U256,
    pub gas_limit: U256,
    pub basefee: U256,
    pub difficulty: U256,
    /// Replaces `difficulty` after the merge.
    pub prevrandao: Option<B256>,
    pub blob_excess_gas_and_price: Option<BlobExcessGasAndPrice>,
}

impl Default for BlockEnv {
    fn default() -> Self {
        Self {
            number: U256::ZERO,
            coinbase: Address::ZERO,
            timestamp: U256::from(1),
            gas_limit: U256::MAX,
            basefee: U256::ZERO,
            difficulty: U256::ZERO,
            prevrandao: Some(B256::ZERO),
            blob_excess_gas_and_price: Some(BlobExcessGasAndPrice::new(0)),
        }
    }
}

impl BlockEnv {
    pub fn set_blob_excess_gas_and_price(&mut self, excess_blob_gas: u64) {
        self.blob_excess_gas_and_price = Some(BlobExcessGasAndPrice::new(excess_blob_gas));
    }

    pub fn blob_gasprice(&self) -> Option<u128> {
        self.blob_excess_gas_and_price
            .map(|blob| blob.blob_gasprice)
    }
}

/// Where a transaction goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactTo {
    Call(Address),
    Create,
}

impl Default for TransactTo {
    fn default() -> Self {
        Self::Call(Address::ZERO)
    }
}

impl TransactTo {
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create)
    }

    pub fn to(&self) -> Option<&Address> {
        match self {
            Self::Call(to) => Some(to),
            Self::Create => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

/// EIP-7702 authorization tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub chain_id: u64,
    pub address: Address,
    pub nonce: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAuthorization {
    pub inner: Authorization,
    pub signature: Signature,
}

/// An authorization whose signer has been recovered, if recovery succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredAuthorization {
    pub inner: Authorization,
    pub authority: Option<Address>,
}

/// An ECDSA signature in `(v, r, s)` form. Carried as data only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    pub r: U256,
    pub s: U256,
}

impl Signature {
    pub fn new(v: u8, r: U256, s: U256) -> Self {
        Self { v, r, s }
    }

    /// `r || s`, each left-padded to 32 bytes.
    pub fn to_raw_signature(&self) -> [u8; 64] {
        let mut raw = [0u8; 64];
        raw[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        raw[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
        raw
    }

    pub fn from_raw_signature(raw: &[u8], v: u8) -> Result<Self, InvalidLengthError> {
        if raw.len() != 64 {
            return Err(InvalidLengthError::new(64, raw.len()));
        }

        Ok(Self {
            v,
            r: U256::from_be_slice(&raw[..32]),
            s: U256::from_be_slice(&raw[32..]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxEnv {
    pub caller: Address,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub transact_to: TransactTo,
    pub value: U256,
    pub data: Bytes,
    /// `None` skips the nonce check.
    pub nonce: Option<u64>,
    pub chain_id: Option<u64>,
    pub access_list: Vec<AccessListItem>,
    pub gas_priority_fee: Option<U256>,
    pub blob_hashes: Vec<B256>,
    pub max_fee_per_blob_gas: Option<U256>,
    pub authorization_list: Vec<SignedAuthorization>,
}

impl Default for TxEnv {
    fn default() -> Self {
        Self {
            caller: Address::ZERO,
            gas_limit: u64::MAX,
            gas_price: U256::ZERO,
            transact_to: TransactTo::default(),
            value: U256::ZERO,
            data: Bytes::new(),
            nonce: None,
            chain_id: None,
            access_list: Vec::new(),
            gas_priority_fee: None,
            blob_hashes: Vec::new(),
            max_fee_per_blob_gas: None,
            authorization_list: Vec::new(),
        }
    }
}

impl TxEnv {
    /// Total blob gas used by the transaction (EIP-4844).
    pub fn blob_gas(&self) -> u64 {
        const GAS_PER_BLOB: u64 = 1 << 17;
        GAS_PER_BLOB * self.blob_hashes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    #[test]
    fn test_default_env() {
        let env = Env::default();

        assert_eq!(env.cfg.chain_id, 1);
        assert_eq!(env.tx.transact_to, TransactTo::Call(Address::ZERO));
        assert_eq!(env.tx.gas_limit, u64::MAX);
        assert_eq!(env.block.prevrandao, Some(B256::ZERO));
        assert_eq!(env.block.blob_gasprice(), Some(1));
    }

    #[test]
    fn test_raw_signature_roundtrip() {
        let sig = Signature::new(1, U256::from(12345), U256::from(67890));
        let raw = sig.to_raw_signature();

        assert_eq!(&raw[30..32], &[0x30, 0x39]);
        assert_eq!(&raw[61..], &[0x01, 0x09, 0x32]);
        assert_eq!(Signature::from_raw_signature(&raw, 1).unwrap(), sig);
    }

    #[test]
    fn test_raw_signature_wrong_length() {
        let err = Signature::from_raw_signature(&[0u8; 63], 0).unwrap_err();
        assert_eq!(err.expected(), 64);
        assert_eq!(err.actual(), 63);
    }

    #[test]
    fn test_cfg_from_config() {
        let config = Config {
            chain_id: 1234,
            disable_base_fee: true,
            memory_limit: 2048,
            ..Default::default()
        };

        let cfg = CfgEnv::from(&config);
        assert_eq!(cfg.chain_id, 1234);
        assert!(cfg.disable_base_fee);
        assert_eq!(cfg.memory_limit, 2048);
    }

    #[test]
    fn test_blob_gasprice() {
        assert_eq!(calc_blob_gasprice(0), 1);
        assert_eq!(calc_blob_gasprice(2_314_057), 1);
        assert_eq!(calc_blob_gasprice(2_314_058), 2);
        assert_eq!(calc_blob_gasprice(10 * 1024 * 1024), 23);
    }

    #[test]
    fn test_transact_to() {
        let to = address!("1a2b3c4d5e000000000000000000000000000000");
        assert_eq!(TransactTo::Call(to).to(), Some(&to));
        assert!(TransactTo::Create.is_create());
        assert_eq!(TransactTo::Create.to(), None);
    }

    #[test]
    fn test_access_list_item_serde() {
        let item = AccessListItem {
            address: address!("1a2b3c4d5e000000000000000000000000000000"),
            storage_keys: vec![b256!(
                "aabbccddee000000000000000000000000000000000000000000000000000000"
            )],
        };

        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("storageKeys").is_some());
        assert_eq!(serde_json::from_value::<AccessListItem>(value).unwrap(), item);
    }

    #[test]
    fn test_recovered_authorization() {
        let auth = Authorization {
            chain_id: 12345,
            address: address!("1a2b3c4d5e000000000000000000000000000000"),
            nonce: None,
        };
        let recovered = RecoveredAuthorization {
            inner: auth.clone(),
            authority: None,
        };

        assert_eq!(recovered.inner.chain_id, 12345);
        assert!(recovered.authority.is_none());
        assert!(recovered.inner.nonce.is_none());
    }
}
