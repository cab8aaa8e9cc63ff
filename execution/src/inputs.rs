//! Frame inputs derived from a transaction or from a CALL/CREATE opcode.

use std::ops::Range;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use common::utils::{u256_number_deserialize, u256_number_serialize};

use crate::bytecode::Eof;
use crate::types::{TransactTo, TxEnv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallScheme {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    ExtCall,
    ExtStaticCall,
    ExtDelegateCall,
}

impl CallScheme {
    pub fn is_ext(&self) -> bool {
        matches!(
            self,
            Self::ExtCall | Self::ExtStaticCall | Self::ExtDelegateCall
        )
    }

    pub fn is_ext_delegate_call(&self) -> bool {
        matches!(self, Self::ExtDelegateCall)
    }
}

/// Value attached to a call. An apparent value is visible through CALLVALUE
/// but is not moved (DELEGATECALL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "value_type", content = "amount", rename_all = "snake_case")]
pub enum CallValue {
    Transfer(
        #[serde(
            serialize_with = "u256_number_serialize",
            deserialize_with = "u256_number_deserialize"
        )]
        U256,
    ),
    Apparent(
        #[serde(
            serialize_with = "u256_number_serialize",
            deserialize_with = "u256_number_deserialize"
        )]
        U256,
    ),
}

impl Default for CallValue {
    fn default() -> Self {
        Self::Transfer(U256::ZERO)
    }
}

impl CallValue {
    pub fn get(&self) -> U256 {
        match *self {
            Self::Transfer(value) | Self::Apparent(value) => value,
        }
    }

    /// The amount actually moved, if any.
    pub fn transfer(&self) -> Option<U256> {
        match *self {
            Self::Transfer(value) => Some(value),
            Self::Apparent(_) => None,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer(_))
    }

    pub fn apparent(&self) -> Option<U256> {
        match *self {
            Self::Transfer(_) => None,
            Self::Apparent(value) => Some(value),
        }
    }

    pub fn is_apparent(&self) -> bool {
        matches!(self, Self::Apparent(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallInputs {
    pub input: Bytes,
    pub return_memory_offset: Range<usize>,
    pub gas_limit: u64,
    /// Account whose code runs.
    pub bytecode_address: Address,
    /// Account whose storage and balance are used.
    pub target_address: Address,
    pub caller: Address,
    pub value: CallValue,
    pub scheme: CallScheme,
    pub is_static: bool,
    pub is_eof: bool,
}

impl CallInputs {
    /// Inputs of the top-level call, or `None` for a contract creation.
    pub fn new(tx: &TxEnv, gas_limit: u64) -> Option<Self> {
        let TransactTo::Call(target_address) = tx.transact_to else {
            return None;
        };

        Some(Self {
            input: tx.data.clone(),
            return_memory_offset: 0..0,
            gas_limit,
            bytecode_address: target_address,
            target_address,
            caller: tx.caller,
            value: CallValue::Transfer(tx.value),
            scheme: CallScheme::Call,
            is_static: false,
            is_eof: false,
        })
    }

    pub fn new_boxed(tx: &TxEnv, gas_limit: u64) -> Option<Box<Self>> {
        Self::new(tx, gas_limit).map(Box::new)
    }

    pub fn transfers_value(&self) -> bool {
        self.value.transfer().is_some_and(|value| !value.is_zero())
    }

    pub fn transfer_value(&self) -> Option<U256> {
        self.value.transfer()
    }

    pub fn apparent_value(&self) -> Option<U256> {
        self.value.apparent()
    }

    pub fn call_value(&self) -> U256 {
        self.value.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateScheme {
    Create,
    Create2 { salt: U256 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateInputs {
    pub caller: Address,
    pub scheme: CreateScheme,
    pub value: U256,
    pub init_code: Bytes,
    pub gas_limit: u64,
}

impl CreateInputs {
    /// Inputs of a top-level creation, or `None` for a call.
    pub fn new(tx: &TxEnv, gas_limit: u64) -> Option<Self> {
        let TransactTo::Create = tx.transact_to else {
            return None;
        };

        Some(Self {
            caller: tx.caller,
            scheme: CreateScheme::Create,
            value: tx.value,
            init_code: tx.data.clone(),
            gas_limit,
        })
    }

    pub fn new_boxed(tx: &TxEnv, gas_limit: u64) -> Option<Box<Self>> {
        Self::new(tx, gas_limit).map(Box::new)
    }

    /// Address of the new contract given the caller's current nonce.
    pub fn created_address(&self, nonce: u64) -> Address {
        match self.scheme {
            CreateScheme::Create => self.caller.create(nonce),
            CreateScheme::Create2 { salt } => self
                .caller
                .create2_from_code(salt.to_be_bytes::<32>(), &self.init_code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EOFCreateKind {
    /// Creation transaction: the container and its calldata are still raw.
    Tx { initdata: Bytes },
    /// EOFCREATE: a validated subcontainer with its calldata.
    Opcode {
        initcode: Eof,
        input: Bytes,
        created_address: Address,
    },
}

impl EOFCreateKind {
    pub fn created_address(&self) -> Option<&Address> {
        match self {
            Self::Tx { .. } => None,
            Self::Opcode {
                created_address, ..
            } => Some(created_address),
        }
    }
}

impl Default for EOFCreateKind {
    fn default() -> Self {
        Self::Opcode {
            initcode: Eof::default(),
            input: Bytes::new(),
            created_address: Address::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EOFCreateInputs {
    pub caller: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub kind: EOFCreateKind,
}

impl EOFCreateInputs {
    pub fn new(caller: Address, value: U256, gas_limit: u64, kind: EOFCreateKind) -> Self {
        Self {
            caller,
            value,
            gas_limit,
            kind,
        }
    }

    pub fn new_tx(tx: &TxEnv, gas_limit: u64) -> Self {
        Self::new(
            tx.caller,
            tx.value,
            gas_limit,
            EOFCreateKind::Tx {
                initdata: tx.data.clone(),
            },
        )
    }

    pub fn new_opcode(
        caller: Address,
        created_address: Address,
        value: U256,
        initcode: Eof,
        gas_limit: u64,
        input: Bytes,
    ) -> Self {
        Self::new(
            caller,
            value,
            gas_limit,
            EOFCreateKind::Opcode {
                initcode,
                input,
                created_address,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, bytes, b256};

    use super::*;

    const CALLER: Address = address!("1a2b3c4d5e000000000000000000000000000000");

    #[test]
    fn test_call_inputs_from_call_tx() {
        let tx = TxEnv {
            transact_to: TransactTo::Call(CALLER),
            data: bytes!("010203"),
            caller: CALLER,
            value: U256::from(123),
            ..Default::default()
        };

        let inputs = CallInputs::new(&tx, 1000).unwrap();
        assert_eq!(
            inputs,
            CallInputs {
                input: bytes!("010203"),
                return_memory_offset: 0..0,
                gas_limit: 1000,
                bytecode_address: CALLER,
                target_address: CALLER,
                caller: CALLER,
                value: CallValue::Transfer(U256::from(123)),
                scheme: CallScheme::Call,
                is_static: false,
                is_eof: false,
            }
        );
        assert!(inputs.transfers_value());
        assert_eq!(CallInputs::new_boxed(&tx, 1000).map(|b| *b), Some(inputs));
        assert!(CreateInputs::new(&tx, 1000).is_none());
    }

    #[test]
    fn test_create_inputs_from_create_tx() {
        let tx = TxEnv {
            transact_to: TransactTo::Create,
            data: bytes!("010203"),
            caller: CALLER,
            value: U256::from(123),
            ..Default::default()
        };

        assert_eq!(
            CreateInputs::new(&tx, 1000),
            Some(CreateInputs {
                caller: CALLER,
                scheme: CreateScheme::Create,
                value: U256::from(123),
                init_code: bytes!("010203"),
                gas_limit: 1000,
            })
        );
        assert!(CallInputs::new(&tx, 1000).is_none());
    }

    #[test]
    fn test_created_address() {
        let deployer = address!("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        let mut inputs = CreateInputs {
            caller: deployer,
            scheme: CreateScheme::Create,
            value: U256::ZERO,
            init_code: bytes!("00"),
            gas_limit: 0,
        };
        assert_eq!(
            inputs.created_address(0),
            address!("cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d")
        );

        let salt = b256!("0000000000000000000000000000000000000000000000000000000000000001");
        inputs.scheme = CreateScheme::Create2 {
            salt: U256::from_be_bytes(salt.0),
        };
        assert_eq!(
            inputs.created_address(0),
            deployer.create2_from_code(salt, bytes!("00"))
        );
    }

    #[test]
    fn test_eof_create_from_tx() {
        let tx = TxEnv {
            caller: CALLER,
            value: U256::from(456),
            data: bytes!("040506"),
            ..Default::default()
        };

        let inputs = EOFCreateInputs::new_tx(&tx, 2000);
        assert_eq!(
            inputs,
            EOFCreateInputs {
                caller: CALLER,
                value: U256::from(456),
                gas_limit: 2000,
                kind: EOFCreateKind::Tx {
                    initdata: bytes!("040506"),
                },
            }
        );
        assert!(inputs.kind.created_address().is_none());
    }

    #[test]
    fn test_eof_create_from_opcode() {
        let created = address!("00000000000000000000000000000000000000ff");
        let inputs = EOFCreateInputs::new_opcode(
            CALLER,
            created,
            U256::from(1),
            Eof::default(),
            500,
            bytes!("aa"),
        );

        assert_eq!(inputs.kind.created_address(), Some(&created));
        assert_eq!(inputs.gas_limit, 500);
    }

    #[test]
    fn test_call_value_serde() {
        let cases = [
            (
                CallValue::Transfer(U256::from(123)),
                r#"{"value_type":"transfer","amount":123}"#,
            ),
            (
                CallValue::Apparent(U256::from(456)),
                r#"{"value_type":"apparent","amount":456}"#,
            ),
        ];

        for (value, expected) in cases {
            let json = serde_json::to_string(&value).unwrap();
            assert_eq!(json, expected);
            assert_eq!(serde_json::from_str::<CallValue>(&json).unwrap(), value);
        }
    }

    #[test]
    fn test_call_value_accessors() {
        let transfer = CallValue::Transfer(U256::from(789));
        let apparent = CallValue::Apparent(U256::from(789));

        assert_eq!(transfer.get(), apparent.get());
        assert_eq!(transfer.transfer(), Some(U256::from(789)));
        assert_eq!(apparent.transfer(), None);
        assert!(apparent.is_apparent());
        assert_eq!(apparent.apparent(), Some(U256::from(789)));
    }
}
