use anyhow::Result;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use ton_block::MsgAddressInt;
use ton_multisig_utils::{pack_std_smc_addr, unpack_std_smc_addr, FriendlyAddressFlags};

use crate::models::FriendlyAddress;

pub const OP_COMMENT: u32 = 0;
pub const OP_JETTON_TRANSFER: u32 = 0x0f8a7ea5;
pub const OP_JETTON_MINT: u32 = 0x642b7d07;

pub const OP_NEW_ORDER: u32 = 0xf718510f;
pub const OP_EXECUTE_INTERNAL: u32 = 0xa32c59bf;
pub const OP_APPROVE: u32 = 0xa762230f;

pub const OP_SEND_MESSAGE: u32 = 0xf1381e5b;
pub const OP_UPDATE_MULTISIG_PARAMS: u32 = 0x1d0cfbd3;

pub const OP_BITS: usize = 32;
pub const QUERY_ID_BITS: usize = 64;
pub const ORDER_SEQNO_BITS: usize = 256;
pub const SIGNER_INDEX_BITS: usize = 8;
pub const ACTION_INDEX_BITS: usize = 8;
pub const TIME_BITS: usize = 48;
pub const SEND_MODE_BITS: usize = 8;
/// `addr_std$10 anycast:nothing workchain:int8 address:bits256`
pub const ADDRESS_BITS: usize = 267;
/// Length prefix of `VarUInteger 16`
pub const COINS_LEN_BITS: usize = 4;

pub const MAX_EXPIRATION_DATE: u64 = (1 << TIME_BITS) - 1;

/// Order seqno which tells the wallet to use its next free seqno
pub static ORDER_MAX_SEQNO: Lazy<BigUint> =
    Lazy::new(|| (BigUint::from(1u8) << ORDER_SEQNO_BITS) - 1u8);

pub const SEND_MODE_PAY_GAS_SEPARATELY: u8 = 1;
pub const SEND_MODE_IGNORE_ERRORS: u8 = 2;
pub const DEFAULT_SEND_MODE: u8 = SEND_MODE_PAY_GAS_SEPARATELY + SEND_MODE_IGNORE_ERRORS;

/// Max number of actions in one direct dictionary
pub const MAX_ORDER_ACTIONS: usize = 255;
/// Actions per chunk of a large order, the last index is taken by the link
pub const LARGE_ORDER_CHUNK_SIZE: usize = 254;
/// 0.01 TON
pub const LARGE_ORDER_LINK_VALUE: u64 = 10_000_000;
/// 0.65 TON
pub const JETTON_TRANSFER_ATTACHED_VALUE: u64 = 650_000_000;

pub const DEFAULT_WORKCHAIN: i8 = 0;

/// Signers and proposers are addressed by an 8-bit index
pub const MAX_MEMBERS: usize = 255;

/// Opcodes of the actions stored in an order dictionary
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ActionOpcode {
    SendMessage,
    UpdateMultisigParams,
}

impl ActionOpcode {
    pub fn from_u32(op: u32) -> Option<Self> {
        match op {
            OP_SEND_MESSAGE => Some(Self::SendMessage),
            OP_UPDATE_MULTISIG_PARAMS => Some(Self::UpdateMultisigParams),
            _ => None,
        }
    }
}

ton_multisig_utils::define_string_enum!(
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TonNetwork {
        #[default]
        Mainnet => "mainnet",
        Testnet => "testnet",
    }
);

impl TonNetwork {
    pub fn is_testnet(&self) -> bool {
        matches!(self, Self::Testnet)
    }

    /// Packs address into the base64url user-friendly form
    pub fn pack_address(&self, address: &MsgAddressInt, bounceable: bool) -> Result<String> {
        pack_std_smc_addr(
            true,
            address,
            FriendlyAddressFlags {
                bounceable,
                testnet: self.is_testnet(),
            },
        )
    }
}

/// Parses a user-friendly address in either base64 charset
pub fn unpack_address(packed: &str) -> Result<FriendlyAddress> {
    let (address, flags) = unpack_std_smc_addr(packed)?;
    Ok(FriendlyAddress {
        address,
        network: if flags.testnet {
            TonNetwork::Testnet
        } else {
            TonNetwork::Mainnet
        },
        bounceable: flags.bounceable,
    })
}
