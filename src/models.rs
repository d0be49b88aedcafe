use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};
use ton_block::MsgAddressInt;
use ton_multisig_utils::*;
use ton_types::Cell;

use crate::constants::*;

/// Multisig wallet configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigConfig {
    pub threshold: u8,
    #[serde(with = "serde_vec_address")]
    pub signers: Vec<MsgAddressInt>,
    #[serde(with = "serde_vec_address", default)]
    pub proposers: Vec<MsgAddressInt>,
    #[serde(default)]
    pub allow_arbitrary_seqno: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    #[serde(with = "serde_address")]
    pub multisig_address: MsgAddressInt,
    /// `-1` means the next seqno of the wallet
    #[serde(with = "serde_string")]
    pub order_seqno: BigInt,
    pub expiration_date: u64,
}

/// Internal message to be sent by the user wallet
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTransferData {
    #[serde(with = "serde_address")]
    pub send_to_address: MsgAddressInt,
    #[serde(with = "serde_optional_cell", default)]
    pub state_init: Option<Cell>,
    #[serde(with = "serde_cell")]
    pub payload: Cell,
}

/// One action of an order
#[derive(Clone, Debug)]
pub enum Action {
    /// Native TON transfer with an optional comment
    Transfer(TonTransfer),
    /// Jetton transfer through the sender's jetton wallet
    JettonTransfer(JettonTransfer),
    /// Replace signers, proposers and threshold
    UpdateConfig(UpdateConfig),
    /// Any prebuilt internal message
    Message(SendMessage),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TonTransfer {
    pub recipient: MsgAddressInt,
    pub amount: BigUint,
    pub comment: Option<String>,
}

#[derive(Clone, Debug)]
pub struct JettonTransfer {
    /// Owner of the receiving jetton wallet
    pub recipient: MsgAddressInt,
    pub amount: BigUint,
    /// Jetton wallet of the multisig
    pub jetton_wallet: MsgAddressInt,
    /// Excess receiver, the recipient when not set
    pub response_address: Option<MsgAddressInt>,
    pub forward_ton_amount: BigUint,
    pub forward_payload: Option<Cell>,
    pub query_id: u64,
}

impl JettonTransfer {
    pub fn new(recipient: MsgAddressInt, amount: BigUint, jetton_wallet: MsgAddressInt) -> Self {
        Self {
            recipient,
            amount,
            jetton_wallet,
            response_address: None,
            forward_ton_amount: BigUint::from(1u8),
            forward_payload: None,
            query_id: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateConfig {
    pub threshold: u8,
    pub signers: Vec<MsgAddressInt>,
    pub proposers: Vec<MsgAddressInt>,
}

#[derive(Clone, Debug)]
pub struct SendMessage {
    pub send_mode: u8,
    pub message: ton_block::Message,
}

impl From<TonTransfer> for Action {
    fn from(value: TonTransfer) -> Self {
        Self::Transfer(value)
    }
}

impl From<JettonTransfer> for Action {
    fn from(value: JettonTransfer) -> Self {
        Self::JettonTransfer(value)
    }
}

impl From<UpdateConfig> for Action {
    fn from(value: UpdateConfig) -> Self {
        Self::UpdateConfig(value)
    }
}

impl From<SendMessage> for Action {
    fn from(value: SendMessage) -> Self {
        Self::Message(value)
    }
}

/// Decoded order action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionReadable {
    SendTon {
        #[serde(with = "serde_string")]
        amount: BigUint,
        #[serde(with = "serde_address")]
        recipient: MsgAddressInt,
        comment: String,
    },
    SendJetton {
        #[serde(with = "serde_string")]
        amount: BigUint,
        #[serde(with = "serde_address")]
        recipient: MsgAddressInt,
        #[serde(with = "serde_address", rename = "jettonWallet")]
        jetton_wallet: MsgAddressInt,
    },
    UpdateConfig {
        threshold: u8,
        #[serde(with = "serde_vec_address")]
        signers: Vec<MsgAddressInt>,
        #[serde(with = "serde_vec_address")]
        proposers: Vec<MsgAddressInt>,
    },
    Unknown,
}

impl ActionReadable {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Actions of a new order, either as a list or as an already packed dictionary
#[derive(Clone, Debug)]
pub enum OrderActions {
    List(Vec<Action>),
    Packed(Cell),
}

impl From<Vec<Action>> for OrderActions {
    fn from(value: Vec<Action>) -> Self {
        Self::List(value)
    }
}

impl From<Cell> for OrderActions {
    fn from(value: Cell) -> Self {
        Self::Packed(value)
    }
}

/// Fee parameters of a jetton wallet
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JettonTransferFees {
    pub fwd_fee: u64,
    pub gas_consumption: u64,
    pub min_tons_for_storage: u64,
}

impl Default for JettonTransferFees {
    fn default() -> Self {
        Self {
            fwd_fee: 3_000_000,
            gas_consumption: 15_000_000,
            min_tons_for_storage: 10_000_000,
        }
    }
}

/// Destination and network of a friendly-formatted address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyAddress {
    pub address: MsgAddressInt,
    pub network: TonNetwork,
    pub bounceable: bool,
}
