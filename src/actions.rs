use anyhow::Result;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use ton_block::{
    CurrencyCollection, Deserializable, Grams, InternalMessageHeader, Message, MsgAddressInt,
    Serializable,
};
use ton_multisig_utils::{load_snake_bytes, store_snake_bytes};
use ton_types::{BuilderData, Cell, IBitstring, SliceData};

use crate::address_list::*;
use crate::constants::*;
use crate::errors::*;
use crate::models::*;

impl Action {
    /// Serializes the action as it is stored in the order dictionary
    pub fn to_cell(&self) -> Result<Cell> {
        match self {
            Self::Transfer(transfer) => transfer.to_send_message()?.to_cell(),
            Self::JettonTransfer(transfer) => transfer.to_send_message()?.to_cell(),
            Self::UpdateConfig(config) => config.to_cell(),
            Self::Message(message) => message.to_cell(),
        }
    }
}

impl TonTransfer {
    /// Empty body or a text comment
    pub fn body(&self) -> Result<Cell> {
        match &self.comment {
            Some(comment) if !comment.is_empty() => comment_to_cell(comment),
            _ => Ok(Cell::default()),
        }
    }

    pub fn to_send_message(&self) -> Result<SendMessage> {
        let value = to_grams(&self.amount)?;
        Ok(SendMessage {
            send_mode: DEFAULT_SEND_MODE,
            message: internal_message(self.recipient.clone(), value, self.body()?)?,
        })
    }
}

impl JettonTransfer {
    /// `transfer` message body of the jetton wallet
    pub fn body(&self) -> Result<Cell> {
        let mut builder = BuilderData::new();

        builder
            .append_u32(OP_JETTON_TRANSFER)?
            .append_u64(self.query_id)?;

        store_coins(&mut builder, &self.amount)?;
        self.recipient.write_to(&mut builder)?;
        self.response_address
            .as_ref()
            .unwrap_or(&self.recipient)
            .write_to(&mut builder)?;

        // No custom payload
        builder.append_bit_zero()?;

        store_coins(&mut builder, &self.forward_ton_amount)?;

        match &self.forward_payload {
            Some(payload) => {
                builder.append_bit_one()?;
                builder.checked_append_reference(payload.clone())?;
            }
            None => {
                builder.append_bit_zero()?;
            }
        }

        builder.into_cell()
    }

    pub fn to_send_message(&self) -> Result<SendMessage> {
        let value = Grams::from(JETTON_TRANSFER_ATTACHED_VALUE);
        Ok(SendMessage {
            send_mode: DEFAULT_SEND_MODE,
            message: internal_message(self.jetton_wallet.clone(), value, self.body()?)?,
        })
    }
}

impl UpdateConfig {
    pub fn to_cell(&self) -> Result<Cell> {
        let mut builder = BuilderData::new();
        builder
            .append_u32(OP_UPDATE_MULTISIG_PARAMS)?
            .append_u8(self.threshold)?
            .checked_append_reference(address_list_to_cell(&self.signers)?)?;
        store_address_list(&mut builder, &self.proposers)?;
        builder.into_cell()
    }
}

impl SendMessage {
    pub fn to_cell(&self) -> Result<Cell> {
        let mut builder = BuilderData::new();
        builder
            .append_u32(OP_SEND_MESSAGE)?
            .append_u8(self.send_mode)?
            .checked_append_reference(self.message.serialize()?)?;
        builder.into_cell()
    }
}

pub fn ton_transfer_action(
    recipient: MsgAddressInt,
    amount: BigUint,
    comment: Option<String>,
) -> Action {
    Action::Transfer(TonTransfer {
        recipient,
        amount,
        comment,
    })
}

/// Jetton transfer with default query id, response address and forward amount
pub fn jetton_transfer_action(
    recipient: MsgAddressInt,
    amount: BigUint,
    jetton_wallet: MsgAddressInt,
) -> Action {
    Action::JettonTransfer(JettonTransfer::new(recipient, amount, jetton_wallet))
}

pub fn change_config_action(
    signers: Vec<MsgAddressInt>,
    proposers: Vec<MsgAddressInt>,
    threshold: u8,
) -> Action {
    Action::UpdateConfig(UpdateConfig {
        threshold,
        signers,
        proposers,
    })
}

impl JettonTransferFees {
    /// Min value the jetton wallet accepts for a transfer:
    /// `forward + 2 * fwd_fee + 2 * gas + min_storage`
    pub fn estimate(&self, forward_ton_amount: &BigUint) -> BigUint {
        forward_ton_amount
            + 2u64 * BigUint::from(self.fwd_fee)
            + 2u64 * BigUint::from(self.gas_consumption)
            + self.min_tons_for_storage
    }
}

pub fn estimate_jetton_transfer_fee(forward_ton_amount: &BigUint) -> BigUint {
    JettonTransferFees::default().estimate(forward_ton_amount)
}

pub fn comment_to_cell(text: &str) -> Result<Cell> {
    let mut builder = BuilderData::new();
    builder.append_u32(OP_COMMENT)?;
    store_snake_bytes(&mut builder, text.as_bytes())?;
    builder.into_cell()
}

pub fn cell_to_comment(cell: &Cell) -> Result<String> {
    let mut slice = SliceData::load_cell_ref(cell)?;
    slice.get_next_u32()?;
    let bytes = load_snake_bytes(&mut slice)?;
    Ok(String::from_utf8(bytes)?)
}

pub fn to_grams(amount: &BigUint) -> Result<Grams> {
    let value = amount.to_u128().ok_or(MultisigError::AmountTooLarge)?;
    Grams::new(value).map_err(|_| MultisigError::AmountTooLarge.into())
}

pub fn store_coins(builder: &mut BuilderData, amount: &BigUint) -> Result<()> {
    to_grams(amount)?.write_to(builder)
}

pub fn load_coins(slice: &mut SliceData) -> Result<BigUint> {
    Ok(BigUint::from(Grams::construct_from(slice)?.as_u128()))
}

/// Bounceable internal message without state init
pub(crate) fn internal_message(dst: MsgAddressInt, value: Grams, body: Cell) -> Result<Message> {
    let mut message = Message::with_int_header(InternalMessageHeader {
        ihr_disabled: true,
        bounce: true,
        dst,
        value: CurrencyCollection::from_grams(value),
        ..Default::default()
    });
    message.set_body(SliceData::load_cell(body)?);
    Ok(message)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn addr(byte: u8) -> MsgAddressInt {
        MsgAddressInt::from_str(&format!("0:{}", hex::encode([byte; 32]))).unwrap()
    }

    #[test]
    fn comment_cell() -> Result<()> {
        let cell = comment_to_cell("hello")?;
        assert_eq!(cell.bit_length(), 32 + 5 * 8);
        assert_eq!(cell_to_comment(&cell)?, "hello");

        let long = "multisig ".repeat(40);
        let cell = comment_to_cell(&long)?;
        assert_eq!(cell.references_count(), 1);
        assert_eq!(cell_to_comment(&cell)?, long);
        Ok(())
    }

    #[test]
    fn ton_transfer_message() -> Result<()> {
        let action = ton_transfer_action(addr(1), BigUint::from(1_000_000_000u64), None);
        let Action::Transfer(transfer) = &action else {
            panic!("unexpected action");
        };

        let send = transfer.to_send_message()?;
        assert_eq!(send.send_mode, 3);

        let header = send.message.int_header().unwrap();
        assert!(header.bounce);
        assert_eq!(header.dst, addr(1));
        assert_eq!(header.value.grams.as_u128(), 1_000_000_000);

        let body = send.message.body().unwrap_or_default();
        assert_eq!(body.remaining_bits(), 0);

        let cell = action.to_cell()?;
        let mut slice = SliceData::load_cell(cell)?;
        assert_eq!(slice.get_next_u32()?, OP_SEND_MESSAGE);
        assert_eq!(slice.get_next_byte()?, DEFAULT_SEND_MODE);
        assert_eq!(slice.remaining_references(), 1);
        Ok(())
    }

    #[test]
    fn jetton_transfer_body_layout() -> Result<()> {
        let transfer = JettonTransfer {
            query_id: 42,
            ..JettonTransfer::new(addr(1), BigUint::from(10u8).pow(18), addr(2))
        };

        let mut body = SliceData::load_cell(transfer.body()?)?;
        assert_eq!(body.get_next_u32()?, OP_JETTON_TRANSFER);
        assert_eq!(body.get_next_u64()?, 42);
        assert_eq!(load_coins(&mut body)?, BigUint::from(10u8).pow(18));
        assert_eq!(MsgAddressInt::construct_from(&mut body)?, addr(1));
        // Response address defaults to the recipient
        assert_eq!(MsgAddressInt::construct_from(&mut body)?, addr(1));
        assert!(!body.get_next_bit()?);
        assert_eq!(load_coins(&mut body)?, BigUint::from(1u8));
        assert!(!body.get_next_bit()?);
        assert_eq!(body.remaining_bits(), 0);

        let send = transfer.to_send_message()?;
        let header = send.message.int_header().unwrap();
        assert_eq!(header.dst, addr(2));
        assert_eq!(header.value.grams.as_u128(), 650_000_000);
        Ok(())
    }

    #[test]
    fn jetton_transfer_forward_payload() -> Result<()> {
        let payload = comment_to_cell("gift")?;
        let transfer = JettonTransfer {
            response_address: Some(addr(3)),
            forward_ton_amount: BigUint::from(5u8),
            forward_payload: Some(payload.clone()),
            ..JettonTransfer::new(addr(1), BigUint::from(100u8), addr(2))
        };

        let cell = transfer.body()?;
        assert_eq!(cell.references_count(), 1);
        assert_eq!(cell.reference(0)?, payload);
        Ok(())
    }

    #[test]
    fn update_config_layout() -> Result<()> {
        let action = change_config_action(vec![addr(1), addr(2)], vec![addr(3)], 2);
        let mut slice = SliceData::load_cell(action.to_cell()?)?;

        assert_eq!(slice.get_next_u32()?, OP_UPDATE_MULTISIG_PARAMS);
        assert_eq!(slice.get_next_byte()?, 2);

        let signers = slice.checked_drain_reference()?;
        assert_eq!(
            load_address_list(&mut SliceData::load_cell(signers)?)?,
            vec![addr(1), addr(2)]
        );
        assert_eq!(load_address_list(&mut slice)?, vec![addr(3)]);
        Ok(())
    }

    #[test]
    fn amount_overflow() {
        let too_large = BigUint::from(1u8) << 128u32;
        let err = ton_transfer_action(addr(1), too_large, None)
            .to_cell()
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultisigError>(),
            Some(&MultisigError::AmountTooLarge)
        );
    }

    #[test]
    fn jetton_fee_estimate() {
        assert_eq!(
            estimate_jetton_transfer_fee(&BigUint::from(1u8)),
            BigUint::from(1u64 + 6_000_000 + 30_000_000 + 10_000_000)
        );
    }
}
