use std::convert::TryFrom;

use anyhow::Result;
use num_bigint::{BigInt, BigUint};
use ton_block::{Grams, MsgAddressInt};
use ton_multisig_utils::{load_uint256, store_uint256, uint8_key};
use ton_types::{BuilderData, Cell, HashmapE, IBitstring, SliceData};

use crate::actions::internal_message;
use crate::constants::*;
use crate::errors::*;
use crate::models::*;

/// Packs up to 255 actions into a direct `uint8 -> ^Cell` dictionary
pub fn pack_order(actions: &[Action]) -> Result<Cell> {
    if actions.len() > MAX_ORDER_ACTIONS {
        return Err(MultisigError::TooManyActions(actions.len()).into());
    }

    let cells = actions
        .iter()
        .map(Action::to_cell)
        .collect::<Result<Vec<_>>>()?;
    pack_action_cells(&cells)
}

/// Splits actions into chained chunks of 254.
///
/// Each chunk except the last one ends with a message to the multisig
/// itself which executes the next chunk.
pub fn pack_large_order(actions: &[Action], multisig_address: &MsgAddressInt) -> Result<Cell> {
    let cells = actions
        .iter()
        .map(Action::to_cell)
        .collect::<Result<Vec<_>>>()?;

    let mut next: Option<Cell> = None;
    for chunk in cells.chunks(LARGE_ORDER_CHUNK_SIZE).rev() {
        let mut chunk = chunk.to_vec();
        if let Some(next) = next.take() {
            chunk.push(large_order_link(next, multisig_address)?);
        }
        next = Some(pack_action_cells(&chunk)?);
    }

    next.ok_or_else(|| MultisigError::EmptyOrder.into())
}

fn large_order_link(next: Cell, multisig_address: &MsgAddressInt) -> Result<Cell> {
    let mut body = BuilderData::new();
    body.append_u32(OP_EXECUTE_INTERNAL)?
        .append_u64(0)?
        .checked_append_reference(next)?;

    SendMessage {
        send_mode: SEND_MODE_PAY_GAS_SEPARATELY,
        message: internal_message(
            multisig_address.clone(),
            Grams::from(LARGE_ORDER_LINK_VALUE),
            body.into_cell()?,
        )?,
    }
    .to_cell()
}

fn pack_action_cells(cells: &[Cell]) -> Result<Cell> {
    let mut dict = HashmapE::with_bit_len(ACTION_INDEX_BITS);
    for (i, cell) in cells.iter().enumerate() {
        let index = u8::try_from(i).map_err(|_| MultisigError::TooManyActions(cells.len()))?;
        dict.setref(uint8_key(index)?, cell)?;
    }

    // Direct dictionary, without the `Maybe` bit
    match dict.data() {
        Some(root) => Ok(root.clone()),
        None => Err(MultisigError::EmptyOrder.into()),
    }
}

/// `new_order` message body of the multisig
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrderMessage {
    pub query_id: u64,
    pub order_seqno: BigUint,
    pub is_signer: bool,
    pub signer_index: u8,
    pub expiration_date: u64,
    pub actions: Cell,
}

impl NewOrderMessage {
    pub fn serialize(&self) -> Result<Cell> {
        if self.expiration_date > MAX_EXPIRATION_DATE {
            return Err(MultisigError::ExpirationOutOfRange(self.expiration_date).into());
        }

        let mut builder = BuilderData::new();
        builder
            .append_u32(OP_NEW_ORDER)?
            .append_u64(self.query_id)?;
        store_uint256(&mut builder, &self.order_seqno)?;
        builder
            .append_bit_bool(self.is_signer)?
            .append_u8(self.signer_index)?
            .append_raw(&self.expiration_date.to_be_bytes()[2..], TIME_BITS)?
            .checked_append_reference(self.actions.clone())?;
        builder.into_cell()
    }
}

impl TryFrom<&Cell> for NewOrderMessage {
    type Error = anyhow::Error;

    fn try_from(body: &Cell) -> Result<Self, Self::Error> {
        let mut cs = SliceData::load_cell_ref(body)?;
        if cs.get_next_u32()? != OP_NEW_ORDER {
            return Err(NewOrderError::InvalidOpcode.into());
        }

        let query_id = cs.get_next_u64()?;
        let order_seqno = load_uint256(&mut cs)?;
        let is_signer = cs.get_next_bit()?;
        let signer_index = cs.get_next_byte()?;

        let mut expiration = [0u8; 8];
        expiration[2..].copy_from_slice(&cs.get_next_bytes(TIME_BITS / 8)?);

        Ok(Self {
            query_id,
            order_seqno,
            is_signer,
            signer_index,
            expiration_date: u64::from_be_bytes(expiration),
            actions: cs.checked_drain_reference()?,
        })
    }
}

/// Maps `-1` to the "next seqno" sentinel and validates the range
pub fn normalize_order_seqno(order_seqno: &BigInt) -> Result<BigUint> {
    if *order_seqno == BigInt::from(-1) {
        return Ok(ORDER_MAX_SEQNO.clone());
    }

    match order_seqno.to_biguint() {
        Some(seqno) if seqno <= *ORDER_MAX_SEQNO => Ok(seqno),
        _ => Err(MultisigError::InvalidOrderSeqno(order_seqno.clone()).into()),
    }
}

/// Finds the sender among signers first, then among proposers.
///
/// Returns the role flag (`true` for signer) and the index in the list.
pub fn resolve_order_author(
    address: &MsgAddressInt,
    config: &MultisigConfig,
) -> Result<(bool, u8)> {
    let (is_signer, index) = match config.signers.iter().position(|item| item == address) {
        Some(index) => (true, index),
        None => match config.proposers.iter().position(|item| item == address) {
            Some(index) => (false, index),
            None => {
                return Err(MultisigError::NotAuthorized(RequiredRole::SignerOrProposer).into())
            }
        },
    };

    let index = u8::try_from(index)
        .map_err(|_| MultisigError::InvalidConfig("member index does not fit into 8 bits"))?;
    Ok((is_signer, index))
}

/// Builds the `new_order` message which the sender wallet must send to the multisig
pub fn deploy_order(
    from_address: &MsgAddressInt,
    params: &OrderParams,
    config: &MultisigConfig,
    actions: impl Into<OrderActions>,
) -> Result<ContractTransferData> {
    let (is_signer, signer_index) = resolve_order_author(from_address, config)?;
    let order_seqno = normalize_order_seqno(&params.order_seqno)?;

    let actions = match actions.into() {
        OrderActions::Packed(cell) => cell,
        OrderActions::List(actions) if actions.is_empty() => {
            return Err(MultisigError::EmptyOrder.into())
        }
        OrderActions::List(actions) if actions.len() > MAX_ORDER_ACTIONS => {
            log::debug!("Packing {} actions as a large order", actions.len());
            pack_large_order(&actions, &params.multisig_address)?
        }
        OrderActions::List(actions) => pack_order(&actions)?,
    };

    let payload = NewOrderMessage {
        query_id: 0,
        order_seqno,
        is_signer,
        signer_index,
        expiration_date: params.expiration_date,
        actions,
    }
    .serialize()?;

    Ok(ContractTransferData {
        send_to_address: params.multisig_address.clone(),
        state_init: None,
        payload,
    })
}

/// Builds the `approve` message which the signer wallet must send to the order contract
pub fn approve_order(
    from_address: &MsgAddressInt,
    signers: &[MsgAddressInt],
    order_address: &MsgAddressInt,
    query_id: u64,
) -> Result<ContractTransferData> {
    let index = signers
        .iter()
        .position(|item| item == from_address)
        .ok_or(MultisigError::NotAuthorized(RequiredRole::Signer))?;
    let index = u8::try_from(index)
        .map_err(|_| MultisigError::InvalidConfig("signer index does not fit into 8 bits"))?;

    let mut payload = BuilderData::new();
    payload
        .append_u32(OP_APPROVE)?
        .append_u64(query_id)?
        .append_u8(index)?;

    Ok(ContractTransferData {
        send_to_address: order_address.clone(),
        state_init: None,
        payload: payload.into_cell()?,
    })
}

/// Expands the 256-bit approvals mask of an order contract
pub fn approvals_from_mask(mask: &BigUint) -> Vec<bool> {
    let bytes = mask.to_bytes_le();
    (0..256)
        .map(|i| matches!(bytes.get(i / 8), Some(byte) if (byte >> (i % 8)) & 1 == 1))
        .collect()
}

#[derive(thiserror::Error, Debug, Copy, Clone)]
enum NewOrderError {
    #[error("Not a new order message")]
    InvalidOpcode,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::actions::*;
    use crate::parsing::*;

    fn addr(byte: u8) -> MsgAddressInt {
        MsgAddressInt::from_str(&format!("0:{}", hex::encode([byte; 32]))).unwrap()
    }

    fn config() -> MultisigConfig {
        MultisigConfig {
            threshold: 2,
            signers: vec![addr(1), addr(2), addr(3)],
            proposers: vec![addr(4), addr(5)],
            allow_arbitrary_seqno: false,
        }
    }

    fn params(order_seqno: i64) -> OrderParams {
        OrderParams {
            multisig_address: addr(0xaa),
            order_seqno: BigInt::from(order_seqno),
            expiration_date: 1_700_000_000,
        }
    }

    fn transfers(count: u32) -> Vec<Action> {
        (0..count)
            .map(|i| ton_transfer_action(addr(9), BigUint::from(i + 1), None))
            .collect()
    }

    fn not_authorized(err: &anyhow::Error) -> Option<RequiredRole> {
        match err.downcast_ref::<MultisigError>() {
            Some(MultisigError::NotAuthorized(role)) => Some(*role),
            _ => None,
        }
    }

    #[test]
    fn signer_order() -> Result<()> {
        let data = deploy_order(&addr(2), &params(-1), &config(), transfers(2))?;
        assert_eq!(data.send_to_address, addr(0xaa));
        assert!(data.state_init.is_none());

        let message = NewOrderMessage::try_from(&data.payload)?;
        assert_eq!(message.query_id, 0);
        assert_eq!(message.order_seqno, *ORDER_MAX_SEQNO);
        assert!(message.is_signer);
        assert_eq!(message.signer_index, 1);
        assert_eq!(message.expiration_date, 1_700_000_000);
        assert_eq!(parse_order_actions(&message.actions).len(), 2);
        Ok(())
    }

    #[test]
    fn proposer_order() -> Result<()> {
        let data = deploy_order(&addr(5), &params(7), &config(), transfers(1))?;

        let message = NewOrderMessage::try_from(&data.payload)?;
        assert!(!message.is_signer);
        assert_eq!(message.signer_index, 1);
        assert_eq!(message.order_seqno, BigUint::from(7u8));
        Ok(())
    }

    #[test]
    fn new_order_bit_layout() -> Result<()> {
        let actions = pack_order(&transfers(1))?;
        let payload = NewOrderMessage {
            query_id: 5,
            order_seqno: BigUint::from(3u8),
            is_signer: true,
            signer_index: 2,
            expiration_date: 0x0102_0304_0506,
            actions: actions.clone(),
        }
        .serialize()?;

        assert_eq!(payload.bit_length(), 32 + 64 + 256 + 1 + 8 + 48);
        assert_eq!(payload.references_count(), 1);
        assert_eq!(payload.reference(0)?, actions);

        let mut cs = SliceData::load_cell(payload)?;
        assert_eq!(cs.get_next_u32()?, OP_NEW_ORDER);
        assert_eq!(cs.get_next_u64()?, 5);
        assert_eq!(load_uint256(&mut cs)?, BigUint::from(3u8));
        assert!(cs.get_next_bit()?);
        assert_eq!(cs.get_next_byte()?, 2);
        assert_eq!(cs.get_next_bytes(6)?, vec![1, 2, 3, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn prepacked_order_is_used_verbatim() -> Result<()> {
        let packed = pack_order(&transfers(3))?;
        let data = deploy_order(&addr(1), &params(0), &config(), packed.clone())?;

        let message = NewOrderMessage::try_from(&data.payload)?;
        assert_eq!(message.actions, packed);
        Ok(())
    }

    #[test]
    fn stranger_cannot_create_order() {
        let err = deploy_order(&addr(6), &params(-1), &config(), transfers(1)).unwrap_err();
        assert_eq!(not_authorized(&err), Some(RequiredRole::SignerOrProposer));
    }

    #[test]
    fn order_limits() {
        let err = deploy_order(&addr(1), &params(-1), &config(), Vec::<Action>::new()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultisigError>(),
            Some(&MultisigError::EmptyOrder)
        );

        let err = pack_order(&transfers(256)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultisigError>(),
            Some(&MultisigError::TooManyActions(256))
        );

        let mut params = params(-1);
        params.expiration_date = 1 << 48;
        let err = deploy_order(&addr(1), &params, &config(), transfers(1)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MultisigError>(),
            Some(&MultisigError::ExpirationOutOfRange(1 << 48))
        );
    }

    #[test]
    fn seqno_normalization() {
        assert_eq!(
            normalize_order_seqno(&BigInt::from(-1)).unwrap(),
            *ORDER_MAX_SEQNO
        );
        assert_eq!(
            normalize_order_seqno(&BigInt::from(42)).unwrap(),
            BigUint::from(42u8)
        );
        assert!(normalize_order_seqno(&BigInt::from(-2)).is_err());

        let max = BigInt::from(ORDER_MAX_SEQNO.clone());
        assert!(normalize_order_seqno(&max).is_ok());
        assert!(normalize_order_seqno(&(max + 1)).is_err());
    }

    #[test]
    fn large_order_split_threshold() -> Result<()> {
        let data = deploy_order(&addr(1), &params(-1), &config(), transfers(255))?;
        let message = NewOrderMessage::try_from(&data.payload)?;
        let actions = parse_order_actions(&message.actions);
        assert_eq!(actions.len(), 255);
        assert!(actions.iter().all(|action| !action.is_unknown()));

        let data = deploy_order(&addr(1), &params(-1), &config(), transfers(256))?;
        let message = NewOrderMessage::try_from(&data.payload)?;
        let first_chunk = parse_order_actions(&message.actions);
        assert_eq!(first_chunk.len(), 255);
        assert!(first_chunk[254].is_unknown());

        let link = load_link(&message.actions)?;
        let next = parse_large_order_link(&link).expect("link");
        let second_chunk = parse_order_actions(&next);
        assert_eq!(second_chunk.len(), 2);

        assert_eq!(parse_order_actions_chained(&message.actions).len(), 256);
        Ok(())
    }

    fn load_link(order: &Cell) -> Result<Cell> {
        let dict = HashmapE::with_hashmap(ACTION_INDEX_BITS, Some(order.clone()));
        let value = dict.get(uint8_key(254)?)?.expect("link entry");
        value.reference(0)
    }

    #[test]
    fn large_order_link_message() -> Result<()> {
        let packed = pack_large_order(&transfers(300), &addr(0xaa))?;
        let link = load_link(&packed)?;

        let mut cs = SliceData::load_cell(link)?;
        assert_eq!(cs.get_next_u32()?, OP_SEND_MESSAGE);
        assert_eq!(cs.get_next_byte()?, SEND_MODE_PAY_GAS_SEPARATELY);

        let message =
            <ton_block::Message as ton_block::Deserializable>::construct_from_cell(
                cs.checked_drain_reference()?,
            )?;
        let header = message.int_header().expect("internal");
        assert_eq!(header.dst, addr(0xaa));
        assert_eq!(header.value.grams.as_u128(), 10_000_000);

        let mut body = message.body().expect("body");
        assert_eq!(body.get_next_u32()?, OP_EXECUTE_INTERNAL);
        assert_eq!(body.get_next_u64()?, 0);
        assert_eq!(parse_order_actions(&body.checked_drain_reference()?).len(), 46);
        Ok(())
    }

    #[test]
    fn approve_message() -> Result<()> {
        let signers = config().signers;
        let data = approve_order(&addr(3), &signers, &addr(0xbb), 17)?;
        assert_eq!(data.send_to_address, addr(0xbb));

        let mut cs = SliceData::load_cell(data.payload)?;
        assert_eq!(cs.get_next_u32()?, OP_APPROVE);
        assert_eq!(cs.get_next_u64()?, 17);
        assert_eq!(cs.get_next_byte()?, 2);
        assert_eq!(cs.remaining_bits(), 0);

        // Proposers can not approve
        let err = approve_order(&addr(4), &signers, &addr(0xbb), 0).unwrap_err();
        assert_eq!(not_authorized(&err), Some(RequiredRole::Signer));
        Ok(())
    }

    #[test]
    fn approvals_mask() {
        let mask = BigUint::from(0b101u8) | (BigUint::from(1u8) << 255u32);
        let approvals = approvals_from_mask(&mask);

        assert_eq!(approvals.len(), 256);
        assert!(approvals[0]);
        assert!(!approvals[1]);
        assert!(approvals[2]);
        assert!(approvals[255]);
        assert_eq!(approvals.iter().filter(|x| **x).count(), 3);

        assert!(approvals_from_mask(&BigUint::default())
            .iter()
            .all(|x| !x));
    }
}
