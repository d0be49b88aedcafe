use num_bigint::BigUint;
use ton_block::{Deserializable, Message, MsgAddressInt};
use ton_multisig_utils::load_snake_bytes;
use ton_types::{Cell, HashmapE, HashmapType, SliceData};

use crate::actions::load_coins;
use crate::address_list::load_address_list;
use crate::constants::*;
use crate::models::ActionReadable;

/// Minimal jetton transfer body: op, query id, empty coins and an address
const JETTON_TRANSFER_MIN_BITS: usize = OP_BITS + COINS_LEN_BITS + QUERY_ID_BITS + ADDRESS_BITS;

/// Decodes one action cell of an order dictionary.
///
/// Never fails: anything malformed or not recognized is `Unknown`.
pub fn parse_action(cell: &Cell) -> ActionReadable {
    parse_action_impl(cell).unwrap_or(ActionReadable::Unknown)
}

fn parse_action_impl(cell: &Cell) -> Option<ActionReadable> {
    let mut slice = SliceData::load_cell_ref(cell).ok()?;
    if slice.remaining_bits() < OP_BITS {
        return None;
    }

    let opcode = ActionOpcode::from_u32(slice.get_next_u32().ok()?)?;
    match opcode {
        ActionOpcode::UpdateMultisigParams
            if slice.remaining_bits() >= SIGNER_INDEX_BITS && slice.remaining_references() >= 1 =>
        {
            parse_update_config(&mut slice)
        }
        ActionOpcode::SendMessage
            if slice.remaining_bits() >= SEND_MODE_BITS && slice.remaining_references() >= 1 =>
        {
            // Send mode is not surfaced
            slice.get_next_byte().ok()?;
            let message = Message::construct_from_cell(slice.checked_drain_reference().ok()?).ok()?;
            parse_send_message(&message)
        }
        _ => None,
    }
}

fn parse_update_config(slice: &mut SliceData) -> Option<ActionReadable> {
    let threshold = slice.get_next_byte().ok()?;

    let signers = slice.checked_drain_reference().ok()?;
    let signers = load_address_list(&mut SliceData::load_cell(signers).ok()?).ok()?;
    let proposers = load_address_list(slice).ok()?;

    Some(ActionReadable::UpdateConfig {
        threshold,
        signers,
        proposers,
    })
}

fn parse_send_message(message: &Message) -> Option<ActionReadable> {
    // External messages are not supported
    let header = message.int_header()?;
    let destination = header.dst.clone();
    let value = BigUint::from(header.value.grams.as_u128());

    let mut body = message.body().unwrap_or_default();
    if body.remaining_bits() == 0 {
        return Some(ActionReadable::SendTon {
            amount: value,
            recipient: destination,
            comment: String::new(),
        });
    }

    if body.remaining_bits() < OP_BITS {
        return None;
    }

    match body.clone().get_next_u32().ok()? {
        OP_COMMENT => {
            body.get_next_u32().ok()?;
            let comment = load_snake_bytes(&mut body).ok()?;
            Some(ActionReadable::SendTon {
                amount: value,
                recipient: destination,
                comment: String::from_utf8_lossy(&comment).into_owned(),
            })
        }
        OP_JETTON_TRANSFER if body.remaining_bits() > JETTON_TRANSFER_MIN_BITS => {
            body.get_next_u32().ok()?;
            body.get_next_u64().ok()?;
            let amount = load_coins(&mut body).ok()?;
            let recipient = MsgAddressInt::construct_from(&mut body).ok()?;
            Some(ActionReadable::SendJetton {
                amount,
                recipient,
                jetton_wallet: destination,
            })
        }
        _ => None,
    }
}

/// Decodes a direct action dictionary (`uint8 -> ^Cell`) in key order.
///
/// The output has exactly one item per dictionary entry.
pub fn parse_order_actions(order: &Cell) -> Vec<ActionReadable> {
    load_order_entries(order)
        .into_iter()
        .map(|(index, action)| parse_entry(index, action.as_ref()))
        .collect()
}

/// Same as [`parse_order_actions`] but follows large order links,
/// returning the flat list of all chunks.
///
/// Only the last entry of a chunk stored under the link index is treated
/// as a link, any other entry is decoded as a regular action.
pub fn parse_order_actions_chained(order: &Cell) -> Vec<ActionReadable> {
    let mut result = Vec::new();

    let mut next = Some(order.clone());
    while let Some(order) = next.take() {
        let mut entries = load_order_entries(&order);

        let link = match entries.last() {
            Some((index, Some(action))) if usize::from(*index) == LARGE_ORDER_CHUNK_SIZE => {
                parse_large_order_link(action)
            }
            _ => None,
        };
        if let Some(link) = link {
            log::trace!("Following large order link at #{LARGE_ORDER_CHUNK_SIZE}");
            entries.pop();
            next = Some(link);
        }

        result.extend(
            entries
                .into_iter()
                .map(|(index, action)| parse_entry(index, action.as_ref())),
        );
    }

    result
}

/// Returns the next chunk of a large order if the action is a link to it
pub fn parse_large_order_link(action: &Cell) -> Option<Cell> {
    let mut slice = SliceData::load_cell_ref(action).ok()?;
    if slice.get_next_u32().ok()? != OP_SEND_MESSAGE {
        return None;
    }
    slice.get_next_byte().ok()?;

    let message = Message::construct_from_cell(slice.checked_drain_reference().ok()?).ok()?;
    message.int_header()?;

    let mut body = message.body()?;
    if body.get_next_u32().ok()? != OP_EXECUTE_INTERNAL {
        return None;
    }
    body.get_next_u64().ok()?;
    body.checked_drain_reference().ok()
}

fn parse_entry(index: u8, action: Option<&Cell>) -> ActionReadable {
    let parsed = match action {
        Some(action) => parse_action(action),
        None => ActionReadable::Unknown,
    };
    if parsed.is_unknown() {
        log::debug!("Order action #{index} is not recognized");
    }
    parsed
}

fn load_order_entries(order: &Cell) -> Vec<(u8, Option<Cell>)> {
    let dict = HashmapE::with_hashmap(ACTION_INDEX_BITS, Some(order.clone()));

    let mut entries = Vec::new();
    for item in dict.iter() {
        let (key, value) = match item {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Broken order dictionary: {e:?}");
                break;
            }
        };

        let index = match key.data().first() {
            Some(index) => *index,
            None => {
                log::warn!("Broken order dictionary key");
                break;
            }
        };
        entries.push((index, value.reference_opt(0)));
    }

    entries.sort_by_key(|(index, _)| *index);
    entries
}
