use anyhow::Result;
use ton_block::{Deserializable, MsgAddressInt, Serializable};
use ton_types::{BuilderData, Cell, IBitstring, SliceData};

/// Writes addresses as a linked chain: `addr continue:Bit [^next]`.
/// An empty list is a single zero bit.
pub fn store_address_list(builder: &mut BuilderData, addresses: &[MsgAddressInt]) -> Result<()> {
    let (first, rest) = match addresses.split_first() {
        Some(item) => item,
        None => {
            builder.append_bit_zero()?;
            return Ok(());
        }
    };

    let mut next = None;
    for address in rest.iter().rev() {
        let mut cell = BuilderData::new();
        address.write_to(&mut cell)?;
        append_continuation(&mut cell, next.take())?;
        next = Some(cell.into_cell()?);
    }

    first.write_to(builder)?;
    append_continuation(builder, next)
}

pub fn address_list_to_cell(addresses: &[MsgAddressInt]) -> Result<Cell> {
    let mut builder = BuilderData::new();
    store_address_list(&mut builder, addresses)?;
    builder.into_cell()
}

/// Reads a chain written by [`store_address_list`].
///
/// Fewer than two remaining bits mean an empty list.
pub fn load_address_list(slice: &mut SliceData) -> Result<Vec<MsgAddressInt>> {
    let mut result = Vec::new();
    if slice.remaining_bits() < 2 {
        return Ok(result);
    }

    let mut next = load_list_item(slice, &mut result)?;
    while let Some(cell) = next {
        next = load_list_item(&mut SliceData::load_cell(cell)?, &mut result)?;
    }

    Ok(result)
}

fn load_list_item(slice: &mut SliceData, target: &mut Vec<MsgAddressInt>) -> Result<Option<Cell>> {
    target.push(MsgAddressInt::construct_from(slice)?);
    Ok(if slice.get_next_bit()? {
        Some(slice.checked_drain_reference()?)
    } else {
        None
    })
}

fn append_continuation(builder: &mut BuilderData, next: Option<Cell>) -> Result<()> {
    match next {
        Some(next) => {
            builder.append_bit_one()?;
            builder.checked_append_reference(next)?;
        }
        None => {
            builder.append_bit_zero()?;
        }
    }
    Ok(())
}
