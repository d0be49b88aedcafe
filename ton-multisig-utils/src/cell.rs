use anyhow::Result;
use num_bigint::BigUint;
use ton_types::{BuilderData, Cell, IBitstring, SliceData};

/// Max bytes in a continuation cell of a snake chain
pub const SNAKE_CHUNK_BYTES: usize = 127;

pub fn decode_boc_base64(boc: &str) -> Result<Cell> {
    let bytes = base64::decode(boc.trim())?;
    ton_types::deserialize_tree_of_cells(&mut bytes.as_slice())
}

pub fn encode_boc_base64(cell: &Cell) -> Result<String> {
    Ok(base64::encode(ton_types::serialize_toc(cell)?))
}

/// Writes bytes into the builder, spilling into a chain of
/// continuation cells through the first reference
pub fn store_snake_bytes(builder: &mut BuilderData, bytes: &[u8]) -> Result<()> {
    let inline = std::cmp::min(builder.bits_free() / 8, bytes.len());
    let (head, tail) = bytes.split_at(inline);
    builder.append_raw(head, head.len() * 8)?;

    if tail.is_empty() {
        return Ok(());
    }

    if builder.references_free() == 0 {
        return Err(CellError::NoSpaceForContinuation.into());
    }

    let mut next: Option<Cell> = None;
    for chunk in tail.chunks(SNAKE_CHUNK_BYTES).rev() {
        let mut cell = BuilderData::new();
        cell.append_raw(chunk, chunk.len() * 8)?;
        if let Some(next) = next.take() {
            cell.checked_append_reference(next)?;
        }
        next = Some(cell.into_cell()?);
    }

    if let Some(next) = next {
        builder.checked_append_reference(next)?;
    }
    Ok(())
}

/// Reads the remaining bytes of the slice and of every cell reachable
/// through the first reference
pub fn load_snake_bytes(slice: &mut SliceData) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut next = read_aligned(slice, &mut result)?;
    while let Some(cell) = next {
        let mut slice = SliceData::load_cell(cell)?;
        next = read_aligned(&mut slice, &mut result)?;
    }
    Ok(result)
}

fn read_aligned(slice: &mut SliceData, target: &mut Vec<u8>) -> Result<Option<Cell>> {
    let bits = slice.remaining_bits();
    if bits % 8 != 0 {
        return Err(CellError::UnalignedSnakeData.into());
    }
    target.extend_from_slice(&slice.get_next_bytes(bits / 8)?);
    Ok(slice.reference_opt(0))
}

/// Dictionary key for 8-bit indexed dictionaries
pub fn uint8_key(index: u8) -> Result<SliceData> {
    let mut key = BuilderData::new();
    key.append_u8(index)?;
    SliceData::load_builder(key)
}

pub fn store_uint256(builder: &mut BuilderData, value: &BigUint) -> Result<()> {
    if value.bits() > 256 {
        return Err(CellError::IntegerOverflow.into());
    }
    let bytes = value.to_bytes_be();
    let mut buffer = [0u8; 32];
    buffer[32 - bytes.len()..].copy_from_slice(&bytes);
    builder.append_raw(&buffer, 256)?;
    Ok(())
}

pub fn load_uint256(slice: &mut SliceData) -> Result<BigUint> {
    let bytes = slice.get_next_bytes(32)?;
    Ok(BigUint::from_bytes_be(&bytes))
}

#[derive(thiserror::Error, Debug, Copy, Clone)]
enum CellError {
    #[error("No free reference for continuation cell")]
    NoSpaceForContinuation,
    #[error("Snake data is not byte aligned")]
    UnalignedSnakeData,
    #[error("Integer does not fit into 256 bits")]
    IntegerOverflow,
}
