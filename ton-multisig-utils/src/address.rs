use anyhow::Result;
use base64::URL_SAFE;
use ton_block::{MsgAddrStd, MsgAddressInt};
use ton_types::AccountId;

use crate::crc::crc_16;

const BOUNCEABLE_TAG: u8 = 0x11;
const NON_BOUNCEABLE_TAG: u8 = 0x51;
const TESTNET_FLAG: u8 = 0x80;

/// Flags of a user-friendly address
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct FriendlyAddressFlags {
    pub bounceable: bool,
    pub testnet: bool,
}

/// Packs std address to the base64 user-friendly format
/// # Arguments
/// `base64_url` - encode with url friendly charset or not
pub fn pack_std_smc_addr(
    base64_url: bool,
    addr: &MsgAddressInt,
    flags: FriendlyAddressFlags,
) -> Result<String> {
    let addr = match addr {
        MsgAddressInt::AddrStd(addr) => addr,
        MsgAddressInt::AddrVar(_) => {
            return Err(AddressConversionError::UnsupportedAddressType.into())
        }
    };

    let mut tag = if flags.bounceable {
        BOUNCEABLE_TAG
    } else {
        NON_BOUNCEABLE_TAG
    };
    if flags.testnet {
        tag |= TESTNET_FLAG;
    }

    let account = addr.address.get_bytestring(0);
    if account.len() != 32 {
        return Err(AddressConversionError::UnsupportedAddressType.into());
    }

    let mut buffer = [0u8; 36];
    buffer[0] = tag;
    buffer[1] = addr.workchain_id as u8;
    buffer[2..34].copy_from_slice(&account);
    let crc = crc_16(&buffer[..34]);
    buffer[34] = (crc >> 8) as u8;
    buffer[35] = (crc & 0xff) as u8;

    Ok(if base64_url {
        base64::encode_config(buffer, URL_SAFE)
    } else {
        base64::encode(buffer)
    })
}

/// Unpacks a user-friendly address in either base64 charset
pub fn unpack_std_smc_addr(packed: &str) -> Result<(MsgAddressInt, FriendlyAddressFlags)> {
    let unpacked = if packed.contains(|c: char| c == '-' || c == '_') {
        base64::decode_config(packed, URL_SAFE)
    } else {
        base64::decode(packed)
    }
    .map_err(|_| AddressConversionError::InvalidBase64)?;

    if unpacked.len() != 36 {
        return Err(AddressConversionError::InvalidPackedLength.into());
    }

    let crc = crc_16(&unpacked[..34]);
    if unpacked[34] as u16 != (crc >> 8) || unpacked[35] as u16 != (crc & 0xff) {
        return Err(AddressConversionError::InvalidChecksum.into());
    }

    let flags = FriendlyAddressFlags {
        bounceable: match unpacked[0] & !TESTNET_FLAG {
            BOUNCEABLE_TAG => true,
            NON_BOUNCEABLE_TAG => false,
            _ => return Err(AddressConversionError::InvalidTag.into()),
        },
        testnet: unpacked[0] & TESTNET_FLAG != 0,
    };

    let address = &unpacked[2..34];
    let address = MsgAddressInt::AddrStd(MsgAddrStd {
        workchain_id: unpacked[1] as i8,
        anycast: None,
        address: AccountId::from_raw(address.to_vec(), address.len() * 8),
    });
    Ok((address, flags))
}

#[derive(thiserror::Error, Debug)]
enum AddressConversionError {
    #[error("Unsupported address type")]
    UnsupportedAddressType,
    #[error("Invalid base64")]
    InvalidBase64,
    #[error("Invalid packed address length")]
    InvalidPackedLength,
    #[error("Invalid checksum")]
    InvalidChecksum,
    #[error("Invalid address tag")]
    InvalidTag,
}
