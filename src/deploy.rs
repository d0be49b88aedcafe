use std::convert::TryFrom;

use anyhow::Result;
use num_bigint::BigUint;
use ton_block::{Deserializable, MsgAddrStd, MsgAddressInt, Serializable, StateInit};
use ton_multisig_utils::{load_uint256, store_uint256, uint8_key};
use ton_types::{BuilderData, Cell, HashmapE, HashmapType, IBitstring, SliceData};

use crate::constants::*;
use crate::errors::*;
use crate::models::*;

/// Persistent data of the multisig wallet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigData {
    pub next_order_seqno: BigUint,
    pub threshold: u8,
    pub signers: Vec<MsgAddressInt>,
    pub proposers: Vec<MsgAddressInt>,
    pub allow_arbitrary_seqno: bool,
}

impl MultisigData {
    /// Initial data of a new wallet
    pub fn new(config: &MultisigConfig) -> Result<Self> {
        validate_config(config)?;
        Ok(Self {
            next_order_seqno: BigUint::default(),
            threshold: config.threshold,
            signers: config.signers.clone(),
            proposers: config.proposers.clone(),
            allow_arbitrary_seqno: config.allow_arbitrary_seqno,
        })
    }

    pub fn config(&self) -> MultisigConfig {
        MultisigConfig {
            threshold: self.threshold,
            signers: self.signers.clone(),
            proposers: self.proposers.clone(),
            allow_arbitrary_seqno: self.allow_arbitrary_seqno,
        }
    }

    pub fn serialize(&self) -> Result<Cell> {
        let signers = match addresses_to_dict(&self.signers)?.data() {
            Some(root) => root.clone(),
            None => return Err(MultisigError::InvalidConfig("no signers").into()),
        };
        let signers_num = u8::try_from(self.signers.len())
            .map_err(|_| MultisigError::InvalidConfig("too many signers"))?;

        let mut data = BuilderData::new();
        store_uint256(&mut data, &self.next_order_seqno)?;
        data.append_u8(self.threshold)?
            .checked_append_reference(signers)?
            .append_u8(signers_num)?;
        addresses_to_dict(&self.proposers)?.write_to(&mut data)?;
        data.append_bit_bool(self.allow_arbitrary_seqno)?;
        data.into_cell()
    }
}

impl TryFrom<&Cell> for MultisigData {
    type Error = anyhow::Error;

    fn try_from(data: &Cell) -> Result<Self, Self::Error> {
        let mut cs = SliceData::load_cell_ref(data)?;

        let next_order_seqno = load_uint256(&mut cs)?;
        let threshold = cs.get_next_byte()?;
        let signers = dict_to_addresses(Some(cs.checked_drain_reference()?))?;
        let signers_num = cs.get_next_byte()?;
        if signers.len() != signers_num as usize {
            return Err(MultisigError::InvalidConfig("signers count mismatch").into());
        }
        let proposers = dict_to_addresses(cs.get_next_dictionary()?)?;

        Ok(Self {
            next_order_seqno,
            threshold,
            signers,
            proposers,
            allow_arbitrary_seqno: cs.get_next_bit()?,
        })
    }
}

/// Builds the deployment message of a new multisig wallet with the given code
pub fn deploy_multisig(config: &MultisigConfig, code: Cell) -> Result<ContractTransferData> {
    let data = MultisigData::new(config)?.serialize()?;

    let state_init = StateInit {
        code: Some(code),
        data: Some(data),
        ..Default::default()
    }
    .serialize()?;

    let send_to_address = MsgAddressInt::AddrStd(MsgAddrStd {
        anycast: None,
        workchain_id: DEFAULT_WORKCHAIN,
        address: state_init.repr_hash().into(),
    });

    let mut payload = BuilderData::new();
    payload.append_u32(0)?.append_u64(0)?;

    log::debug!("Multisig deploy address: {send_to_address}");

    Ok(ContractTransferData {
        send_to_address,
        state_init: Some(state_init),
        payload: payload.into_cell()?,
    })
}

fn validate_config(config: &MultisigConfig) -> Result<()> {
    let error = if config.signers.is_empty() {
        "no signers"
    } else if config.signers.len() > MAX_MEMBERS {
        "too many signers"
    } else if config.proposers.len() > MAX_MEMBERS {
        "too many proposers"
    } else if config.threshold == 0 {
        "threshold must be positive"
    } else if config.threshold as usize > config.signers.len() {
        "threshold is greater than the number of signers"
    } else {
        return Ok(());
    };
    Err(MultisigError::InvalidConfig(error).into())
}

/// `uint8 -> MsgAddressInt` dictionary with inline values
fn addresses_to_dict(addresses: &[MsgAddressInt]) -> Result<HashmapE> {
    let mut dict = HashmapE::with_bit_len(SIGNER_INDEX_BITS);
    for (i, address) in addresses.iter().enumerate() {
        let index =
            u8::try_from(i).map_err(|_| MultisigError::InvalidConfig("too many addresses"))?;
        dict.set_builder(uint8_key(index)?, &address.write_to_new_cell()?)?;
    }
    Ok(dict)
}

fn dict_to_addresses(root: Option<Cell>) -> Result<Vec<MsgAddressInt>> {
    let dict = HashmapE::with_hashmap(SIGNER_INDEX_BITS, root);

    let mut entries = Vec::new();
    for item in dict.iter() {
        let (key, mut value) = item?;
        let index = SliceData::load_builder(key)?.get_next_byte()?;
        entries.push((index, MsgAddressInt::construct_from(&mut value)?));
    }
    entries.sort_by_key(|(index, _)| *index);

    Ok(entries.into_iter().map(|(_, address)| address).collect())
}
