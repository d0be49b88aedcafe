//! Payload builders and parsers for the TON multisig v2 wallet.
//!
//! Orders are bundles of actions proposed to a multisig wallet. This crate
//! packs actions into the cell layout the wallet expects, frames the
//! "new order" and "approve" messages, and decodes pending orders back into
//! readable actions.

pub use ton_multisig_utils as utils;

pub use self::actions::*;
pub use self::address_list::*;
pub use self::constants::*;
pub use self::deploy::*;
pub use self::errors::*;
pub use self::models::*;
pub use self::order::*;
pub use self::parsing::*;

mod actions;
mod address_list;
mod constants;
mod deploy;
mod errors;
mod models;
mod order;
mod parsing;
