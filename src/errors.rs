use num_bigint::BigInt;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Sender is {0}")]
    NotAuthorized(RequiredRole),
    #[error("Order must contain at least one action")]
    EmptyOrder,
    #[error("Too many actions for a single order dictionary: {0}")]
    TooManyActions(usize),
    #[error("Invalid order seqno: {0}")]
    InvalidOrderSeqno(BigInt),
    #[error("Expiration date does not fit into 48 bits: {0}")]
    ExpirationOutOfRange(u64),
    #[error("Amount is too large")]
    AmountTooLarge,
    #[error("Invalid multisig config: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequiredRole {
    Signer,
    SignerOrProposer,
}

impl std::fmt::Display for RequiredRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Signer => "not a signer",
            Self::SignerOrProposer => "not a signer or proposer",
        })
    }
}
