use thiserror::Error;

/// Errors raised by a [`CouponStore`](crate::CouponStore) backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("coupon code already exists: {0}")]
    Conflict(String),
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out: {0}")]
    Timeout(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Errors returned while evaluating or running a coupon generation.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The instruction is missing a required field or is out of bounds.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The code space cannot hold the requested amount of new codes.
    #[error(
        "cannot generate {requested} unique coupons with code length {code_length}, \
         at most {possible} can be generated"
    )]
    GenerationInfeasible {
        requested: u64,
        code_length: usize,
        possible: u64,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GenerationError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::InvalidParameter(format!("{field} is required"))
    }
}
