use crate::coupon::{Coupon, CouponCode};
use crate::error::StoreError;
use crate::instruction::CodePattern;
use async_trait::async_trait;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistent home of every issued coupon.
///
/// Backends must enforce code uniqueness at write time: the generator checks
/// candidates with [`find_by_code`](CouponStore::find_by_code) before saving,
/// but two concurrent generations can still race between the check and the
/// write.
#[async_trait]
pub trait CouponStore: Send + Sync + 'static {
    /// Counts stored codes matching the given shape.
    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64>;

    /// Looks up a coupon by its full code.
    /// Returns `None` if the code does not exist.
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>>;

    /// Persists a batch of coupons atomically.
    ///
    /// Returns `Err(Conflict)` and stores nothing if any code already exists.
    async fn save_all(&self, coupons: &[Coupon]) -> Result<()>;
}
