use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of the promotion that owns a batch of coupons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromotionId(i64);

impl PromotionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for PromotionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for PromotionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A full coupon code, including any prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Builds a code from a random body wrapped with an optional prefix and suffix.
    pub fn compose(prefix: Option<&str>, body: &str, suffix: Option<&str>) -> Self {
        let prefix = prefix.unwrap_or_default();
        let suffix = suffix.unwrap_or_default();
        let mut code = String::with_capacity(prefix.len() + body.len() + suffix.len());
        code.push_str(prefix);
        code.push_str(body);
        code.push_str(suffix);
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A promotion coupon as produced by the generator.
///
/// Once handed to a [`CouponStore`](crate::CouponStore) the coupon belongs to
/// the store; the generator never mutates it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    code: CouponCode,
    promotion: PromotionId,
    usage_limit: Option<u32>,
    expires_at: Option<Timestamp>,
}

impl Coupon {
    pub fn new(
        promotion: PromotionId,
        code: CouponCode,
        usage_limit: Option<u32>,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            code,
            promotion,
            usage_limit,
            expires_at,
        }
    }

    pub fn code(&self) -> &CouponCode {
        &self.code
    }

    pub fn promotion(&self) -> PromotionId {
        self.promotion
    }

    pub fn usage_limit(&self) -> Option<u32> {
        self.usage_limit
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }
}
