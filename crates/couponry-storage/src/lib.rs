//! Storage backends for issued coupons.

pub mod memory;
pub mod mysql;

pub use couponry_core::store::{CouponStore, Result};
pub use couponry_core::StoreError;
pub use memory::InMemoryCouponStore;
pub use mysql::MySqlCouponStore;
