//! Core types and traits for coupon code generation.
//!
//! This crate provides the data model shared by the generator and the
//! storage backends: generation instructions, coupons, the code alphabet,
//! and the [`CouponStore`] collaborator contract.

pub mod alphabet;
pub mod coupon;
pub mod error;
pub mod instruction;
pub mod store;

pub use alphabet::Alphabet;
pub use coupon::{Coupon, CouponCode, PromotionId};
pub use error::{GenerationError, StoreError};
pub use instruction::{CodePattern, GenerationInstruction};
pub use store::CouponStore;
