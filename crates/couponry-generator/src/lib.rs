//! Coupon code generation.
//!
//! This crate decides whether a batch of unique coupon codes can be issued
//! from a code space ([`GenerationPolicy`]), samples candidate codes
//! ([`CodeSampler`]) and orchestrates the whole batch against a
//! [`CouponStore`](couponry_core::CouponStore) ([`CouponGenerator`]).

pub mod generator;
pub mod policy;
pub mod sampler;

pub use generator::{
    CouponGenerator, GeneratorSettings, MAX_CODE_LENGTH, MAX_FULL_CODE_LENGTH, MIN_CODE_LENGTH,
};
pub use policy::{GenerationPolicy, PercentageGenerationPolicy};
pub use sampler::{CodeSampler, RandomCodeSampler};

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, couponry_core::GenerationError>;
