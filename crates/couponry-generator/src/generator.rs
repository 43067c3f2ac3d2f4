use crate::policy::{GenerationPolicy, PercentageGenerationPolicy};
use crate::sampler::{CodeSampler, RandomCodeSampler};
use crate::Result;
use couponry_core::{
    Alphabet, Coupon, CouponCode, CouponStore, GenerationError, GenerationInstruction,
    PromotionId, StoreError,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// Shortest supported length of the random part of a code.
pub const MIN_CODE_LENGTH: usize = 1;
/// Longest supported length of the random part of a code.
pub const MAX_CODE_LENGTH: usize = 40;
/// Longest full code, prefix and suffix included, a store has to hold.
pub const MAX_FULL_CODE_LENGTH: usize = 255;

pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Tunables of a [`CouponGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct GeneratorSettings {
    /// How many times a batch is regenerated after the store reports that a
    /// code was taken by a concurrent writer.
    #[builder(default = DEFAULT_MAX_CONFLICT_RETRIES)]
    pub max_conflict_retries: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Generates batches of unique coupon codes for a promotion.
///
/// The generator wraps a [`CouponStore`], a [`GenerationPolicy`] and a
/// [`CodeSampler`] to:
/// - reject instructions the code space cannot satisfy before touching the store
/// - sample codes until each one is unique in the store and in the batch
/// - persist the whole batch with a single atomic save
///
/// The uniqueness check and the save are not atomic, so the store must reject
/// duplicate codes itself. A `Conflict` from the store regenerates the batch,
/// up to [`GeneratorSettings::max_conflict_retries`] times.
pub struct CouponGenerator<S, P, C> {
    store: Arc<S>,
    policy: P,
    sampler: C,
    settings: GeneratorSettings,
}

impl<S: CouponStore> CouponGenerator<S, PercentageGenerationPolicy, RandomCodeSampler> {
    /// Creates a generator whose policy and sampler share `alphabet`.
    pub fn with_threshold(store: S, threshold: f64, alphabet: Alphabet) -> Result<Self> {
        let policy = PercentageGenerationPolicy::with_alphabet(threshold, &alphabet)?;
        Ok(Self::new(store, policy, RandomCodeSampler::new(alphabet)))
    }
}

impl<S: CouponStore, P: GenerationPolicy, C: CodeSampler> CouponGenerator<S, P, C> {
    pub fn new(store: S, policy: P, sampler: C) -> Self {
        Self::with_shared_store(Arc::new(store), policy, sampler)
    }

    /// Creates a generator over a store that is also used elsewhere.
    pub fn with_shared_store(store: Arc<S>, policy: P, sampler: C) -> Self {
        Self {
            store,
            policy,
            sampler,
            settings: GeneratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> GeneratorSettings {
        self.settings
    }

    /// Returns how many of the requested coupons can currently be generated.
    pub async fn possible_generation_amount(
        &self,
        instruction: &GenerationInstruction,
    ) -> Result<u64> {
        Self::validate(instruction)?;
        let existing = self.store.count_matching(&instruction.pattern()?).await?;
        self.policy.possible_generation_amount(instruction, existing)
    }

    /// Generates and persists `amount` new coupons for `promotion`.
    ///
    /// Fails with `InvalidParameter` or `GenerationInfeasible` without
    /// writing anything. Store errors other than `Conflict` propagate as-is.
    pub async fn generate(
        &self,
        promotion: PromotionId,
        instruction: &GenerationInstruction,
    ) -> Result<Vec<Coupon>> {
        let (amount, code_length) = Self::validate(instruction)?;

        let mut attempt = 0;
        loop {
            match self
                .generate_batch(promotion, instruction, amount, code_length)
                .await
            {
                Err(GenerationError::Store(StoreError::Conflict(code)))
                    if attempt < self.settings.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(
                        %promotion,
                        %code,
                        attempt,
                        "coupon code taken by a concurrent writer, regenerating batch"
                    );
                }
                result => return result,
            }
        }
    }

    /// Checks the bounds that hold regardless of the state of the store.
    fn validate(instruction: &GenerationInstruction) -> Result<(u64, usize)> {
        let amount = instruction.required_amount()?;
        let code_length = instruction.required_code_length()?;

        if amount == 0 {
            return Err(GenerationError::InvalidParameter(
                "amount must be positive".to_string(),
            ));
        }

        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code_length) {
            return Err(GenerationError::InvalidParameter(format!(
                "code length must be between {} and {}, got {}",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH, code_length
            )));
        }

        let full_length = instruction.pattern()?.full_length();
        if full_length > MAX_FULL_CODE_LENGTH {
            return Err(GenerationError::InvalidParameter(format!(
                "prefix, code and suffix must not exceed {} characters, got {}",
                MAX_FULL_CODE_LENGTH, full_length
            )));
        }

        Ok((amount, code_length))
    }

    async fn generate_batch(
        &self,
        promotion: PromotionId,
        instruction: &GenerationInstruction,
        amount: u64,
        code_length: usize,
    ) -> Result<Vec<Coupon>> {
        let existing = self.store.count_matching(&instruction.pattern()?).await?;
        if !self.policy.is_generation_possible(instruction, existing)? {
            let possible = self.policy.possible_generation_amount(instruction, existing)?;
            return Err(GenerationError::GenerationInfeasible {
                requested: amount,
                code_length,
                possible,
            });
        }

        debug!(
            %promotion,
            amount,
            code_length,
            existing,
            alphabet = %self.sampler.alphabet(),
            "generating coupon batch"
        );

        let mut reserved = HashSet::new();
        let mut coupons = Vec::new();
        for _ in 0..amount {
            let code = self.unique_code(instruction, code_length, &reserved).await?;
            reserved.insert(code.clone());
            coupons.push(Coupon::new(
                promotion,
                code,
                instruction.usage_limit,
                instruction.expires_at,
            ));
        }

        self.store.save_all(&coupons).await?;

        info!(%promotion, amount, code_length, "generated coupon batch");

        Ok(coupons)
    }

    /// Samples until a code is free both in the store and in this batch.
    async fn unique_code(
        &self,
        instruction: &GenerationInstruction,
        code_length: usize,
        reserved: &HashSet<CouponCode>,
    ) -> Result<CouponCode> {
        loop {
            let body = self.sampler.sample(code_length);
            let code = CouponCode::compose(instruction.prefix(), &body, instruction.suffix());

            if reserved.contains(&code) || self.store.find_by_code(&code).await?.is_some() {
                debug!(%code, "discarding colliding coupon code");
                continue;
            }

            return Ok(code);
        }
    }
}
