use crate::Result;
use couponry_core::{Alphabet, GenerationError, GenerationInstruction};

/// Decides how many new codes may be issued from a code space.
///
/// Implementations are pure: the number of already issued codes matching the
/// instruction's pattern is supplied by the caller.
pub trait GenerationPolicy: Send + Sync + 'static {
    /// Whether `amount` more codes fit next to `existing` matching codes.
    fn is_generation_possible(
        &self,
        instruction: &GenerationInstruction,
        existing: u64,
    ) -> Result<bool>;

    /// The largest amount, up to the requested one, that can still be issued.
    fn possible_generation_amount(
        &self,
        instruction: &GenerationInstruction,
        existing: u64,
    ) -> Result<u64>;
}

/// Allows issuing codes until a fixed fraction of the code space is used.
///
/// The headroom left by the threshold keeps the collision rate of random
/// sampling low as the space fills up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentageGenerationPolicy {
    threshold: f64,
    alphabet_size: u64,
}

impl PercentageGenerationPolicy {
    /// Creates a policy for the default alphabet.
    pub fn new(threshold: f64) -> Result<Self> {
        Self::with_alphabet(threshold, &Alphabet::default())
    }

    /// Creates a policy for codes drawn from `alphabet`.
    ///
    /// `threshold` must lie in `(0, 1]`.
    pub fn with_alphabet(threshold: f64, alphabet: &Alphabet) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(GenerationError::InvalidParameter(format!(
                "threshold must be in (0, 1], got {threshold}"
            )));
        }

        Ok(Self {
            threshold,
            alphabet_size: alphabet.len() as u64,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn alphabet_size(&self) -> u64 {
        self.alphabet_size
    }

    /// Number of codes of `code_length` this policy allows in total.
    ///
    /// This is the exact floor of the code space times the threshold, as the
    /// threshold is represented in binary. Saturates at `u64::MAX` when the
    /// code space does not fit in a `u64`.
    pub fn capacity(&self, code_length: usize) -> u64 {
        let total = u32::try_from(code_length)
            .ok()
            .and_then(|exp| self.alphabet_size.checked_pow(exp));

        match total {
            Some(total) => scale_floor(total, self.threshold),
            None => u64::MAX,
        }
    }

    /// Codes still allowed once `existing` matching codes are issued.
    pub fn remaining(&self, code_length: usize, existing: u64) -> u64 {
        self.capacity(code_length).saturating_sub(existing)
    }
}

/// Computes `floor(total * fraction)` without rounding, for `fraction` in `(0, 1]`.
fn scale_floor(total: u64, fraction: f64) -> u64 {
    let bits = fraction.to_bits();
    let biased_exponent = ((bits >> 52) & 0x7ff) as i32;
    let significand = bits & ((1 << 52) - 1);

    // fraction == mantissa * 2^exponent, and exponent is negative below 2.0
    let (mantissa, exponent) = if biased_exponent == 0 {
        (significand, -1074)
    } else {
        (significand | (1 << 52), biased_exponent - 1075)
    };

    let product = u128::from(total) * u128::from(mantissa);
    let scaled = product.checked_shr(exponent.unsigned_abs()).unwrap_or(0);

    u64::try_from(scaled).unwrap_or(u64::MAX).min(total)
}

impl GenerationPolicy for PercentageGenerationPolicy {
    fn is_generation_possible(
        &self,
        instruction: &GenerationInstruction,
        existing: u64,
    ) -> Result<bool> {
        let amount = instruction.required_amount()?;
        let code_length = instruction.required_code_length()?;

        Ok(amount <= self.remaining(code_length, existing))
    }

    fn possible_generation_amount(
        &self,
        instruction: &GenerationInstruction,
        existing: u64,
    ) -> Result<u64> {
        let amount = instruction.required_amount()?;
        let code_length = instruction.required_code_length()?;

        Ok(amount.min(self.remaining(code_length, existing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PercentageGenerationPolicy {
        PercentageGenerationPolicy::new(0.5).unwrap()
    }

    fn instruction(amount: u64, code_length: usize) -> GenerationInstruction {
        GenerationInstruction::builder()
            .amount(amount)
            .code_length(code_length)
            .build()
    }

    #[test]
    fn capacity_is_half_of_single_hex_digit_space() {
        assert_eq!(policy().alphabet_size(), 16);
        assert_eq!(policy().capacity(1), 8);
        assert_eq!(policy().capacity(2), 128);
    }

    #[test]
    fn generation_is_not_possible_above_capacity() {
        assert!(!policy().is_generation_possible(&instruction(17, 1), 0).unwrap());
    }

    #[test]
    fn generation_is_possible_below_capacity() {
        assert!(policy().is_generation_possible(&instruction(7, 1), 0).unwrap());
        assert!(policy().is_generation_possible(&instruction(8, 1), 0).unwrap());
    }

    #[test]
    fn possible_amount_is_reduced_by_existing_codes() {
        assert_eq!(
            policy().possible_generation_amount(&instruction(17, 1), 1).unwrap(),
            7
        );
    }

    #[test]
    fn possible_amount_is_capped_by_requested_amount() {
        assert_eq!(
            policy().possible_generation_amount(&instruction(3, 1), 5).unwrap(),
            3
        );
    }

    #[test]
    fn possible_amount_never_goes_below_zero() {
        assert_eq!(
            policy().possible_generation_amount(&instruction(3, 1), 100).unwrap(),
            0
        );
        assert!(!policy().is_generation_possible(&instruction(1, 1), 100).unwrap());
    }

    #[test]
    fn possible_amount_is_bounded_for_every_supported_length() {
        let policy = policy();
        for code_length in 1..=40 {
            for existing in [0, 1, 7, 1_000, u64::MAX] {
                let possible = policy
                    .possible_generation_amount(&instruction(50, code_length), existing)
                    .unwrap();
                assert!(possible <= 50, "length {code_length}, existing {existing}");
            }
        }
    }

    #[test]
    fn possible_amount_is_non_increasing_in_existing_count() {
        let policy = policy();
        let instruction = instruction(100, 2);
        let mut previous = u64::MAX;
        for existing in 0..200 {
            let possible = policy
                .possible_generation_amount(&instruction, existing)
                .unwrap();
            assert!(possible <= previous);
            previous = possible;
        }
    }

    #[test]
    fn huge_code_space_saturates_instead_of_overflowing() {
        let policy = policy();
        assert_eq!(policy.capacity(40), u64::MAX);
        assert_eq!(
            policy
                .possible_generation_amount(&instruction(u64::MAX, 40), 0)
                .unwrap(),
            u64::MAX
        );
        assert_eq!(
            policy
                .possible_generation_amount(&instruction(u64::MAX, 40), 10)
                .unwrap(),
            u64::MAX - 10
        );
        assert!(policy
            .is_generation_possible(&instruction(1_000_000, 40), 1_000)
            .unwrap());
    }

    #[test]
    fn largest_exact_space_is_not_saturated() {
        // 16^15 = 2^60 still fits in a u64
        assert_eq!(policy().capacity(15), 1 << 59);
        assert_eq!(policy().capacity(16), u64::MAX);
    }

    #[test]
    fn capacity_is_exact_beyond_float_precision() {
        // 62^10 needs 60 bits, more than an f64 mantissa holds
        let low = PercentageGenerationPolicy::with_alphabet(0.3, &Alphabet::ALPHANUMERIC).unwrap();
        let high = PercentageGenerationPolicy::with_alphabet(0.7, &Alphabet::ALPHANUMERIC).unwrap();

        assert_eq!(low.capacity(10), 251_789_809_760_502_057);
        assert_eq!(high.capacity(10), 587_509_556_107_838_119);
    }

    #[test]
    fn full_threshold_allows_the_whole_space() {
        let policy = PercentageGenerationPolicy::with_alphabet(1.0, &Alphabet::ALPHANUMERIC).unwrap();
        assert_eq!(policy.capacity(10), 839_299_365_868_340_224);
    }

    #[test]
    fn tiny_threshold_rounds_down_to_zero() {
        let policy = PercentageGenerationPolicy::new(f64::MIN_POSITIVE).unwrap();
        assert_eq!(policy.capacity(15), 0);
        assert!(!policy.is_generation_possible(&instruction(1, 15), 0).unwrap());
    }

    #[test]
    fn alphanumeric_alphabet_grows_the_space() {
        let policy = PercentageGenerationPolicy::with_alphabet(1.0, &Alphabet::ALPHANUMERIC).unwrap();
        assert_eq!(policy.capacity(1), 62);
        assert_eq!(policy.capacity(2), 3_844);
    }

    #[test]
    fn missing_fields_are_invalid() {
        let no_length = GenerationInstruction::builder().amount(1).build();
        let no_amount = GenerationInstruction {
            amount: None,
            code_length: Some(4),
            ..GenerationInstruction::default()
        };

        for instruction in [no_length, no_amount] {
            assert!(matches!(
                policy().is_generation_possible(&instruction, 0),
                Err(GenerationError::InvalidParameter(_))
            ));
            assert!(matches!(
                policy().possible_generation_amount(&instruction, 0),
                Err(GenerationError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(PercentageGenerationPolicy::new(1.0).is_ok());
        for threshold in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                PercentageGenerationPolicy::new(threshold),
                Err(GenerationError::InvalidParameter(_))
            ));
        }
    }
}
