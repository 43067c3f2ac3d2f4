use crate::error::GenerationError;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Amount of coupons requested when the caller does not say otherwise.
pub const DEFAULT_AMOUNT: u64 = 5;

/// Describes a single coupon generation request.
///
/// `amount` and `code_length` are optional here because the value is often
/// assembled from user input; they are checked when the instruction is used.
/// `prefix` and `suffix` keep `Some("")` distinct from `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct GenerationInstruction {
    /// How many coupons to generate.
    #[builder(default = Some(DEFAULT_AMOUNT), setter(strip_option))]
    pub amount: Option<u64>,
    /// Length of the random part of each code.
    #[builder(default, setter(strip_option))]
    pub code_length: Option<usize>,
    /// Literal prepended to every code.
    #[builder(default, setter(into, strip_option))]
    pub prefix: Option<String>,
    /// Literal appended to every code.
    #[builder(default, setter(into, strip_option))]
    pub suffix: Option<String>,
    /// Copied onto every generated coupon.
    #[builder(default, setter(strip_option))]
    pub usage_limit: Option<u32>,
    /// Copied onto every generated coupon.
    #[builder(default, setter(strip_option))]
    pub expires_at: Option<Timestamp>,
}

impl Default for GenerationInstruction {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GenerationInstruction {
    /// Returns the amount, failing when it is absent.
    pub fn required_amount(&self) -> Result<u64, GenerationError> {
        self.amount.ok_or_else(|| GenerationError::missing("amount"))
    }

    /// Returns the code length, failing when it is absent.
    pub fn required_code_length(&self) -> Result<usize, GenerationError> {
        self.code_length
            .ok_or_else(|| GenerationError::missing("code length"))
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// The pattern of existing codes that compete with this instruction.
    pub fn pattern(&self) -> Result<CodePattern, GenerationError> {
        Ok(CodePattern {
            code_length: self.required_code_length()?,
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
        })
    }
}

/// Selects stored codes by shape: `prefix`, then `code_length` characters,
/// then `suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodePattern {
    pub code_length: usize,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl CodePattern {
    pub fn new(code_length: usize, prefix: Option<String>, suffix: Option<String>) -> Self {
        Self {
            code_length,
            prefix,
            suffix,
        }
    }

    /// Total number of characters of a matching code.
    pub fn full_length(&self) -> usize {
        let affix = |s: &Option<String>| s.as_deref().map_or(0, |s| s.chars().count());
        affix(&self.prefix) + self.code_length + affix(&self.suffix)
    }

    pub fn matches(&self, code: &str) -> bool {
        code.chars().count() == self.full_length()
            && self.prefix.as_deref().map_or(true, |p| code.starts_with(p))
            && self.suffix.as_deref().map_or(true, |s| code.ends_with(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instruction() {
        let instruction = GenerationInstruction::default();
        assert_eq!(instruction.amount, Some(5));
        assert_eq!(instruction.code_length, None);
        assert_eq!(instruction.prefix, None);
        assert_eq!(instruction.suffix, None);
        assert_eq!(instruction.usage_limit, None);
        assert_eq!(instruction.expires_at, None);
    }

    #[test]
    fn builder_sets_fields() {
        let instruction = GenerationInstruction::builder()
            .amount(10)
            .code_length(6)
            .prefix("PRE-")
            .suffix("")
            .usage_limit(2)
            .build();

        assert_eq!(instruction.required_amount().unwrap(), 10);
        assert_eq!(instruction.required_code_length().unwrap(), 6);
        assert_eq!(instruction.prefix(), Some("PRE-"));
        assert_eq!(instruction.suffix(), Some(""));
        assert_eq!(instruction.usage_limit, Some(2));
    }

    #[test]
    fn missing_code_length_is_invalid() {
        let err = GenerationInstruction::default().pattern().unwrap_err();
        assert!(matches!(err, GenerationError::InvalidParameter(_)));
    }

    #[test]
    fn missing_amount_is_invalid() {
        let instruction = GenerationInstruction {
            amount: None,
            ..GenerationInstruction::default()
        };
        assert!(matches!(
            instruction.required_amount(),
            Err(GenerationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn pattern_matches_by_shape() {
        let pattern = CodePattern::new(4, Some("PRE-".into()), Some("-X".into()));

        assert_eq!(pattern.full_length(), 10);
        assert!(pattern.matches("PRE-ABCD-X"));
        assert!(!pattern.matches("PRE-ABCDE-X"));
        assert!(!pattern.matches("XXX-ABCD-X"));
        assert!(!pattern.matches("PRE-ABCD-Y"));
    }

    #[test]
    fn pattern_without_affixes_matches_by_length() {
        let pattern = CodePattern::new(3, None, None);

        assert!(pattern.matches("ABC"));
        assert!(!pattern.matches("ABCD"));
        assert!(!pattern.matches("AB"));
    }

    #[test]
    fn pattern_counts_characters_not_bytes() {
        let pattern = CodePattern::new(2, Some("é".into()), None);
        assert!(pattern.matches("éAB"));
    }
}
