use std::fmt::{Display, Formatter};

/// A fixed character set used to build the random part of coupon codes.
///
/// The size of the alphabet determines the size of the code space:
/// a code body of length `n` has `len()^n` possible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    name: &'static str,
    chars: &'static [u8],
}

impl Alphabet {
    /// Upper-case hexadecimal digits, `0-9A-F`.
    pub const HEX_UPPER: Alphabet = Alphabet {
        name: "hex",
        chars: b"0123456789ABCDEF",
    };

    /// Case-sensitive alphanumerics, `0-9A-Za-z`.
    pub const ALPHANUMERIC: Alphabet = Alphabet {
        name: "alphanumeric",
        chars: b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
    };

    /// Returns the characters of the alphabet as ASCII bytes.
    pub fn chars(&self) -> &'static [u8] {
        self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        c.is_ascii() && self.chars.contains(&(c as u8))
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::HEX_UPPER
    }
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hex_is_the_default() {
        assert_eq!(Alphabet::default(), Alphabet::HEX_UPPER);
        assert_eq!(Alphabet::default().len(), 16);
    }

    #[test]
    fn alphanumeric_has_62_characters() {
        assert_eq!(Alphabet::ALPHANUMERIC.len(), 62);
    }

    #[test]
    fn characters_are_unique() {
        for alphabet in [Alphabet::HEX_UPPER, Alphabet::ALPHANUMERIC] {
            let unique: HashSet<_> = alphabet.chars().iter().collect();
            assert_eq!(unique.len(), alphabet.len(), "{alphabet} has duplicates");
        }
    }

    #[test]
    fn contains_is_case_sensitive_for_hex() {
        assert!(Alphabet::HEX_UPPER.contains('A'));
        assert!(!Alphabet::HEX_UPPER.contains('a'));
        assert!(!Alphabet::HEX_UPPER.contains('é'));
    }
}
