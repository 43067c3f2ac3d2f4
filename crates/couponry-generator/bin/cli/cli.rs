use clap::{Parser, ValueEnum};
use couponry_core::Alphabet;
use jiff::Timestamp;
use std::fmt::{Display, Formatter};

pub const THRESHOLD_ENV: &str = "COUPONRY_THRESHOLD";
pub const ALPHABET_ENV: &str = "COUPONRY_ALPHABET";
pub const STORAGE_BACKEND_ENV: &str = "COUPONRY_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "COUPONRY_MYSQL_DSN";
pub const MAX_CONFLICT_RETRIES_ENV: &str = "COUPONRY_MAX_CONFLICT_RETRIES";
pub const LOG_FORMAT_ENV: &str = "COUPONRY_LOG_FORMAT";

pub const DEFAULT_THRESHOLD: &str = "0.5";
pub const DEFAULT_MAX_CONFLICT_RETRIES: &str = "3";
pub const DEFAULT_AMOUNT: &str = "5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlphabetArg {
    #[value(name = "hex")]
    Hex,
    #[value(name = "alphanumeric")]
    Alphanumeric,
}

impl From<AlphabetArg> for Alphabet {
    fn from(value: AlphabetArg) -> Self {
        match value {
            AlphabetArg::Hex => Alphabet::HEX_UPPER,
            AlphabetArg::Alphanumeric => Alphabet::ALPHANUMERIC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "coupon-generator", about = "Generates unique promotion coupon codes")]
pub struct CLI {
    /// Promotion that owns the generated coupons.
    #[arg(long)]
    pub promotion_id: i64,

    /// Number of coupons to generate.
    #[arg(long, default_value = DEFAULT_AMOUNT)]
    pub amount: u64,

    /// Length of the random part of each code.
    #[arg(long)]
    pub code_length: usize,

    #[arg(long)]
    pub prefix: Option<String>,

    #[arg(long)]
    pub suffix: Option<String>,

    #[arg(long)]
    pub usage_limit: Option<u32>,

    /// Expiry copied onto every coupon, e.g. `2030-01-01T00:00:00Z`.
    #[arg(long)]
    pub expires_at: Option<Timestamp>,

    /// Only print how many of the requested coupons can be generated.
    #[arg(long)]
    pub check_only: bool,

    /// Fraction of the code space that may be issued.
    #[arg(long, env = THRESHOLD_ENV, default_value = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    #[arg(long, env = ALPHABET_ENV, value_enum, default_value_t = AlphabetArg::Hex)]
    pub alphabet: AlphabetArg,

    #[arg(
        long,
        env = MAX_CONFLICT_RETRIES_ENV,
        default_value = DEFAULT_MAX_CONFLICT_RETRIES,
    )]
    pub max_conflict_retries: u32,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_arguments_with_defaults() {
        let cli = CLI::try_parse_from([
            "coupon-generator",
            "--promotion-id",
            "7",
            "--code-length",
            "8",
        ])
        .unwrap();

        assert_eq!(cli.promotion_id, 7);
        assert_eq!(cli.amount, 5);
        assert_eq!(cli.code_length, 8);
        assert_eq!(cli.threshold, 0.5);
        assert_eq!(cli.alphabet, AlphabetArg::Hex);
        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert!(!cli.check_only);
    }

    #[test]
    fn parses_expiry_timestamp() {
        let cli = CLI::try_parse_from([
            "coupon-generator",
            "--promotion-id",
            "7",
            "--code-length",
            "8",
            "--expires-at",
            "2030-01-01T00:00:00Z",
        ])
        .unwrap();

        assert_eq!(
            cli.expires_at,
            Some("2030-01-01T00:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn mysql_backend_requires_dsn() {
        let result = CLI::try_parse_from([
            "coupon-generator",
            "--promotion-id",
            "7",
            "--code-length",
            "8",
            "--storage",
            "mysql",
        ]);

        assert!(result.is_err());
    }
}
