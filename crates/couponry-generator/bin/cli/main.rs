mod cli;

use crate::cli::{LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use couponry_core::{CouponStore, GenerationInstruction, PromotionId};
use couponry_generator::{CouponGenerator, GeneratorSettings};
use couponry_storage::{InMemoryCouponStore, MySqlCouponStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    init_tracing(config.log_format);

    info!(
        promotion_id = config.promotion_id,
        amount = config.amount,
        code_length = config.code_length,
        alphabet = %couponry_core::Alphabet::from(config.alphabet),
        threshold = config.threshold,
        storage_backend = %config.storage,
        "starting coupon generation"
    );

    match config.storage {
        StorageBackendArg::InMemory => run(&config, InMemoryCouponStore::new()).await,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlCouponStore::connect(mysql_dsn)
                .await
                .context("failed to connect to mysql")?;
            run(&config, store).await
        }
    }
}

fn init_tracing(format: LogFormatArg) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

fn instruction(config: &CLI) -> GenerationInstruction {
    GenerationInstruction {
        amount: Some(config.amount),
        code_length: Some(config.code_length),
        prefix: config.prefix.clone(),
        suffix: config.suffix.clone(),
        usage_limit: config.usage_limit,
        expires_at: config.expires_at,
    }
}

async fn run<S: CouponStore>(config: &CLI, store: S) -> anyhow::Result<()> {
    let settings = GeneratorSettings::builder()
        .max_conflict_retries(config.max_conflict_retries)
        .build();
    let generator = CouponGenerator::with_threshold(store, config.threshold, config.alphabet.into())?
        .with_settings(settings);
    let instruction = instruction(config);

    if config.check_only {
        let possible = generator.possible_generation_amount(&instruction).await?;
        println!("{possible}");
        return Ok(());
    }

    let coupons = generator
        .generate(PromotionId::new(config.promotion_id), &instruction)
        .await?;

    for coupon in &coupons {
        println!("{}", coupon.code());
    }

    Ok(())
}
