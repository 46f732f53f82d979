use clap::Parser;
use fx_reimburse::core::BlobStorage;
use fx_reimburse::utils::{logger, validation::Validate};
use fx_reimburse::{
    AppConfig, CalculateOutcome, CalculatorSession, CliConfig, LocalStorage, MemoryStorage,
    MultiSourceFetcher, UsageCounter,
};
use reqwest::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, logger::LogFormat::from_json_flag(cli.json_logs));

    tracing::info!("Starting fx-reimburse CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let app_config = match cli
        .validate()
        .and_then(|_| cli.app_config())
        .and_then(|config| config.validate().map(|_| config))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let client = Client::new();
    let fetcher = app_config.build_fetcher(client.clone());

    let outcome = if cli.no_cache {
        run(&cli, &app_config, fetcher, MemoryStorage::new()).await
    } else {
        let storage = LocalStorage::new(app_config.cache_directory().to_string());
        run(&cli, &app_config, fetcher, storage).await
    };

    print_outcome(&outcome);

    if let Some(usage) = &app_config.usage {
        let counter = UsageCounter::with_client(client, usage.endpoint.clone(), usage.secret.clone());
        if let Some(count) = counter.record_use().await {
            println!("🔢 Used {} times", count);
        }
    }

    Ok(())
}

async fn run<S: BlobStorage>(
    cli: &CliConfig,
    config: &AppConfig,
    fetcher: MultiSourceFetcher,
    storage: S,
) -> CalculateOutcome {
    let raw = cli.raw_inputs();
    let mut session = CalculatorSession::with_config(config, fetcher, storage);

    session.set_currencies(&raw.old_ccy, &raw.new_ccy);
    session.set_amounts(&raw.original, &raw.reimbursed);
    session.set_decimals(&raw.decimals);
    if cli.fx.is_some() {
        session.set_rate(&raw.rate);
        session.accept_current_pair();
    }

    session.calculate().await
}

fn print_outcome(outcome: &CalculateOutcome) {
    let view = &outcome.view;

    println!("Remaining ({}): {}", view.old_ccy_tag, view.remaining_old);
    println!("Remaining ({}): {}", view.new_ccy_tag, view.remaining_new);
    println!("Hybrid total {}: {}", view.hybrid_tag, view.hybrid_total);
    if let Some(notice) = &outcome.notice {
        println!("{}", notice);
    }
    println!();
    println!("{}", view.description);
}
