use anyhow::Result;
use clap::Parser;

use flasharb::app;
use flasharb::config::Config;

#[derive(Parser, Debug)]
#[command(version, about = "Cross-DEX arbitrage scanner and execution service")]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Scan interval in milliseconds (overrides config)
    #[arg(long)]
    scan_interval_ms: Option<u64>,

    /// Minimum profit threshold in percent (overrides config)
    #[arg(long)]
    min_profit_percent: Option<f64>,

    /// Opportunity time-to-live in seconds (overrides config)
    #[arg(long)]
    opportunity_ttl_secs: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut cfg = Config::from_file(&args.config)?;

    // CLI args take priority over the config file
    if let Some(bind) = args.bind {
        cfg.server.bind = bind;
    }
    if let Some(scan_interval_ms) = args.scan_interval_ms {
        cfg.scanner.scan_interval_ms = scan_interval_ms;
    }
    if let Some(min_profit_percent) = args.min_profit_percent {
        cfg.scanner.min_profit_percent = min_profit_percent;
    }
    if let Some(opportunity_ttl_secs) = args.opportunity_ttl_secs {
        cfg.scanner.opportunity_ttl_secs = opportunity_ttl_secs;
    }

    app::run(cfg).await
}
