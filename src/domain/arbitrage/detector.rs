//! Opportunity scanner: pulls two independent quotes per configured
//! token pair and turns qualifying spreads into stored opportunities.

use chrono::Duration as ChronoDuration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{NetworkCfg, ScannerCfg, TokenPairCfg};
use crate::domain::arbitrage::NewOpportunity;
use crate::infrastructure::dex::QuoteSource;
use crate::infrastructure::MemStorage;

/// Simulated notional the advertised profit is sized against. This is a
/// price-signal multiplier, not a capital-sizing model.
const NOTIONAL_UNITS: f64 = 100.0;
const CAPITAL_FLOOR: f64 = 10000.0;
const CAPITAL_SCALE: f64 = 1000.0;

/// Normalized price discrepancy between two quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub price_diff: f64,
    pub avg_price: f64,
    pub profit_percent: f64,
}

/// Spread between two quoted prices, or `None` when the prices are
/// identical or unusable.
pub fn compute_spread(price_a: f64, price_b: f64) -> Option<Spread> {
    let price_diff = (price_a - price_b).abs();
    let avg_price = (price_a + price_b) / 2.0;
    if price_diff <= 0.0 || avg_price <= 0.0 {
        return None;
    }
    Some(Spread {
        price_diff,
        avg_price,
        profit_percent: price_diff / avg_price * 100.0,
    })
}

pub struct OpportunityScanner {
    cfg: ScannerCfg,
    networks: Vec<NetworkCfg>,
    source_a: Arc<dyn QuoteSource>,
    source_b: Arc<dyn QuoteSource>,
    storage: Arc<MemStorage>,
    running: AtomicBool,
    in_flight: AtomicBool,
}

impl OpportunityScanner {
    pub fn new(
        cfg: ScannerCfg,
        networks: Vec<NetworkCfg>,
        source_a: Arc<dyn QuoteSource>,
        source_b: Arc<dyn QuoteSource>,
        storage: Arc<MemStorage>,
    ) -> Self {
        Self {
            cfg,
            networks,
            source_a,
            source_b,
            storage,
            running: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Start the scan loop: one cycle immediately, then one per
    /// interval. A cycle still in flight when the next tick fires is not
    /// overlapped; that tick is skipped.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        info!(
            "🔍 Starting opportunity scanning every {}ms",
            self.cfg.scan_interval_ms
        );
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(self.cfg.scan_interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    info!("⏹️ Stopped opportunity scanning");
                    break;
                }
                if self
                    .in_flight
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    debug!("Previous scan cycle still running, skipping tick");
                    continue;
                }
                self.scan().await;
                self.in_flight.store(false, Ordering::SeqCst);
            }
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_scanning(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One full cycle over every configured network and pair. Failures
    /// are swallowed at pair granularity; the loop itself never errors.
    pub async fn scan(&self) {
        for network in &self.networks {
            if !self.storage.network_is_active(&network.name).await {
                debug!("Network {} inactive, skipping scan", network.name);
                continue;
            }
            for pair in &network.pairs {
                self.scan_pair(network, pair).await;
            }
        }
    }

    async fn scan_pair(&self, network: &NetworkCfg, pair: &TokenPairCfg) {
        let amount = self.cfg.probe_amount.as_str();
        let (quote_a, quote_b) = tokio::join!(
            self.source_a
                .quote(network.chain_id, &pair.address_a, &pair.address_b, amount),
            self.source_b
                .quote(network.chain_id, &pair.address_a, &pair.address_b, amount),
        );

        let (quote_a, quote_b) = match (quote_a, quote_b) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    "Quote unavailable for {}/{} on {}: {}",
                    pair.symbol_a, pair.symbol_b, network.name, e
                );
                return;
            }
        };

        let Some(spread) = compute_spread(quote_a.output_amount, quote_b.output_amount) else {
            return;
        };
        if spread.profit_percent < self.cfg.min_profit_percent {
            return;
        }

        // The cheaper quote is the buy side; ties go to source A.
        let buy_on_a = quote_a.output_amount <= quote_b.output_amount;
        let (buy_label, sell_label) = if buy_on_a {
            (self.source_a.label(), self.source_b.label())
        } else {
            (self.source_b.label(), self.source_a.label())
        };
        let (buy_price, sell_price) = if buy_on_a {
            (quote_a.output_amount, quote_b.output_amount)
        } else {
            (quote_b.output_amount, quote_a.output_amount)
        };

        let opportunity = self
            .storage
            .create_opportunity(NewOpportunity {
                network: network.name.clone(),
                token_a: pair.address_a.clone(),
                token_b: pair.address_b.clone(),
                symbol_a: pair.symbol_a.clone(),
                symbol_b: pair.symbol_b.clone(),
                dex_a: buy_label.to_string(),
                dex_b: sell_label.to_string(),
                price_a: buy_price,
                price_b: sell_price,
                profit_amount: spread.price_diff * NOTIONAL_UNITS,
                profit_percent: spread.profit_percent,
                min_capital: CAPITAL_FLOOR.max(spread.price_diff * CAPITAL_SCALE),
                gas_estimate: quote_a.gas_estimate,
                ttl: ChronoDuration::seconds(self.cfg.opportunity_ttl_secs),
            })
            .await;

        info!(
            "💰 Found arbitrage: {}/{} on {} - {:.2}% profit ({} -> {})",
            pair.symbol_a,
            pair.symbol_b,
            network.name,
            opportunity.profit_percent,
            opportunity.dex_a,
            opportunity.dex_b
        );
    }
}
