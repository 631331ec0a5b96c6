use basket_transfer::application::config::TransferConfig;
use basket_transfer::application::engine::TransferEngine;
use basket_transfer::domain::basket::BasketId;
use basket_transfer::domain::money::Currency;
use basket_transfer::domain::payload::RequestParameters;
use basket_transfer::domain::ports::{BasketStoreBox, GatewayAction, GatewayResponse};
use basket_transfer::infrastructure::dummy_gateway::DummyGateway;
use basket_transfer::infrastructure::in_memory::{InMemoryBasketStore, InMemoryCatalog};
#[cfg(feature = "storage-rocksdb")]
use basket_transfer::infrastructure::rocksdb::RocksDbBasketStore;
use basket_transfer::interfaces::csv::catalog_reader::CatalogReader;
use basket_transfer::interfaces::csv::item_reader::ItemReader;
use basket_transfer::interfaces::report::write_report;
use chrono::Datelike;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Basket line items CSV (item, product, quantity)
    items: PathBuf,

    /// Product catalog CSV (product, currency, price)
    #[arg(long)]
    catalog: PathBuf,

    /// Card number passed to the gateway
    #[arg(long)]
    card_number: String,

    #[arg(long)]
    expiry_month: Option<u32>,

    #[arg(long)]
    expiry_year: Option<i32>,

    /// Gateway action to run (purchase, authorize, ...)
    #[arg(long, default_value = "purchase")]
    action: String,

    #[arg(long, default_value_t = 1)]
    basket_id: u64,

    #[arg(long)]
    client_ip: Option<String>,

    /// Basket currency
    #[arg(long, env = "TRANSFER_CURRENCY", default_value = "GBP")]
    currency: String,

    /// Redirect responses tolerated before giving up
    #[arg(long, env = "TRANSFER_MAX_REDIRECTS", default_value_t = 10)]
    max_redirects: u32,

    #[arg(long, env = "TRANSFER_REDIRECT_TIMEOUT_MS", default_value_t = 30_000)]
    redirect_timeout_ms: u64,

    #[arg(long, env = "TRANSFER_POLL_INTERVAL_MS", default_value_t = 0)]
    poll_interval_ms: u64,

    /// Redirects the dummy gateway answers with before its final response
    #[arg(long, default_value_t = 0)]
    gateway_redirects: u32,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Result<TransferConfig> {
        let currency = Currency::new(&self.currency).into_diagnostic()?;
        Ok(TransferConfig::default()
            .with_default_currency(currency)
            .with_max_redirects(self.max_redirects)
            .with_redirect_timeout(Duration::from_millis(self.redirect_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms)))
    }

    #[cfg(feature = "storage-rocksdb")]
    fn store(&self) -> Result<BasketStoreBox> {
        match &self.db_path {
            Some(db_path) => {
                let store = RocksDbBasketStore::open(db_path).into_diagnostic()?;
                Ok(Box::new(store))
            }
            None => Ok(Box::new(InMemoryBasketStore::new())),
        }
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    fn store(&self) -> Result<BasketStoreBox> {
        Ok(Box::new(InMemoryBasketStore::new()))
    }

    fn gateway_parameters(&self) -> RequestParameters {
        let expiry_year = self
            .expiry_year
            .unwrap_or_else(|| chrono::Utc::now().year() + 1);
        let mut params = RequestParameters::new().with(
            "card",
            json!({
                "number": self.card_number,
                "expiryMonth": self.expiry_month.unwrap_or(12),
                "expiryYear": expiry_year,
            }),
        );
        if let Some(ip) = &self.client_ip {
            params.insert("clientIp", ip.as_str());
        }
        params
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog_file = File::open(&cli.catalog).into_diagnostic()?;
    let prices = CatalogReader::new(catalog_file)
        .prices()
        .collect::<basket_transfer::error::Result<Vec<_>>>()
        .into_diagnostic()?;
    let catalog = InMemoryCatalog::from_prices(prices);

    let engine = TransferEngine::with_config(cli.store()?, Box::new(catalog), cli.config()?);

    let mut basket = engine.new_basket(BasketId(cli.basket_id));
    let items_file = File::open(&cli.items).into_diagnostic()?;
    for item in ItemReader::new(items_file).items() {
        basket.add_item(item.into_diagnostic()?).into_diagnostic()?;
    }
    engine.save(&mut basket).await.into_diagnostic()?;
    engine.freeze(&mut basket).await.into_diagnostic()?;

    let gateway = DummyGateway::new().with_redirects(cli.gateway_redirects);
    let action = GatewayAction::from(cli.action.as_str());
    let response = engine
        .execute(&mut basket, &gateway, action, cli.gateway_parameters())
        .await
        .into_diagnostic()?;
    info!(successful = response.is_successful(), "transfer finished");

    let stdout = io::stdout();
    write_report(stdout.lock(), &basket).into_diagnostic()?;

    Ok(())
}
