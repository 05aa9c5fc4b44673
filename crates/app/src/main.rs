use std::{error::Error, sync::Arc, time::Duration};

use engine::{
    BudgetTable, CalendarMonthFilter, Engine, LedgerStore, MemoryBudgets, MemoryLedger,
    MonthFilter, PrefixMonthFilter, SystemClock,
};
use settings::{MonthFilterKind, StorageKind};
use sheets::{
    CsvBudgets, CsvLedger, GoogleBudgets, GoogleLedger, ServiceAccountKey, SheetsClient,
};

mod settings;

type Stores = (Arc<dyn LedgerStore>, Arc<dyn BudgetTable>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "jizhang={level},line_bot={level},sheets={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let tz = settings.timezone()?;
    let (ledger, budgets) = build_stores(&settings.storage).await?;
    let month_filter: Arc<dyn MonthFilter> = match settings.app.month_filter {
        MonthFilterKind::Prefix => Arc::new(PrefixMonthFilter),
        MonthFilterKind::Calendar => Arc::new(CalendarMonthFilter),
    };

    let engine = Engine::builder()
        .ledger(ledger)
        .budgets(budgets)
        .clock(Arc::new(SystemClock::new(tz)))
        .month_filter(month_filter)
        .build()?;

    let mut bot = line_bot::Bot::builder()
        .engine(engine)
        .channel(
            &settings.line.channel_secret,
            &settings.line.channel_access_token,
        )
        .timeout(Duration::from_secs(settings.line.timeout_secs));
    if let Some(api_base) = &settings.line.api_base {
        bot = bot.api_base(api_base);
    }

    bot.build()?.run(&settings.bind_address()).await?;
    Ok(())
}

async fn build_stores(
    storage: &settings::Storage,
) -> Result<Stores, Box<dyn Error + Send + Sync>> {
    let stores: Stores = match storage.kind {
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage, the ledger is lost on exit");
            (
                Arc::new(MemoryLedger::default()),
                Arc::new(MemoryBudgets::default()),
            )
        }
        StorageKind::Csv => {
            let dir = &storage.directory;
            tracing::info!("Using CSV storage in {}", dir.display());
            (
                Arc::new(CsvLedger::new(dir.join(format!("{}.csv", storage.ledger_sheet)))),
                Arc::new(CsvBudgets::new(dir.join(format!("{}.csv", storage.budget_sheet)))),
            )
        }
        StorageKind::GoogleSheets => {
            let key = ServiceAccountKey::from_file(&storage.credentials)?;
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(storage.timeout_secs))
                .build()?;

            let client = SheetsClient::new(http, key);
            let client = match (&storage.spreadsheet_id, &storage.spreadsheet_title) {
                (Some(id), _) => client.with_spreadsheet_id(id),
                (None, Some(title)) => client.select_by_title(title).await?,
                (None, None) => {
                    return Err("google_sheets storage needs storage.spreadsheet_id \
                                or storage.spreadsheet_title"
                        .into());
                }
            };

            tracing::info!(
                "Using Google Sheets storage, spreadsheet {}",
                client.spreadsheet_id()
            );
            let ledger = GoogleLedger::new(client.clone(), &storage.ledger_sheet);
            ledger.ensure_header().await?;

            (
                Arc::new(ledger),
                Arc::new(GoogleBudgets::new(client, &storage.budget_sheet)),
            )
        }
    };

    Ok(stores)
}
