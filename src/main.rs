use anyhow::Result;
use inventorist::config::Config;
use inventorist::constants::{ALL_ITEMS, SYNC_COMPLETED, SYNC_UNAVAILABLE};
use inventorist::utils::datetime;
use inventorist::view::CategoryFilter;
use inventorist::{logger, Inventory};

const USAGE: &str = "Usage: inventorist [list|sync|init-config]";

#[tokio::main]
async fn main() -> Result<()> {
    let command = std::env::args().nth(1).unwrap_or_else(|| "list".to_string());

    if command == "init-config" {
        let path = Config::get_default_config_path()?;
        return Config::generate_default_config(path);
    }

    let config = Config::load()?;
    if let Some(path) = logger::init(&config.logging)? {
        log::info!("📝 Logging to {}", path.display());
    }

    let mut inventory = Inventory::open(&config).await?;

    match command.as_str() {
        "list" => list(&mut inventory).await,
        "sync" => sync(&inventory).await,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

async fn list(inventory: &mut Inventory) -> Result<()> {
    let title = match inventory.query().category {
        CategoryFilter::All => ALL_ITEMS.to_string(),
        CategoryFilter::Category(id) => inventory.store().get_category(id).await?.name,
    };
    let rows = inventory.rows().await?;

    println!("{} ({}, sorted by {})", title, rows.len(), inventory.query().sort_mode);
    for row in rows {
        println!(
            "{:>4}  {:<32} x{:<4} {:<16} {:<16} {}",
            row.item.sort_order,
            row.item.name,
            row.item.quantity,
            row.location_name,
            row.category_name,
            datetime::format_local(row.item.modified_date)
        );
    }
    Ok(())
}

async fn sync(inventory: &Inventory) -> Result<()> {
    let Some(sync) = inventory.sync() else {
        println!("Sync is disabled in the configuration");
        return Ok(());
    };

    match sync.sync().await {
        Ok(report) => {
            println!(
                "{}: {} pushed, {} pulled, {} skipped",
                SYNC_COMPLETED, report.pushed, report.pulled, report.skipped
            );
            for conflict in &report.conflicts {
                println!("  conflict on {} {}: {:?}", conflict.kind, conflict.id, conflict.resolution);
            }
        }
        Err(e) if e.is_unavailable() => {
            let queued = inventory.store().pending_count().await?;
            println!("{}: {} ({} change(s) queued)", SYNC_UNAVAILABLE, e, queued);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
