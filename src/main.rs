use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use specialty_reconciliation::{
    load_survey_csv, CancellationToken, EngineConfig, Metric, ReconciliationService, SqliteStore,
};

const DEFAULT_DB: &str = "reconciliation.db";

const USAGE: &str = "\
Usage: specialty-reconciliation [--db <path>] [--config <file>] <command>

Commands:
  import <csv>                          Add survey rows to the unmapped pool
  auto-map                              Group confident cross-vendor matches
  groups                                List mapping groups with TCC p50
  unmapped                              List specialties still unmapped
  export <file>                         Write a checksummed JSON export
  import-json <file>                    Replace all state from an export
  lookup <group-id> <tcc|wrvu|cf> <v>   Percentile of a value in a group
  clear                                 Return every group to the pool";

fn main() -> Result<()> {
    init_tracing();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let db_path = take_option(&mut args, "--db")?.unwrap_or_else(|| DEFAULT_DB.to_string());
    let config_path = take_option(&mut args, "--config")?;

    if args.is_empty() {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match config_path {
        Some(path) => EngineConfig::from_file(&path)?,
        None => EngineConfig::default(),
    };
    let store = SqliteStore::open(&db_path)?;
    let service = ReconciliationService::open_with_config(Arc::new(store), config)?.with_actor("cli");

    match (args[0].as_str(), &args[1..]) {
        ("import", [csv]) => run_import(&service, Path::new(csv))?,
        ("auto-map", []) => run_auto_map(&service)?,
        ("groups", []) => run_groups(&service),
        ("unmapped", []) => run_unmapped(&service),
        ("export", [file]) => run_export(&service, Path::new(file))?,
        ("import-json", [file]) => run_import_json(&service, Path::new(file))?,
        ("lookup", [group_id, metric, value]) => run_lookup(&service, group_id, metric, value)?,
        ("clear", []) => {
            let removed = service.clear_all_mappings()?;
            println!("✓ Cleared {} groups", removed);
        }
        _ => bail!("Unrecognized command\n\n{}", USAGE),
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = env::var("RECON_LOG_JSON").map(|v| v == "1" || v == "true").unwrap_or(false);

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Remove `--flag value` from `args`, returning the value
fn take_option(args: &mut Vec<String>, flag: &str) -> Result<Option<String>> {
    let Some(position) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if position + 1 >= args.len() {
        bail!("{} requires a value", flag);
    }
    let value = args.remove(position + 1);
    args.remove(position);
    Ok(Some(value))
}

fn run_import(service: &ReconciliationService, csv_path: &Path) -> Result<()> {
    println!("📂 Loading survey CSV...");
    let rows = load_survey_csv(csv_path)?;
    println!("✓ Read {} rows", rows.len());

    let summary = service.ingest(rows)?;
    println!("✓ Added {} specialties to the unmapped pool", summary.added);
    println!("✓ Duplicates skipped: {}", summary.duplicates);
    println!("✓ Already mapped: {}", summary.already_mapped);
    Ok(())
}

fn run_auto_map(service: &ReconciliationService) -> Result<()> {
    println!("🔗 Auto-mapping unmapped specialties...");
    let report = service.auto_arrange(&CancellationToken::new())?;

    println!("✓ Groups created: {}", report.groups_created);
    println!("✓ Specialties mapped: {}", report.members_mapped);
    println!("✓ Single-source groups: {}", report.single_source);
    println!("• Left unmapped: {}", report.unmatched);
    Ok(())
}

fn run_groups(service: &ReconciliationService) {
    let data = service.all_market_data();
    if data.is_empty() {
        println!("No mapping groups yet");
        return;
    }

    for record in data {
        let p50 = record
            .tcc
            .p50
            .value
            .map(|v| format!("{:.0}", v))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<40} vendors={:<30} n={:<6} tcc_p50={}",
            record.group_id,
            record.name,
            record.vendors.join(","),
            record.record_count,
            p50
        );
    }
}

fn run_unmapped(service: &ReconciliationService) {
    for source in service.unmapped() {
        println!("{:<20} {}", source.vendor, source.name);
    }
}

fn run_export(service: &ReconciliationService, path: &Path) -> Result<()> {
    let json = service.export_data()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Exported to {}", path.display());
    Ok(())
}

fn run_import_json(service: &ReconciliationService, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let summary = service.import_data_detailed(&json)?;
    println!(
        "✓ Imported {} specialties, {} groups, {} unmapped",
        summary.specialties, summary.groups, summary.unmapped
    );
    Ok(())
}

fn run_lookup(service: &ReconciliationService, group_id: &str, metric: &str, value: &str) -> Result<()> {
    let Some(metric) = Metric::parse(metric) else {
        bail!("Unknown metric '{}': expected tcc, wrvu or cf", metric);
    };
    let value: f64 = value.parse().with_context(|| format!("Invalid value '{}'", value))?;

    let pct = service.percentile_rank(group_id, metric, value)?;
    println!("{:.1}", pct);
    Ok(())
}
