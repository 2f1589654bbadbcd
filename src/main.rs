//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `ip_country` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{bail, Context, Result};
use clap::Parser;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::process;
use std::sync::Arc;

use ip_country::config::{Command, Opt};
use ip_country::export::{export_csv, export_csv_v6, export_json, export_stats};
use ip_country::fetch::{DirProvider, HttpProvider};
use ip_country::index::SnapshotStore;
use ip_country::registry::RegistrySource;
use ip_country::storage::{init_db_pool_with_path, load_snapshot};
use ip_country::{lookup, run_build};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    env_logger::Builder::new()
        .filter_level(opt.log_level.clone().into())
        .init();

    match run(opt).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("ip_country error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(opt: Opt) -> Result<()> {
    let db_path = opt.db_path;
    match opt.command {
        Command::Build { from_dir } => {
            let pool = init_db_pool_with_path(&db_path)
                .await
                .context("Failed to initialize database")?;
            let store = SnapshotStore::new();

            let snapshot = match from_dir {
                Some(dir) => {
                    let sources = RegistrySource::from_dir(&dir);
                    run_build(&sources, &DirProvider, &store, &pool).await?
                }
                None => {
                    let provider =
                        HttpProvider::new().context("Failed to build the HTTP client")?;
                    let sources = RegistrySource::defaults();
                    run_build(&sources, &provider, &store, &pool).await?
                }
            };

            println!(
                "Indexed {} IPv4 and {} IPv6 ranges from {} of {} registries",
                snapshot.meta.ipv4_count,
                snapshot.meta.ipv6_count,
                snapshot.meta.successful_registries().len(),
                snapshot.meta.registries.len()
            );
            println!("Ranges saved in {}", db_path.display());
            Ok(())
        }
        Command::Lookup { address, json } => {
            let pool = open_existing(&db_path).await?;
            let snapshot = load_snapshot(&pool)
                .await
                .context("Failed to load stored ranges")?;

            match lookup(&snapshot, &address) {
                Some(result) if json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    Ok(())
                }
                Some(result) => {
                    print!(
                        "{} -> {} ({}, {}",
                        result.address,
                        result.country.as_str(),
                        result.registry,
                        result.status
                    );
                    if let Some(date) = result.date_allocated {
                        print!(", allocated {date}");
                    }
                    if let Some(network) = &result.matched_network {
                        print!(", network {network}");
                    }
                    println!(")");
                    Ok(())
                }
                None => {
                    println!("No allocation found for {address}");
                    process::exit(1);
                }
            }
        }
        Command::ExportCsv { output, ipv6 } => {
            let pool = open_existing(&db_path).await?;
            let rows = if ipv6 {
                export_csv_v6(&pool, output.as_ref()).await?
            } else {
                export_csv(&pool, output.as_ref()).await?
            };
            report_export(rows, output.as_deref());
            Ok(())
        }
        Command::ExportJson { output } => {
            let pool = open_existing(&db_path).await?;
            let rows = export_json(&pool, output.as_ref()).await?;
            report_export(rows, output.as_deref());
            Ok(())
        }
        Command::Stats { output } => {
            let pool = open_existing(&db_path).await?;
            let rows = export_stats(&pool, output.as_ref()).await?;
            report_export(rows, output.as_deref());
            Ok(())
        }
    }
}

/// Opens the pool for commands that read previously built data.
async fn open_existing(db_path: &Path) -> Result<Arc<Pool<Sqlite>>> {
    if !db_path.exists() {
        bail!(
            "Database not found at {}; run `ip_country build` first",
            db_path.display()
        );
    }
    init_db_pool_with_path(db_path)
        .await
        .context("Failed to open database")
}

fn report_export(rows: usize, output: Option<&Path>) {
    if let Some(path) = output {
        println!(
            "Exported {} row{} to {}",
            rows,
            if rows == 1 { "" } else { "s" },
            path.display()
        );
    }
}
