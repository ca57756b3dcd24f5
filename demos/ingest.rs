//! Ingest Example
//!
//! Loads a results directory with the built-in plugins, prints every run
//! and the size of the flattened table, and optionally writes it out as
//! Parquet.
//!
//! Run with: cargo run --example ingest -- <results-dir> [out.parquet]
//!
//! Set `RUST_LOG=falba=debug` to see per-artifact enrichment.

use anyhow::Context;
use falba::Database;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("falba=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args
        .next()
        .context("usage: ingest <results-dir> [out.parquet]")?;
    let out = args.next();

    let db = Database::builder()
        .load(&dir)
        .with_context(|| format!("loading {dir}"))?;

    for result in db.iter() {
        println!("{result}");
    }

    let table = db.flatten();
    println!(
        "{} rows x {} columns from {} results",
        table.len(),
        table.columns().len(),
        db.len()
    );

    if let Some(out) = out {
        table
            .write_parquet(&out)
            .with_context(|| format!("writing {out}"))?;
        println!("wrote {out}");
    }

    Ok(())
}
