use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;

use arkiv_blob::BlobStore;
use arkiv_store::{open_record_store, RecordStore, StorageConfig};
use arkiv_types::{Condition, Filter, Link, Part};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(?config, "resolved storage config");

    match cli.command {
        Command::Blob(command) => run_blob(&BlobStore::new(&config.base_path), command),
        command => {
            let store = open_record_store(&config)
                .with_context(|| format!("opening storage at {}", config.base_path.display()))?;
            run_record(store, command)
        }
    }
}

/// `--config` is read first; `--base-path` then overrides its base path and
/// forces the disk backend.
fn resolve_config(cli: &Cli) -> anyhow::Result<StorageConfig> {
    let mut config = match &cli.config {
        Some(path) => StorageConfig::from_file(path)?,
        None => StorageConfig::disk(StorageConfig::default().base_path),
    };
    if let Some(base_path) = &cli.base_path {
        config = StorageConfig::disk(base_path);
    }
    Ok(config)
}

fn run_record(store: Arc<dyn RecordStore>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Stats => cmd_stats(store.as_ref()),
        Command::Read(args) => cmd_read(store.as_ref(), args),
        Command::List(args) => cmd_list(store.as_ref(), args),
        Command::Links(args) => cmd_links(store.as_ref(), args),
        Command::Terms(args) => cmd_terms(store.as_ref(), args),
        Command::Delete(args) => {
            store.delete_by_type_and_id(&args.record_type, &args.id)?;
            println!("{} Deleted {}/{}", "✓".green().bold(), args.record_type, args.id.yellow());
            Ok(())
        }
        Command::Blob(_) => bail!("blob commands operate on the stream tree, not on records"),
    }
}

fn cmd_stats(store: &dyn RecordStore) -> anyhow::Result<()> {
    let types = store.record_types()?;
    if types.is_empty() {
        println!("No records stored.");
        return Ok(());
    }
    let mut total = 0;
    for record_type in &types {
        let count = store.count(record_type)?;
        total += count;
        println!("  {:<32} {}", record_type.cyan(), count);
    }
    println!("{} records in {} types", total.to_string().bold(), types.len());
    Ok(())
}

fn cmd_read(store: &dyn RecordStore, args: ReadArgs) -> anyhow::Result<()> {
    let data = if args.search_implementing {
        store.read_abstract(&args.record_type, &args.id)?
    } else {
        store.read_one(&args.record_type, &args.id)?
    };
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn cmd_list(store: &dyn RecordStore, args: ListArgs) -> anyhow::Result<()> {
    let filter = build_filter(&args.conditions, args.from, args.to)?;
    let result = store.read_list(&[args.record_type.as_str()], &filter)?;
    eprintln!(
        "{} of {} matches from position {}",
        result.len().to_string().bold(),
        result.total_number_of_matches,
        result.start
    );
    println!("{}", serde_json::to_string_pretty(&result.list_of_data_groups)?);
    Ok(())
}

fn cmd_links(store: &dyn RecordStore, args: RecordArgs) -> anyhow::Result<()> {
    let record = Link::new(args.record_type, args.id);
    println!("Links from {}:", record.to_string().yellow());
    for to in store.get_links_from_record(&record)? {
        println!("  → {to}");
    }
    println!("Links to {}:", record.to_string().yellow());
    for from in store.get_links_to_record(&record)? {
        println!("  ← {from}");
    }
    Ok(())
}

fn cmd_terms(store: &dyn RecordStore, args: RecordArgs) -> anyhow::Result<()> {
    for term in store.get_storage_terms(&args.record_type, &args.id)? {
        println!("  {} {} = {}", term.id.dimmed(), term.storage_key.cyan(), term.value);
    }
    Ok(())
}

fn run_blob(blobs: &BlobStore, command: BlobCommand) -> anyhow::Result<()> {
    match command {
        BlobCommand::Put { blob, file } => {
            let mut input = File::open(&file)
                .with_context(|| format!("opening {}", file.display()))?;
            let size = blobs.store(
                &blob.data_divider,
                &blob.record_type,
                &blob.id,
                &blob.representation,
                &mut input,
            )?;
            println!("{} Stored {} bytes", "✓".green().bold(), size);
        }
        BlobCommand::Get { blob, out } => {
            let mut stream =
                blobs.retrieve(&blob.data_divider, &blob.record_type, &blob.id, &blob.representation)?;
            match out {
                Some(path) => {
                    let mut file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    io::copy(&mut stream, &mut file)?;
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    io::copy(&mut stream, &mut stdout)?;
                    stdout.flush()?;
                }
            }
        }
        BlobCommand::Rm { blob } => {
            blobs.delete(&blob.data_divider, &blob.record_type, &blob.id, &blob.representation)?;
            println!("{} Deleted stream {}", "✓".green().bold(), blob.representation.yellow());
        }
    }
    Ok(())
}

/// Build a single-part filter from `KEY=VALUE` conditions.
fn build_filter(conditions: &[String], from: Option<u64>, to: Option<u64>) -> anyhow::Result<Filter> {
    let mut parsed = Vec::with_capacity(conditions.len());
    for raw in conditions {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("condition `{raw}` is not of the form KEY=VALUE");
        };
        if key.is_empty() {
            bail!("condition `{raw}` has an empty key");
        }
        parsed.push(Condition::equals(key, value));
    }

    let mut filter = Filter::new();
    if !parsed.is_empty() {
        filter = filter.with_part(Part::new(parsed));
    }
    filter.from_no = from;
    filter.to_no = to;
    Ok(filter)
}
