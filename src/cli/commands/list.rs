//! List command - show completed entries of a category

use crate::cache::{format_bytes, list_entries, CacheDirResolver, CacheEntry};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::CacheResult;
use console::style;

/// Execute the list command
pub fn execute(args: ListArgs, config: &Config) -> CacheResult<()> {
    let dir = CacheDirResolver::from_config(&config.cache).category_dir(&args.category)?;
    let entries = list_entries(&dir)?;

    match args.format {
        OutputFormat::Table => print_entry_table(&args.category, &entries),
        OutputFormat::Json => print_entry_json(&entries)?,
        OutputFormat::Plain => print_entry_plain(&entries),
    }

    Ok(())
}

fn print_entry_table(category: &str, entries: &[CacheEntry]) {
    if entries.is_empty() {
        println!("No entries cached in category '{}'.", category);
        return;
    }

    println!("{:<66} {:>10} {:<20}", "KEY", "SIZE", "MODIFIED");
    println!("{}", "-".repeat(98));

    let mut total = 0u64;
    for entry in entries {
        total += entry.size_bytes;
        println!(
            "{:<66} {:>10} {:<20}",
            entry.key,
            format_bytes(entry.size_bytes),
            style(entry.modified.format("%Y-%m-%d %H:%M")).dim()
        );
    }

    println!();
    println!(
        "Total: {} entr{} ({})",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        format_bytes(total)
    );
}

fn print_entry_json(entries: &[CacheEntry]) -> CacheResult<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

fn print_entry_plain(entries: &[CacheEntry]) {
    for entry in entries {
        println!("{}", entry.path.display());
    }
}
