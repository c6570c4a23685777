//! Veles CLI - Command-line tool for inspecting and verifying ZIP archives.
//!
//! This is the main entry point for the Veles command-line application.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use veles::prelude::*;

/// Veles - ZIP archive inspection and verification tool
#[derive(Parser)]
#[command(name = "veles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of a ZIP archive
    List {
        /// Path to the archive
        #[arg(short, long, env = "INPUT_ZIP")]
        archive: PathBuf,

        /// Filter pattern (substring match)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Decode every entry in memory and verify sizes and checksums
    Check {
        /// Path to the archive
        #[arg(short, long, env = "INPUT_ZIP")]
        archive: PathBuf,

        /// Filter pattern (substring match)
        #[arg(short, long)]
        filter: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            archive,
            filter,
            detailed,
        } => cmd_list(&archive, filter.as_deref(), detailed),
        Commands::Check { archive, filter } => cmd_check(&archive, filter.as_deref()),
    }
}

fn cmd_list(path: &PathBuf, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = ZipArchive::open(path).context("Failed to open archive")?;

    let mut count = 0;
    let mut total_size = 0u64;
    for entry in archive.entries() {
        if let Some(pattern) = filter {
            if !entry.name().contains(pattern) {
                continue;
            }
        }

        if detailed {
            let (year, month, day) = entry.mod_date_parts();
            let (hour, minute, _) = entry.mod_time_parts();
            println!(
                "{:>12} {:>12} {:04}-{:02}-{:02} {:02}:{:02} {}",
                entry.compressed_size(),
                entry.size(),
                year,
                month,
                day,
                hour,
                minute,
                entry.name(),
            );
        } else {
            println!("{}", entry.name());
        }
        count += 1;
        total_size += entry.size();
    }

    println!("\nTotal: {count} entries, {total_size} bytes uncompressed");
    if !archive.comment().is_empty() {
        println!("Comment: {}", archive.comment());
    }

    Ok(())
}

fn cmd_check(path: &PathBuf, filter: Option<&str>) -> Result<()> {
    println!("Opening archive: {}", path.display());

    let start = Instant::now();
    let archive = ZipArchive::open(path).context("Failed to open archive")?;
    println!("Loaded {} entries in {:?}", archive.len(), start.elapsed());

    let selected: Vec<&ZipEntry> = archive
        .entries()
        .iter()
        .filter(|entry| !entry.is_directory())
        .filter(|entry| filter.is_none_or(|pattern| entry.name().contains(pattern)))
        .collect();

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut checked = 0u64;
    let mut bytes = 0u64;
    let mut failures = 0u64;
    for entry in &selected {
        match entry.data() {
            Ok(data) => {
                checked += 1;
                bytes += data.len() as u64;
            }
            Err(err) => {
                failures += 1;
                pb.suspend(|| eprintln!("{}: {err}", entry.name()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Verified {checked} entries ({bytes} bytes) in {:?}, {failures} failures",
        start.elapsed()
    );

    if failures > 0 {
        anyhow::bail!("{failures} entries failed verification");
    }
    Ok(())
}
