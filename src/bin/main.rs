//! This is the main entry point for the FAT32 carving tool.
//!
//! The program resolves a volume, prints its boot sector, FSInfo and FAT
//! information, then carves either the unallocated clusters (default) or every
//! data cluster and prints one line per recognized file start.

use clap::Parser;
use fat_carver::traits::LayoutDisplay;
use fat_carver::volume::resolver::{ImageResolver, VolumeResolver};
use fat_carver::{CarveError, CarveMode, CarveOptions, FatCopies, Session};
use log::{error, warn};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser, Debug)]
#[command(name = "fat-carve")]
#[command(version, about = "Carve deleted files from the clusters of a FAT32 volume.")]
struct Args {
    /// Volume to carve: a drive letter (e.g. `E:`) or a raw device or image path
    volume: String,

    /// Scan every data cluster instead of the unallocated ones only
    #[arg(short, long, default_value_t = false)]
    all: bool,

    /// Charset of ZIP member names
    #[arg(long, default_value = "euc-kr")]
    charset: String,

    /// Number of FATs preceding the data region, overriding the boot sector
    #[arg(long)]
    fat_copies: Option<u8>,

    /// Print the region layout of the volume
    #[arg(short, long, default_value_t = false)]
    layout: bool,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .module("fat_carver")
        .quiet(args.quiet)
        .verbosity(1 + args.verbose as usize)
        .init()
    {
        eprintln!("Failed to initialize logging: {err}");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl+C handler: {err}");
    }

    match run(&args, running) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, running: Arc<AtomicBool>) -> Result<(), CarveError> {
    let options = CarveOptions {
        mode: if args.all {
            CarveMode::AllClusters
        } else {
            CarveMode::UnallocatedOnly
        },
        fat_copies: args
            .fat_copies
            .map_or(FatCopies::FromBootSector, FatCopies::Fixed),
        running: Some(running),
        ..CarveOptions::default()
    }
    .with_charset_label(&args.charset)?;

    let volume = ImageResolver.resolve(&args.volume)?;
    let mut session = Session::open(&volume)?;

    println!("{}", session.geometry());
    match session.fs_info() {
        Some(fs_info) => println!("{fs_info}"),
        None => println!("FSInfo Information:\n  (missing or invalid FSInfo sector)\n"),
    }
    println!("{}", session.fat_header());
    if args.layout {
        match session.geometry().display_layout(2) {
            Ok(layout) => println!("{layout}"),
            Err(err) => warn!("Layout formatting failed: {err}"),
        }
    }

    let carver = session.carver(&options)?;

    println!("========== Carving Start ==========\n");
    let mut hits = 0usize;
    for hit in carver {
        println!("{hit}");
        hits += 1;
    }
    println!("\n========== Carving Complete ({hits} files) ==========");

    Ok(())
}
