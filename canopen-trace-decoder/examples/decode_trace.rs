//! Standalone CANopen trace decoder tool
//!
//! This tool parses a PCAN-View or IXXAT MiniMon trace, interprets every frame as a
//! CANopen object and prints one line per frame followed by a short summary.
//!
//! Usage:
//!   decode_trace <trace_file> [--eds <file.eds>] [--limit <count>] [--all]
//!
//! Example:
//!   decode_trace trace.trc --eds drive.eds --limit 100

use canopen_trace_decoder::{Decoder, DecoderConfig, FunctionCode};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <trace_file> [--eds <file.eds>] [--limit <count>] [--all]", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} trace.trc --eds drive.eds --limit 100", args[0]);
        std::process::exit(1);
    }

    let trace_file = PathBuf::from(&args[1]);
    let mut eds_files = Vec::new();
    let mut limit: Option<usize> = None;
    let mut show_all = false;

    // Parse arguments
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--eds" => {
                i += 1;
                if i < args.len() {
                    eds_files.push(PathBuf::from(&args[i]));
                }
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            "--all" => {
                show_all = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    let mut decoder = Decoder::new();
    for eds_file in &eds_files {
        println!("Loading EDS: {:?}", eds_file);
        decoder.add_eds(eds_file)?;
    }

    let dict_stats = decoder.dictionary_stats();
    println!(
        "Object dictionary: {} objects, {} entries\n",
        dict_stats.num_objects, dict_stats.num_entries
    );

    let trace = decoder.read_file(&trace_file, &DecoderConfig::new())?;
    println!("=== {} ({}) ===\n", trace_file.display(), trace.format);

    let mut per_function: BTreeMap<FunctionCode, usize> = BTreeMap::new();
    let mut malformed = 0usize;

    for (shown, (frame, message)) in decoder.interpret_all(&trace).enumerate() {
        *per_function.entry(message.function).or_insert(0) += 1;
        if message.malformed {
            malformed += 1;
        }

        let within_limit = limit.map_or(true, |n| shown < n);
        if within_limit && (show_all || message.function != FunctionCode::None) {
            print!(
                "{:>6} {:>12.3} {:#05x} {:<8} {}",
                frame.sequence(),
                frame.timestamp_ms(),
                frame.can_id(),
                message.function,
                message.text
            );
            if let Some(name) = &message.resolved_name {
                print!("  [{}]", name);
            }
            println!();
        }
    }

    println!("\n=== SUMMARY ===");
    println!("Frames: {}", trace.frames.len());
    println!("Skipped lines: {}", trace.skipped_lines);
    println!("Malformed CANopen payloads: {}", malformed);
    for (function, count) in &per_function {
        println!("  {:<8} {}", function, count);
    }

    Ok(())
}
