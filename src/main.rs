#![allow(clippy::print_stderr)]
#![allow(clippy::exit)]

use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{ArgAction, CommandFactory, Parser, ValueHint, value_parser};
use clap_complete::aot::{Shell, generate};
use zff::{Class, Options, Record, Stats, ZoneError, indexer};

mod printer;
use printer::{PrintedRecord, write_record};

/// What a worker sends back over the channel.
enum Msg {
    Record(PrintedRecord),
    Done(PathBuf, Result<Stats, ZoneError>),
}

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
///Parse DNS zone files and print their records in wire form.
pub struct Args {
    #[arg(
        value_name = "ZONE",
        help = "Zone files to parse",
        value_hint = ValueHint::FilePath,
        required_unless_present = "generate",
        num_args = 1..,
    )]
    zones: Vec<PathBuf>,

    #[arg(
        short = 'o',
        long = "origin",
        default_value = ".",
        help = "Origin appended to relative names\n"
    )]
    origin: String,

    #[arg(
        short = 't',
        long = "ttl",
        default_value_t = 3600,
        help = "Default TTL for records that carry none\n"
    )]
    ttl: u32,

    #[arg(
        short = 'c',
        long = "class",
        default_value = "IN",
        help = "Default class, one of IN CS CH HS\n"
    )]
    class: String,

    #[arg(
        short = 'p',
        long = "pattern",
        help = "Only print records whose owner matches this regex"
    )]
    pattern: Option<String>,

    #[arg(
        short = 'n',
        long = "max-results",
        help = "Stop printing after this many records"
    )]
    top_n: Option<usize>,

    #[arg(
        long = "count",
        default_value_t = false,
        help = "Print per-file record totals instead of records\n"
    )]
    count: bool,

    #[arg(
        short = 'j',
        long = "threads",
        default_value_t = env!("THREAD_COUNT").parse::<usize>().unwrap_or(1),
        help = "Worker threads for parsing multiple zones, defaults to available threads",
    )]
    threads: usize,

    #[arg(
        long = "target",
        help = "Force a scanner variant (haswell, westmere, fallback)"
    )]
    target: Option<String>,

    #[arg(
        long = "generate",
        action = ArgAction::Set,
        value_parser = value_parser!(Shell),
        help = "Generate shell completions"
    )]
    generate: Option<Shell>,
}

fn main() {
    let args = Args::parse();

    if let Some(generator) = args.generate {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_owned();
        generate(generator, &mut cmd, name, &mut stdout());
        return;
    }

    if let Some(target) = &args.target {
        // SAFETY: set before any worker thread spawns, nothing reads the
        // environment concurrently yet
        unsafe { std::env::set_var(indexer::TARGET_ENV, target) };
    }

    let class = match args.class.to_ascii_uppercase().as_str() {
        "IN" => Class::In,
        "CS" => Class::Cs,
        "CH" => Class::Ch,
        "HS" => Class::Hs,
        other => {
            eprintln!("Error: {other} is not a class (try IN, CS, CH, HS)");
            std::process::exit(1);
        }
    };
    let options = Options::new(&args.origin, args.ttl, class).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let filter = args.pattern.as_deref().map(|pattern| {
        regex::bytes::Regex::new(pattern).unwrap_or_else(|e| {
            eprintln!("Error in regex: {e}");
            std::process::exit(1);
        })
    });

    let (sender, receiver) = crossbeam_channel::unbounded::<Msg>();
    let next_zone = AtomicUsize::new(0);
    let workers = args.threads.max(1).min(args.zones.len().max(1));

    let mut exit_code = 0i32;
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next_zone = &next_zone;
            let zones = &args.zones;
            let options = &options;
            let filter = filter.as_ref();
            let count_only = args.count;
            scope.spawn(move || {
                loop {
                    let index = next_zone.fetch_add(1, Ordering::Relaxed);
                    let Some(zone) = zones.get(index) else { break };
                    let mut sink = |record: &Record<'_>| -> Result<usize, i32> {
                        let wanted = !count_only
                            && filter.is_none_or(|re| {
                                re.is_match(record.owner.to_string().as_bytes())
                            });
                        if wanted {
                            let _ = sender.send(Msg::Record(PrintedRecord::from_record(record)));
                            //the only send error is a dropped receiver, which
                            //just means the printer stopped listening
                        }
                        Ok(0)
                    };
                    let result = zff::parse_file(options, zone, &mut sink);
                    let _ = sender.send(Msg::Done(zone.clone(), result));
                }
            });
        }
        drop(sender);

        let mut writer = BufWriter::new(stdout());
        let limit = args.top_n.unwrap_or(usize::MAX);
        let mut printed = 0usize;
        let mut pending = args.zones.len();
        while pending > 0 {
            let Ok(msg) = receiver.recv() else { break };
            match msg {
                Msg::Record(record) => {
                    if printed < limit {
                        if write_record(&mut writer, &record).is_err() {
                            // broken pipe downstream; stop printing, let
                            // the parses run out
                            printed = usize::MAX;
                        }
                        printed = printed.saturating_add(1);
                    }
                }
                Msg::Done(zone, result) => {
                    pending -= 1;
                    match result {
                        Ok(stats) => {
                            if args.count {
                                let _ = writeln!(
                                    writer,
                                    "{}: {} records, {} lines, {} files",
                                    zone.display(),
                                    stats.records,
                                    stats.lines,
                                    stats.files
                                );
                            }
                        }
                        Err(err) => {
                            eprintln!("{}: {err}", zone.display());
                            if exit_code == 0 {
                                exit_code = -err.code();
                            }
                        }
                    }
                }
            }
        }
        let _ = writer.flush();
    });

    if exit_code != 0 {
        std::process::exit(exit_code.clamp(1, 125));
    }
}
