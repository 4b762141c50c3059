use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use statforge_core::file_utils::{find_files_with_extension, read_input, read_text_file, write_record};
use statforge_core::{
    ImportConfig, filter_for_import, parse_bulk_spells, parse_spell, parse_statblock, spell_key,
    statblock_key, validate_spell, validate_statblock,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(
    name = "statforge",
    version = "0.1.0",
    about = "Convert pasted D&D Beyond spell and statblock text into JSON records",
    long_about = None
)]
struct Cli {
    /// Path to import configuration (TOML)
    #[arg(long, global = true, env = "STATFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for written records (overrides output_dir from the config)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Path to log file
    #[arg(long, global = true, default_value = "/tmp/statforge.log")]
    log_file: PathBuf,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one spell and print it as JSON
    Spell {
        /// Text file with the pasted spell (stdin when omitted)
        input: Option<PathBuf>,
        /// Also write the record to the output directory
        #[arg(long, default_value_t = false)]
        write: bool,
    },

    /// Parse one statblock and print it as JSON
    Statblock {
        /// Text file with the pasted statblock (stdin when omitted)
        input: Option<PathBuf>,
        /// Also write the record to the output directory
        #[arg(long, default_value_t = false)]
        write: bool,
    },

    /// Parse every statblock file in a directory
    Statblocks {
        /// Directory containing pasted statblocks
        #[arg(long)]
        input_dir: PathBuf,
        /// File extension to look for
        #[arg(long, default_value = "txt")]
        extension: String,
    },

    /// Split a multi-spell paste and report every spell found
    BulkSpells {
        /// Text file with the pasted spell list (stdin when omitted)
        input: Option<PathBuf>,
        /// Keep spells marked "Legacy"
        #[arg(long, default_value_t = false)]
        include_legacy: bool,
        /// Keep duplicate keys instead of collapsing them
        #[arg(long, default_value_t = false)]
        no_dedupe: bool,
        /// Write each spell to the output directory
        #[arg(long, default_value_t = false)]
        write: bool,
    },

    /// Print the storage key for a name
    Key {
        /// Spell or creature name
        name: String,
        /// Derive a statblock key (collapses "Goblin #2" to "goblin.json")
        #[arg(long, default_value_t = false)]
        statblock: bool,
    },
}

fn setup_logging(verbose: u8, log_file: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter_level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(filter_level.into());

    let file_appender = tracing_appender::rolling::never(
        log_file.parent().unwrap_or(Path::new(".")),
        log_file.file_name().unwrap_or(std::ffi::OsStr::new("statforge.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_writer(std::io::stderr).with_ansi(true))
        .with(fmt::Layer::new().with_writer(non_blocking).with_ansi(false));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

fn print_json<T: Serialize>(record: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn print_warnings(name: &str, warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {}: {}", name, warning);
    }
}

fn require_output_dir(config: &ImportConfig) -> Result<&Path> {
    match config.output_dir.as_deref() {
        Some(dir) => Ok(dir),
        None => anyhow::bail!("--write needs an output directory (--output-dir or output_dir in the config)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(cli.verbose, &cli.log_file)?;

    info!("Starting statforge CLI");

    let mut config = ImportConfig::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load import config: {}", e))?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = Some(dir);
    }

    match cli.command {
        Commands::Spell { input, write } => {
            let text = read_input(input.as_deref())?;
            let record = parse_spell(&text)?;
            print_warnings(&record.name, &validate_spell(&record));
            print_json(&record)?;

            if write {
                let path = write_record(require_output_dir(&config)?, &spell_key(&record.name), &record)?;
                info!("Wrote spell {:?} to {:?}", record.name, path);
            }
        }
        Commands::Statblock { input, write } => {
            let text = read_input(input.as_deref())?;
            let record = parse_statblock(&text);
            if record.name.is_empty() {
                anyhow::bail!("No statblock text found");
            }
            print_warnings(&record.name, &validate_statblock(&record));
            print_json(&record)?;

            if write {
                let path = write_record(require_output_dir(&config)?, &statblock_key(&record.name), &record)?;
                info!("Wrote statblock {:?} to {:?}", record.name, path);
            }
        }
        Commands::Statblocks { input_dir, extension } => {
            if !input_dir.exists() {
                anyhow::bail!("Input directory not found: {:?}", input_dir);
            }

            let files = find_files_with_extension(&input_dir, &extension)?;
            info!("Found {} .{} files in {:?}", files.len(), extension, input_dir);

            let progress = ProgressBar::new(files.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")?.progress_chars("=>-"),
            );
            progress.set_message("parsing statblocks");

            // Parse all files in parallel
            let records: Vec<_> = files
                .par_iter()
                .filter_map(|path| {
                    let parsed = match read_text_file(path) {
                        Ok(text) => Some((path.clone(), parse_statblock(&text))),
                        Err(e) => {
                            tracing::warn!("Failed to read {:?}: {}", path, e);
                            None
                        }
                    };
                    progress.inc(1);
                    parsed
                })
                .collect();
            progress.finish_and_clear();

            let mut written = 0;
            for (path, record) in &records {
                if record.name.is_empty() {
                    tracing::warn!("Skipping {:?}: no statblock text", path);
                    continue;
                }
                print_warnings(&record.name, &validate_statblock(record));
                println!("{} ({}) CR {}", record.name, statblock_key(&record.name), record.challenge_rating);

                if let Some(dir) = config.output_dir.as_deref() {
                    write_record(dir, &statblock_key(&record.name), record)?;
                    written += 1;
                }
            }

            info!("Parsed {} of {} files, wrote {} records", records.len(), files.len(), written);
        }
        Commands::BulkSpells { input, include_legacy, no_dedupe, write } => {
            let text = read_input(input.as_deref())?;

            // Parse with legacy entries kept so the filter can fall back to them.
            let parsed = parse_bulk_spells(&text, true);
            let total = parsed.len();
            let spells = filter_for_import(
                parsed,
                include_legacy || config.include_legacy,
                config.dedupe && !no_dedupe,
                config.skip_incomplete,
            );
            info!("Kept {} of {} spells", spells.len(), total);

            let output_dir = if write { Some(require_output_dir(&config)?) } else { None };

            for spell in &spells {
                let marker = if spell.is_legacy { " [legacy]" } else { "" };
                println!("{} ({}){}", spell.name, spell.key, marker);
                print_warnings(&spell.name, &spell.warnings);

                if let Some(dir) = output_dir {
                    write_record(dir, &spell.key, &spell.data)?;
                }
            }
        }
        Commands::Key { name, statblock } => {
            let key = if statblock { statblock_key(&name) } else { spell_key(&name) };
            println!("{}", key);
        }
    }

    info!("statforge CLI finished");
    Ok(())
}
