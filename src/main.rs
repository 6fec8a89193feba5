use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use pgnsort::{
    CompressionMode, EcoTable, Filer, GroupingMode, PgnParser, PreserveSet, RunReport, SortError,
    check_prerequisites, discover_inputs, log, merge_group_dirs, parse_inputs,
};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Split PGN files into one file per game, grouped into folders", long_about = None)]
#[command(group(ArgGroup::new("grouping").args(["players", "openings", "eco"])))]
struct Cli {
    /// Organize output by player names
    #[arg(long)]
    players: bool,

    /// Organize output by opening name
    #[arg(long)]
    openings: bool,

    /// Ignore the Event header and group by ECO classification
    #[arg(long)]
    eco: bool,

    /// Combine all games in each output folder into one file
    #[arg(long)]
    onefile: bool,

    /// Directory scanned for *.pgn and *.pgn.zst files
    #[arg(long, value_name = "DIR", default_value = ".")]
    input_dir: PathBuf,

    #[arg(long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// ECO reference list, one "<code> <name>" entry per line
    #[arg(long, value_name = "FILE", default_value = "ecolist.txt")]
    eco_list: PathBuf,

    /// Treat every input as compressed (only "zstd"); detected from the extension otherwise
    #[arg(long, value_name = "CODEC", value_parser = CompressionMode::parse)]
    compression: Option<CompressionMode>,

    /// Delete the output directory before filing
    #[arg(long)]
    clean: bool,

    /// Worker threads for parsing and filing
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn clear_output_dir(dir: &Path) -> Result<(), SortError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            log::info(format!("Cleared '{}'", dir.display()));
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SortError::io(dir, e)),
    }
}

fn load_eco_table(path: &Path) -> EcoTable {
    match EcoTable::load(path) {
        Ok(table) if table.is_empty() => {
            log::warn(format!(
                "'{}' has no entries; ECO codes will be used as folder names",
                path.display()
            ));
            table
        }
        Ok(table) => {
            log::info(format!("Loaded {} ECO entries from '{}'", table.len(), path.display()));
            table
        }
        Err(err) => {
            log::warn(format!("{}; ECO codes will be used as folder names", err));
            EcoTable::default()
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("Processing games [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()?;
    }

    if cli.clean {
        clear_output_dir(&cli.output_dir)?;
    }

    let mode = GroupingMode::from_flags(cli.players, cli.openings, cli.eco);
    let eco = if mode == GroupingMode::Eco {
        load_eco_table(&cli.eco_list)
    } else {
        EcoTable::default()
    };

    let inputs = discover_inputs(&cli.input_dir)?;
    let parser = PgnParser::new(PreserveSet::standard());
    let parsed = parse_inputs(&inputs, cli.compression, &parser)?;

    match check_prerequisites(&parsed.games, mode) {
        Ok(()) => {}
        Err(err @ (SortError::NoGames | SortError::MissingTag(_))) => {
            println!("{}", err);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    let filer = Filer::new(&cli.output_dir, mode, eco);
    let bar = progress_bar(parsed.games.len());
    let summary = filer.file_all_with(parsed.games, || bar.inc(1));
    bar.finish_and_clear();

    let merge = if cli.onefile {
        Some(merge_group_dirs(&cli.output_dir)?)
    } else {
        None
    };

    println!(
        "Filed {} games into {} folders ({} incomplete, {} without a {} tag, {} failed)",
        summary.files_written,
        summary.group_count(),
        summary.skipped_incomplete,
        summary.skipped_missing_tag,
        mode.name(),
        summary.failed
    );
    if let Some(merge) = &merge {
        println!(
            "Combined {} files into {} folder files",
            merge.files_combined, merge.directories_merged
        );
    }

    if let Some(path) = &cli.report {
        RunReport {
            mode,
            input_files: inputs.len(),
            unreadable_inputs: parsed.unreadable,
            filing: &summary,
            merge: merge.as_ref(),
        }
        .write(path)?;
    }

    println!(
        "All operations have been completed; your files are in '{}'",
        cli.output_dir.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error(format!("An error occurred: {}", err));
            ExitCode::FAILURE
        }
    }
}
