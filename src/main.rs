use clap::{CommandFactory, Parser, Subcommand};
use sgf2ebook::config::{self, BookConfig};
use sgf2ebook::convert::{self, ConvertEvent};
use sgf2ebook::naming::output_filename;
use sgf2ebook::output::{self, CheckedRecord};
use sgf2ebook::record::load_record;
use sgf2ebook::render::SgfRenderBackend;
use sgf2ebook::templates::{Templates, resolve_template_dir};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sgf2ebook")]
#[command(about = "Convert Go game records (SGF) into EPUB ebooks, one page per move")]
#[command(long_about = "\
Convert Go game records (SGF) into EPUB ebooks, one page per move

Each page shows the board after its move, rendered by sgf-render, and the
comment attached to that move. Only the main line is used; variations are
ignored.

Input layout:

  games/
  ├── config.toml                  # Optional, applies to everything below
  ├── 2023-honinbo-1.sgf           # → Honinbo_1.epub (from EV[] and RO[])
  └── archive/
      └── old-game.sgf             # → old-game.epub (no EV[], file stem)

Usage without a subcommand converts: 'sgf2ebook -i games/ -o books/' is the
same as 'sgf2ebook convert -i games/ -o books/'.

Books are named after the event and round of the record (EV, RO), or the
file name when the record has no event. Directories are searched
recursively for .sgf files and converted in sorted path order.

Run 'sgf2ebook gen-config' to generate a documented config.toml.")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Convert options, used when no subcommand is given
    #[command(flatten)]
    convert: Option<ConvertArgs>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Input selection shared by every command that reads records.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Input .sgf file or directory of .sgf files
    #[arg(short = 'i', long = "input-path")]
    input_path: PathBuf,
}

#[derive(clap::Args, Clone)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory, created if missing
    #[arg(short = 'o', long = "output-path")]
    output_path: PathBuf,

    /// Template directory (overrides book.template_dir)
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// sgf-render executable (overrides renderer.executable)
    #[arg(long)]
    renderer: Option<PathBuf>,

    /// Diagram style (overrides renderer.style)
    #[arg(long)]
    style: Option<String>,

    /// Leave move comments out of the pages
    #[arg(long)]
    no_comments: bool,

    /// Stop at the first record that fails instead of converting the rest
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert records into ebooks
    Convert(ConvertArgs),
    /// Load records and show what would be converted
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Print the loaded records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match (cli.command, cli.convert) {
        (Some(Command::Convert(args)), _) | (None, Some(args)) => run_convert(&args),
        (Some(Command::Check { input, json }), _) => run_check(&input.input_path, json),
        (Some(Command::GenConfig), _) => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
        (None, None) => {
            Cli::command().print_help()?;
            Ok(ExitCode::from(2))
        }
    }
}

/// Initialize tracing on stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "sgf2ebook=warn",
        1 => "sgf2ebook=info",
        _ => "sgf2ebook=debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn input_exists(input: &Path) -> bool {
    if input.exists() {
        return true;
    }
    eprintln!("Input path {} not found", input.display());
    false
}

/// Config for an input path with command-line overrides applied.
fn resolve_convert_config(args: &ConvertArgs) -> Result<BookConfig, config::ConfigError> {
    let root = config::config_root(&args.input.input_path);
    let mut config = config::load_config(&root)?;

    if let Some(exe) = &args.renderer {
        config.renderer.executable = exe.clone();
    }
    if let Some(style) = &args.style {
        config.renderer.style = style.clone();
    }
    if args.no_comments {
        config.book.comments = false;
    }
    config.book.template_dir = match &args.template_dir {
        Some(dir) => dir.clone(),
        None => resolve_template_dir(&root, &config.book.template_dir),
    };
    config.validate()?;
    Ok(config)
}

fn run_convert(args: &ConvertArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let input = &args.input.input_path;
    if !input_exists(input) {
        return Ok(ExitCode::FAILURE);
    }

    let config = resolve_convert_config(args)?;
    let templates = Templates::load(&config.book.template_dir)?;
    let records = convert::discover_records(input)?;
    if records.is_empty() {
        println!("No .sgf files found in {}", input.display());
        return Ok(ExitCode::SUCCESS);
    }

    let backend = SgfRenderBackend::new(config.renderer.clone());
    if !backend.is_available() {
        tracing::warn!(
            executable = %backend.executable().display(),
            "sgf-render could not be started; set renderer.executable or pass --renderer"
        );
    }

    println!(
        "==> Converting {} from {}",
        match records.len() {
            1 => "1 record".to_string(),
            n => format!("{n} records"),
        },
        input.display()
    );

    let (tx, rx) = std::sync::mpsc::channel::<ConvertEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_convert_event(&event) {
                println!("{}", line);
            }
        }
    });
    let report = convert::convert_batch(
        &records,
        &args.output_path,
        &config,
        &templates,
        args.fail_fast,
        Some(tx),
    );
    printer.join().map_err(|_| "progress printer panicked")?;

    output::print_batch_summary(&report, &args.output_path);
    Ok(exit_code(report.is_success()))
}

fn run_check(input: &Path, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if !input_exists(input) {
        return Ok(ExitCode::FAILURE);
    }

    let config = config::load_config(&config::config_root(input))?;
    let records = convert::discover_records(input)?;
    let mut failures = 0;
    let mut loaded = Vec::new();

    if !json {
        println!("==> Checking {}", input.display());
        println!("Records");
    }
    for (idx, source) in records.iter().enumerate() {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match load_record(source) {
            Ok(record) => {
                let name = output_filename(&record, &stem, config.output.naming);
                if !json {
                    output::print_checked_record(
                        idx + 1,
                        source,
                        &CheckedRecord::Loaded {
                            record: &record,
                            output_name: &name,
                        },
                    );
                }
                loaded.push(serde_json::json!({
                    "source": source,
                    "output": name,
                    "record": record,
                }));
            }
            Err(err) => {
                failures += 1;
                let error = err.to_string();
                if !json {
                    output::print_checked_record(
                        idx + 1,
                        source,
                        &CheckedRecord::Failed { error: &error },
                    );
                }
                loaded.push(serde_json::json!({
                    "source": source,
                    "error": error,
                }));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded)?);
        return Ok(exit_code(failures == 0));
    }

    let backend = SgfRenderBackend::new(config.renderer.clone());
    println!(
        "Renderer: {} ({})",
        backend.executable().display(),
        if backend.is_available() {
            "available"
        } else {
            "not found"
        }
    );
    if failures == 0 {
        println!("==> All records are valid");
    } else {
        println!("==> {failures} of {} records failed to load", records.len());
    }
    Ok(exit_code(failures == 0))
}
