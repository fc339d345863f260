use std::{
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use binutils::{clap, verbose};
use clap::Parser;
use lstview::{config::TraceConfig, export, generate, GenerateOption};

// Pipeline timeline reconstruction from simulation listings
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = binutils::get_styles(),
    arg_required_else_help = true,
)]
struct Args {
    /// Path to the input .lst file
    input: PathBuf,

    /// Output filename (default is input%.csv, or input%.xlsx with --excel,
    /// in the current directory)
    output: Option<PathBuf>,

    /// Export to an Excel workbook instead of CSV
    #[arg(long)]
    excel: bool,

    /// Also print the timeline to stdout
    #[arg(short = 'p', long)]
    print: bool,

    /// JSON file overriding the testbench signal names
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbose: verbose::Verbosity<verbose::InfoLevel>,
}

fn check_input(path: &Path) -> Result<()> {
    anyhow::ensure!(path.is_file(), "input file not found: {}", path.display());
    let is_lst = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lst"));
    anyhow::ensure!(
        is_lst,
        "input file must be .lst format, got: {}",
        path.display()
    );
    Ok(())
}

fn default_output(input: &Path, excel: bool) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(if excel { ".xlsx" } else { ".csv" });
    PathBuf::from(name)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = binutils::verbose_level_to_trace(args.verbose.log_level());
    binutils::logging_setup(log_level, None::<std::fs::File>);

    check_input(&args.input)?;
    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("could not read file `{}`", args.input.display()))?;

    let config = match &args.config {
        Some(path) => TraceConfig::load(path)?,
        None => TraceConfig::default(),
    };
    let timeline = generate(&content, &GenerateOption::default().set_config(config))
        .context("error during pipeline generation")?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, args.excel));
    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("could not write file `{}`", output_path.display()))?;
    if args.excel {
        export::write_xlsx(&timeline, io::BufWriter::new(file))?;
        tracing::info!("exported to Excel: {}", output_path.display());
    } else {
        export::write_csv(&timeline, io::BufWriter::new(file))?;
        tracing::info!("exported to CSV: {}", output_path.display());
    }

    if args.print {
        print!("{}", export::render(&timeline, io::stdout().is_terminal()));
    }
    Ok(())
}
