//! refbook CLI - resolve references, export sheets and generate models

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use refbook::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "refbook")]
#[command(
    author,
    version,
    about = "Resolve cross-workbook references in spreadsheet master data"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every data sheet with its references resolved
    Export {
        /// Input workbook
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Output format: csv, json or yaml (anything else means csv)
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file name prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Generate model code for every data sheet
    Generate {
        /// Input workbook
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Target language: go or csharp
        #[arg(short, long, default_value = "go")]
        lang: String,

        /// Model name prefix
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// [Go] Package name
        #[arg(long, default_value = "model")]
        package_name: String,

        /// [Go] Struct tag names, comma separated
        #[arg(long, default_value = "json", value_delimiter = ',')]
        tag_name: Vec<String>,
    },

    /// Rewrite reference data, defined names and validations in the workbook
    Update {
        /// Workbook to update in place
        file: PathBuf,
    },

    /// Workbook metadata
    Meta {
        #[command(subcommand)]
        command: MetaCommands,
    },
}

#[derive(Subcommand)]
enum MetaCommands {
    /// Write sheet schemas and reference definitions as YAML
    Export {
        /// Input workbook
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_error_chain(err: &anyhow::Error) {
    eprintln!("Error: {}", err);
    for cause in err.chain().skip(1) {
        eprintln!("Caused by: {}", cause);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Export {
            file,
            out,
            format,
            prefix,
        } => export(&file, &out, &format, &prefix),
        Commands::Generate {
            file,
            out,
            lang,
            prefix,
            package_name,
            tag_name,
        } => {
            let options = GenerateOptions {
                out_dir: out,
                prefix,
                go_package_name: package_name,
                go_tag_names: tag_name,
            };
            generate(&file, &lang, options)
        }
        Commands::Update { file } => update(&file),
        Commands::Meta {
            command: MetaCommands::Export { file, out },
        } => meta_export(&file, &out),
    }
}

fn open_book(file: &Path) -> Result<XlsxBook> {
    open(file).with_context(|| format!("open file '{}'", file.display()))
}

fn prepare_out_dir(out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("create output directory '{}'", out.display()))
}

fn export(file: &Path, out: &Path, format: &str, prefix: &str) -> Result<()> {
    let mut book = open_book(file)?;
    prepare_out_dir(out)?;

    let options = ExportOptions::new(out).with_prefix(prefix);
    let exporter = build_exporter(ExportFormat::from_name(format), options);
    let written = book.export(exporter.as_ref()).context("export sheets")?;
    tracing::info!(files = written.len(), "export finished");
    Ok(())
}

fn generate(file: &Path, lang: &str, options: GenerateOptions) -> Result<()> {
    let language: Language = lang.parse()?;
    let mut book = open_book(file)?;
    prepare_out_dir(&options.out_dir)?;

    let generator = build_generator(language, options);
    let written = book.generate(generator.as_ref()).context("generate code")?;
    tracing::info!(files = written.len(), "generate finished");
    Ok(())
}

fn update(file: &Path) -> Result<()> {
    let mut book = open_book(file)?;
    book.update_references().context("update reference data")?;
    Ok(())
}

fn meta_export(file: &Path, out: &Path) -> Result<()> {
    let mut book = open_book(file)?;
    prepare_out_dir(out)?;
    book.export_metadata(out).context("export metadata")?;
    Ok(())
}
