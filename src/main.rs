//! # dotmatrix CLI
//!
//! Run ESC/P print jobs through the virtual printer.
//!
//! ## Usage
//!
//! ```bash
//! # Print a captured job to page1.png, page2.png, ...
//! dotmatrix print job.prn
//!
//! # Multipage PostScript at 180 dpi into out/
//! dotmatrix print --output ps --multipage --dpi 180 --docpath out job.prn
//!
//! # Read the job from stdin, with settings from a JSON file
//! cat job.prn | dotmatrix print --config printer.json -
//!
//! # List the code pages ESC ( t can select
//! dotmatrix codepages
//! ```
//!
//! Set `RUST_LOG=debug` to see page events and skipped commands.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use dotmatrix::{
    PrinterError,
    output::Artifact,
    printer::{OutputFormat, PrinterConfig},
    protocol::charset,
    transport::ParallelPort,
};

/// dotmatrix - Virtual Epson ESC/P dot-matrix printer
#[derive(Parser, Debug)]
#[command(name = "dotmatrix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an ESC/P job file
    Print {
        /// Job file, or `-` for stdin
        file: PathBuf,

        /// JSON configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Page resolution in dots per inch
        #[arg(long)]
        dpi: Option<u16>,

        /// Paper width in 1/10 inch
        #[arg(long)]
        width: Option<u16>,

        /// Paper height in 1/10 inch
        #[arg(long)]
        height: Option<u16>,

        /// Output format: png, ps, bmp or printer
        #[arg(long, value_name = "FMT")]
        output: Option<OutputFormat>,

        /// Collect all pages into one document
        #[arg(long)]
        multipage: bool,

        /// Directory for output files
        #[arg(long, value_name = "DIR")]
        docpath: Option<PathBuf>,

        /// Directory with the TrueType printer faces
        #[arg(long, value_name = "DIR")]
        fontpath: Option<PathBuf>,

        /// Line feed after every carriage return
        #[arg(long)]
        autofeed: bool,
    },

    /// List supported code pages
    Codepages,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PrinterError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print {
            file,
            config,
            dpi,
            width,
            height,
            output,
            multipage,
            docpath,
            fontpath,
            autofeed,
        } => {
            let mut config = match config {
                Some(path) => PrinterConfig::from_json_file(path)?,
                None => PrinterConfig::default(),
            };
            config.enabled = true;
            if let Some(dpi) = dpi {
                config.dpi = dpi;
            }
            if let Some(width) = width {
                config.width = width;
            }
            if let Some(height) = height {
                config.height = height;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if multipage {
                config.multipage = true;
            }
            if let Some(docpath) = docpath {
                config.docpath = docpath;
            }
            if let Some(fontpath) = fontpath {
                config.font_path = fontpath;
            }

            let job = read_job(&file)?;
            print_job(config, &job, autofeed)
        }
        Commands::Codepages => {
            println!("Supported code pages:");
            for codepage in charset::SUPPORTED_CODEPAGES {
                println!("  {}", codepage);
            }
            println!("\nESC ( t selectors:");
            for (selector, codepage) in charset::EPSON_CODEPAGES.iter().enumerate() {
                match codepage {
                    0 => println!("  {:2}  italic", selector),
                    cp => println!("  {:2}  {}", selector, cp),
                }
            }
            Ok(())
        }
    }
}

fn read_job(file: &Path) -> Result<Vec<u8>, PrinterError> {
    if file.as_os_str() == "-" {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        Ok(data)
    } else {
        Ok(std::fs::read(file)?)
    }
}

/// Strobe the job through a parallel port and eject the last page.
fn print_job(config: PrinterConfig, job: &[u8], autofeed: bool) -> Result<(), PrinterError> {
    let mut port = ParallelPort::new(config)?;
    let control = port.read_control() & 0x1F;
    if autofeed {
        port.write_control(control | dotmatrix::transport::parallel::AUTOFEED);
    }

    port.send(job);
    port.form_feed();

    // Multipage documents report the same file for every page.
    let mut artifacts = port
        .printer()
        .map(|p| p.artifacts().to_vec())
        .unwrap_or_default();
    artifacts.dedup();
    if artifacts.is_empty() {
        println!("Nothing printed.");
    }
    for artifact in &artifacts {
        match artifact {
            Artifact::File(path) => println!("Wrote {}", path.display()),
            Artifact::Spooled { page } => println!("Spooled page {}", page),
        }
    }
    Ok(())
}
