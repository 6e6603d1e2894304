//! `receipt-renderer` command line.
//!
//! Renders a donation record (JSON, camelCase fields) into a PDF receipt, or
//! prints the receipt template for inspection.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use receipt_renderer::i18n::Translate;
use receipt_renderer::{share, Catalog, DonationRecord, Locale, OutputMode, ReceiptRenderer, RendererConfig};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "receipt-renderer", version, about = "Render donation receipts as PDF")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a receipt PDF into the output directory
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory (overrides the config file)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Run the full form validation before rendering
        #[arg(long)]
        validate: bool,

        /// Print a WhatsApp share link for the donor after rendering
        #[arg(long)]
        share_link: bool,
    },
    /// Print the receipt HTML template to stdout
    Html {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Donation record JSON file, or `-` for stdin
    #[arg(long)]
    record: PathBuf,

    /// Receipt language
    #[arg(long, default_value = "en")]
    locale: Locale,

    /// Banner URL or path (overrides the config file)
    #[arg(long)]
    banner: Option<String>,

    /// Renderer config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra translations JSON overlaid on the built-in catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Outline font for Kannada text, tried before the config file's fonts (repeatable)
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,
}

impl InputArgs {
    fn load_record(&self) -> Result<DonationRecord> {
        let json = if self.record.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading record from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&self.record)
                .with_context(|| format!("reading record {}", self.record.display()))?
        };
        Ok(DonationRecord::from_json(&json)?)
    }

    fn load_config(&self) -> Result<RendererConfig> {
        let mut config = match &self.config {
            Some(path) => RendererConfig::from_json_file(path)?,
            None => RendererConfig::default(),
        };
        if let Some(banner) = &self.banner {
            config.banner_url = banner.clone();
        }
        if !self.fonts.is_empty() {
            config.fonts.splice(0..0, self.fonts.iter().cloned());
        }
        Ok(config)
    }

    fn load_catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::builtin();
        if let Some(path) = &self.catalog {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            catalog.merge_json(&json)?;
        }
        Ok(catalog)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render { input, out, validate, share_link } => {
            let record = input.load_record()?;
            if validate {
                record.validate()?;
            }
            let mut config = input.load_config()?;
            if let Some(out) = out {
                config.output_dir = out;
            }
            let renderer = ReceiptRenderer::new(config)?.with_catalog(input.load_catalog()?);
            let output = renderer.render_localized(&record, input.locale, OutputMode::SaveToDisk)?;
            match output.path() {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", output.filename()),
            }
            if share_link {
                println!("{}", share::whatsapp_link(&record.mobile_number, &record.donor_name)?);
            }
        }
        Command::Html { input } => {
            let record = input.load_record()?;
            record.check_renderable()?;
            let renderer = ReceiptRenderer::new(input.load_config()?)?;
            let catalog = input.load_catalog()?;
            let text = catalog.translator(input.locale);
            let html = renderer.render_html(&record, input.locale, &text as &dyn Translate, chrono::Utc::now())?;
            println!("{}", html);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
