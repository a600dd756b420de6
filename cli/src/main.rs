//! brlpage CLI - braille translation and pagination tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use brlpage::{
    parse_file_with_options, render, Encoding, Engine, EngineConfig, FormatStats, JsonFormat,
    ParseOptions,
};

#[derive(Parser)]
#[command(name = "brlpage")]
#[command(author = "brlpage contributors")]
#[command(version)]
#[command(about = "Translate tagged XML documents to paginated braille (BRF)", long_about = None)]
struct Cli {
    /// Input XML file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output BRF file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to BRF
    Convert {
        /// Input XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (input name with .brf if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write Unicode braille instead of ASCII
        #[arg(long)]
        unicode: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Run the pipeline twice and check the output is identical
    Bench {
        /// Input XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Dump formatted pages as JSON
    Dump {
        /// Input XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show document and configuration information
    Info {
        /// Input XML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print page statistics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct ConfigArgs {
    /// Data root holding settings/{page,braille,styles,rules}.json
    #[arg(long, value_name = "DIR", conflicts_with = "page")]
    config_dir: Option<PathBuf>,

    /// Page settings file
    #[arg(long, value_name = "FILE", requires_all = ["braille", "styles", "rules"])]
    page: Option<PathBuf>,

    /// Braille settings file
    #[arg(long, value_name = "FILE", requires = "page")]
    braille: Option<PathBuf>,

    /// Style definitions file
    #[arg(long, value_name = "FILE", requires = "page")]
    styles: Option<PathBuf>,

    /// Style and action rules file
    #[arg(long, value_name = "FILE", requires = "page")]
    rules: Option<PathBuf>,

    /// Tolerate malformed input
    #[arg(long)]
    lenient: bool,
}

impl ConfigArgs {
    fn load(&self) -> brlpage::Result<EngineConfig> {
        if let Some(dir) = &self.config_dir {
            log::debug!("Loading configuration from {}", dir.display());
            return EngineConfig::load_dir(dir);
        }
        match (&self.page, &self.braille, &self.styles, &self.rules) {
            (Some(page), Some(braille), Some(styles), Some(rules)) => {
                EngineConfig::from_paths(page, braille, styles, rules)
            }
            _ => Ok(EngineConfig::default()),
        }
    }

    fn parse_options(&self) -> ParseOptions {
        if self.lenient {
            ParseOptions::new().lenient()
        } else {
            ParseOptions::new()
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            unicode,
            config,
        }) => cmd_convert(&input, output.as_deref(), unicode, &config),
        Some(Commands::Bench { input, config }) => cmd_bench(&input, &config),
        Some(Commands::Dump {
            input,
            output,
            compact,
            config,
        }) => cmd_dump(&input, output.as_deref(), compact, &config),
        Some(Commands::Info {
            input,
            json,
            config,
        }) => cmd_info(&input, json, &config),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), false, &ConfigArgs::default())
            } else {
                println!("{}", "Usage: brlpage <FILE> [OUTPUT]".yellow());
                println!("       brlpage --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    unicode: bool,
    args: &ConfigArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("brf"));

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading configuration...");
    let mut config = args.load()?;
    if unicode {
        config.braille.encoding = Encoding::Unicode;
    }
    let engine = Engine::new(config)?;
    pb.inc(1);

    pb.set_message("Parsing document...");
    let mut doc = parse_file_with_options(input, args.parse_options())?;
    pb.inc(1);

    pb.set_message("Translating...");
    engine.translate(&mut doc)?;
    pb.inc(1);

    pb.set_message("Formatting pages...");
    let pages = engine.format(&doc)?;
    let brf = engine.to_brf(&pages)?;
    fs::write(&output, &brf)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!(
        "\n{} {} ({} pages)",
        "Saved to".green(),
        output.display(),
        pages.len()
    );

    Ok(())
}

fn cmd_bench(input: &Path, args: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new(args.load()?)?;

    let mut outputs = Vec::with_capacity(2);
    for run in 1..=2 {
        let start = Instant::now();
        let mut doc = parse_file_with_options(input, args.parse_options())?;
        let brf = engine.process(&mut doc)?;
        println!(
            "{} {}: {} bytes in {:.2?}",
            "Run".bold(),
            run,
            brf.len(),
            start.elapsed()
        );
        outputs.push(brf);
    }

    if outputs[0] != outputs[1] {
        return Err("output differs between runs".into());
    }
    println!("{}", "Output is identical".green().bold());

    Ok(())
}

fn cmd_dump(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    args: &ConfigArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::new(args.load()?)?;
    let mut doc = parse_file_with_options(input, args.parse_options())?;
    engine.translate(&mut doc)?;
    let pages = engine.format(&doc)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = render::to_json(&pages, format, false)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path, json: bool, args: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.load()?;
    let engine = Engine::new(config)?;
    let mut doc = parse_file_with_options(input, args.parse_options())?;
    let spans = engine.translate(&mut doc)?;
    let pages = engine.format(&doc)?;
    let stats = FormatStats::from_pages(&pages);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref language) = doc.metadata.language {
        println!("{}: {}", "Language".bold(), language);
    }
    println!("{}: {}", "Braille spans".bold(), spans);

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let page = &engine.config().page;
    println!(
        "{}: {} x {}",
        "Page size".bold(),
        page.width(),
        page.height()
    );
    println!("{}: {}", "Braille pages".bold(), stats.page_count);
    println!("{}: {}", "Blank pages".bold(), stats.blank_pages);
    println!("{}: {}", "Content lines".bold(), stats.content_lines);
    println!("{}: {}", "Cells".bold(), stats.cells);

    println!();
    println!("{}", "Configuration".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let braille = &engine.config().braille;
    println!("{}: {}", "Table".bold(), braille.table);
    println!("{}: {}", "Tables".bold(), engine.tables().ids().join(", "));
    println!("{}: {:?}", "Math code".bold(), braille.math_code);
    println!(
        "{}: {}",
        "Styles".bold(),
        engine.resolver().sheet().names().collect::<Vec<_>>().join(", ")
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "brlpage".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Braille translation and pagination tool");
    println!();
    println!("License: MIT");
}
