//! htmlsheet CLI - render templates and convert HTML tables to XLSX

mod logger;
mod template;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use htmlsheet::{CheckpointPolicy, ConvertOptions, RunReport};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "htmlsheet")]
#[command(
    author,
    version,
    about = "Render report templates and convert HTML tables to XLSX"
)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        env = "HTMLSHEET_LOG_LEVEL",
        default_value = "info"
    )]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with JSON data and convert the result
    Render {
        /// Template file
        template: PathBuf,

        /// JSON data file (an object)
        data: PathBuf,

        /// Output XLSX file
        output: PathBuf,

        /// Body rows per batch (overrides --batch-size)
        #[arg(value_name = "BATCH_SIZE")]
        batch: Option<usize>,

        /// Also write the rendered markup to rendered.html next to the output
        #[arg(long, env = "HTMLSHEET_DEBUG")]
        debug: bool,

        #[command(flatten)]
        convert: ConvertArgs,
    },

    /// Convert an HTML file with tables to XLSX
    Convert {
        /// Input HTML file
        input: PathBuf,

        /// Output XLSX file
        output: PathBuf,

        #[command(flatten)]
        convert: ConvertArgs,
    },
}

/// Conversion settings shared by both commands
#[derive(Args)]
struct ConvertArgs {
    /// JSON file with conversion options; flags override its values
    #[arg(long, env = "HTMLSHEET_CONFIG")]
    config: Option<PathBuf>,

    /// Pixels to column-width units
    #[arg(long, env = "HTMLSHEET_WIDTH_MULTIPLIER")]
    width_multiplier: Option<f64>,

    /// Pixels to row-height units
    #[arg(long, env = "HTMLSHEET_HEIGHT_MULTIPLIER")]
    height_multiplier: Option<f64>,

    /// Body rows per batch
    #[arg(long, env = "HTMLSHEET_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// When to write the output: every-batch or hold-open
    #[arg(long, env = "HTMLSHEET_CHECKPOINT")]
    checkpoint: Option<CheckpointPolicy>,

    /// Row height for row styles that declare none
    #[arg(long, env = "HTMLSHEET_DEFAULT_ROW_HEIGHT")]
    default_row_height: Option<f64>,

    /// Font size for cells that declare none
    #[arg(long, env = "HTMLSHEET_DEFAULT_FONT_SIZE")]
    default_font_size: Option<f64>,

    /// Hex fill for cells that declare no background
    #[arg(long)]
    default_background: Option<String>,

    /// Directory relative image paths resolve against (default: the input's directory)
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Delete the output if the conversion fails part way
    #[arg(long)]
    remove_partial: bool,
}

impl ConvertArgs {
    /// Options from the config file (or defaults) with flags applied on top
    fn options(&self, source: &Path) -> Result<ConvertOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => ConvertOptions::default(),
        };

        if let Some(v) = self.width_multiplier {
            options.width_multiplier = v;
        }
        if let Some(v) = self.height_multiplier {
            options.height_multiplier = v;
        }
        if let Some(v) = self.batch_size {
            options.batch_size = v;
        }
        if let Some(v) = self.checkpoint {
            options.checkpoint = v;
        }
        if let Some(v) = self.default_row_height {
            options.default_row_height = v;
        }
        if let Some(v) = self.default_font_size {
            options.default_font_size = v;
        }
        if let Some(v) = &self.default_background {
            options.default_background = v.clone();
        }
        if let Some(dir) = &self.image_dir {
            options.image_base_dir = Some(dir.clone());
        } else if options.image_base_dir.is_none() {
            options.image_base_dir = source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf);
        }
        if self.remove_partial {
            options.remove_partial_on_error = true;
        }

        options
            .validate()
            .context("Invalid conversion options")?;
        Ok(options)
    }
}

fn load_config(path: &Path) -> Result<ConvertOptions> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config '{}'", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.log_level).context("Failed to install logger")?;

    match cli.command {
        Commands::Render {
            template,
            data,
            output,
            batch,
            debug,
            convert,
        } => {
            let mut options = convert.options(&template)?;
            if let Some(batch) = batch {
                options.batch_size = batch;
            }
            render(&template, &data, &output, debug, &options)
        }
        Commands::Convert {
            input,
            output,
            convert,
        } => {
            let options = convert.options(&input)?;
            convert_file(&input, &output, &options)
        }
    }
}

fn render(
    template: &Path,
    data: &Path,
    output: &Path,
    debug: bool,
    options: &ConvertOptions,
) -> Result<()> {
    let start = Instant::now();
    let data = template::read_data(data)?;
    let html = template::render_file(template, &data)?;
    log::info!(
        "rendered '{}' ({} bytes) in {:.3}s",
        template.display(),
        html.len(),
        start.elapsed().as_secs_f64()
    );

    if debug {
        let debug_path = output.with_file_name("rendered.html");
        match std::fs::write(&debug_path, &html) {
            Ok(()) => log::info!("wrote rendered markup to '{}'", debug_path.display()),
            Err(err) => log::warn!(
                "cannot write rendered markup to '{}': {}",
                debug_path.display(),
                err
            ),
        }
    }

    let report = htmlsheet::convert_html(&html, output, options)
        .with_context(|| format!("Failed to convert rendered '{}'", template.display()))?;
    summarize(&report, start);
    Ok(())
}

fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<()> {
    let start = Instant::now();
    let report = htmlsheet::convert_file(input, output, options)
        .with_context(|| format!("Failed to convert '{}'", input.display()))?;
    summarize(&report, start);
    Ok(())
}

fn summarize(report: &RunReport, start: Instant) {
    log::info!(
        "wrote '{}': {} sheet(s), {} row(s), {} checkpoint(s), total {:.3}s",
        report.output.display(),
        report.tables,
        report.rows,
        report.checkpoints,
        start.elapsed().as_secs_f64()
    );
}
