//! # qrforge CLI
//!
//! Command-line interface for styled QR code rendering.
//!
//! ## Usage
//!
//! ```bash
//! # Render one code with a label
//! qrforge render --data https://example.com --label "Scan me" -o code.png
//!
//! # Render with a saved preset and a TTF label font
//! qrforge render --data hello --preset brand.json --font Lexend:700=Lexend-Bold.ttf -o hello.jpeg
//!
//! # One code per CSV row, zipped
//! qrforge batch items.csv --preset brand.json -o codes.zip
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use qrforge::{
    ForgeError,
    batch::{
        BatchJob, CsvRecordParser, DuplicatePolicy, LogProgress, TabularRecordParser,
        ZipAssembler, run_batch,
    },
    compose::render_labeled,
    render::{PreviewSession, StyledQrRenderer},
    resolve::ItemOverrideRecord,
    style::{
        Color, CornerDotShape, CornerSquareShape, DotShape, ExportFormat, FontWeight, Logo, LogoSlot,
        StylePreset,
        names,
    },
    text::{FontDescriptor, FontMetricsProvider, TtfFontBook},
};

/// qrforge - styled QR codes with labels
#[derive(Parser, Debug)]
#[command(name = "qrforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Style inputs shared by every command.
#[derive(clap::Args, Debug)]
struct StyleArgs {
    /// JSON style preset
    #[arg(long, value_name = "FILE")]
    preset: Option<PathBuf>,

    /// Label font, as FAMILY:WEIGHT[:italic]=PATH (repeatable)
    #[arg(long = "font", value_name = "SPEC")]
    fonts: Vec<FontArg>,

    /// Logo image (max 2 MiB)
    #[arg(long, value_name = "FILE")]
    logo: Option<PathBuf>,

    /// Output edge length in pixels (overrides the preset)
    #[arg(long)]
    size: Option<u32>,

    /// Output format: png, jpeg, webp or svg (overrides the preset)
    #[arg(long)]
    format: Option<ExportFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a single code
    Render {
        /// Payload to encode
        #[arg(long)]
        data: String,

        /// Label text under the code
        #[arg(long)]
        label: Option<String>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Render one code per CSV row into a ZIP archive
    Batch {
        /// CSV file with a `data` column
        csv: PathBuf,

        /// Output archive
        #[arg(short, long, value_name = "FILE", default_value = "qrcodes.zip")]
        output: PathBuf,

        /// Add _2, _3, ... to repeated file names instead of replacing
        #[arg(long)]
        unique_names: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Keep a preview PNG in sync with a preset file
    Preview {
        /// Payload to encode
        #[arg(long, default_value = "")]
        data: String,

        /// Preset to watch
        #[arg(long, value_name = "FILE")]
        preset: PathBuf,

        /// Preview file, rewritten whenever the preset changes
        #[arg(short, long, value_name = "FILE", default_value = "preview.png")]
        output: PathBuf,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },

    /// List shapes, formats, CSV columns and registered fonts
    Fonts {
        /// Sample text to measure with each font
        #[arg(long, default_value = "Scan me")]
        sample: String,

        #[command(flatten)]
        style: StyleArgs,
    },
}

/// `--font` value: `Lexend:700=fonts/Lexend-Bold.ttf`.
#[derive(Debug, Clone)]
struct FontArg {
    family: String,
    weight: FontWeight,
    italic: bool,
    path: PathBuf,
}

impl FromStr for FontArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (face, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FAMILY:WEIGHT[:italic]=PATH, got '{}'", s))?;
        let mut parts = face.split(':');
        let family = parts.next().unwrap_or("").trim();
        if family.is_empty() {
            return Err("font family must not be empty".to_string());
        }
        let weight = match parts.next() {
            Some(w) => w.parse()?,
            None => FontWeight::Normal,
        };
        let italic = match parts.next() {
            Some(style) if style.eq_ignore_ascii_case("italic") => true,
            Some(other) => return Err(format!("unknown font style '{}'", other)),
            None => false,
        };
        Ok(FontArg {
            family: family.to_string(),
            weight,
            italic,
            path: PathBuf::from(path),
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ForgeError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            data,
            label,
            output,
            style,
        } => {
            let (mut preset, fonts) = load_style(&style)?;
            if let Some(text) = label {
                preset.label.text = text;
            }
            let format = style.format.unwrap_or_else(|| format_from_path(&output, preset.format));

            let outcome = render_labeled(
                &StyledQrRenderer::new(),
                &fonts,
                &preset.style,
                &preset.label,
                &data,
                preset.export_size,
                format,
            )?;
            if let Some(note) = outcome.note() {
                println!("Note: {}", note);
            }
            std::fs::write(&output, outcome.bytes())?;
            println!("Saved {} to {}", format, output.display());
        }

        Commands::Batch {
            csv,
            output,
            unique_names,
            style,
        } => {
            let (preset, fonts) = load_style(&style)?;
            let bytes = std::fs::read(&csv)?;
            let table = CsvRecordParser::new().parse(&bytes)?;
            let duplicates = if unique_names {
                DuplicatePolicy::Suffix
            } else {
                DuplicatePolicy::Replace
            };
            let job = BatchJob::from_preset(table, &preset).with_duplicates(duplicates);

            let outcome = run_batch(
                &job,
                &StyledQrRenderer::new(),
                &fonts,
                &ZipAssembler::new(),
                &LogProgress,
            )?;
            for failed in &outcome.failed {
                println!("Row {}: {}", failed.index, failed.reason);
            }
            for (row, note) in &outcome.notes {
                println!("Row {}: {}", row, note);
            }
            std::fs::write(&output, &outcome.archive)?;
            println!("{}", outcome.summary());
            println!("Saved {}", output.display());
        }

        Commands::Preview {
            data,
            preset,
            output,
            interval_ms,
        } => {
            let mut session = PreviewSession::new(StyledQrRenderer::new());
            println!("Watching {} (Ctrl-C to stop)", preset.display());
            loop {
                let style = match StylePreset::load(&preset) {
                    Ok(loaded) => loaded.style,
                    Err(e) => {
                        log::warn!("Keeping last preview: {}", e);
                        std::thread::sleep(Duration::from_millis(interval_ms));
                        continue;
                    }
                };
                let before = session.render_count();
                if let Err(e) = session.update(&style, &data) {
                    log::warn!("Preview failed: {}", e);
                } else if session.render_count() != before
                    && let Some(png) = session.image()
                {
                    std::fs::write(&output, png)?;
                    println!("Updated {}", output.display());
                }
                std::thread::sleep(Duration::from_millis(interval_ms));
            }
        }

        Commands::Fonts { sample, style } => {
            let (preset, fonts) = load_style(&style)?;

            println!("Dot shapes:          {}", names::<DotShape>().join(", "));
            println!("Corner frame shapes: {}", names::<CornerSquareShape>().join(", "));
            println!("Corner dot shapes:   {}", names::<CornerDotShape>().join(", "));
            println!(
                "Formats:             {}",
                ExportFormat::ALL.map(|f| f.extension()).join(", ")
            );
            println!("CSV columns:         {}", ItemOverrideRecord::FIELDS.join(", "));
            println!("Colors:              {}", Color::ACCEPTED_FORMS);
            println!(
                "Color names:         {}",
                Color::names().collect::<Vec<_>>().join(", ")
            );
            println!();

            let faces = fonts.faces();
            if faces.is_empty() {
                println!("No font files registered, labels use the built-in bitmap font.");
            }
            for (family, weight, italic) in faces {
                let request = FontDescriptor {
                    family: family.clone(),
                    size: preset.label.font_size,
                    weight,
                    italic,
                };
                let metrics = fonts.measure(&request, &sample);
                println!(
                    "  {:<20} {} {:<7} width {:.1}px, height {:.1}px",
                    family,
                    weight,
                    if italic { "italic" } else { "normal" },
                    metrics.width,
                    metrics.height()
                );
            }
        }
    }

    Ok(())
}

/// Preset, logo and fonts from the shared command-line options.
fn load_style(args: &StyleArgs) -> Result<(StylePreset, TtfFontBook), ForgeError> {
    let mut preset = match &args.preset {
        Some(path) => StylePreset::load(path)?,
        None => StylePreset::default(),
    };
    if let Some(size) = args.size {
        if size == 0 {
            return Err(ForgeError::Style("--size must be positive".to_string()));
        }
        preset.export_size = size;
    }
    if let Some(format) = args.format {
        preset.format = format;
    }
    if let Some(path) = &args.logo {
        let mut slot = LogoSlot::new();
        if let Some(logo) = preset.style.logo.take() {
            slot.set(logo);
        }
        let had_logo = slot.get().is_some();
        match slot.replace(std::fs::read(path)?) {
            Ok(logo) if !had_logo => {
                let size = preset.logo.as_ref().map_or(Logo::DEFAULT_SIZE, |l| l.size);
                let sized = logo.clone().with_size(size);
                slot.set(sized);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Ignoring logo {}: {}", path.display(), e),
        }
        preset.style.logo = slot.get().cloned();
    }

    let mut fonts = TtfFontBook::new();
    for font in &args.fonts {
        fonts.load_file(&font.family, font.weight, font.italic, &font.path)?;
    }
    Ok((preset, fonts))
}

/// Format implied by the output file extension, else `fallback`.
fn format_from_path(path: &Path, fallback: ExportFormat) -> ExportFormat {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
        .unwrap_or(fallback)
}
