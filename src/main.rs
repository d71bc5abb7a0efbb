use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use retrostamp::{OutputPolicy, SaveOptions, add_timestamp};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image to stamp
    input: PathBuf,

    /// Where to write the stamped image (defaults to <stem>_stamped.<ext>
    /// next to the input)
    output: Option<PathBuf>,

    /// Output container policy: preserve the input's format, or let `auto`
    /// swap lossy-leaning formats (HEIC) for JPEG
    #[arg(long, value_enum, default_value_t = FormatArg::Preserve)]
    output_format: FormatArg,

    /// Print the result record as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Preserve,
    Auto,
}

impl From<FormatArg> for OutputPolicy {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Preserve => OutputPolicy::Preserve,
            FormatArg::Auto => OutputPolicy::Auto,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let output = cli.output.clone().unwrap_or_else(|| default_output_path(&cli.input));

    let options = SaveOptions {
        output_format: cli.output_format.into(),
    };

    info!("stamping {}", cli.input.display());
    let result = add_timestamp(&cli.input, &output, &options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Output: {}", result.output_path.display());
        println!("Size:   {}x{}", result.width, result.height);
        match (result.date_used, result.date_source) {
            (Some(date), Some(source)) => {
                println!("Date:   {}", date);
                println!("Source: {}", source);
            }
            _ => println!("Date:   none found"),
        }
        println!("Added:  {}", result.timestamp_added);
    }

    Ok(())
}

/// `photo.jpg` -> `photo_stamped.jpg`, next to the input.
fn default_output_path(input: &PathBuf) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_stamped.{}", stem, ext),
        None => format!("{}_stamped", stem),
    };
    input.with_file_name(name)
}
