use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use urlqr::caption::MAX_CAPTION_FONT_PX;
use urlqr::config::{DEFAULT_LOGOS_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_QUIET_ZONE, DEFAULT_SIZE};
use urlqr::render::MAX_PIXEL_SIZE;
use urlqr::{GenerateOptions, QrCodeEcc, QrError};

/// Generate a QR code PNG for a URL, with an optional logo and caption.
#[derive(Parser, Debug)]
#[command(name = "urlqr", version)]
struct Cli {
    /// Text or URL to encode.
    url: Option<String>,

    /// Text or URL to encode (alternative to the positional argument).
    #[arg(long = "url", value_name = "URL", conflicts_with = "url")]
    url_flag: Option<String>,

    /// Requested image side in pixels; rounded down to a whole number of pixels per module.
    #[arg(
        long,
        default_value_t = DEFAULT_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PIXEL_SIZE))
    )]
    size: u32,

    /// Error correction level: L, M, Q or H.
    #[arg(long, default_value_t = QrCodeEcc::Medium)]
    ec: QrCodeEcc,

    /// Quiet zone width in modules.
    #[arg(long, default_value_t = DEFAULT_QUIET_ZONE)]
    quiet_zone: u32,

    /// Logo file name or stem in the logos directory, or a path to an image file.
    #[arg(long)]
    logo_name: Option<String>,

    /// Caption rendered under the code.
    #[arg(long)]
    caption: Option<String>,

    /// Caption font size in pixels.
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CAPTION_FONT_PX))
    )]
    caption_size: Option<u32>,

    /// Output directory.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    out_dir: PathBuf,

    /// Directory searched for logos.
    #[arg(long, default_value = DEFAULT_LOGOS_DIR)]
    logos_dir: PathBuf,

    /// Output file name, instead of one derived from the URL.
    #[arg(long)]
    name: Option<String>,

    /// Overwrite an existing output file.
    #[arg(long)]
    force: bool,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_options(self) -> Result<GenerateOptions, QrError> {
        let text = self
            .url
            .or(self.url_flag)
            .ok_or_else(|| QrError::invalid_argument("a URL is required (positional or --url)"))?;
        Ok(GenerateOptions {
            text,
            ecl: self.ec,
            size: self.size,
            quiet_zone: self.quiet_zone,
            logo_name: self.logo_name,
            caption: self.caption,
            caption_size: self.caption_size,
            output_dir: self.out_dir,
            logos_dir: self.logos_dir,
            file_name: self.name,
            force: self.force,
        })
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.into_options().and_then(|opts| urlqr::generate(&opts)) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
