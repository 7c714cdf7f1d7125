use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uidiff_lib::types::CheckKind;
use uidiff_lib::Viewport;

#[derive(Parser)]
#[command(name = "uidiff")]
#[command(
    version,
    about = "UI parity checker - compare a rendered page against a reference design",
    long_about = "uidiff\n\nChecks a live page against a reference design two ways:\n- element-match: text recognized in the design is located on the page and its position compared.\n- pixel-diff / similarity: the reference image is compared with a screenshot (perceptual pixel count and SSIM).\n\nExit codes: 0 pass, 1 comparison failed, 2 fatal error."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output (info-level logs on stderr)")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with defaults for thresholds/checks/viewport/timeouts; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare a reference design against a rendered page or screenshot
    Compare(CompareArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "ocr",
        help = "Recognized text of the design: JSON or YAML array of {text, bbox:{x0,y0,x1,y1}}"
    )]
    pub layout: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Reference design image to run OCR on (requires the 'ocr' feature)"
    )]
    pub ocr: Option<PathBuf>,

    #[arg(
        long,
        default_value = "0.5",
        help = "Drop OCR words below this confidence (0.0-1.0)"
    )]
    pub min_confidence: f32,

    #[arg(long, help = "Page to match elements against (and screenshot when --actual is omitted)")]
    pub url: Option<String>,

    #[arg(long, value_name = "PATH", help = "Reference image for pixel-diff/similarity")]
    pub reference: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Actual image for pixel-diff/similarity")]
    pub actual: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Keep the screenshot captured from --url at this path"
    )]
    pub screenshot: Option<PathBuf>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Checks to run (element-match,pixel-diff,similarity); default all"
    )]
    pub checks: Option<Vec<CheckKind>>,

    #[arg(
        long,
        default_value = "0.1",
        help = "Per-pixel color distance threshold (0.0-1.0; smaller is stricter)"
    )]
    pub pixel_threshold: f64,

    #[arg(
        long,
        default_value = "0.95",
        help = "Similarity threshold for pass/fail (score >= threshold passes)"
    )]
    pub similarity_threshold: f64,

    #[arg(long, default_value = "0", help = "Largest differing pixel count that still passes")]
    pub max_diff_pixels: u64,

    #[arg(
        long,
        value_name = "MS",
        help = "Wait up to this long for each element to appear before looking it up"
    )]
    pub match_timeout_ms: Option<u64>,

    #[arg(long, help = "Count anti-aliased edge pixels as differences")]
    pub no_anti_aliasing: bool,

    #[arg(long, value_name = "PATH", help = "Write the diff visualization (PNG) here")]
    pub diff_image: Option<PathBuf>,

    #[arg(long, help = "Draw only differences in the diff image (transparent background)")]
    pub diff_mask: bool,

    #[arg(
        long,
        default_value = "1440x900",
        help = "Viewport dimensions (WIDTHxHEIGHT)"
    )]
    pub viewport: Viewport,

    #[arg(
        long,
        default_value = "30",
        help = "Navigation timeout (seconds) for URL rendering"
    )]
    pub nav_timeout: u64,

    #[arg(
        long,
        default_value = "10",
        help = "Network idle timeout (seconds) for URL rendering"
    )]
    pub network_idle_timeout: u64,

    #[arg(
        long,
        default_value = "45",
        help = "Process timeout (seconds) for Playwright invocation"
    )]
    pub process_timeout: u64,

    #[arg(long, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
