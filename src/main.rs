//! epubweb - Turn an extracted EPUB into a static website

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use epubweb::{SiteConfig, Templates};

#[derive(Parser)]
#[command(name = "epubweb")]
#[command(version, about = "Turn an extracted EPUB into a static website", long_about = None)]
#[command(after_help = "EXAMPLES:
    epubweb book/ -o site/                      Convert with the built-in templates
    epubweb book/ -o site/ -t my-templates/     Override page.hbs / navigation.hbs
    RUST_LOG=epubweb=debug epubweb book/ -o site/")]
struct Cli {
    /// Extracted book directory (containing META-INF/container.xml)
    #[arg(value_name = "WORKDIR")]
    workdir: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Base URL of the gitbook assets
    #[arg(short, long, value_name = "URL", default_value = "")]
    gitbook_url: String,

    /// Directory holding page.hbs and/or navigation.hbs
    #[arg(short, long, value_name = "TEMPLATE_DIR")]
    templates: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "epubweb=warn" } else { "epubweb=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(first) => {
            println!("{first}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> epubweb::Result<String> {
    let templates = match &cli.templates {
        Some(dir) => Templates::from_dir(dir)?,
        None => Templates::default(),
    };
    let config = SiteConfig::new(&cli.output)
        .with_gitbook_url(cli.gitbook_url.as_str())
        .with_templates(templates);

    epubweb::convert(&cli.workdir, &config)
}
