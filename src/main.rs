use std::path::PathBuf;

use clap::Parser;

use haku::build::{build_site, BuildOptions};
use haku::config::Config;

/// Builds the haku blog's feed and sitemap outputs.
#[derive(Parser)]
#[command(name = "haku", version, about)]
struct Cli {
    /// Directory to start the `haku.yaml` search from (ancestors are
    /// searched too).
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Output directory for the generated documents.
    #[arg(long, short, default_value = "./dist")]
    output: PathBuf,

    /// Include draft articles (preview mode).
    #[arg(long)]
    drafts: bool,

    /// Worker threads for loading and rendering. Defaults to the number
    /// of CPUs.
    #[arg(long)]
    threads: Option<usize>,

    /// Log level filter; `RUST_LOG` takes precedence when set.
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logger = flexi_logger::Logger::try_with_env_or_str(&cli.log)?.start()?;

    let config = Config::from_directory(&cli.project)?;
    build_site(
        &config,
        &BuildOptions {
            output_directory: cli.output,
            drafts: cli.drafts,
            threads: cli.threads.unwrap_or_else(num_cpus::get),
        },
    )?;
    Ok(())
}
