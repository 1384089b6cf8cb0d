use clap::Parser;
use color_eyre::eyre::Result;
use gameshelf_core::Browser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod output;

use cli::{Cli, Command};
use output::{DownloadView, ThumbnailView, print_json};

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[cfg(windows)]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // Install error hooks
    color_eyre::install()?;

    setup_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("gameshelf error: {}", e);
        return Err(e);
    }

    Ok(())
}

fn setup_logging() {
    // stdout carries JSON, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gameshelf=info,warn"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings().await?;
    info!("Starting gameshelf in {}", settings.root_dir.display());

    let browser = Browser::new(&settings)?;
    let query = cli.command.query();

    match cli.command {
        Command::Home { .. } => print_json(&browser.home(&query).await?)?,
        Command::Browse { subpath, .. } => print_json(&browser.browse(&subpath, &query).await?)?,
        Command::Buckets => print_json(&browser.indexer().buckets().await?)?,
        Command::Download { subpath } => {
            let file = browser.indexer().resolve_download(&subpath).await?;
            print_json(&DownloadView::from(&file))?;
        }
        Command::Thumbnail { subpath, output } => {
            let thumbnail = browser.thumbnail(&subpath).await?;
            tokio::fs::write(&output, &thumbnail.bytes[..]).await?;
            info!("Wrote {} byte thumbnail to {}", thumbnail.len(), output.display());
            print_json(&ThumbnailView::new(&thumbnail, output))?;
        }
    }

    Ok(())
}
