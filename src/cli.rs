use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use gameshelf_config::Settings;
use gameshelf_models::ListingQuery;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gameshelf", version, about = "Browse, search and preview a folder tree of games")]
pub struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root of the game tree (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Entries per page (overrides the config file)
    #[arg(long, global = true)]
    pub items_per_page: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Every game folder across all bucket directories
    Home {
        #[arg(short, long)]
        search: Option<String>,
        /// Only scan this bucket
        #[arg(short, long)]
        bucket: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// List a folder, or describe a file, relative to the root
    Browse {
        #[arg(default_value = "")]
        subpath: String,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Names of the first-level bucket directories
    Buckets,
    /// Resolve a file for download
    Download { subpath: String },
    /// Write the preview of an image to a file
    Thumbnail {
        subpath: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Command {
    #[must_use]
    pub fn query(&self) -> ListingQuery {
        match self {
            Self::Home { search, bucket, page } => ListingQuery {
                search: search.clone(),
                bucket: bucket.clone(),
                page: *page,
            },
            Self::Browse { search, page, .. } => ListingQuery {
                search: search.clone(),
                bucket: None,
                page: *page,
            },
            Self::Buckets | Self::Download { .. } | Self::Thumbnail { .. } => ListingQuery::new(),
        }
    }
}

impl Cli {
    /// Loads settings and applies command-line overrides.
    pub async fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path).await?,
            None => Settings::load().await?,
        };

        if let Some(root) = &self.root {
            settings.root_dir.clone_from(root);
        }
        if let Some(items_per_page) = self.items_per_page {
            settings.items_per_page = items_per_page;
        }

        settings.validate()?;
        Ok(settings)
    }
}
