use color_eyre::eyre::Result;
use gameshelf_models::{Kind, ResolvedFile, Thumbnail};
use gameshelf_utils::format_bytes;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct DownloadView<'a> {
    pub path: &'a Path,
    pub name: &'a str,
    pub kind: Kind,
    pub size_bytes: u64,
    pub size: String,
}

impl<'a> From<&'a ResolvedFile> for DownloadView<'a> {
    fn from(file: &'a ResolvedFile) -> Self {
        Self {
            path: &file.path,
            name: &file.name,
            kind: file.kind,
            size_bytes: file.size_bytes,
            size: format_bytes(file.size_bytes),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThumbnailView<'a> {
    pub key: &'a str,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
    pub bytes: usize,
    pub output: PathBuf,
}

impl<'a> ThumbnailView<'a> {
    pub fn new(thumbnail: &'a Thumbnail, output: PathBuf) -> Self {
        Self {
            key: &thumbnail.key,
            width: thumbnail.width,
            height: thumbnail.height,
            content_type: thumbnail.content_type(),
            bytes: thumbnail.len(),
            output,
        }
    }
}

/// Pretty JSON on stdout, newline terminated.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
