use color_eyre::Result;
use gameshelf_config::Settings;
use gameshelf_core::{ThumbnailCache, ThumbnailError, cache_key};
use gameshelf_models::ThumbnailFormat;
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba([0, 90, 200, 128])).save(path).unwrap();
}

fn cache_with(format: ThumbnailFormat, capacity: Option<usize>) -> ThumbnailCache {
    ThumbnailCache::new(&Settings {
        thumbnail_format: format,
        thumbnail_cache_capacity: capacity,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_png_thumbnail_is_decodable_and_bounded() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let source = temp_dir.path().join("A/Asteroids/icon.png");
    write_png(&source, 1024, 512);

    let cache = cache_with(ThumbnailFormat::Png, None);
    let thumbnail = cache.get_or_create(&source).await?;

    assert_eq!(thumbnail.key, cache_key(&source));
    assert_eq!(thumbnail.content_type(), "image/png");
    assert!(!thumbnail.is_empty());

    let decoded = image::load_from_memory(&thumbnail.bytes)?;
    assert_eq!((decoded.width(), decoded.height()), (320, 160));
    assert_eq!((thumbnail.width, thumbnail.height), (320, 160));
    Ok(())
}

#[tokio::test]
async fn test_jpeg_thumbnail_format() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let source = temp_dir.path().join("cover.png");
    write_png(&source, 100, 50);

    let cache = cache_with(ThumbnailFormat::Jpeg, None);
    let thumbnail = cache.get_or_create(&source).await?;

    assert_eq!(thumbnail.content_type(), "image/jpeg");
    assert_eq!(image::guess_format(&thumbnail.bytes)?, image::ImageFormat::Jpeg);
    assert_eq!((thumbnail.width, thumbnail.height), (100, 50));
    Ok(())
}

#[tokio::test]
async fn test_cached_preview_survives_source_change() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let source = temp_dir.path().join("icon.png");
    write_png(&source, 40, 40);

    let cache = cache_with(ThumbnailFormat::Png, None);
    let first = cache.get_or_create(&source).await?;

    // Same path, new content: the memo is keyed on the path only.
    write_png(&source, 80, 80);
    let second = cache.get_or_create(&source).await?;
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(second.width, 40);

    cache.clear().await;
    let third = cache.get_or_create(&source).await?;
    assert_eq!(third.width, 80);
    Ok(())
}

#[tokio::test]
async fn test_bounded_cache_evicts_least_recently_used() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths: Vec<PathBuf> = (0..3)
        .map(|i| {
            let path = temp_dir.path().join(format!("shot_{i}.png"));
            write_png(&path, 8, 8);
            path
        })
        .collect();

    let cache = cache_with(ThumbnailFormat::Png, Some(2));
    cache.get_or_create(&paths[0]).await?;
    cache.get_or_create(&paths[1]).await?;
    cache.get_or_create(&paths[0]).await?;
    cache.get_or_create(&paths[2]).await?;

    assert!(cache.get(&paths[0]).await.is_some());
    assert!(cache.get(&paths[1]).await.is_none());
    assert!(cache.get(&paths[2]).await.is_some());

    let stats = cache.stats().await;
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.capacity, Some(2));
    assert_eq!(stats.evictions, 1);
    Ok(())
}

#[tokio::test]
async fn test_failures_are_reported_and_retried() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let source = temp_dir.path().join("later.png");

    let cache = cache_with(ThumbnailFormat::Png, None);
    let missing = cache.get_or_create(&source).await;
    assert!(matches!(missing, Err(ThumbnailError::Io { .. })));

    fs::write(&source, b"definitely not a png")?;
    let corrupt = cache.get_or_create(&source).await;
    assert!(matches!(corrupt, Err(ThumbnailError::Decode { .. })));
    assert!(cache.is_empty().await);

    write_png(&source, 12, 12);
    let thumbnail = cache.get_or_create(&source).await?;
    assert_eq!(thumbnail.width, 12);
    assert_eq!(cache.stats().await.failures, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_cache() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let paths: Vec<PathBuf> = (0..4)
        .map(|i| {
            let path = temp_dir.path().join(format!("game_{i}.png"));
            write_png(&path, 200, 100);
            path
        })
        .collect();

    let cache = cache_with(ThumbnailFormat::Png, None);
    let mut handles = Vec::new();
    for round in 0..8 {
        let cache = cache.clone();
        let path = paths[round % paths.len()].clone();
        handles.push(tokio::spawn(async move { cache.get_or_create(&path).await }));
    }

    for handle in handles {
        let thumbnail = handle.await??;
        assert_eq!((thumbnail.width, thumbnail.height), (200, 100));
    }

    assert_eq!(cache.len().await, 4);
    let stats = cache.stats().await;
    assert_eq!(stats.hits + stats.misses, 8);
    Ok(())
}
