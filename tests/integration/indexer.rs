use color_eyre::Result;
use gameshelf_config::Settings;
use gameshelf_core::{Browse, IndexError, Indexer};
use gameshelf_models::{Kind, ListingQuery};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn settings_for(root: &Path) -> Settings {
    Settings {
        root_dir: root.to_path_buf(),
        items_per_page: 50,
        worker_threads: 2,
        ..Default::default()
    }
}

fn write_file(path: &Path, size: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; size]).unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, Rgb([200, 40, 40])).save(path).unwrap();
}

/// A small shelf: two buckets, a handful of games, one with screenshots.
fn setup_shelf(root: &Path) {
    write_png(&root.join("A/Asteroids/icon.png"), 32, 32);
    write_file(&root.join("A/Asteroids/game.jar"), 512_000);
    write_file(&root.join("A/Asteroids/readme.txt"), 120);
    write_png(&root.join("A/Arkanoid/screens/title.png"), 64, 48);
    write_file(&root.join("A/Arkanoid/arkanoid.sis"), 4096);
    fs::create_dir_all(root.join("B/Bomberman")).unwrap();
    write_file(&root.join("B/Bomberman/bomberman.jar"), 2048);
    write_file(&root.join("B/Bubble Bobble/bb.zip"), 8192);
    write_file(&root.join("notes.txt"), 10);
}

#[tokio::test]
async fn test_asteroids_scenario() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    let home = indexer.home(&ListingQuery::new()).await?;
    assert!(home.items.iter().any(|c| c.path == "A/Asteroids"));

    let Browse::Listing(page) = indexer.browse("A/Asteroids", &ListingQuery::new()).await? else {
        panic!("A/Asteroids should be a directory");
    };

    let icon = page.items.iter().find(|e| &*e.name == "icon.png").unwrap();
    assert_eq!(icon.kind, Kind::Image);
    assert_eq!(icon.thumbnail_ref.as_deref(), Some("A/Asteroids/icon.png"));

    let jar = page.items.iter().find(|e| &*e.name == "game.jar").unwrap();
    assert_eq!(jar.kind, Kind::Downloadable);
    assert_eq!(jar.size_bytes, Some(512_000));
    Ok(())
}

#[tokio::test]
async fn test_home_lists_games_across_buckets_in_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    let home = indexer.home(&ListingQuery::new()).await?;
    let paths: Vec<&str> = home.items.iter().map(|c| c.path.as_str()).collect();

    assert_eq!(
        paths,
        vec!["A/Arkanoid", "A/Asteroids", "B/Bomberman", "B/Bubble Bobble"]
    );
    assert_eq!(home.total_items, 4);

    // Only direct image children count, so screenshots in a subfolder do not.
    assert!(home.items[0].thumbnail_ref.is_none());
    assert_eq!(home.items[1].thumbnail_ref.as_deref(), Some("A/Asteroids/icon.png"));
    Ok(())
}

#[tokio::test]
async fn test_home_search_and_bucket_filter() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    let searched = indexer.home(&ListingQuery::new().with_search("BOB")).await?;
    assert_eq!(searched.items.len(), 1);
    assert_eq!(&*searched.items[0].name, "Bubble Bobble");

    let bucket = indexer.home(&ListingQuery::new().with_bucket("B")).await?;
    assert!(bucket.items.iter().all(|c| &*c.bucket == "B"));
    assert_eq!(bucket.items.len(), 2);

    let none = indexer.home(&ListingQuery::new().with_bucket("Z")).await?;
    assert!(none.is_empty());
    assert_eq!(none.total_pages, 1);
    Ok(())
}

#[tokio::test]
async fn test_home_pagination_walks_every_candidate_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    for bucket in ["A", "B", "C"] {
        for i in 0..7 {
            fs::create_dir_all(temp_dir.path().join(format!("{bucket}/game_{i:02}")))?;
        }
    }
    let settings = Settings {
        items_per_page: 5,
        ..settings_for(temp_dir.path())
    };
    let indexer = Indexer::new(&settings)?;

    let first = indexer.home(&ListingQuery::new()).await?;
    assert_eq!(first.total_items, 21);
    assert_eq!(first.total_pages, 5);

    let mut seen = Vec::new();
    for page_number in 1..=first.total_pages {
        let page = indexer.home(&ListingQuery::new().with_page(page_number)).await?;
        seen.extend(page.items.into_iter().map(|c| c.path));
    }

    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(seen.len(), 21);
    assert_eq!(sorted, seen);

    let past_end = indexer.home(&ListingQuery::new().with_page(9)).await?;
    assert!(past_end.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_browse_root_sorts_directories_first() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    let Browse::Listing(page) = indexer.browse("", &ListingQuery::new()).await? else {
        panic!("root should be a directory");
    };

    let names: Vec<&str> = page.items.iter().map(|e| &*e.name).collect();
    assert_eq!(names, vec!["A", "B", "notes.txt"]);
    assert!(page.items[0].is_directory);
    assert_eq!(page.items[2].kind, Kind::Other);
    Ok(())
}

#[tokio::test]
async fn test_browse_rejects_escapes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    for subpath in ["../", "A/../../etc", "../../../../etc/passwd"] {
        let result = indexer.browse(subpath, &ListingQuery::new()).await;
        assert!(
            matches!(result, Err(IndexError::InvalidPath(_))),
            "{subpath} should be rejected, got {result:?}"
        );
    }

    let missing = indexer.browse("A/Pacman", &ListingQuery::new()).await;
    assert!(missing.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_download_flow() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    let jar = indexer.resolve_download("A/Asteroids/game.jar").await?;
    assert_eq!(jar.size_bytes, 512_000);
    assert_eq!(jar.kind, Kind::Downloadable);
    assert!(jar.path.starts_with(indexer.root()));

    let blocked = indexer.resolve_download("A/Asteroids/readme.txt").await;
    assert!(matches!(blocked, Err(IndexError::Forbidden(_))));

    let directory = indexer.resolve_download("A/Asteroids").await;
    assert!(matches!(directory, Err(IndexError::NotAFile(_))));
    Ok(())
}

#[tokio::test]
async fn test_buckets_lists_first_level_directories() -> Result<()> {
    let temp_dir = TempDir::new()?;
    setup_shelf(temp_dir.path());
    let indexer = Indexer::new(&settings_for(temp_dir.path()))?;

    assert_eq!(indexer.buckets().await?, vec!["A".to_string(), "B".to_string()]);
    Ok(())
}
