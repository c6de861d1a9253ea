//! Disk helpers shared by the CLI and the benches.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InputError;
use crate::models::{ImageInput, SourceImage};

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

/// Read a file as an encoded image input, without decoding it
pub fn load_input<P: AsRef<Path>>(path: P) -> Result<ImageInput, InputError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageInput::Encoded(bytes))
}

/// Read and decode an image file
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<SourceImage, InputError> {
    SourceImage::from_input(&load_input(path)?)
}

/// Dataset root from `BARSCAN_DATASET_ROOT`, `benches/images` by default
pub fn dataset_root_from_env() -> PathBuf {
    env::var("BARSCAN_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Image limit from `BARSCAN_BENCH_LIMIT`
///
/// Returns `None` (whole dataset) when unset or set to `0`.
pub fn bench_limit_from_env() -> Option<usize> {
    env::var("BARSCAN_BENCH_LIMIT")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
}

/// Sorted image paths under `root`, truncated to `limit`
pub fn dataset_iter<P: AsRef<Path>>(root: P, limit: Option<usize>) -> impl Iterator<Item = PathBuf> {
    let mut images = collect_images(root.as_ref());
    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

/// Every file with an image extension below `root`, unreadable dirs skipped
pub fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let is_image = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
            if is_image {
                images.push(path);
            }
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColorSpace;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let sequence = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = env::temp_dir().join(format!("barscan_tools_{}_{sequence}", std::process::id()));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_dataset_iter_sorted_and_limited() {
        let root = temp_dir();
        fs::create_dir_all(root.join("nested")).unwrap();
        for name in ["b.png", "a.JPG", "nested/c.bmp", "notes.txt"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let all: Vec<_> = dataset_iter(&root, None).collect();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(dataset_iter(&root, Some(2)).count(), 2);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_load_image() {
        let root = temp_dir();
        let path = root.join("tiny.png");
        image::GrayImage::from_pixel(3, 2, image::Luma([7u8])).save(&path).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.color(), ColorSpace::Gray);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_missing_file() {
        let err = load_input("/nonexistent/barscan.png").unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }
}
