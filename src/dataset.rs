use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{Dataset, EvalConfig, Split};
use crate::error::{Result, SegError};

/// Ordered list of images to evaluate for a configuration
pub fn load_image_list(config: &EvalConfig) -> Result<Vec<PathBuf>> {
    let mut images = enumerate(config.dataset, &config.data_path, config.split)?;

    if let Some(limit) = config.limit {
        images.truncate(limit);
    }

    info!("# of images for testing: {}", images.len());
    Ok(images)
}

/// Enumerate a dataset split. The result is never empty.
pub fn enumerate(dataset: Dataset, root: &Path, split: Split) -> Result<Vec<PathBuf>> {
    match dataset {
        Dataset::City => scan_cityscapes(root, split),
        Dataset::Pascal => read_voc_manifest(root, split),
    }
}

/// `<root>/leftImg8bit/<split>/<city>/*.png`, sorted by path
pub fn scan_cityscapes(root: &Path, split: Split) -> Result<Vec<PathBuf>> {
    let base = root.join("leftImg8bit").join(split.name());
    let pattern = format!("{}/*/*.png", Pattern::escape(&base.to_string_lossy()));

    let entries = glob::glob(&pattern)
        .map_err(|e| SegError::Configuration(format!("invalid image pattern {pattern}: {e}")))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SegError::Io(e.into_error()))?;
        if path.is_file() {
            images.push(path);
        }
    }

    if images.is_empty() {
        return Err(SegError::EmptyImageList { location: pattern });
    }

    images.sort();
    Ok(images)
}

/// `<root>/VOC2012/list/<split>.txt`, one image per line, paths relative
/// to `<root>/VOC2012`. Only the first column is used; order is kept.
pub fn read_voc_manifest(root: &Path, split: Split) -> Result<Vec<PathBuf>> {
    let voc_root = root.join("VOC2012");
    let manifest = voc_root.join("list").join(format!("{}.txt", split.name()));
    if !manifest.is_file() {
        return Err(SegError::missing("manifest file", manifest));
    }

    let contents = fs::read_to_string(&manifest)?;
    let mut images = Vec::new();
    for line in contents.lines() {
        let Some(rel) = line.split_whitespace().next() else {
            continue;
        };
        let path = voc_root.join(rel.trim_start_matches('/'));
        if !path.is_file() {
            return Err(SegError::missing("image file", path));
        }
        images.push(path);
    }

    if images.is_empty() {
        return Err(SegError::EmptyImageList {
            location: manifest.display().to_string(),
        });
    }

    Ok(images)
}
