//! Preview image lookup inside a package archive.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use std::fs::File;
use std::io::Read;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tga", "gif", "bmp"];
const PREFERRED_MARKERS: &[&str] = &["levelshot", "preview"];

/// Largest image read from an archive; the entry's size field is untrusted.
pub const MAX_PREVIEW_BYTES: u64 = 16 * 1024 * 1024;

/// Raw bytes of one image entry; never decoded here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub entry_name: String,
    pub bytes: Vec<u8>,
}

impl PreviewImage {
    /// Lowercase extension of the entry, e.g. `"tga"`.
    pub fn extension(&self) -> String {
        Utf8Path::new(&self.entry_name)
            .extension()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

/// Pick the preview image of a package.
///
/// Entries whose name contains `levelshot` or `preview` win; otherwise the
/// first image in archive order. `Ok(None)` when the archive has no image.
pub fn find_preview(path: &Utf8Path) -> Result<Option<PreviewImage>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let mut archive =
        zip::ZipArchive::new(file).with_context(|| format!("Not a valid archive: {}", path))?;

    let mut images = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index).context("zip entry")?;
        if entry.is_file() && is_image(entry.name()) {
            images.push(entry.name().to_string());
        }
    }

    let best = images
        .iter()
        .find(|name| {
            let lower = name.to_lowercase();
            PREFERRED_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .or_else(|| images.first());

    let Some(entry_name) = best.cloned() else {
        tracing::debug!("No image found in {}", path);
        return Ok(None);
    };

    let mut entry = archive
        .by_name(&entry_name)
        .with_context(|| format!("Failed to open {} in {}", entry_name, path))?;
    let capacity = entry.size().min(MAX_PREVIEW_BYTES);
    let mut bytes = Vec::with_capacity(usize::try_from(capacity).unwrap_or_default());
    entry
        .by_ref()
        .take(MAX_PREVIEW_BYTES + 1)
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read {} in {}", entry_name, path))?;

    if bytes.len() as u64 > MAX_PREVIEW_BYTES {
        bail!(
            "{} in {} is larger than {} bytes",
            entry_name,
            path,
            MAX_PREVIEW_BYTES
        );
    }

    Ok(Some(PreviewImage { entry_name, bytes }))
}

fn is_image(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}
