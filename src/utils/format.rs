use anyhow::{Result, anyhow};
use std::path::Path;

/// Extension of the published tiled format.
pub const TILED_EXTENSION: &str = "pmtiles";

/// Source formats the converter accepts. Anything else is rejected at entry.
pub const SOURCE_EXTENSIONS: &[&str] = &["geojson", "json"];

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// True if the name ends in the tiled-format extension (case-insensitive).
pub fn is_tiled_name(name: &str) -> bool {
    extension_of(name).as_deref() == Some(TILED_EXTENSION)
}

/// True if the name carries one of the recognized source extensions.
pub fn is_convertible_name(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str()))
}

/// Derives the published object key from the original upload name:
/// strips a recognized source extension and appends the tiled extension.
/// The result depends only on the original name, never on staging paths.
pub fn tiled_key_for(original_name: &str) -> String {
    let stem = match extension_of(original_name) {
        Some(ext) if SOURCE_EXTENSIONS.contains(&ext.as_str()) => {
            &original_name[..original_name.len() - ext.len() - 1]
        }
        _ => original_name,
    };
    format!("{}.{}", stem, TILED_EXTENSION)
}

/// Reduces an untrusted upload name to its final path component and rejects
/// names that leave nothing usable behind.
pub fn sanitize_filename(original: &str) -> Result<String> {
    let name = Path::new(original)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!("Invalid filename: {:?}", original));
    }

    Ok(name)
}
