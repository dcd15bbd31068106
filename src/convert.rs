use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use crate::{common, crs::Crs, io::GeoFormat, table::GeoTable};

/// Shapefile sidecars travel with their `.shp` and are never converted on their own.
const SHAPEFILE_SIDECARS: &[&str] = &["dbf", "shx", "prj", "cpg", "sbn", "sbx", "qix"];

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Skip files whose extension is not a supported container instead of failing.
    /// Shapefile sidecars are skipped either way.
    pub skip_invalid: bool,
}

/// Read `src`, reproject it to `crs`, and write it to `dst` (format from `dst`'s extension).
pub fn convert_file(src: &Path, dst: &Path, crs: Crs) -> Result<()> {
    let format = GeoFormat::from_path(dst)?;
    let table = GeoTable::read(src)?;
    table.to_crs(crs)
        .with_context(|| format!("Failed to convert {} to {crs}", src.display()))?
        .write_to(dst, format)?;
    log::info!("Converted {} to {crs} -> {}", src.display(), dst.display());
    Ok(())
}

/// Convert every container directly inside `src` into `dst`, keeping file names.
/// Returns the written paths.
pub fn convert_dir(src: &Path, dst: &Path, crs: Crs, options: &ConvertOptions) -> Result<Vec<PathBuf>> {
    common::require_dir_exists(src)?;
    common::require_dir_exists(dst)?;

    let mut entries = WalkDir::new(src).min_depth(1).max_depth(1).sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list {}", src.display()))?;
    entries.retain(|e| e.file_type().is_file());

    let mut written = Vec::new();
    for entry in entries {
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        if ext.as_deref().is_some_and(|e| SHAPEFILE_SIDECARS.contains(&e)) {
            continue;
        }

        if let Err(err) = GeoFormat::from_path(path) {
            if options.skip_invalid {
                log::debug!("Skipping {}: {err}", path.display());
                continue;
            }
            return Err(err);
        }

        let target = dst.join(entry.file_name());
        convert_file(path, &target, crs)?;
        written.push(target);
    }

    if written.is_empty() {
        log::warn!("No convertible files in {}", src.display());
    }
    Ok(written)
}

/// Convert a single file, or a directory of files when `src` is a directory.
pub fn convert(src: &Path, dst: &Path, crs: Crs, options: &ConvertOptions) -> Result<Vec<PathBuf>> {
    if !src.exists() {
        bail!("Source does not exist: {}", src.display());
    }
    if src.is_dir() {
        convert_dir(src, dst, crs, options)
    } else {
        convert_file(src, dst, crs)?;
        Ok(vec![dst.to_path_buf()])
    }
}
