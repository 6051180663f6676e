use std::path::{Path, PathBuf};

use anyhow::Context;
use nsscope::AssemblyView;
use rayon::prelude::*;
use serde::Serialize;

/// Load and validate a .NET assembly.
pub fn load_assembly(path: &Path) -> anyhow::Result<AssemblyView> {
    AssemblyView::from_file(path)
        .with_context(|| format!("failed to load assembly: {}", path.display()))
}

/// Expand the command line inputs: files are kept as given, directories are searched
/// recursively for assemblies.
pub fn collect_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(collect_assemblies(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Collect all `.exe` and `.dll` files recursively from a directory.
pub fn collect_assemblies(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_assemblies_recursive(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_assemblies_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_assemblies_recursive(&path, files)?;
        } else if is_assembly_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns true if the path has an `.exe` or `.dll` extension.
pub fn is_assembly_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("exe" | "dll")
    )
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

/// An assembly that could not be processed.
#[derive(Debug, Serialize)]
pub struct Failure {
    pub path: String,
    pub error: String,
}

/// Run `process` on every file in parallel. Results come back in input order; failures are
/// logged and collected separately.
pub fn process_files<T: Send>(
    files: &[PathBuf],
    process: impl Fn(&Path) -> anyhow::Result<T> + Sync,
) -> (Vec<(PathBuf, T)>, Vec<Failure>) {
    let results: Vec<anyhow::Result<T>> = files.par_iter().map(|path| process(path)).collect();

    let mut processed = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(value) => processed.push((path.clone(), value)),
            Err(error) => {
                log::warn!("Skipping {} - {:#}", path.display(), error);
                failures.push(Failure {
                    path: path.display().to_string(),
                    error: format!("{error:#}"),
                });
            }
        }
    }

    (processed, failures)
}

/// Turn collected failures into the process result.
pub fn finish(failures: &[Failure], total: usize) -> anyhow::Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} assemblies could not be read", failures.len(), total)
    }
}
