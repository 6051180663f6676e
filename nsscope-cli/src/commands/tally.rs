use std::path::{Path, PathBuf};

use anyhow::Context;
use nsscope::{NamespaceFilter, NamespaceTally};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{
        collect_inputs, file_display_name, finish, load_assembly, process_files, Failure,
    },
    output::print_output,
};

#[derive(Debug, Serialize)]
struct NamespaceEntry {
    namespace: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct TallyOutput {
    namespaces: Vec<NamespaceEntry>,
    failed: Vec<Failure>,
}

pub fn run(
    paths: &[PathBuf],
    filter: &NamespaceFilter,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let files = collect_inputs(paths)?;
    if files.is_empty() {
        log::warn!("No assemblies found");
    }

    let (processed, failed) = process_files(&files, |path| tally_file(path, filter));
    let output = TallyOutput {
        namespaces: merge(processed.iter().map(|(_, tally)| tally)),
        failed,
    };

    print_output(&output, opts, |out| {
        for entry in &out.namespaces {
            println!("{}\t{}", entry.namespace, entry.count);
        }
    })?;

    finish(&output.failed, files.len())
}

fn tally_file(path: &Path, filter: &NamespaceFilter) -> anyhow::Result<NamespaceTally> {
    let view = load_assembly(path)?;

    let mut tally = NamespaceTally::new();
    let counted = tally
        .add_types(&view, filter)
        .with_context(|| format!("failed to decode types: {}", path.display()))?;

    log::debug!(
        "{}: {} types in {} namespaces",
        file_display_name(path),
        counted,
        tally.len()
    );
    Ok(tally)
}

fn merge<'a>(tallies: impl Iterator<Item = &'a NamespaceTally>) -> Vec<NamespaceEntry> {
    let mut total = NamespaceTally::new();
    for tally in tallies {
        total.merge(tally);
    }

    total
        .iter()
        .map(|(namespace, count)| NamespaceEntry {
            namespace: namespace.to_string(),
            count,
        })
        .collect()
}
