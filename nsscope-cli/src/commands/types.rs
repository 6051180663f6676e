use std::path::{Path, PathBuf};

use anyhow::Context;
use nsscope::{DecodedType, NamespaceFilter};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{
        collect_inputs, file_display_name, finish, load_assembly, process_files, Failure,
    },
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct TypeEntry {
    assembly: String,
    token: String,
    namespace: String,
    name: String,
    nested: bool,
}

#[derive(Debug, Serialize)]
struct TypesOutput {
    types: Vec<TypeEntry>,
    count: usize,
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

    let (processed, failed) = process_files(&files, |path| list_file(path, filter));
    let types: Vec<TypeEntry> = processed
        .into_iter()
        .flat_map(|(_, entries)| entries)
        .collect();

    let output = TypesOutput {
        count: types.len(),
        types,
        failed,
    };

    print_output(&output, opts, |out| {
        let mut tw = TabWriter::new(vec![
            ("Assembly", Align::Left),
            ("Token", Align::Left),
            ("Namespace", Align::Left),
            ("Name", Align::Left),
        ]);
        for e in &out.types {
            let name = if e.nested {
                format!("{} (nested)", e.name)
            } else {
                e.name.clone()
            };
            tw.row(vec![
                e.assembly.clone(),
                e.token.clone(),
                e.namespace.clone(),
                name,
            ]);
        }
        tw.print();
        println!("\n{} type(s) listed.", out.count);
    })?;

    finish(&output.failed, files.len())
}

fn list_file(path: &Path, filter: &NamespaceFilter) -> anyhow::Result<Vec<TypeEntry>> {
    let view = load_assembly(path)?;
    let assembly = file_display_name(path);

    let mut entries = Vec::new();
    for decoded in view.types() {
        let decoded =
            decoded.with_context(|| format!("failed to decode types: {}", path.display()))?;
        if filter.is_included(&decoded.namespace) {
            entries.push(entry(&assembly, decoded));
        }
    }
    Ok(entries)
}

fn entry(assembly: &str, decoded: DecodedType) -> TypeEntry {
    TypeEntry {
        assembly: assembly.to_string(),
        token: decoded.token.to_string(),
        nested: decoded.is_nested(),
        namespace: decoded.namespace,
        name: decoded.name,
    }
}
