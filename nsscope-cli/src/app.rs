use std::path::PathBuf;

use clap::Parser;
use nsscope::NamespaceFilter;

/// nsscope - list the namespaces defined in .NET assemblies
#[derive(Debug, Parser)]
#[command(name = "nsscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(flatten)]
    pub filter: FilterOptions,

    /// List every decoded type instead of the namespace tally.
    #[arg(long)]
    pub types: bool,

    /// Assemblies to read. Directories are searched recursively for .dll and .exe files.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Options shared across all output modes.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Which namespaces to report.
#[derive(Debug, Parser)]
pub struct FilterOptions {
    /// Keep `System` and the namespaces below it.
    #[arg(long)]
    pub include_system: bool,

    /// Keep types without a namespace (global and nested types).
    #[arg(long)]
    pub include_empty: bool,

    /// Drop this namespace root and everything below it. Repeatable.
    #[arg(long, value_name = "ROOT")]
    pub exclude: Vec<String>,
}

impl FilterOptions {
    pub fn to_filter(&self) -> NamespaceFilter {
        let mut filter = NamespaceFilter::default().include_empty(self.include_empty);
        if self.include_system {
            filter = filter.include_root("System");
        }
        for root in &self.exclude {
            filter = filter.exclude_root(root.as_str());
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flags() {
        let cli = Cli::parse_from([
            "nsscope",
            "--json",
            "--include-empty",
            "--exclude",
            "Microsoft",
            "--exclude",
            "Internal",
            "a.dll",
            "libs",
        ]);

        assert!(cli.global.json);
        assert!(!cli.global.verbose);
        assert!(!cli.types);
        assert_eq!(cli.paths, vec![PathBuf::from("a.dll"), PathBuf::from("libs")]);

        let filter = cli.filter.to_filter();
        assert!(filter.is_included(""));
        assert!(filter.is_excluded("System.IO"));
        assert!(filter.is_excluded("Microsoft.Win32"));
        assert!(filter.is_excluded("Internal"));
    }

    #[test]
    fn include_system() {
        let cli = Cli::parse_from(["nsscope", "--include-system", "-v", "a.dll"]);
        assert!(cli.global.verbose);

        let filter = cli.filter.to_filter();
        assert!(filter.is_included("System.IO"));
        assert!(filter.is_excluded(""));
    }

    #[test]
    fn paths_required() {
        assert!(Cli::try_parse_from(["nsscope", "--json"]).is_err());
    }
}
