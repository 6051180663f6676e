//! Namespace filtering and counting.
//!
//! The reader reports every type it finds; which namespaces are interesting is up to the caller.
//! [`NamespaceFilter`] holds that policy, [`NamespaceTally`] applies it to one or more
//! [`TypeSource`]s and counts the surviving namespaces.
//!
//! # Example
//!
//! ```rust
//! use nsscope::{DecodedType, NamespaceFilter, NamespaceTally};
//!
//! let types = [
//!     DecodedType::new("Foo.Bar", "MyClass"),
//!     DecodedType::new("", "MyClass2"),
//!     DecodedType::new("System.Runtime", "Helper"),
//! ];
//!
//! let mut tally = NamespaceTally::new();
//! tally.add_types(&types[..], &NamespaceFilter::default())?;
//!
//! assert_eq!(tally.iter().collect::<Vec<_>>(), vec![("Foo.Bar", 1)]);
//! # Ok::<(), nsscope::Error>(())
//! ```

use std::collections::HashMap;

use crate::{metadata::types::TypeSource, Result};

/// Which namespaces to drop.
///
/// A namespace is excluded if it is empty (unless [`NamespaceFilter::include_empty`] is set), or
/// if it equals one of the excluded roots or lies below one on a `.` boundary. With the default
/// root `System`, both `System` and `System.IO` are dropped while `SystemX` and `NotSystem.Foo`
/// are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceFilter {
    exclude_empty: bool,
    excluded_roots: Vec<String>,
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        NamespaceFilter {
            exclude_empty: true,
            excluded_roots: vec!["System".to_string()],
        }
    }
}

impl NamespaceFilter {
    /// A filter that keeps everything
    #[must_use]
    pub fn none() -> Self {
        NamespaceFilter {
            exclude_empty: false,
            excluded_roots: Vec::new(),
        }
    }

    /// Keep or drop the empty namespace of global and nested types
    #[must_use]
    pub fn include_empty(mut self, include: bool) -> Self {
        self.exclude_empty = !include;
        self
    }

    /// Drop `root` and every namespace below it
    #[must_use]
    pub fn exclude_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        if !self.excluded_roots.contains(&root) {
            self.excluded_roots.push(root);
        }
        self
    }

    /// Stop dropping `root`; other roots are unaffected
    #[must_use]
    pub fn include_root(mut self, root: &str) -> Self {
        self.excluded_roots.retain(|excluded| excluded != root);
        self
    }

    /// The roots currently excluded
    #[must_use]
    pub fn excluded_roots(&self) -> &[String] {
        &self.excluded_roots
    }

    /// Returns `true` if `namespace` should be dropped
    #[must_use]
    pub fn is_excluded(&self, namespace: &str) -> bool {
        if namespace.is_empty() {
            return self.exclude_empty;
        }

        self.excluded_roots.iter().any(|root| {
            namespace
                .strip_prefix(root.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
    }

    /// Returns `true` if `namespace` should be kept
    #[must_use]
    pub fn is_included(&self, namespace: &str) -> bool {
        !self.is_excluded(namespace)
    }
}

/// Namespace counts in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTally {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl NamespaceTally {
    /// An empty tally
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one type in `namespace`, without filtering
    pub fn add(&mut self, namespace: &str) {
        self.add_count(namespace, 1);
    }

    fn add_count(&mut self, namespace: &str, count: usize) {
        if let Some(&position) = self.index.get(namespace) {
            self.entries[position].1 += count;
        } else {
            self.index.insert(namespace.to_string(), self.entries.len());
            self.entries.push((namespace.to_string(), count));
        }
    }

    /// Count the types of `source` whose namespace passes `filter`, returning how many were
    /// counted.
    ///
    /// # Errors
    /// Returns the first error reported by `source`. The tally is left unchanged in that case.
    pub fn add_types<S: TypeSource + ?Sized>(
        &mut self,
        source: &S,
        filter: &NamespaceFilter,
    ) -> Result<usize> {
        let mut local = NamespaceTally::new();
        let mut counted = 0;

        for decoded in source.types() {
            let decoded = decoded?;
            if filter.is_included(&decoded.namespace) {
                local.add(&decoded.namespace);
                counted += 1;
            } else {
                log::trace!("Filtered out {}", decoded.full_name());
            }
        }

        self.merge(&local);
        Ok(counted)
    }

    /// Add the counts of `other`; namespaces new to `self` are appended in `other`'s order
    pub fn merge(&mut self, other: &NamespaceTally) {
        for (namespace, count) in &other.entries {
            self.add_count(namespace, *count);
        }
    }

    /// The count for `namespace`, 0 if never seen
    #[must_use]
    pub fn get(&self, namespace: &str) -> usize {
        self.index
            .get(namespace)
            .map_or(0, |&position| self.entries[position].1)
    }

    /// `(namespace, count)` pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries
            .iter()
            .map(|(namespace, count)| (namespace.as_str(), *count))
    }

    /// Number of distinct namespaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was counted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}
