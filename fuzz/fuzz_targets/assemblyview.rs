#![no_main]

use libfuzzer_sys::fuzz_target;
use nsscope::{AssemblyView, NamespaceFilter, NamespaceTally};

fuzz_target!(|data: &[u8]| {
    if let Ok(view) = AssemblyView::from_mem(data.to_vec()) {
        let _ = view.module_name();
        let _ = view.type_refs().count();

        let mut tally = NamespaceTally::new();
        let _ = tally.add_types(&view, &NamespaceFilter::none());
    }
});
