//! Synthetic managed PE images.
//!
//! [`ImageBuilder`] lays out a minimal PE32 DLL with a single `.text` section holding the CLI
//! header and a metadata root with `#~`, `#Strings`, `#US`, `#GUID` and `#Blob`. The tables stream
//! carries Module, TypeRef, TypeDef and optionally Field rows. Knobs exist to corrupt individual
//! pieces so loaders can be driven into each failure path.
//!
//! This file only depends on `std`; the integration tests include it via `#[path]`.

#![allow(dead_code)]

use std::collections::HashMap;

/// RVA of the `.text` section, which starts with the CLI header
pub const TEXT_RVA: u32 = 0x2000;
/// File offset of the `.text` section
pub const TEXT_OFFSET: usize = 0x200;
/// RVA of the metadata root, directly after the 72-byte CLI header
pub const METADATA_RVA: u32 = TEXT_RVA + 72;
/// File offset of the metadata root
pub const METADATA_OFFSET: usize = TEXT_OFFSET + 72;

const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_OFFSET: usize = PE_OFFSET + 4 + 20;
const DATA_DIRECTORIES_OFFSET: usize = OPTIONAL_HEADER_OFFSET + 28 + 68;
const SECTION_TABLE_OFFSET: usize = OPTIONAL_HEADER_OFFSET + 0xE0;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: usize = 0x2000;

/// Default flags of a generated type: public, beforefieldinit
pub const PUBLIC_CLASS: u32 = 0x0010_0001;

#[derive(Clone)]
struct TypeEntry {
    namespace: String,
    name: String,
    flags: u32,
}

/// Builder for a minimal managed PE32 image.
#[derive(Clone)]
pub struct ImageBuilder {
    module_name: String,
    types: Vec<TypeEntry>,
    type_refs: Vec<(String, String)>,
    raw_types: Vec<(u32, u32)>,
    fields: u32,
    large_strings: bool,
    extra_data: Option<u32>,
    unknown_table: bool,
    declared_typedef_rows: Option<u32>,
    first_type_extends: Option<u32>,
    metadata_signature: u32,
    tables_stream_name: Option<&'static str>,
    strings_heap: bool,
    clr_directory: bool,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// An image with a Module row and the `<Module>` pseudo-type only.
    pub fn new() -> Self {
        ImageBuilder {
            module_name: "Sample.dll".to_string(),
            types: Vec::new(),
            type_refs: Vec::new(),
            raw_types: Vec::new(),
            fields: 0,
            large_strings: false,
            extra_data: None,
            unknown_table: false,
            declared_typedef_rows: None,
            first_type_extends: None,
            metadata_signature: 0x424A_5342,
            tables_stream_name: Some("#~"),
            strings_heap: true,
            clr_directory: true,
        }
    }

    pub fn with_module_name(mut self, name: &str) -> Self {
        self.module_name = name.to_string();
        self
    }

    /// Append a TypeDef row; an empty namespace is written as string index 0.
    pub fn with_type(self, namespace: &str, name: &str) -> Self {
        self.with_type_flags(namespace, name, PUBLIC_CLASS)
    }

    pub fn with_type_flags(mut self, namespace: &str, name: &str, flags: u32) -> Self {
        self.types.push(TypeEntry {
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
        });
        self
    }

    /// Append a TypeRef row scoped to the Module.
    pub fn with_type_ref(mut self, namespace: &str, name: &str) -> Self {
        self.type_refs
            .push((namespace.to_string(), name.to_string()));
        self
    }

    /// Append a TypeDef row with raw `#Strings` offsets, after all regular types.
    pub fn with_raw_type(mut self, name_index: u32, namespace_index: u32) -> Self {
        self.raw_types.push((name_index, namespace_index));
        self
    }

    /// Add a Field table with `count` rows.
    pub fn with_fields(mut self, count: u32) -> Self {
        self.fields = count;
        self
    }

    /// Set the wide `#Strings` flag and push every string past offset 0xFFFF.
    pub fn with_large_strings(mut self) -> Self {
        self.large_strings = true;
        self
    }

    /// Set HeapSizes bit 0x40 and write `value` after the row counts.
    pub fn with_extra_data(mut self, value: u32) -> Self {
        self.extra_data = Some(value);
        self
    }

    /// Mark table 0x2D as present, which no metadata version defines.
    pub fn with_unknown_table(mut self) -> Self {
        self.unknown_table = true;
        self
    }

    /// Declare `rows` TypeDef rows regardless of how many are written.
    pub fn with_declared_typedef_rows(mut self, rows: u32) -> Self {
        self.declared_typedef_rows = Some(rows);
        self
    }

    /// Raw `Extends` value of the first regular type.
    pub fn with_first_type_extends(mut self, coded: u32) -> Self {
        self.first_type_extends = Some(coded);
        self
    }

    pub fn with_metadata_signature(mut self, signature: u32) -> Self {
        self.metadata_signature = signature;
        self
    }

    /// Name the tables stream `#-`.
    pub fn with_uncompressed_tables(mut self) -> Self {
        self.tables_stream_name = Some("#-");
        self
    }

    pub fn without_tables_stream(mut self) -> Self {
        self.tables_stream_name = None;
        self
    }

    pub fn without_strings_heap(mut self) -> Self {
        self.strings_heap = false;
        self
    }

    /// Leave data directory #14 zeroed, i.e. a native image.
    pub fn without_clr_directory(mut self) -> Self {
        self.clr_directory = false;
        self
    }

    /// Number of TypeDef rows written, including `<Module>`.
    pub fn typedef_rows(&self) -> u32 {
        (1 + self.types.len() + self.raw_types.len()) as u32
    }

    /// Lay out the complete image.
    pub fn build(&self) -> Vec<u8> {
        let metadata = self.build_metadata();

        let virtual_size = 72 + metadata.len();
        let raw_size = align(virtual_size, FILE_ALIGNMENT);
        let mut image = vec![0_u8; TEXT_OFFSET + raw_size];

        self.write_pe_headers(&mut image, virtual_size, raw_size);

        // CLI header
        let cli = TEXT_OFFSET;
        put_u32(&mut image, cli, 72);
        put_u16(&mut image, cli + 4, 2);
        put_u16(&mut image, cli + 6, 5);
        put_u32(&mut image, cli + 8, METADATA_RVA);
        put_u32(&mut image, cli + 12, metadata.len() as u32);
        put_u32(&mut image, cli + 16, 0x0000_0001);

        image[METADATA_OFFSET..METADATA_OFFSET + metadata.len()].copy_from_slice(&metadata);
        image
    }

    fn write_pe_headers(&self, image: &mut [u8], virtual_size: usize, raw_size: usize) {
        // DOS header
        image[0] = b'M';
        image[1] = b'Z';
        put_u16(image, 0x02, 0x0090);
        put_u16(image, 0x04, 0x0003);
        put_u16(image, 0x08, 0x0004);
        put_u16(image, 0x0C, 0xFFFF);
        put_u16(image, 0x10, 0x00B8);
        put_u16(image, 0x18, 0x0040);
        put_u32(image, 0x3C, PE_OFFSET as u32);

        // PE signature and COFF header
        image[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
        let coff = PE_OFFSET + 4;
        put_u16(image, coff, 0x014C);
        put_u16(image, coff + 2, 1);
        put_u16(image, coff + 16, 0xE0);
        put_u16(image, coff + 18, 0x2102);

        // Optional header, standard fields
        let opt = OPTIONAL_HEADER_OFFSET;
        put_u16(image, opt, 0x010B);
        image[opt + 2] = 8;
        put_u32(image, opt + 4, raw_size as u32);
        put_u32(image, opt + 20, TEXT_RVA);

        // Optional header, windows fields
        let win = opt + 28;
        put_u32(image, win, 0x0040_0000);
        put_u32(image, win + 4, SECTION_ALIGNMENT as u32);
        put_u32(image, win + 8, FILE_ALIGNMENT as u32);
        put_u16(image, win + 12, 4);
        put_u16(image, win + 20, 4);
        put_u32(
            image,
            win + 28,
            (TEXT_RVA as usize + align(virtual_size, SECTION_ALIGNMENT)) as u32,
        );
        put_u32(image, win + 32, TEXT_OFFSET as u32);
        put_u16(image, win + 40, 3);
        put_u16(image, win + 42, 0x8540);
        put_u32(image, win + 44, 0x0010_0000);
        put_u32(image, win + 48, 0x1000);
        put_u32(image, win + 52, 0x0010_0000);
        put_u32(image, win + 56, 0x1000);
        put_u32(image, win + 64, 16);

        if self.clr_directory {
            let clr = DATA_DIRECTORIES_OFFSET + 14 * 8;
            put_u32(image, clr, TEXT_RVA);
            put_u32(image, clr + 4, 72);
        }

        // .text section header
        let section = SECTION_TABLE_OFFSET;
        image[section..section + 5].copy_from_slice(b".text");
        put_u32(image, section + 8, virtual_size as u32);
        put_u32(image, section + 12, TEXT_RVA);
        put_u32(image, section + 16, raw_size as u32);
        put_u32(image, section + 20, TEXT_OFFSET as u32);
        put_u32(image, section + 36, 0x6000_0020);
    }

    fn build_metadata(&self) -> Vec<u8> {
        let tables = self.build_tables();

        let mut streams: Vec<(&str, Vec<u8>)> = Vec::new();
        if let Some(name) = self.tables_stream_name {
            streams.push((name, tables.0));
        }
        if self.strings_heap {
            streams.push(("#Strings", tables.1));
        }
        streams.push(("#US", vec![0x00, 0x00, 0x00, 0x00]));
        streams.push((
            "#GUID",
            vec![
                0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6,
                0x99, 0xbe, 0xa5,
            ],
        ));
        streams.push(("#Blob", vec![0x00, 0x00, 0x00, 0x00]));

        let version = b"v4.0.30319\0\0";
        let header_len = 20
            + version.len()
            + streams
                .iter()
                .map(|(name, _)| 8 + align(name.len() + 1, 4))
                .sum::<usize>();

        let mut root = Vec::new();
        root.extend_from_slice(&self.metadata_signature.to_le_bytes());
        root.extend_from_slice(&1_u16.to_le_bytes());
        root.extend_from_slice(&1_u16.to_le_bytes());
        root.extend_from_slice(&0_u32.to_le_bytes());
        root.extend_from_slice(&(version.len() as u32).to_le_bytes());
        root.extend_from_slice(version);
        root.extend_from_slice(&0_u16.to_le_bytes());
        root.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = header_len;
        for (name, data) in &streams {
            let size = align(data.len(), 4);
            root.extend_from_slice(&(offset as u32).to_le_bytes());
            root.extend_from_slice(&(size as u32).to_le_bytes());
            root.extend_from_slice(name.as_bytes());
            root.resize(root.len() + align(name.len() + 1, 4) - name.len(), 0);
            offset += size;
        }

        for (_, data) in &streams {
            root.extend_from_slice(data);
            root.resize(align(root.len(), 4), 0);
        }

        root
    }

    /// Returns the tables stream and the `#Strings` heap.
    fn build_tables(&self) -> (Vec<u8>, Vec<u8>) {
        let mut strings = StringHeap::new(self.large_strings);
        let module_name = strings.add(&self.module_name);
        let module_type = strings.add("<Module>");
        let type_refs: Vec<(u32, u32)> = self
            .type_refs
            .iter()
            .map(|(namespace, name)| (strings.add(name), strings.add(namespace)))
            .collect();
        let types: Vec<(u32, u32, u32)> = self
            .types
            .iter()
            .map(|entry| {
                (
                    entry.flags,
                    strings.add(&entry.name),
                    strings.add(&entry.namespace),
                )
            })
            .collect();
        let field_name = strings.add("value__");

        let wide_str = self.large_strings;
        let wide_field = self.fields > 0xFFFF;

        let mut heap_sizes = 0_u8;
        if wide_str {
            heap_sizes |= 0x01;
        }
        if self.extra_data.is_some() {
            heap_sizes |= 0x40;
        }

        let mut valid = 1_u64 | (1 << 0x02);
        if !type_refs.is_empty() {
            valid |= 1 << 0x01;
        }
        if self.fields > 0 {
            valid |= 1 << 0x04;
        }
        if self.unknown_table {
            valid |= 1 << 0x2D;
        }

        let mut stream = Vec::new();
        stream.extend_from_slice(&0_u32.to_le_bytes());
        stream.push(2);
        stream.push(0);
        stream.push(heap_sizes);
        stream.push(1);
        stream.extend_from_slice(&valid.to_le_bytes());
        stream.extend_from_slice(&0x0000_1600_3301_FA00_u64.to_le_bytes());

        // Row counts, ascending table id
        stream.extend_from_slice(&1_u32.to_le_bytes());
        if !type_refs.is_empty() {
            stream.extend_from_slice(&(type_refs.len() as u32).to_le_bytes());
        }
        stream.extend_from_slice(
            &self
                .declared_typedef_rows
                .unwrap_or_else(|| self.typedef_rows())
                .to_le_bytes(),
        );
        if self.fields > 0 {
            stream.extend_from_slice(&self.fields.to_le_bytes());
        }
        if self.unknown_table {
            stream.extend_from_slice(&1_u32.to_le_bytes());
        }
        if let Some(extra) = self.extra_data {
            stream.extend_from_slice(&extra.to_le_bytes());
        }

        // Module
        stream.extend_from_slice(&0_u16.to_le_bytes());
        put_index(&mut stream, module_name, wide_str);
        put_index(&mut stream, 1, false);
        put_index(&mut stream, 0, false);
        put_index(&mut stream, 0, false);

        // TypeRef, ResolutionScope -> Module row 1
        for (name, namespace) in &type_refs {
            put_index(&mut stream, 1 << 2, false);
            put_index(&mut stream, *name, wide_str);
            put_index(&mut stream, *namespace, wide_str);
        }

        // TypeDef
        let default_extends = if type_refs.is_empty() { 0 } else { (1 << 2) | 1 };
        let mut typedef = |stream: &mut Vec<u8>, flags: u32, name: u32, ns: u32, extends: u32| {
            stream.extend_from_slice(&flags.to_le_bytes());
            put_index(stream, name, wide_str);
            put_index(stream, ns, wide_str);
            put_index(stream, extends, false);
            put_index(stream, 1, wide_field);
            put_index(stream, 1, false);
        };

        typedef(&mut stream, 0, module_type, 0, 0);
        for (position, (flags, name, namespace)) in types.iter().enumerate() {
            let extends = match self.first_type_extends {
                Some(coded) if position == 0 => coded,
                _ => default_extends,
            };
            typedef(&mut stream, *flags, *name, *namespace, extends);
        }
        for (name, namespace) in &self.raw_types {
            typedef(&mut stream, PUBLIC_CLASS, *name, *namespace, 0);
        }

        // Field
        for _ in 0..self.fields {
            stream.extend_from_slice(&0x0001_u16.to_le_bytes());
            put_index(&mut stream, field_name, wide_str);
            put_index(&mut stream, 0, false);
        }

        (stream, strings.data)
    }
}

struct StringHeap {
    data: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringHeap {
    fn new(large: bool) -> Self {
        let mut data = vec![0_u8];
        if large {
            data.resize(0x1_0000, b'x');
            data.push(0);
        }

        StringHeap {
            data,
            offsets: HashMap::new(),
        }
    }

    fn add(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }

        if let Some(offset) = self.offsets.get(value) {
            return *offset;
        }

        let offset = self.data.len() as u32;
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
        self.offsets.insert(value.to_string(), offset);
        offset
    }
}

fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

fn put_u16(image: &mut [u8], offset: usize, value: u16) {
    image[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_index(stream: &mut Vec<u8>, value: u32, large: bool) {
    if large {
        stream.extend_from_slice(&value.to_le_bytes());
    } else {
        stream.extend_from_slice(&(value as u16).to_le_bytes());
    }
}
