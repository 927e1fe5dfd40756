//! Shared support for the integration tests: a typelib writer emitting
//! conforming buffers straight from the record definitions, plus native
//! fixture functions exposed through a static symbol table.
//!
//! The real producer is an external tool; building buffers here by hand
//! also keeps the tests honest about the documented byte format.

#![allow(dead_code)]

use std::sync::Arc;

use typelib_core::{
    AnnotationBlob, ArgBlob, BlobType, DirEntry, Direction, EnumBlob, ErrorDomainBlob, FieldBlob,
    FieldFlags, FunctionBlob, FunctionFlags, Header, Record, SignatureBlob, SimpleType,
    StructBlob, TYPELIB_MAGIC, Transfer, TypeTag, Typelib, ValueBlob,
};
use typelib_ffi::StaticResolver;
use typelib_repository::Repository;

// ============================================================================
// Typelib writer
// ============================================================================

fn bytes_of<T: Record>(record: &T) -> Vec<u8> {
    // Plain-integer repr(C) records: the in-memory bytes are the wire form.
    unsafe { std::slice::from_raw_parts((record as *const T).cast::<u8>(), T::SIZE).to_vec() }
}

fn push_str(buf: &mut Vec<u8>, s: &str) -> u32 {
    let off = buf.len() as u32;
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    off
}

fn simple(tag: TypeTag) -> SimpleType {
    SimpleType {
        tag: tag.into(),
        flags: 0,
        reserved: 0,
    }
}

#[derive(Clone)]
pub struct ArgSpec {
    pub name: String,
    pub direction: Direction,
    pub tag: TypeTag,
}

pub fn arg(name: &str, direction: Direction, tag: TypeTag) -> ArgSpec {
    ArgSpec {
        name: name.to_string(),
        direction,
        tag,
    }
}

enum Entry {
    Function {
        name: String,
        symbol: String,
        args: Vec<ArgSpec>,
        ret: TypeTag,
        flags: FunctionFlags,
    },
    ErrorDomain {
        name: String,
        get_quark: String,
        first_code: i32,
        n_codes: u16,
    },
    Struct {
        name: String,
        gtype_symbol: Option<String>,
        size: u32,
        alignment: u16,
        fields: Vec<(String, u32, TypeTag)>,
    },
    Enum {
        name: String,
        storage: TypeTag,
        values: Vec<(String, i32)>,
    },
}

impl Entry {
    fn blob_type(&self) -> BlobType {
        match self {
            Entry::Function { .. } => BlobType::Function,
            Entry::ErrorDomain { .. } => BlobType::ErrorDomain,
            Entry::Struct { .. } => BlobType::Struct,
            Entry::Enum { .. } => BlobType::Enum,
        }
    }
}

pub struct TypelibWriter {
    namespace: String,
    version: String,
    shared_library: Option<String>,
    entries: Vec<Entry>,
    annotations: Vec<(usize, String, String)>,
}

impl TypelibWriter {
    pub fn new(namespace: &str, version: &str) -> Self {
        TypelibWriter {
            namespace: namespace.to_string(),
            version: version.to_string(),
            shared_library: None,
            entries: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn set_shared_library(&mut self, name: &str) {
        self.shared_library = Some(name.to_string());
    }

    pub fn add_function(
        &mut self,
        name: &str,
        symbol: &str,
        args: &[ArgSpec],
        ret: TypeTag,
        flags: FunctionFlags,
    ) {
        self.entries.push(Entry::Function {
            name: name.to_string(),
            symbol: symbol.to_string(),
            args: args.to_vec(),
            ret,
            flags,
        });
    }

    pub fn add_error_domain(&mut self, name: &str, get_quark: &str, first_code: i32, n_codes: u16) {
        self.entries.push(Entry::ErrorDomain {
            name: name.to_string(),
            get_quark: get_quark.to_string(),
            first_code,
            n_codes,
        });
    }

    pub fn add_struct(
        &mut self,
        name: &str,
        gtype_symbol: Option<&str>,
        size: u32,
        alignment: u16,
        fields: &[(&str, u32, TypeTag)],
    ) {
        self.entries.push(Entry::Struct {
            name: name.to_string(),
            gtype_symbol: gtype_symbol.map(str::to_string),
            size,
            alignment,
            fields: fields
                .iter()
                .map(|(n, off, tag)| (n.to_string(), *off, *tag))
                .collect(),
        });
    }

    pub fn add_enum(&mut self, name: &str, storage: TypeTag, values: &[(&str, i32)]) {
        self.entries.push(Entry::Enum {
            name: name.to_string(),
            storage,
            values: values.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        });
    }

    /// Attach an annotation to the most recently added entry.
    pub fn annotate_last(&mut self, name: &str, value: &str) {
        assert!(!self.entries.is_empty(), "no entry to annotate");
        self.annotations
            .push((self.entries.len() - 1, name.to_string(), value.to_string()));
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Header::SIZE];

        let directory = buf.len() as u32;
        buf.resize(buf.len() + self.entries.len() * DirEntry::SIZE, 0);

        let mut dir_entries = Vec::with_capacity(self.entries.len());
        let mut blob_offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let (name_off, blob_off) = match entry {
                Entry::Function {
                    name,
                    symbol,
                    args,
                    ret,
                    flags,
                } => {
                    let signature = buf.len() as u32;
                    buf.extend_from_slice(&bytes_of(&SignatureBlob {
                        return_type: simple(*ret),
                        return_transfer: Transfer::None.into(),
                        reserved: 0,
                        n_args: args.len() as u16,
                    }));
                    let args_start = buf.len();
                    buf.resize(args_start + args.len() * ArgBlob::SIZE, 0);
                    let name_offsets: Vec<u32> = args
                        .iter()
                        .map(|a| push_str(&mut buf, &a.name))
                        .collect();
                    for (i, a) in args.iter().enumerate() {
                        let blob = ArgBlob {
                            name: name_offsets[i],
                            direction: a.direction.into(),
                            transfer: Transfer::None.into(),
                            reserved: 0,
                            arg_type: simple(a.tag),
                        };
                        let at = args_start + i * ArgBlob::SIZE;
                        buf[at..at + ArgBlob::SIZE].copy_from_slice(&bytes_of(&blob));
                    }

                    let name_off = push_str(&mut buf, name);
                    let symbol_off = push_str(&mut buf, symbol);
                    let blob_off = buf.len() as u32;
                    buf.extend_from_slice(&bytes_of(&FunctionBlob {
                        name: name_off,
                        symbol: symbol_off,
                        signature,
                        flags: flags.bits(),
                        reserved: 0,
                    }));
                    (name_off, blob_off)
                }
                Entry::ErrorDomain {
                    name,
                    get_quark,
                    first_code,
                    n_codes,
                } => {
                    let name_off = push_str(&mut buf, name);
                    let quark_off = push_str(&mut buf, get_quark);
                    let blob_off = buf.len() as u32;
                    buf.extend_from_slice(&bytes_of(&ErrorDomainBlob {
                        name: name_off,
                        get_quark: quark_off,
                        first_code: *first_code,
                        n_codes: *n_codes,
                        reserved: 0,
                    }));
                    (name_off, blob_off)
                }
                Entry::Struct {
                    name,
                    gtype_symbol,
                    size,
                    alignment,
                    fields,
                } => {
                    let fields_start = buf.len();
                    buf.resize(fields_start + fields.len() * FieldBlob::SIZE, 0);
                    let name_offsets: Vec<u32> = fields
                        .iter()
                        .map(|(n, _, _)| push_str(&mut buf, n))
                        .collect();
                    for (i, (_, struct_offset, tag)) in fields.iter().enumerate() {
                        let blob = FieldBlob {
                            name: name_offsets[i],
                            struct_offset: *struct_offset,
                            flags: (FieldFlags::READABLE | FieldFlags::WRITABLE).bits(),
                            reserved: 0,
                            field_type: simple(*tag),
                        };
                        let at = fields_start + i * FieldBlob::SIZE;
                        buf[at..at + FieldBlob::SIZE].copy_from_slice(&bytes_of(&blob));
                    }

                    let name_off = push_str(&mut buf, name);
                    let gtype_off = gtype_symbol
                        .as_deref()
                        .map(|s| push_str(&mut buf, s))
                        .unwrap_or(0);
                    let blob_off = buf.len() as u32;
                    buf.extend_from_slice(&bytes_of(&StructBlob {
                        name: name_off,
                        gtype_symbol: gtype_off,
                        size: *size,
                        alignment: *alignment,
                        n_fields: fields.len() as u16,
                        fields: fields_start as u32,
                        reserved: 0,
                    }));
                    (name_off, blob_off)
                }
                Entry::Enum {
                    name,
                    storage,
                    values,
                } => {
                    let values_start = buf.len();
                    buf.resize(values_start + values.len() * ValueBlob::SIZE, 0);
                    let name_offsets: Vec<u32> = values
                        .iter()
                        .map(|(n, _)| push_str(&mut buf, n))
                        .collect();
                    for (i, (_, value)) in values.iter().enumerate() {
                        let blob = ValueBlob {
                            name: name_offsets[i],
                            value: *value,
                            flags: 0,
                            reserved: 0,
                        };
                        let at = values_start + i * ValueBlob::SIZE;
                        buf[at..at + ValueBlob::SIZE].copy_from_slice(&bytes_of(&blob));
                    }

                    let name_off = push_str(&mut buf, name);
                    let blob_off = buf.len() as u32;
                    buf.extend_from_slice(&bytes_of(&EnumBlob {
                        name: name_off,
                        gtype_symbol: 0,
                        storage: (*storage).into(),
                        reserved: 0,
                        n_values: values.len() as u16,
                        values: values_start as u32,
                    }));
                    (name_off, blob_off)
                }
            };
            blob_offsets.push(blob_off);
            dir_entries.push(DirEntry {
                name: name_off,
                blob_type: entry.blob_type().into(),
                reserved: 0,
                offset: blob_off,
            });
        }

        // Annotation pool: contiguous records keyed by target blob offset.
        let annotation_strings: Vec<(u32, u32)> = self
            .annotations
            .iter()
            .map(|(_, name, value)| {
                let n = push_str(&mut buf, name);
                let v = push_str(&mut buf, value);
                (n, v)
            })
            .collect();
        let annotations_off = buf.len() as u32;
        for ((entry_index, _, _), (name_off, value_off)) in
            self.annotations.iter().zip(&annotation_strings)
        {
            buf.extend_from_slice(&bytes_of(&AnnotationBlob {
                target: blob_offsets[*entry_index],
                name: *name_off,
                value: *value_off,
            }));
        }

        let ns_off = push_str(&mut buf, &self.namespace);
        let ver_off = push_str(&mut buf, &self.version);
        let lib_off = self
            .shared_library
            .as_deref()
            .map(|s| push_str(&mut buf, s))
            .unwrap_or(0);

        for (i, entry) in dir_entries.iter().enumerate() {
            let at = directory as usize + i * DirEntry::SIZE;
            buf[at..at + DirEntry::SIZE].copy_from_slice(&bytes_of(entry));
        }

        let mut header: Header = unsafe { std::mem::zeroed() };
        header.magic = TYPELIB_MAGIC;
        header.major_version = 1;
        header.n_annotations = self.annotations.len() as u16;
        header.n_entries = self.entries.len() as u16;
        header.n_local_entries = self.entries.len() as u16;
        header.directory = directory;
        header.annotations = annotations_off;
        header.entry_blob_size = DirEntry::SIZE as u16;
        header.function_blob_size = FunctionBlob::SIZE as u16;
        header.callback_blob_size = typelib_core::CallbackBlob::SIZE as u16;
        header.signal_blob_size = typelib_core::SignalBlob::SIZE as u16;
        header.vfunc_blob_size = typelib_core::VFuncBlob::SIZE as u16;
        header.arg_blob_size = ArgBlob::SIZE as u16;
        header.property_blob_size = typelib_core::PropertyBlob::SIZE as u16;
        header.field_blob_size = FieldBlob::SIZE as u16;
        header.value_blob_size = ValueBlob::SIZE as u16;
        header.constant_blob_size = typelib_core::ConstantBlob::SIZE as u16;
        header.error_domain_blob_size = ErrorDomainBlob::SIZE as u16;
        header.annotation_blob_size = AnnotationBlob::SIZE as u16;
        header.signature_blob_size = SignatureBlob::SIZE as u16;
        header.enum_blob_size = EnumBlob::SIZE as u16;
        header.struct_blob_size = StructBlob::SIZE as u16;
        header.object_blob_size = typelib_core::ObjectBlob::SIZE as u16;
        header.interface_blob_size = typelib_core::InterfaceBlob::SIZE as u16;
        header.union_blob_size = typelib_core::UnionBlob::SIZE as u16;
        header.namespace = ns_off;
        header.nsversion = ver_off;
        header.shared_library = lib_off;
        buf[..Header::SIZE].copy_from_slice(&bytes_of(&header));

        buf
    }

    pub fn build(&self) -> Typelib {
        match Typelib::from_bytes(self.build_bytes()) {
            Ok(typelib) => typelib,
            Err(e) => panic!("test writer emitted an invalid typelib: {e}"),
        }
    }
}

// ============================================================================
// Native fixtures
// ============================================================================

pub mod fix {
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicU32, Ordering};

    use libc::c_char;
    use typelib_ffi::RawThrow;

    /// Incremented by every fixture that performs observable work; lets
    /// tests assert that a rejected invocation ran no native code.
    pub static CALL_COUNT: AtomicU32 = AtomicU32::new(0);

    pub fn calls() -> u32 {
        CALL_COUNT.load(Ordering::SeqCst)
    }

    pub extern "C" fn add_four(x: i32) -> i32 {
        CALL_COUNT.fetch_add(1, Ordering::SeqCst);
        x + 4
    }

    /// Only the count-mismatch test references this fixture, so its private
    /// counter observing zero proves the rejected invocation ran nothing.
    pub static PROBE_COUNT: AtomicU32 = AtomicU32::new(0);

    pub extern "C" fn probe(x: i32) -> i32 {
        PROBE_COUNT.fetch_add(1, Ordering::SeqCst);
        x + 4
    }

    pub extern "C" fn add_four_out(x: i32, result: *mut i32) {
        CALL_COUNT.fetch_add(1, Ordering::SeqCst);
        unsafe { *result = x + 4 };
    }

    pub extern "C" fn add_four_inout(value: *mut i32) {
        CALL_COUNT.fetch_add(1, Ordering::SeqCst);
        unsafe { *value += 4 };
    }

    #[repr(C)]
    pub struct Counter {
        pub value: i32,
    }

    pub extern "C" fn counter_value(this: *const Counter) -> i32 {
        unsafe { (*this).value }
    }

    pub const FILE_ERROR_QUARK: u32 = 0xBEEF;
    pub const FILE_ERROR_NOT_FOUND: i32 = 2;

    pub extern "C" fn file_error_quark() -> u32 {
        FILE_ERROR_QUARK
    }

    /// Fails like an I/O routine reading a nonexistent path: writes an
    /// error record through the trailing slot and returns false. The record
    /// is leaked deliberately; freeing it is the caller's contract.
    pub extern "C" fn read_config(_path: *const c_char, error: *mut *mut RawThrow) -> i32 {
        static MESSAGE: &std::ffi::CStr = c"path does not exist";
        let record = Box::new(RawThrow {
            domain: FILE_ERROR_QUARK,
            code: FILE_ERROR_NOT_FOUND,
            message: MESSAGE.as_ptr(),
        });
        unsafe { *error = Box::into_raw(record) };
        0
    }

    pub const POINT_GTYPE: usize = 0xCAFE;

    pub extern "C" fn point_get_type() -> usize {
        POINT_GTYPE
    }

    pub fn addr(f: *const ()) -> *const c_void {
        f as *const c_void
    }
}

/// A resolver exposing every fixture symbol.
pub fn fixture_resolver() -> Arc<StaticResolver> {
    let resolver = StaticResolver::new();
    resolver.register("fix_add_four", fix::addr(fix::add_four as *const ()));
    resolver.register("fix_add_four_out", fix::addr(fix::add_four_out as *const ()));
    resolver.register(
        "fix_add_four_inout",
        fix::addr(fix::add_four_inout as *const ()),
    );
    resolver.register("fix_counter_value", fix::addr(fix::counter_value as *const ()));
    resolver.register("fix_read_config", fix::addr(fix::read_config as *const ()));
    resolver.register(
        "fix_file_error_quark",
        fix::addr(fix::file_error_quark as *const ()),
    );
    resolver.register("fix_point_get_type", fix::addr(fix::point_get_type as *const ()));
    resolver.register("fix_probe", fix::addr(fix::probe as *const ()));
    resolver.register("strlen", fix::addr(libc::strlen as *const ()));
    Arc::new(resolver)
}

/// The typelib describing the fixture namespace.
pub fn fixture_typelib() -> Typelib {
    use Direction::{In, InOut, Out};

    let mut writer = TypelibWriter::new("Fix", "1.0");
    writer.add_function(
        "add_four",
        "fix_add_four",
        &[arg("x", In, TypeTag::Int32)],
        TypeTag::Int32,
        FunctionFlags::empty(),
    );
    writer.add_function(
        "add_four_out",
        "fix_add_four_out",
        &[arg("x", In, TypeTag::Int32), arg("result", Out, TypeTag::Int32)],
        TypeTag::Void,
        FunctionFlags::empty(),
    );
    writer.add_function(
        "add_four_inout",
        "fix_add_four_inout",
        &[arg("value", InOut, TypeTag::Int32)],
        TypeTag::Void,
        FunctionFlags::empty(),
    );
    writer.add_function(
        "counter_value",
        "fix_counter_value",
        &[],
        TypeTag::Int32,
        FunctionFlags::METHOD,
    );
    writer.add_function(
        "read_config",
        "fix_read_config",
        &[arg("path", In, TypeTag::String)],
        TypeTag::Boolean,
        FunctionFlags::THROWS,
    );
    writer.add_function(
        "strlen",
        "strlen",
        &[arg("s", In, TypeTag::String)],
        TypeTag::UInt64,
        FunctionFlags::empty(),
    );
    writer.add_function(
        "probe",
        "fix_probe",
        &[arg("x", In, TypeTag::Int32)],
        TypeTag::Int32,
        FunctionFlags::empty(),
    );
    writer.add_function(
        "missing",
        "fix_no_such_symbol",
        &[],
        TypeTag::Void,
        FunctionFlags::empty(),
    );
    writer.add_error_domain("FileError", "fix_file_error_quark", 1, 4);
    writer.add_struct(
        "Point",
        Some("fix_point_get_type"),
        std::mem::size_of::<Point>() as u32,
        std::mem::align_of::<Point>() as u16,
        &[
            ("x", std::mem::offset_of!(Point, x) as u32, TypeTag::Int32),
            ("y", std::mem::offset_of!(Point, y) as u32, TypeTag::Int32),
        ],
    );
    writer.build()
}

/// Native counterpart of the "Point" struct description.
#[repr(C)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A private repository with the fixture namespace registered and every
/// fixture symbol resolvable.
pub fn fixture_repo() -> Repository {
    let repo = Repository::with_resolver(fixture_resolver());
    repo.register(fixture_typelib());
    repo
}

/// Resolve a fixture function handle by name.
pub fn fixture_function(repo: &Repository, name: &str) -> typelib_repository::FunctionInfo {
    match repo.find_by_name(Some("Fix"), name) {
        Ok(Some(info)) => match info {
            typelib_repository::Info::Function(f) => f,
            other => panic!("{name} resolved to {:?}", other.blob_type()),
        },
        other => panic!("could not resolve {name}: {other:?}"),
    }
}
