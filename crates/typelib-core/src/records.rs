//! Fixed-size record definitions for the binary typelib format.
//!
//! Every record is `#[repr(C)]`, built exclusively from plain integer fields
//! (tags stay raw here; enum conversion happens in the accessor layer), and
//! carries a `SIZE` constant documenting its exact byte count. The byte sizes
//! form the format contract and must never change without a version bump.
//!
//! [`layout_check`] asserts once per process that the compiled size of every
//! record matches the documented table. A mismatch means every offset the
//! reader would compute is wrong, so the check fails hard before any decode.

use std::mem::size_of;
use std::sync::Once;

/// Magic bytes at the start of every typelib buffer.
pub const TYPELIB_MAGIC: [u8; 16] = *b"typelib blob\0\0\0\x01";

/// Marker for fixed-size records that can be decoded from a buffer at an
/// arbitrary offset.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]`, contain only integer fields (valid for
/// any bit pattern), and have `size_of::<Self>() == Self::SIZE`.
pub unsafe trait Record: Copy {
    /// Exact byte size of this record in the format.
    const SIZE: usize;
}

// ============================================================================
// Header and directory
// ============================================================================

/// Per-namespace metadata at offset 0 of every typelib buffer.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Header {
    pub magic: [u8; 16],
    pub major_version: u8,
    pub minor_version: u8,
    pub n_annotations: u16,
    pub n_entries: u16,
    pub n_local_entries: u16,
    pub directory: u32,
    pub annotations: u32,
    pub entry_blob_size: u16,
    pub function_blob_size: u16,
    pub callback_blob_size: u16,
    pub signal_blob_size: u16,
    pub vfunc_blob_size: u16,
    pub arg_blob_size: u16,
    pub property_blob_size: u16,
    pub field_blob_size: u16,
    pub value_blob_size: u16,
    pub constant_blob_size: u16,
    pub error_domain_blob_size: u16,
    pub annotation_blob_size: u16,
    pub signature_blob_size: u16,
    pub enum_blob_size: u16,
    pub struct_blob_size: u16,
    pub object_blob_size: u16,
    pub interface_blob_size: u16,
    pub union_blob_size: u16,
    pub namespace: u32,
    pub nsversion: u32,
    pub shared_library: u32,
}

unsafe impl Record for Header {
    const SIZE: usize = 80;
}

/// Index record for one top-level named construct.
///
/// Directory entries are indexed 1..=n_local_entries; index 0 is reserved.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct DirEntry {
    pub name: u32,
    pub blob_type: u16,
    pub reserved: u16,
    pub offset: u32,
}

unsafe impl Record for DirEntry {
    const SIZE: usize = 12;
}

// ============================================================================
// Type descriptors and signatures
// ============================================================================

/// Four-byte type descriptor embedded wherever a value kind is declared.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SimpleType {
    /// Raw [`TypeTag`](crate::TypeTag).
    pub tag: u8,
    pub flags: u8,
    pub reserved: u16,
}

impl SimpleType {
    /// Flag bit marking a by-address value.
    pub const FLAG_POINTER: u8 = 1 << 0;
}

unsafe impl Record for SimpleType {
    const SIZE: usize = 4;
}

/// One declared parameter.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ArgBlob {
    pub name: u32,
    /// Raw [`Direction`](crate::Direction).
    pub direction: u8,
    /// Raw [`Transfer`](crate::Transfer).
    pub transfer: u8,
    pub reserved: u16,
    pub arg_type: SimpleType,
}

unsafe impl Record for ArgBlob {
    const SIZE: usize = 12;
}

/// Callable signature head. `n_args` [`ArgBlob`] records follow inline,
/// immediately after this record.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SignatureBlob {
    pub return_type: SimpleType,
    /// Raw [`Transfer`](crate::Transfer) of the return value.
    pub return_transfer: u8,
    pub reserved: u8,
    pub n_args: u16,
}

unsafe impl Record for SignatureBlob {
    const SIZE: usize = 8;
}

// ============================================================================
// Callables
// ============================================================================

/// A function, method or constructor.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct FunctionBlob {
    pub name: u32,
    /// String offset of the dynamic symbol implementing this function.
    pub symbol: u32,
    /// Offset of the [`SignatureBlob`].
    pub signature: u32,
    /// Raw [`FunctionFlags`](crate::FunctionFlags).
    pub flags: u16,
    pub reserved: u16,
}

unsafe impl Record for FunctionBlob {
    const SIZE: usize = 16;
}

/// A named callable type with no symbol of its own.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct CallbackBlob {
    pub name: u32,
    pub signature: u32,
    pub reserved: u32,
}

unsafe impl Record for CallbackBlob {
    const SIZE: usize = 12;
}

// ============================================================================
// Values
// ============================================================================

/// A typed compile-time constant. The value bytes live in the owning buffer
/// at `offset`, `size` bytes long.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ConstantBlob {
    pub name: u32,
    pub const_type: SimpleType,
    pub size: u16,
    pub reserved: u16,
    pub offset: u32,
}

unsafe impl Record for ConstantBlob {
    const SIZE: usize = 16;
}

/// An error domain covering the contiguous code range
/// `[first_code, first_code + n_codes)`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ErrorDomainBlob {
    pub name: u32,
    /// String offset of the symbol yielding the domain's runtime quark.
    pub get_quark: u32,
    pub first_code: i32,
    pub n_codes: u16,
    pub reserved: u16,
}

unsafe impl Record for ErrorDomainBlob {
    const SIZE: usize = 16;
}

// ============================================================================
// Registered types
// ============================================================================

/// Common prefix of every registered-type blob: the construct name and the
/// string offset of its get-type symbol (0 when the producer omitted one).
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct BoxedBlob {
    pub name: u32,
    pub gtype_symbol: u32,
}

unsafe impl Record for BoxedBlob {
    const SIZE: usize = 8;
}

/// An enumeration or flags type. `values` points at a contiguous array of
/// `n_values` [`ValueBlob`] records.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct EnumBlob {
    pub name: u32,
    pub gtype_symbol: u32,
    /// Raw [`TypeTag`](crate::TypeTag) of the underlying storage.
    pub storage: u8,
    pub reserved: u8,
    pub n_values: u16,
    pub values: u32,
}

unsafe impl Record for EnumBlob {
    const SIZE: usize = 16;
}

/// One named member of an enum or flags type.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ValueBlob {
    pub name: u32,
    pub value: i32,
    /// Raw [`ValueFlags`](crate::ValueFlags).
    pub flags: u16,
    pub reserved: u16,
}

unsafe impl Record for ValueBlob {
    const SIZE: usize = 12;
}

/// A struct type. `fields` points at a contiguous array of `n_fields`
/// [`FieldBlob`] records.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct StructBlob {
    pub name: u32,
    pub gtype_symbol: u32,
    /// Total byte size of the native struct.
    pub size: u32,
    pub alignment: u16,
    pub n_fields: u16,
    pub fields: u32,
    pub reserved: u32,
}

unsafe impl Record for StructBlob {
    const SIZE: usize = 24;
}

/// A union type; same shape as [`StructBlob`].
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct UnionBlob {
    pub name: u32,
    pub gtype_symbol: u32,
    pub size: u32,
    pub alignment: u16,
    pub n_fields: u16,
    pub fields: u32,
    pub reserved: u32,
}

unsafe impl Record for UnionBlob {
    const SIZE: usize = 24;
}

/// One field of a struct or union.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct FieldBlob {
    pub name: u32,
    /// Byte offset of the field inside the native struct.
    pub struct_offset: u32,
    /// Raw [`FieldFlags`](crate::FieldFlags).
    pub flags: u16,
    pub reserved: u16,
    pub field_type: SimpleType,
}

unsafe impl Record for FieldBlob {
    const SIZE: usize = 16;
}

/// An object (class) type.
///
/// `members` points at the object's member records laid out contiguously in
/// declaration groups: `n_methods` [`FunctionBlob`]s, then `n_properties`
/// [`PropertyBlob`]s, then `n_signals` [`SignalBlob`]s, then `n_vfuncs`
/// [`VFuncBlob`]s.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct ObjectBlob {
    pub name: u32,
    pub gtype_symbol: u32,
    /// Directory index of the parent object; 0 = no parent.
    pub parent: u16,
    pub n_methods: u16,
    pub n_properties: u16,
    pub n_signals: u16,
    pub n_vfuncs: u16,
    pub reserved: u16,
    pub members: u32,
    /// Directory index of the class struct; 0 = none.
    pub class_struct: u32,
    pub reserved2: u32,
}

unsafe impl Record for ObjectBlob {
    const SIZE: usize = 32;
}

/// An interface type. `members` points at `n_methods` [`FunctionBlob`]s
/// followed by `n_vfuncs` [`VFuncBlob`]s.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct InterfaceBlob {
    pub name: u32,
    pub gtype_symbol: u32,
    pub n_methods: u16,
    pub n_vfuncs: u16,
    pub members: u32,
    pub reserved: u32,
    pub reserved2: u32,
}

unsafe impl Record for InterfaceBlob {
    const SIZE: usize = 24;
}

// ============================================================================
// Nested members
// ============================================================================

/// One property of an object.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct PropertyBlob {
    pub name: u32,
    /// Raw [`PropertyFlags`](crate::PropertyFlags).
    pub flags: u16,
    /// Raw [`Transfer`](crate::Transfer) of the property value.
    pub transfer: u8,
    pub reserved: u8,
    pub prop_type: SimpleType,
    pub reserved2: u32,
}

unsafe impl Record for PropertyBlob {
    const SIZE: usize = 16;
}

/// One signal of an object.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SignalBlob {
    pub name: u32,
    /// Raw [`SignalFlags`](crate::SignalFlags).
    pub flags: u16,
    pub reserved: u16,
    pub signature: u32,
    pub reserved2: u32,
}

unsafe impl Record for SignalBlob {
    const SIZE: usize = 16;
}

/// One virtual function of an object or interface.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct VFuncBlob {
    pub name: u32,
    /// Raw [`VFuncFlags`](crate::VFuncFlags).
    pub flags: u16,
    /// Byte offset of the function pointer inside the class struct.
    pub struct_offset: u16,
    pub signature: u32,
    pub reserved: u32,
}

unsafe impl Record for VFuncBlob {
    const SIZE: usize = 16;
}

/// One key/value annotation attached to the blob at `target`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct AnnotationBlob {
    /// Buffer offset of the annotated blob.
    pub target: u32,
    pub name: u32,
    pub value: u32,
}

unsafe impl Record for AnnotationBlob {
    const SIZE: usize = 12;
}

// ============================================================================
// Layout sanity check
// ============================================================================

macro_rules! check_record {
    ($ty:ty) => {
        assert!(
            size_of::<$ty>() == <$ty as Record>::SIZE,
            concat!(
                "typelib layout check failed: compiled size of ",
                stringify!($ty),
                " does not match the format table; refusing to decode"
            )
        );
    };
}

/// Assert that every record's compiled size matches the documented format
/// table. Runs at most once per process.
///
/// # Panics
///
/// Panics on any mismatch. This is fatal by design: offsets computed from a
/// layout the reader does not actually match would corrupt every subsequent
/// decode, so there is no recoverable error to return.
pub fn layout_check() {
    static CHECKED: Once = Once::new();
    CHECKED.call_once(|| {
        check_record!(Header);
        check_record!(DirEntry);
        check_record!(SimpleType);
        check_record!(ArgBlob);
        check_record!(SignatureBlob);
        check_record!(FunctionBlob);
        check_record!(CallbackBlob);
        check_record!(ConstantBlob);
        check_record!(ErrorDomainBlob);
        check_record!(BoxedBlob);
        check_record!(EnumBlob);
        check_record!(ValueBlob);
        check_record!(StructBlob);
        check_record!(UnionBlob);
        check_record!(FieldBlob);
        check_record!(ObjectBlob);
        check_record!(InterfaceBlob);
        check_record!(PropertyBlob);
        check_record!(SignalBlob);
        check_record!(VFuncBlob);
        check_record!(AnnotationBlob);
    });
}

impl Header {
    /// Compare the blob sizes a producer recorded against the compiled table.
    ///
    /// Returns the name of the first mismatching record, if any.
    pub fn mismatched_blob_size(&self) -> Option<&'static str> {
        let table: [(&'static str, u16, usize); 18] = [
            ("DirEntry", self.entry_blob_size, DirEntry::SIZE),
            ("FunctionBlob", self.function_blob_size, FunctionBlob::SIZE),
            ("CallbackBlob", self.callback_blob_size, CallbackBlob::SIZE),
            ("SignalBlob", self.signal_blob_size, SignalBlob::SIZE),
            ("VFuncBlob", self.vfunc_blob_size, VFuncBlob::SIZE),
            ("ArgBlob", self.arg_blob_size, ArgBlob::SIZE),
            ("PropertyBlob", self.property_blob_size, PropertyBlob::SIZE),
            ("FieldBlob", self.field_blob_size, FieldBlob::SIZE),
            ("ValueBlob", self.value_blob_size, ValueBlob::SIZE),
            ("ConstantBlob", self.constant_blob_size, ConstantBlob::SIZE),
            (
                "ErrorDomainBlob",
                self.error_domain_blob_size,
                ErrorDomainBlob::SIZE,
            ),
            (
                "AnnotationBlob",
                self.annotation_blob_size,
                AnnotationBlob::SIZE,
            ),
            (
                "SignatureBlob",
                self.signature_blob_size,
                SignatureBlob::SIZE,
            ),
            ("EnumBlob", self.enum_blob_size, EnumBlob::SIZE),
            ("StructBlob", self.struct_blob_size, StructBlob::SIZE),
            ("ObjectBlob", self.object_blob_size, ObjectBlob::SIZE),
            (
                "InterfaceBlob",
                self.interface_blob_size,
                InterfaceBlob::SIZE,
            ),
            ("UnionBlob", self.union_blob_size, UnionBlob::SIZE),
        ];
        table
            .iter()
            .find(|(_, recorded, compiled)| usize::from(*recorded) != *compiled)
            .map(|(name, _, _)| *name)
    }
}
