//! Tag enums and flag words shared by every record in the typelib format.
//!
//! Records store tags as raw integers (`u8`/`u16`) so that any bit pattern
//! can be decoded from a buffer; conversion to these enums happens at the
//! accessor layer and fails with a structured error instead of a panic.

use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// Blob types
// ============================================================================

/// Kind tag of a top-level blob, as stored in a [`DirEntry`](crate::DirEntry).
///
/// Tags at or above [`BlobType::FIRST_REGISTERED`] describe constructs that
/// carry a get-type symbol binding them to a live runtime type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum BlobType {
    Invalid = 0,
    Function = 1,
    Callback = 2,
    Constant = 3,
    ErrorDomain = 4,
    Struct = 5,
    Boxed = 6,
    Enum = 7,
    Flags = 8,
    Object = 9,
    Interface = 10,
    Union = 11,
}

impl BlobType {
    /// First tag whose blobs carry a get-type symbol.
    pub const FIRST_REGISTERED: BlobType = BlobType::Struct;

    /// Whether blobs of this type have a runtime type system counterpart.
    pub fn is_registered_type(self) -> bool {
        u16::from(self) >= u16::from(Self::FIRST_REGISTERED)
    }
}

// ============================================================================
// Type tags
// ============================================================================

/// The closed set of value kinds a signature can describe.
///
/// `Enum` marshals as a 32-bit signed integer; `String` and `Pointer` are
/// passed as raw addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TypeTag {
    Void = 0,
    Boolean = 1,
    Int8 = 2,
    UInt8 = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    Pointer = 13,
    Enum = 14,
}

impl TypeTag {
    /// Whether values of this kind are passed as raw addresses.
    pub fn is_pointer_kind(self) -> bool {
        matches!(self, TypeTag::String | TypeTag::Pointer)
    }
}

// ============================================================================
// Argument direction and ownership transfer
// ============================================================================

/// Direction of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Direction {
    In = 0,
    Out = 1,
    InOut = 2,
}

impl Direction {
    /// Whether the caller supplies a value for this parameter.
    pub fn is_in(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    /// Whether the callee writes a value through this parameter.
    pub fn is_out(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

/// Ownership-transfer annotation. Contractual metadata only: the invoker
/// never frees or copies on the caller's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Transfer {
    None = 0,
    Container = 1,
    Full = 2,
}

// ============================================================================
// Flag words
// ============================================================================

bitflags::bitflags! {
    /// Flag word of a [`FunctionBlob`](crate::FunctionBlob).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FunctionFlags: u16 {
        /// Takes an implicit leading instance pointer.
        const METHOD = 1 << 0;
        const CONSTRUCTOR = 1 << 1;
        const GETTER = 1 << 2;
        const SETTER = 1 << 3;
        /// Takes an implicit trailing error-output slot.
        const THROWS = 1 << 4;
    }

    /// Flag word of a [`FieldBlob`](crate::FieldBlob).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u16 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
    }

    /// Flag word of a [`PropertyBlob`](crate::PropertyBlob).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyFlags: u16 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const CONSTRUCT = 1 << 2;
    }

    /// Flag word of a [`SignalBlob`](crate::SignalBlob).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SignalFlags: u16 {
        const RUN_FIRST = 1 << 0;
        const RUN_LAST = 1 << 1;
        const DETAILED = 1 << 2;
    }

    /// Flag word of a [`VFuncBlob`](crate::VFuncBlob).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VFuncFlags: u16 {
        const MUST_OVERRIDE = 1 << 0;
    }

    /// Flag word of a [`ValueBlob`](crate::ValueBlob).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValueFlags: u16 {
        /// The 32-bit value field holds an unsigned quantity.
        const UNSIGNED = 1 << 0;
    }
}
