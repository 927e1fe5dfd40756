//! The 8-byte argument slot used on both sides of a dynamic call.

use libc::{c_char, c_void};

/// One value slot of the closed primitive set.
///
/// Every constructor fully initializes the slot (unused high bytes are
/// zeroed), so reading any field afterwards observes initialized memory;
/// which field is *meaningful* is dictated by the signature's type tag, as
/// with any C-style value union. Booleans are stored as a C `int`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union Argument {
    pub v_boolean: i32,
    pub v_int8: i8,
    pub v_uint8: u8,
    pub v_int16: i16,
    pub v_uint16: u16,
    pub v_int32: i32,
    pub v_uint32: u32,
    pub v_int64: i64,
    pub v_uint64: u64,
    pub v_float: f32,
    pub v_double: f64,
    pub v_pointer: *mut c_void,
    pub v_string: *const c_char,
    storage: u64,
}

impl Argument {
    /// An all-zero slot: false / 0 / 0.0 / null depending on interpretation.
    pub const fn none() -> Self {
        Argument { storage: 0 }
    }

    pub fn from_bool(v: bool) -> Self {
        let mut arg = Self::none();
        arg.v_boolean = i32::from(v);
        arg
    }

    pub fn from_int8(v: i8) -> Self {
        let mut arg = Self::none();
        arg.v_int8 = v;
        arg
    }

    pub fn from_uint8(v: u8) -> Self {
        let mut arg = Self::none();
        arg.v_uint8 = v;
        arg
    }

    pub fn from_int16(v: i16) -> Self {
        let mut arg = Self::none();
        arg.v_int16 = v;
        arg
    }

    pub fn from_uint16(v: u16) -> Self {
        let mut arg = Self::none();
        arg.v_uint16 = v;
        arg
    }

    pub fn from_int32(v: i32) -> Self {
        let mut arg = Self::none();
        arg.v_int32 = v;
        arg
    }

    pub fn from_uint32(v: u32) -> Self {
        let mut arg = Self::none();
        arg.v_uint32 = v;
        arg
    }

    pub fn from_int64(v: i64) -> Self {
        let mut arg = Self::none();
        arg.v_int64 = v;
        arg
    }

    pub fn from_uint64(v: u64) -> Self {
        Argument { v_uint64: v }
    }

    pub fn from_float(v: f32) -> Self {
        let mut arg = Self::none();
        arg.v_float = v;
        arg
    }

    pub fn from_double(v: f64) -> Self {
        let mut arg = Self::none();
        arg.v_double = v;
        arg
    }

    pub fn from_pointer(v: *mut c_void) -> Self {
        let mut arg = Self::none();
        arg.v_pointer = v;
        arg
    }

    pub fn from_string(v: *const c_char) -> Self {
        let mut arg = Self::none();
        arg.v_string = v;
        arg
    }

    // Slots are always fully initialized (see type docs), and every field is
    // valid for any bit pattern, so these reads are sound regardless of which
    // constructor ran.

    pub fn boolean(&self) -> bool {
        unsafe { self.v_boolean != 0 }
    }

    pub fn int8(&self) -> i8 {
        unsafe { self.v_int8 }
    }

    pub fn uint8(&self) -> u8 {
        unsafe { self.v_uint8 }
    }

    pub fn int16(&self) -> i16 {
        unsafe { self.v_int16 }
    }

    pub fn uint16(&self) -> u16 {
        unsafe { self.v_uint16 }
    }

    pub fn int32(&self) -> i32 {
        unsafe { self.v_int32 }
    }

    pub fn uint32(&self) -> u32 {
        unsafe { self.v_uint32 }
    }

    pub fn int64(&self) -> i64 {
        unsafe { self.v_int64 }
    }

    pub fn uint64(&self) -> u64 {
        unsafe { self.v_uint64 }
    }

    pub fn float(&self) -> f32 {
        unsafe { self.v_float }
    }

    pub fn double(&self) -> f64 {
        unsafe { self.v_double }
    }

    pub fn pointer(&self) -> *mut c_void {
        unsafe { self.v_pointer }
    }

    pub fn string(&self) -> *const c_char {
        unsafe { self.v_string }
    }
}

impl Default for Argument {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Argument({:#018x})", unsafe { self.storage })
    }
}

/// The callee-written error record of the "throws" calling convention.
///
/// A throwing function takes an implicit trailing `*mut *mut RawThrow`
/// parameter; writing a non-null record there signals failure. The invoker
/// copies the fields out and never frees the record.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawThrow {
    /// Runtime quark of the error domain.
    pub domain: u32,
    pub code: i32,
    pub message: *const c_char,
}
