//! The raw dynamic-call boundary.
//!
//! This is the one place a foreign call actually happens. Everything above
//! it (argument counting, direction handling, ownership bookkeeping, error
//! translation) is ordinary safe code; everything below it is libffi. The
//! boundary speaks only the closed primitive set of [`TypeTag`], which keeps
//! the call-construction surface small enough to audit.

use libffi::middle::{Arg, Cif, CodePtr, Type};
use libc::{c_char, c_void};
use typelib_core::TypeTag;

use crate::argument::Argument;

/// The libffi type describing values of `tag`.
///
/// Pointer-flavored kinds (strings, opaque pointers) are plain addresses;
/// booleans and enums travel as C `int`.
pub fn ffi_type(tag: TypeTag) -> Type {
    match tag {
        TypeTag::Void => Type::void(),
        TypeTag::Boolean => Type::i32(),
        TypeTag::Int8 => Type::i8(),
        TypeTag::UInt8 => Type::u8(),
        TypeTag::Int16 => Type::i16(),
        TypeTag::UInt16 => Type::u16(),
        TypeTag::Int32 => Type::i32(),
        TypeTag::UInt32 => Type::u32(),
        TypeTag::Int64 => Type::i64(),
        TypeTag::UInt64 => Type::u64(),
        TypeTag::Float => Type::f32(),
        TypeTag::Double => Type::f64(),
        TypeTag::String | TypeTag::Pointer => Type::pointer(),
        TypeTag::Enum => Type::i32(),
    }
}

/// Call the native function at `code` with the given argument slots.
///
/// `arg_tags` and `args` describe the call in declaration order and must be
/// the same length; each slot is read with the width its tag declares. The
/// return value is widened into a fresh [`Argument`] according to
/// `return_tag`.
///
/// # Safety
///
/// The caller must guarantee that `code` is a live function whose actual
/// ABI signature matches `arg_tags`/`return_tag`, and that every
/// pointer-valued slot holds an address valid for whatever the callee does
/// with it. Nothing here can check any of that; a mismatch is undefined
/// behavior, exactly as with a hand-written extern declaration.
pub unsafe fn raw_call(
    code: CodePtr,
    arg_tags: &[TypeTag],
    args: &[&Argument],
    return_tag: TypeTag,
) -> Argument {
    debug_assert_eq!(arg_tags.len(), args.len());

    let cif = Cif::new(arg_tags.iter().map(|&t| ffi_type(t)), ffi_type(return_tag));

    // An Arg is just the slot's address; libffi reads the width declared in
    // the CIF. Every union field starts at offset 0, so any field reference
    // addresses the whole slot.
    let ffi_args: Vec<Arg> = args
        .iter()
        .map(|slot| Arg::new(unsafe { &slot.v_uint64 }))
        .collect();

    unsafe {
        match return_tag {
            TypeTag::Void => {
                cif.call::<()>(code, &ffi_args);
                Argument::none()
            }
            TypeTag::Boolean => Argument::from_bool(cif.call::<i32>(code, &ffi_args) != 0),
            TypeTag::Int8 => Argument::from_int8(cif.call::<i8>(code, &ffi_args)),
            TypeTag::UInt8 => Argument::from_uint8(cif.call::<u8>(code, &ffi_args)),
            TypeTag::Int16 => Argument::from_int16(cif.call::<i16>(code, &ffi_args)),
            TypeTag::UInt16 => Argument::from_uint16(cif.call::<u16>(code, &ffi_args)),
            TypeTag::Int32 => Argument::from_int32(cif.call::<i32>(code, &ffi_args)),
            TypeTag::UInt32 => Argument::from_uint32(cif.call::<u32>(code, &ffi_args)),
            TypeTag::Int64 => Argument::from_int64(cif.call::<i64>(code, &ffi_args)),
            TypeTag::UInt64 => Argument::from_uint64(cif.call::<u64>(code, &ffi_args)),
            TypeTag::Float => Argument::from_float(cif.call::<f32>(code, &ffi_args)),
            TypeTag::Double => Argument::from_double(cif.call::<f64>(code, &ffi_args)),
            TypeTag::String => {
                Argument::from_string(cif.call::<*const c_char>(code, &ffi_args))
            }
            TypeTag::Pointer => {
                Argument::from_pointer(cif.call::<*mut c_void>(code, &ffi_args))
            }
            TypeTag::Enum => Argument::from_int32(cif.call::<i32>(code, &ffi_args)),
        }
    }
}
