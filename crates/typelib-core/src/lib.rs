//! Binary layout library for the typelib introspection format.
//!
//! A typelib is a producer-emitted binary buffer describing one namespace of
//! a native library: its functions, callbacks, structs, unions, enums,
//! objects, interfaces, constants and error domains. This crate defines the
//! fixed-size records of that format, the owned [`Typelib`] buffer with its
//! bounds-checked offset decoders, and the fatal startup layout check.
//!
//! Higher layers live elsewhere: the namespace registry and typed info
//! handles in `typelib-repository`, the dynamic invoker in the root
//! `typelib` crate.

mod error;
mod records;
mod tags;
mod typelib;

pub use error::{Result, TypelibError};
pub use records::{
    AnnotationBlob, ArgBlob, BoxedBlob, CallbackBlob, ConstantBlob, DirEntry, EnumBlob,
    ErrorDomainBlob, FieldBlob, FunctionBlob, Header, InterfaceBlob, ObjectBlob, PropertyBlob,
    Record, SignalBlob, SignatureBlob, SimpleType, StructBlob, TYPELIB_MAGIC, UnionBlob,
    VFuncBlob, ValueBlob, layout_check,
};
pub use tags::{
    BlobType, Direction, FieldFlags, FunctionFlags, PropertyFlags, SignalFlags, Transfer,
    TypeTag, VFuncFlags, ValueFlags,
};
pub use typelib::Typelib;
