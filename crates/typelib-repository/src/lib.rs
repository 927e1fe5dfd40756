//! Namespace registry and info resolution over registered typelib buffers.
//!
//! This crate owns the repository tables (the process-wide default and any
//! private instances), turns (namespace, name | gtype | index) queries into
//! typed info handles, and maps native error-domain quarks back to their
//! symbolic descriptions. The dynamic invoker in the root `typelib` crate
//! builds on these handles.

mod error;
mod error_domain;
mod info;
mod repository;

pub use error::{RepositoryError, Result, ThrownError};
pub use info::{
    ArgInfo, BoxedInfo, CallbackInfo, ConstantInfo, ConstantValue, EnumInfo, ErrorDomainInfo,
    FieldInfo, FunctionInfo, Info, InfoRef, InterfaceInfo, ObjectInfo, PropertyInfo, SignalInfo,
    SignatureInfo, StructInfo, TypeDesc, UnionInfo, VFuncInfo, ValueInfo,
};
pub use repository::{GType, Repository, TYPELIB_PATH_VAR, require_from};
