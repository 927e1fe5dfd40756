//! The narrow unsafe boundary under the typelib stack: argument slots,
//! symbol resolution, and the single raw dynamic-call site.
//!
//! Marshaling, ownership bookkeeping and error translation all live above
//! this crate so they can be exercised without performing a foreign call.

mod argument;
mod raw_call;
mod resolver;

pub use argument::{Argument, RawThrow};
pub use raw_call::{ffi_type, raw_call};
pub use resolver::{DlResolver, StaticResolver, SymbolResolver};

// The code-pointer wrapper crosses this crate's API (resolver output feeds
// raw_call), so callers get it from here rather than depending on libffi.
pub use libffi::middle::CodePtr;
