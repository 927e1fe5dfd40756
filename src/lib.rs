//! Runtime introspection over binary typelibs, with dynamic invocation.
//!
//! A typelib is a producer-emitted binary description of one namespace of a
//! native library. This crate ties the stack together: the binary format
//! (`typelib-core`), the namespace registry and typed info handles
//! (`typelib-repository`), the raw FFI boundary (`typelib-ffi`), and the
//! [`invoke`] entry point that performs a real native call from a resolved
//! function description.
//!
//! ```no_run
//! use typelib::prelude::*;
//!
//! let repo = Repository::default_registry();
//! repo.require("Gtk", "4.0")?;
//! if let Some(info) = repo.find_by_name(Some("Gtk"), "init")? {
//!     let func = info.as_function().expect("init is a function");
//!     let mut retval = Argument::none();
//!     typelib::invoke(repo, func, &[], &mut [], &mut retval)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod invoke;

pub use invoke::{InvokeError, invoke};

pub mod prelude {
    pub use typelib_core::{BlobType, Direction, Transfer, TypeTag, Typelib, TypelibError};
    pub use typelib_ffi::{Argument, DlResolver, RawThrow, StaticResolver, SymbolResolver};
    pub use typelib_repository::{
        ConstantValue, FunctionInfo, Info, Repository, RepositoryError, ThrownError,
    };

    pub use crate::invoke::{InvokeError, invoke};
}
