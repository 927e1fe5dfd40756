//! Dynamic symbol resolution.
//!
//! The repository and invoker never call `dlopen`/`dlsym` directly; they go
//! through a [`SymbolResolver`]. The default implementation ([`DlResolver`])
//! loads the shared library a typelib's producer recorded and caches the
//! handle. [`StaticResolver`] serves embedders (and tests) that want to
//! expose in-process functions without any library loading.

use std::ffi::c_void;
use std::sync::{Mutex, RwLock};

use libloading::Library;
use rustc_hash::FxHashMap;

/// Maps symbol names to addresses.
///
/// `library` is the shared-library name recorded by a typelib's producer,
/// when one was recorded; implementations may ignore it and search wherever
/// they like. Returning `None` means the symbol cannot be resolved, which
/// callers surface as a structured error.
pub trait SymbolResolver: Send + Sync {
    fn resolve(&self, library: Option<&str>, symbol: &str) -> Option<*mut c_void>;
}

// ============================================================================
// dlopen-backed resolver
// ============================================================================

/// Resolver backed by the platform dynamic loader, with cached library
/// handles. Symbols are looked up in the named library when one is given,
/// falling back to the current process image.
#[derive(Default)]
pub struct DlResolver {
    libraries: Mutex<FxHashMap<String, Library>>,
}

impl DlResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform-decorated fallback name for a bare library name.
    fn platform_lib_name(name: &str) -> String {
        #[cfg(target_os = "windows")]
        {
            format!("{name}.dll")
        }
        #[cfg(target_os = "macos")]
        {
            format!("lib{name}.dylib")
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            format!("lib{name}.so")
        }
    }

    fn lookup_in(library: &Library, symbol: &str) -> Option<*mut c_void> {
        let mut name = symbol.as_bytes().to_vec();
        name.push(0);
        // The signature is a lie shared with every dynamic-loader API: the
        // real type is only known to the caller holding the typelib.
        let sym = unsafe { library.get::<unsafe extern "C" fn()>(&name) }.ok()?;
        Some(*sym as usize as *mut c_void)
    }

    fn current_process() -> Option<Library> {
        #[cfg(unix)]
        {
            Some(libloading::os::unix::Library::this().into())
        }
        #[cfg(windows)]
        {
            libloading::os::windows::Library::this().ok().map(Into::into)
        }
    }
}

impl SymbolResolver for DlResolver {
    fn resolve(&self, library: Option<&str>, symbol: &str) -> Option<*mut c_void> {
        if let Some(name) = library {
            let mut libraries = self.libraries.lock().ok()?;
            if !libraries.contains_key(name) {
                let loaded = unsafe { Library::new(name) }.or_else(|_| {
                    let decorated = Self::platform_lib_name(name);
                    unsafe { Library::new(&decorated) }
                });
                match loaded {
                    Ok(lib) => {
                        libraries.insert(name.to_string(), lib);
                    }
                    Err(e) => {
                        log::warn!("failed to load shared library {name}: {e}");
                    }
                }
            }
            if let Some(lib) = libraries.get(name) {
                if let Some(addr) = Self::lookup_in(lib, symbol) {
                    return Some(addr);
                }
            }
        }

        // Fall back to whatever is already linked into the process.
        Self::lookup_in(&Self::current_process()?, symbol)
    }
}

// ============================================================================
// Static table resolver
// ============================================================================

/// Resolver over an explicit symbol table.
///
/// Embedders register in-process function addresses up front; the library
/// name is ignored. This keeps every layer above the raw call testable
/// without touching the dynamic loader.
#[derive(Default)]
pub struct StaticResolver {
    symbols: RwLock<FxHashMap<String, usize>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` under `symbol`, replacing any previous entry.
    pub fn register(&self, symbol: impl Into<String>, address: *const c_void) {
        if let Ok(mut symbols) = self.symbols.write() {
            symbols.insert(symbol.into(), address as usize);
        }
    }
}

impl SymbolResolver for StaticResolver {
    fn resolve(&self, _library: Option<&str>, symbol: &str) -> Option<*mut c_void> {
        let symbols = self.symbols.read().ok()?;
        symbols.get(symbol).map(|&addr| addr as *mut c_void)
    }
}
