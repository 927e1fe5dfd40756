//! The namespace registry and resolution layer.
//!
//! A [`Repository`] maps namespace names to registered typelib buffers and
//! answers name/type/index queries against them. One process-wide instance
//! is available through [`Repository::default_registry`]; private instances
//! are fully isolated (own table, own caches, own resolver) and never fall
//! through to the default table.
//!
//! Registration and enumeration serialize on the registry lock; byte
//! decoding happens on shared buffer handles outside any lock, since a
//! registered buffer is immutable.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use typelib_core::{BlobType, BoxedBlob, DirEntry, TypeTag, Typelib};
use typelib_ffi::{CodePtr, DlResolver, SymbolResolver, raw_call};

use crate::error::{RepositoryError, Result};
use crate::info::Info;

/// A runtime type identifier produced by a get-type symbol.
pub type GType = usize;

/// Environment variable holding extra search-path directories.
pub const TYPELIB_PATH_VAR: &str = "TYPELIB_PATH";

/// Registry mapping namespace names to registered typelib buffers.
pub struct Repository {
    typelibs: RwLock<FxHashMap<String, Arc<Typelib>>>,
    search_path: RwLock<Vec<PathBuf>>,
    resolver: Arc<dyn SymbolResolver>,
    gtype_cache: Mutex<FxHashMap<(String, u32), GType>>,
    pub(crate) quark_cache: Mutex<FxHashMap<(String, u32), u32>>,
}

impl Repository {
    /// Create a private registry using the platform dynamic loader for
    /// symbol resolution.
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(DlResolver::new()))
    }

    /// Create a private registry with a caller-supplied symbol resolver.
    pub fn with_resolver(resolver: Arc<dyn SymbolResolver>) -> Self {
        Repository {
            typelibs: RwLock::new(FxHashMap::default()),
            search_path: RwLock::new(Vec::new()),
            resolver,
            gtype_cache: Mutex::new(FxHashMap::default()),
            quark_cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// The process-wide registry, created on first use.
    ///
    /// Safe under concurrent first access; every caller observes the same
    /// instance.
    pub fn default_registry() -> &'static Repository {
        static DEFAULT: OnceLock<Repository> = OnceLock::new();
        DEFAULT.get_or_init(Repository::new)
    }

    /// The symbol resolver this registry consults for get-type, quark and
    /// function symbols.
    pub fn resolver(&self) -> &Arc<dyn SymbolResolver> {
        &self.resolver
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a typelib under the namespace its header declares.
    ///
    /// If the namespace is already registered the existing buffer is kept
    /// (first registration wins), a warning is logged, and the existing
    /// handle is returned.
    pub fn register(&self, typelib: Typelib) -> Arc<Typelib> {
        let namespace = typelib.namespace().to_string();
        let mut map = self
            .typelibs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = map.get(&namespace) {
            log::warn!(
                "namespace {namespace} is already registered; keeping the existing typelib"
            );
            return existing.clone();
        }
        let shared = Arc::new(typelib);
        map.insert(namespace, shared.clone());
        shared
    }

    /// Remove a namespace's registration.
    ///
    /// Outstanding info handles keep the buffer alive but the namespace is
    /// no longer reachable through queries. Returns false (with a warning)
    /// when the namespace was not registered.
    pub fn unregister(&self, namespace: &str) -> bool {
        let removed = self
            .typelibs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(namespace)
            .is_some();
        if removed {
            let mut gtypes = self
                .gtype_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            gtypes.retain(|(ns, _), _| ns != namespace);
            let mut quarks = self
                .quark_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            quarks.retain(|(ns, _), _| ns != namespace);
        } else {
            log::warn!("cannot unregister namespace {namespace}: not registered");
        }
        removed
    }

    pub fn is_registered(&self, namespace: &str) -> bool {
        self.typelibs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(namespace)
    }

    /// The registered buffer for a namespace.
    pub fn get_typelib(&self, namespace: &str) -> Option<Arc<Typelib>> {
        self.typelibs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .cloned()
    }

    /// All currently registered namespace names, in unspecified order.
    pub fn get_namespaces(&self) -> Vec<String> {
        self.typelibs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Local-entry count of one namespace, or the sum across all registered
    /// namespaces when none is given. An unregistered namespace counts as 0,
    /// with a warning.
    pub fn get_n_infos(&self, namespace: Option<&str>) -> usize {
        match namespace {
            Some(ns) => match self.get_typelib(ns) {
                Some(tl) => usize::from(tl.n_local_entries()),
                None => {
                    log::warn!("namespace {ns} is not registered");
                    0
                }
            },
            None => self
                .snapshot()
                .iter()
                .map(|tl| usize::from(tl.n_local_entries()))
                .sum(),
        }
    }

    /// Buffers of every registered namespace, in unspecified order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Typelib>> {
        self.typelibs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    // ========================================================================
    // Search path / require
    // ========================================================================

    /// Add a directory consulted first by [`require`](Self::require).
    pub fn prepend_search_path(&self, dir: impl Into<PathBuf>) {
        self.search_path
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, dir.into());
    }

    /// Add a directory consulted last (before `TYPELIB_PATH`) by
    /// [`require`](Self::require).
    pub fn append_search_path(&self, dir: impl Into<PathBuf>) {
        self.search_path
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.into());
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self
            .search_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(paths) = std::env::var_os(TYPELIB_PATH_VAR) {
            dirs.extend(std::env::split_paths(&paths));
        }
        dirs
    }

    /// Locate `<namespace>-<version>.typelib` in the search path, load it and
    /// register it. Reuses an existing registration for the namespace.
    pub fn require(&self, namespace: &str, version: &str) -> Result<Arc<Typelib>> {
        if let Some(existing) = self.get_typelib(namespace) {
            return Ok(existing);
        }
        let filename = format!("{namespace}-{version}.typelib");
        let dirs = self.search_dirs();
        for dir in &dirs {
            let path = dir.join(&filename);
            if !path.is_file() {
                continue;
            }
            log::debug!("require: loading {}", path.display());
            let typelib = Typelib::from_path(&path)?;
            if typelib.namespace() != namespace {
                return Err(RepositoryError::NamespaceMismatch {
                    path,
                    found: typelib.namespace().to_string(),
                    expected: namespace.to_string(),
                });
            }
            return Ok(self.register(typelib));
        }
        Err(RepositoryError::TypelibNotFound {
            namespace: namespace.to_string(),
            version: version.to_string(),
            searched: dirs.len(),
        })
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Find a top-level construct by name.
    ///
    /// With a namespace, scans that namespace's directory in entry order and
    /// returns the first match. Without one, scans every registered
    /// namespace in unspecified order. No match is `Ok(None)`.
    pub fn find_by_name(&self, namespace: Option<&str>, name: &str) -> Result<Option<Info>> {
        match namespace {
            Some(ns) => match self.get_typelib(ns) {
                Some(tl) => find_in_typelib(&tl, name),
                None => Ok(None),
            },
            None => {
                for tl in self.snapshot() {
                    if let Some(info) = find_in_typelib(&tl, name)? {
                        return Ok(Some(info));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Resolve a construct by external 0-based index.
    ///
    /// Without a namespace the index is a global cursor that walks
    /// namespaces in registry iteration order, which is unspecified and may
    /// differ between processes; only the total count is stable.
    pub fn get_info(&self, namespace: Option<&str>, index: usize) -> Result<Option<Info>> {
        match namespace {
            Some(ns) => match self.get_typelib(ns) {
                Some(tl) => info_at(&tl, index),
                None => {
                    log::warn!("namespace {ns} is not registered");
                    Ok(None)
                }
            },
            None => {
                let mut cursor = index;
                for tl in self.snapshot() {
                    let n = usize::from(tl.n_local_entries());
                    if cursor < n {
                        return info_at(&tl, cursor);
                    }
                    cursor -= n;
                }
                Ok(None)
            }
        }
    }

    /// Find the registered-type construct bound to a runtime type
    /// identifier, scanning every registered namespace.
    pub fn find_by_gtype(&self, gtype: GType) -> Result<Option<Info>> {
        for tl in self.snapshot() {
            for index in 1..=tl.n_local_entries() {
                let entry = tl.dir_entry(index)?;
                if !is_registered_type(&entry) {
                    continue;
                }
                if self.registered_gtype(&tl, entry.offset)? == Some(gtype) {
                    return Info::from_dir_entry(&tl, entry).map(Some).map_err(Into::into);
                }
            }
        }
        Ok(None)
    }

    /// Resolve (and cache) the runtime type identifier of the registered
    /// type blob at `offset`. Returns `None` when the producer recorded no
    /// get-type symbol or the symbol cannot be resolved.
    pub fn registered_gtype(&self, typelib: &Arc<Typelib>, offset: u32) -> Result<Option<GType>> {
        let key = (typelib.namespace().to_string(), offset);
        {
            let cache = self
                .gtype_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(&gtype) = cache.get(&key) {
                return Ok(Some(gtype));
            }
        }

        // Every registered-type blob starts with the name/get-type prefix.
        let prefix: BoxedBlob = typelib.record_at(offset)?;
        let Some(symbol) = typelib.optional_string(prefix.gtype_symbol)? else {
            return Ok(None);
        };
        let Some(addr) = self.resolver.resolve(typelib.shared_library(), symbol) else {
            log::warn!("get-type symbol {symbol} could not be resolved");
            return Ok(None);
        };

        // Get-type symbols take no arguments and return a pointer-sized id.
        let ret = unsafe { raw_call(CodePtr(addr), &[], &[], TypeTag::Pointer) };
        let gtype = ret.pointer() as GType;

        self.gtype_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, gtype);
        Ok(Some(gtype))
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("namespaces", &self.get_namespaces())
            .finish()
    }
}

fn is_registered_type(entry: &DirEntry) -> bool {
    BlobType::try_from(entry.blob_type).is_ok_and(BlobType::is_registered_type)
}

fn find_in_typelib(typelib: &Arc<Typelib>, name: &str) -> Result<Option<Info>> {
    for index in 1..=typelib.n_local_entries() {
        let entry = typelib.dir_entry(index)?;
        if typelib.string(entry.name)? == name {
            return Info::from_dir_entry(typelib, entry)
                .map(Some)
                .map_err(Into::into);
        }
    }
    Ok(None)
}

fn info_at(typelib: &Arc<Typelib>, index: usize) -> Result<Option<Info>> {
    if index >= usize::from(typelib.n_local_entries()) {
        return Ok(None);
    }
    let entry = typelib.dir_entry(index as u16 + 1)?;
    Info::from_dir_entry(typelib, entry)
        .map(Some)
        .map_err(Into::into)
}

/// Convenience wrapper: `require` against the default registry with an extra
/// leading search directory.
pub fn require_from(dir: impl AsRef<Path>, namespace: &str, version: &str) -> Result<Arc<Typelib>> {
    let repo = Repository::default_registry();
    repo.prepend_search_path(dir.as_ref());
    repo.require(namespace, version)
}
