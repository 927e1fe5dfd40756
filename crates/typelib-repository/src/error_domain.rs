//! Error-domain resolution.
//!
//! Error-domain blobs bind a symbolic domain name and a get-quark symbol to
//! a contiguous range of error codes. When an invoked function throws, the
//! raw record only carries the runtime quark; this module maps it back to
//! the symbolic domain so callers get a readable structured error.

use std::sync::PoisonError;

use typelib_core::{BlobType, TypeTag};
use typelib_ffi::{CodePtr, raw_call};

use crate::error::{Result, ThrownError};
use crate::info::ErrorDomainInfo;
use crate::repository::Repository;

impl Repository {
    /// Resolve (and cache) the runtime quark of an error domain by invoking
    /// its get-quark symbol. `None` when the symbol is missing or cannot be
    /// resolved.
    pub fn domain_quark(&self, domain: &ErrorDomainInfo) -> Result<Option<u32>> {
        let typelib = domain.info().typelib();
        let key = (typelib.namespace().to_string(), domain.info().offset());
        {
            let cache = self
                .quark_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(&quark) = cache.get(&key) {
                return Ok(Some(quark));
            }
        }

        let symbol = domain.get_quark_symbol()?;
        if symbol.is_empty() {
            return Ok(None);
        }
        let Some(addr) = self
            .resolver()
            .resolve(typelib.shared_library(), symbol)
        else {
            log::warn!("get-quark symbol {symbol} could not be resolved");
            return Ok(None);
        };

        // Quark accessors take no arguments and return a 32-bit id.
        let ret = unsafe { raw_call(CodePtr(addr), &[], &[], TypeTag::UInt32) };
        let quark = ret.uint32();

        self.quark_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, quark);
        Ok(Some(quark))
    }

    /// Find the registered error domain whose runtime quark is `quark`,
    /// scanning every registered namespace.
    pub fn find_error_domain(&self, quark: u32) -> Result<Option<ErrorDomainInfo>> {
        for typelib in self.snapshot() {
            for index in 1..=typelib.n_local_entries() {
                let entry = typelib.dir_entry(index)?;
                if entry.blob_type != u16::from(BlobType::ErrorDomain) {
                    continue;
                }
                let domain = ErrorDomainInfo::new(typelib.clone(), entry.offset)?;
                if self.domain_quark(&domain)? == Some(quark) {
                    return Ok(Some(domain));
                }
            }
        }
        Ok(None)
    }

    /// Package a raw throw into a structured error, mapping the quark to a
    /// symbolic domain name when one is registered.
    ///
    /// Mapping failures never mask the throw itself; they degrade to the
    /// decimal quark value.
    pub fn describe_throw(&self, quark: u32, code: i32, message: impl Into<String>) -> ThrownError {
        let domain = match self.find_error_domain(quark) {
            Ok(Some(info)) => info
                .name()
                .map(str::to_string)
                .unwrap_or_else(|_| quark.to_string()),
            Ok(None) => quark.to_string(),
            Err(e) => {
                log::warn!("error-domain lookup for quark {quark} failed: {e}");
                quark.to_string()
            }
        };
        ThrownError {
            domain,
            code,
            message: message.into(),
        }
    }
}
