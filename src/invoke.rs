//! The function invoker.
//!
//! This is the unified entry point for calling a native function through its
//! resolved description: it validates argument counts against the declared
//! signature, lays arguments out in declaration order (implicit instance
//! pointer first, implicit error-output slot last), performs the raw call,
//! and writes results back into the caller's slots.
//!
//! The invoker does no memory management on the caller's behalf: transfer
//! annotations are metadata, and values returned by the callee are handed
//! over exactly as received.

use std::ffi::CStr;

use thiserror::Error;
use typelib_core::{Direction, TypeTag, TypelibError};
use typelib_ffi::{Argument, CodePtr, RawThrow, raw_call};
use typelib_repository::{FunctionInfo, Repository, ThrownError};

/// Errors from a single invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The function's description failed to decode.
    #[error(transparent)]
    Typelib(#[from] TypelibError),

    /// Caller-supplied slot counts disagree with the signature. The native
    /// function was not called.
    #[error(
        "argument count mismatch: expected {expected_in} in / {expected_out} out, \
         got {got_in} in / {got_out} out"
    )]
    ArgumentMismatch {
        expected_in: usize,
        got_in: usize,
        expected_out: usize,
        got_out: usize,
    },

    /// The implementing symbol could not be resolved. The native function
    /// was not called.
    #[error("symbol {symbol} could not be resolved")]
    SymbolNotFound { symbol: String },

    /// The callee signaled failure through its error-output slot.
    #[error(transparent)]
    NativeThrow(ThrownError),
}

/// Invoke the native function described by `func`.
///
/// `in_args` supplies one slot per `in`/`inout` parameter in declaration
/// order, preceded by the instance pointer when the function is a method.
/// `out_args` receives one slot per `out`/`inout` parameter in declaration
/// order. The return value lands in `retval`, sized by the declared return
/// type.
///
/// On any error, including a native throw, `out_args` and `retval` are
/// left untouched. The call is fully synchronous on the calling thread; a
/// hung or crashing callee hangs or crashes the caller.
pub fn invoke(
    repo: &Repository,
    func: &FunctionInfo,
    in_args: &[Argument],
    out_args: &mut [Argument],
    retval: &mut Argument,
) -> Result<(), InvokeError> {
    let signature = func.signature()?;
    let params = signature.args()?;

    let mut n_in = 0usize;
    let mut n_out = 0usize;
    let mut declared = Vec::with_capacity(params.len());
    for param in &params {
        let direction = param.direction()?;
        let tag = param.type_desc()?.tag;
        if direction.is_in() {
            n_in += 1;
        }
        if direction.is_out() {
            n_out += 1;
        }
        declared.push((direction, tag));
    }

    let expected_in = n_in + usize::from(func.is_method());
    let expected_out = n_out;
    if in_args.len() != expected_in || out_args.len() != expected_out {
        return Err(InvokeError::ArgumentMismatch {
            expected_in,
            got_in: in_args.len(),
            expected_out,
            got_out: out_args.len(),
        });
    }

    // Resolve before marshaling so a missing symbol also means "no call".
    let symbol = func.symbol()?;
    let typelib = func.info().typelib();
    let Some(addr) = repo.resolver().resolve(typelib.shared_library(), symbol) else {
        return Err(InvokeError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    };

    // Out and inout parameters are passed as pointers to local slots; the
    // locals are copied back into the caller's out slots after the call, in
    // declaration order. The locals vector is sized up front so the
    // addresses handed to the callee stay put.
    let mut locals = vec![Argument::none(); expected_out];
    let mut call_tags: Vec<TypeTag> = Vec::with_capacity(declared.len() + 2);
    let mut slots: Vec<Argument> = Vec::with_capacity(declared.len() + 2);

    let mut in_cursor = 0usize;
    if func.is_method() {
        call_tags.push(TypeTag::Pointer);
        slots.push(in_args[in_cursor]);
        in_cursor += 1;
    }

    let mut out_cursor = 0usize;
    for &(direction, tag) in &declared {
        match direction {
            Direction::In => {
                call_tags.push(tag);
                slots.push(in_args[in_cursor]);
                in_cursor += 1;
            }
            Direction::Out => {
                let local: *mut Argument = &mut locals[out_cursor];
                call_tags.push(TypeTag::Pointer);
                slots.push(Argument::from_pointer(local.cast()));
                out_cursor += 1;
            }
            Direction::InOut => {
                locals[out_cursor] = in_args[in_cursor];
                in_cursor += 1;
                let local: *mut Argument = &mut locals[out_cursor];
                call_tags.push(TypeTag::Pointer);
                slots.push(Argument::from_pointer(local.cast()));
                out_cursor += 1;
            }
        }
    }

    let mut thrown: *mut RawThrow = std::ptr::null_mut();
    if func.throws() {
        let slot: *mut *mut RawThrow = &mut thrown;
        call_tags.push(TypeTag::Pointer);
        slots.push(Argument::from_pointer(slot.cast()));
    }

    let return_tag = signature.return_type()?.tag;
    let arg_refs: Vec<&Argument> = slots.iter().collect();
    log::debug!(
        "invoking {symbol} with {} in / {} out arguments",
        expected_in,
        expected_out
    );
    // SAFETY: the typelib contract is that `symbol` implements exactly the
    // declared signature; tags and slots were built from it in declaration
    // order above.
    let result = unsafe { raw_call(CodePtr(addr), &call_tags, &arg_refs, return_tag) };

    if func.throws() && !thrown.is_null() {
        // Copy the record's fields out; ownership of the record itself is
        // the callee's contract, never the invoker's.
        let raw = unsafe { &*thrown };
        let message = if raw.message.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(raw.message) }
                .to_string_lossy()
                .into_owned()
        };
        return Err(InvokeError::NativeThrow(repo.describe_throw(
            raw.domain, raw.code, message,
        )));
    }

    out_args.copy_from_slice(&locals);
    *retval = result;
    Ok(())
}
