//! Process-wide interrupt flag.
//!
//! The binary sets it from its Ctrl-C handler. Running children are killed
//! when it is seen, and batch loops stop before their next item.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ErrorKind, Result};

static REQUESTED: AtomicBool = AtomicBool::new(false);

/// Asks every running operation to stop. Safe to call from a signal handler
/// thread.
pub fn request() {
    REQUESTED.store(true, Ordering::SeqCst);
}

pub fn is_requested() -> bool {
    REQUESTED.load(Ordering::SeqCst)
}

/// `Err(Interrupted)` once an interrupt has been requested.
pub fn check() -> Result<()> {
    if is_requested() {
        return Err(ErrorKind::Interrupted.into());
    }
    Ok(())
}
