//! In-flight indicator shared by every operation of a session.
//!
//! The flag is only ever raised through [`BusyFlag::try_acquire`], which
//! returns a [`BusyGuard`]. Dropping the guard lowers the flag, so it is
//! cleared on every exit path: success, error, early return, or the
//! surrounding future being dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Raise the flag for `operation`.
    ///
    /// Fails with [`CoreError::Busy`] if it is already raised; re-entrant
    /// submits are rejected instead of racing the in-flight call.
    pub fn try_acquire(&self, operation: &'static str) -> Result<BusyGuard<'_>, CoreError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::Busy(operation))?;
        Ok(BusyGuard {
            flag: self,
            operation,
        })
    }
}

/// Holds the busy flag raised until dropped.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
    operation: &'static str,
}

impl BusyGuard<'_> {
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}
