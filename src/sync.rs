//! # Fail-fast reentrancy detection for dispatch paths.
//!
//! Consumer callbacks and alarm listeners run synchronously inside a locked
//! region. A callback that calls back into the same component on the same
//! thread would self-deadlock on the coarse mutex; that is a contract
//! violation, not a situation to handle gracefully. [`DispatchGuard`] makes
//! the violation loud: same-thread reentry panics immediately instead of
//! hanging, while callers on other threads block on the mutex as usual.
//!
//! The guard is tagged with the instance address, so two *different*
//! components may legitimately nest on one thread (e.g. a router callback
//! driving the alarm server).

use std::cell::Cell;
use std::ptr;

thread_local! {
    /// Address of the component currently dispatching on this thread.
    static ACTIVE_DISPATCH: Cell<*const ()> = const { Cell::new(ptr::null()) };
}

/// RAII marker for a dispatch section; see the module docs.
///
/// Created at the top of every dispatching operation, before the mutex is
/// taken. Dropping it (including during unwinding) restores the previous
/// marker, so nested dispatch across distinct instances works.
pub(crate) struct DispatchGuard {
    previous: *const (),
}

impl DispatchGuard {
    /// Enters a dispatch section for the component at `instance`.
    ///
    /// # Panics
    /// Panics if the same instance is already dispatching on this thread.
    pub(crate) fn enter(instance: *const (), component: &'static str) -> Self {
        let previous = ACTIVE_DISPATCH.with(|cell| {
            if cell.get() == instance {
                panic!("reentrant call into {component} from within its own dispatch");
            }
            cell.replace(instance)
        });
        Self { previous }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        ACTIVE_DISPATCH.with(|cell| cell.set(self.previous));
    }
}
