//! Per-thread record of the context this crate last made current
//!
//! GL "current" state is thread-local, so is this slot. Context ids are never
//! reused, so a slot still naming a released context can never match a live one.

use crate::types::ContextId;
use std::cell::Cell;

thread_local! {
    static CURRENT: Cell<Option<ContextId>> = const { Cell::new(None) };
}

/// Context made current on this thread, if any
pub fn current() -> Option<ContextId> {
    CURRENT.with(|slot| slot.get())
}

pub fn is_current(context: ContextId) -> bool {
    current() == Some(context)
}

pub fn mark_current(context: ContextId) {
    CURRENT.with(|slot| slot.set(Some(context)));
}

/// Forget the current context, forcing the next activation to switch
pub fn forget() {
    CURRENT.with(|slot| slot.set(None));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_mark_and_forget() {
        forget();
        assert_eq!(current(), None);

        mark_current(ContextId(3));
        assert!(is_current(ContextId(3)));
        assert!(!is_current(ContextId(4)));

        forget();
        assert!(!is_current(ContextId(3)));
    }

    #[test]
    fn test_slot_is_per_thread() {
        mark_current(ContextId(1));

        let other = thread::spawn(current).join().unwrap();

        assert_eq!(other, None);
        assert_eq!(current(), Some(ContextId(1)));
    }
}
