//! Synchronization utilities for robust mutex handling

use std::sync::LockResult;

/// Convert a mutex poison error into an application error
///
/// A poisoned lock means a panic occurred while the guard was held; the
/// caller decides which error variant that maps to.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use snapscan::core::sync::handle_mutex_poison;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), |msg| msg).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). This indicates a panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
