use std::ptr::NonNull;

/// A destruction policy for an owned target, invoked with the raw pointer when the last
/// owner lets go.
///
/// Deleters are plain values: they are stored by value inside [`UniquePtr`][crate::UniquePtr]
/// and inside the control block of [`SharedPtr`][crate::SharedPtr], and may carry state
/// (e.g. a reference to the arena the target came from).
///
/// The blanket policy for `Box`-allocated targets is [`DefaultDeleter`]. Implement this
/// trait to release targets that were not allocated via `Box` or that need extra
/// bookkeeping on destruction.
///
/// # Example
///
/// ```rust
/// use std::ptr::NonNull;
///
/// use managed_ptr::{Deleter, UniquePtr};
///
/// /// Counts destructions while still releasing the allocation.
/// #[derive(Debug, Default)]
/// struct CountingDeleter {
///     deleted: usize,
/// }
///
/// impl<T> Deleter<T> for CountingDeleter {
///     unsafe fn delete(&mut self, target: NonNull<T>) {
///         self.deleted += 1;
///
///         // SAFETY: Forwarding the caller's guarantee that `target` came from `Box::new`.
///         drop(unsafe { Box::from_raw(target.as_ptr()) });
///     }
/// }
///
/// let raw = NonNull::from(Box::leak(Box::new(42_u32)));
///
/// // SAFETY: `raw` was just leaked from a Box and nothing else owns it.
/// let mut handle = unsafe { UniquePtr::from_raw_with(raw, CountingDeleter::default()) };
///
/// handle.reset();
/// assert_eq!(handle.deleter().deleted, 1);
/// ```
pub trait Deleter<T: ?Sized> {
    /// Destroys the target and releases its storage.
    ///
    /// Called at most once per owned target, by the handle (or control block) that holds
    /// this deleter, at the moment ownership ends.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `target` points to a live value this deleter is compatible with (for
    ///    allocation-releasing deleters, a value allocated the way the deleter expects).
    /// 2. No other code accesses the target after this call.
    /// 3. This is the only `delete` call that will ever be made for this target.
    unsafe fn delete(&mut self, target: NonNull<T>);
}

/// The default destruction policy: drops the target and frees its storage by
/// reconstituting the `Box` that allocated it.
///
/// Works for any `T: ?Sized`, so the same policy covers single objects, slices
/// (`UniquePtr<[T]>` drops every element and frees with the correct layout) and
/// trait objects (`SharedPtr<dyn Trait>` destroys through the concrete type's
/// destructor).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DefaultDeleter;

impl<T: ?Sized> Deleter<T> for DefaultDeleter {
    unsafe fn delete(&mut self, target: NonNull<T>) {
        // SAFETY: Forwarding the caller's guarantee that `target` was allocated via `Box`
        // and is not owned or accessed by anyone else.
        drop(unsafe { Box::from_raw(target.as_ptr()) });
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Test helper that tracks whether it has been dropped.
    struct DropTracker {
        dropped: Rc<Cell<bool>>,
    }

    impl DropTracker {
        fn new() -> (Self, Rc<Cell<bool>>) {
            let dropped = Rc::new(Cell::new(false));
            (
                Self {
                    dropped: Rc::clone(&dropped),
                },
                dropped,
            )
        }
    }

    impl Drop for DropTracker {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[test]
    fn default_deleter_drops_and_frees_boxed_target() {
        let (tracker, dropped_flag) = DropTracker::new();
        let raw = NonNull::from(Box::leak(Box::new(tracker)));

        assert!(!dropped_flag.get());

        // SAFETY: `raw` came from `Box::new` above and has no other owner.
        unsafe {
            DefaultDeleter.delete(raw);
        }

        assert!(dropped_flag.get());
    }

    #[test]
    fn default_deleter_drops_every_slice_element() {
        struct CountOnDrop(Rc<Cell<usize>>);

        impl Drop for CountOnDrop {
            fn drop(&mut self) {
                self.0.set(self.0.get().wrapping_add(1));
            }
        }

        let counter = Rc::new(Cell::new(0_usize));

        let slice: Box<[CountOnDrop]> = vec![
            CountOnDrop(Rc::clone(&counter)),
            CountOnDrop(Rc::clone(&counter)),
            CountOnDrop(Rc::clone(&counter)),
        ]
        .into_boxed_slice();

        let raw = NonNull::from(Box::leak(slice));

        // SAFETY: `raw` came from `Box::leak` above and has no other owner.
        unsafe {
            DefaultDeleter.delete(raw);
        }

        assert_eq!(counter.get(), 3);
    }

    #[test]
    fn stateful_deleter_observes_its_own_state() {
        struct Recording {
            calls: Rc<Cell<usize>>,
        }

        impl<T> Deleter<T> for Recording {
            unsafe fn delete(&mut self, target: NonNull<T>) {
                self.calls.set(self.calls.get().wrapping_add(1));

                // SAFETY: Forwarding the caller's guarantee about the allocation.
                drop(unsafe { Box::from_raw(target.as_ptr()) });
            }
        }

        let calls = Rc::new(Cell::new(0_usize));
        let mut deleter = Recording {
            calls: Rc::clone(&calls),
        };

        let raw = NonNull::from(Box::leak(Box::new("payload".to_string())));

        // SAFETY: `raw` came from `Box::new` above and has no other owner.
        unsafe {
            deleter.delete(raw);
        }

        assert_eq!(calls.get(), 1);
    }
}
