use thiserror::Error;

/// Errors that can occur when a fallible constructor asks the global allocator for memory.
///
/// Returned by [`UniquePtr::try_new`][crate::UniquePtr::try_new] and
/// [`SharedPtr::try_new`][crate::SharedPtr::try_new]. When one of these is returned,
/// no handle has taken ownership of anything and no memory has leaked.
///
/// The infallible constructors do not use this type; for them, allocator exhaustion
/// is a panic, not a recoverable condition.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AllocError {
    /// The global allocator could not provide a block of the requested size.
    #[error("the global allocator could not provide {size} bytes for {what}")]
    Exhausted {
        /// What the allocation was for (the managed object or the control block).
        what: &'static str,

        /// The number of bytes requested.
        size: usize,
    },
}
