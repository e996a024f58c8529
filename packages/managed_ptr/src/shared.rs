use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::atomic;

use crate::control::{self, ControlBlock};
use crate::{AllocError, DefaultDeleter, Deleter, UniquePtr};

/// A shared-ownership handle: any number of `SharedPtr` instances may jointly own a
/// target, and the last one to let go destroys it through the deletion policy the
/// group was created with.
///
/// Every ownership group is mediated by one control block, allocated when the first
/// handle for a target is created. Cloning a handle increments the block's atomic
/// count; dropping or [`reset()`][Self::reset]ting decrements it; the owner that
/// drives the count to zero destroys the target exactly once and then frees the
/// block. The count is safe to mutate from any number of threads concurrently — the
/// target's own contents are not synchronized by this type.
///
/// A `SharedPtr` may be empty. Dereferencing an empty handle panics; use
/// [`get()`][Self::get] or [`as_deref()`][Self::as_deref] when emptiness is a
/// legitimate state to observe.
///
/// # Example
///
/// ```rust
/// use managed_ptr::SharedPtr;
///
/// let first = SharedPtr::new(42_i32);
/// let second = first.clone();
/// let third = second.clone();
///
/// assert_eq!(first.use_count(), 3);
///
/// drop(first);
/// drop(second);
/// assert_eq!(third.use_count(), 1);
/// assert!(third.is_unique());
/// assert_eq!(*third, 42);
/// // Dropping `third` destroys the integer, exactly once.
/// ```
pub struct SharedPtr<T: ?Sized> {
    /// Target cache and control block travel together: the handle is empty exactly
    /// when this is `None`.
    inner: Option<SharedInner<T>>,
}

/// The non-empty state: a cached target pointer (possibly a differently typed view
/// of the block's target, after a cast) plus the shared control block.
struct SharedInner<T: ?Sized> {
    target: NonNull<T>,
    block: NonNull<dyn ControlBlock>,
}

impl<T: ?Sized> Clone for SharedInner<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for SharedInner<T> {}

impl<T: 'static> SharedPtr<T> {
    /// Allocates `value` on the heap and wraps it in a shared handle in one step,
    /// so no raw pointer is ever transiently unowned.
    ///
    /// Allocates the target and one control block; the count starts at 1.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::SharedPtr;
    ///
    /// let handle = SharedPtr::new("hello".to_string());
    /// assert_eq!(handle.len(), 5);
    /// assert_eq!(handle.use_count(), 1);
    /// ```
    #[must_use]
    pub fn new(value: T) -> Self {
        UniquePtr::new(value).into_shared()
    }

    /// Like [`new()`][Self::new], but reports allocator exhaustion as an error
    /// instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if either the target allocation or the control block
    /// allocation fails. In both cases the value is dropped cleanly and nothing
    /// leaks; no handle comes into existence.
    pub fn try_new(value: T) -> Result<Self, AllocError> {
        let exclusive = UniquePtr::try_new(value)?;

        exclusive.try_into_shared().map_err(|(handle, error)| {
            // The exclusive handle still owns the target; dropping it destroys the
            // value and releases the allocation, upholding the strong guarantee.
            drop(handle);
            error
        })
    }
}

impl<T: ?Sized + 'static> SharedPtr<T> {
    /// Takes ownership of a raw pointer, allocating a control block bound to the
    /// default deletion policy.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `target` came from `Box::into_raw` / `Box::leak` (or an allocation with
    ///    the identical layout in the global allocator).
    /// 2. No other owning handle or code path will also destroy it. In particular,
    ///    creating a second group for a pointer that already has one leads to a
    ///    double destruction.
    pub unsafe fn from_raw(target: NonNull<T>) -> Self {
        // SAFETY: Forwarding the caller's guarantees; `DefaultDeleter` releases via
        // `Box::from_raw`, matching requirement 1.
        unsafe { Self::from_raw_with(target, DefaultDeleter) }
    }

    /// Takes ownership of a raw pointer, allocating a control block bound to the
    /// given deletion policy.
    ///
    /// The deleter must be `Send + Sync` because it becomes shared state of the
    /// whole group and may run on whichever thread drops the last handle.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `target` points to a live value that `deleter` knows how to destroy.
    /// 2. No other owning handle or code path will also destroy it.
    pub unsafe fn from_raw_with<D>(target: NonNull<T>, deleter: D) -> Self
    where
        D: Deleter<T> + Send + Sync + 'static,
    {
        let block = control::allocate(target, deleter);

        // SAFETY: The block was just created for this target with a count of 1,
        // which this handle's lifetime accounts for.
        unsafe { Self::from_parts(target, block) }
    }

    /// Destroys/releases the current share (if any), then adopts `target` into a
    /// freshly allocated control block with the default policy.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw()`][Self::from_raw] for the new target.
    pub unsafe fn reset_raw(&mut self, target: NonNull<T>) {
        self.reset();

        // SAFETY: Forwarded from the caller.
        *self = unsafe { Self::from_raw(target) };
    }

    /// Destroys/releases the current share (if any), then adopts `target` into a
    /// freshly allocated control block with the given policy.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw_with()`][Self::from_raw_with] for the new target.
    pub unsafe fn reset_raw_with<D>(&mut self, target: NonNull<T>, deleter: D)
    where
        D: Deleter<T> + Send + Sync + 'static,
    {
        self.reset();

        // SAFETY: Forwarded from the caller.
        *self = unsafe { Self::from_raw_with(target, deleter) };
    }
}

impl<T: ?Sized> SharedPtr<T> {
    /// Creates an empty handle that participates in no ownership group.
    #[must_use]
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Assembles a handle from a target pointer and a control block.
    ///
    /// # Safety
    ///
    /// `target` must be a view of the object `block` destroys, and `block`'s count
    /// must already include this handle's contribution.
    pub(crate) unsafe fn from_parts(target: NonNull<T>, block: NonNull<dyn ControlBlock>) -> Self {
        Self {
            inner: Some(SharedInner { target, block }),
        }
    }

    /// Returns the target pointer without affecting ownership, or `None` for an
    /// empty handle.
    #[must_use]
    #[inline]
    pub fn get(&self) -> Option<NonNull<T>> {
        self.inner.map(|inner| inner.target)
    }

    /// Whether this handle currently participates in no ownership group.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrows the target, or `None` for an empty handle.
    #[must_use]
    pub fn as_deref(&self) -> Option<&T> {
        // SAFETY: A non-empty handle keeps the ownership group alive, and the group
        // keeps the target alive, for at least as long as this borrow.
        self.inner.map(|inner| unsafe { inner.target.as_ref() })
    }

    /// The number of handles currently sharing this handle's target, or 0 for an
    /// empty handle.
    ///
    /// Advisory only: under concurrency the value may be stale the instant it is
    /// produced. Never use it to justify unsynchronized access to the target.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::SharedPtr;
    ///
    /// let handle = SharedPtr::new(1_u8);
    /// assert_eq!(handle.use_count(), 1);
    ///
    /// let other = handle.clone();
    /// assert_eq!(handle.use_count(), 2);
    ///
    /// drop(other);
    /// assert_eq!(handle.use_count(), 1);
    /// ```
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.inner.map_or(0, |inner| {
            // SAFETY: A non-empty handle participates in the group, so the block
            // is live.
            unsafe { control::count(inner.block) }
        })
    }

    /// Whether this handle is the only owner in its group. Advisory under
    /// concurrency, same as [`use_count()`][Self::use_count]; `false` for an
    /// empty handle.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.inner.is_some() && self.use_count() == 1
    }

    /// Mutably borrows the target if this handle is the group's only owner.
    ///
    /// Sound because there is no non-owning observer type in this crate: a count of
    /// one, observed with Acquire ordering while holding `&mut self`, means no other
    /// handle exists anywhere and none can appear while the borrow lasts.
    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let inner = self.inner?;

        // Acquire pairs with the Release decrements of departed owners, so their
        // accesses to the target happen-before ours.
        // SAFETY: A non-empty handle participates in the group, so the block is live.
        let owners = unsafe { inner.block.as_ref() }
            .strong()
            .load(atomic::Ordering::Acquire);

        if owners == 1 {
            let target = inner.target.as_ptr();

            // SAFETY: We are the sole owner and `&mut self` prevents cloning for the
            // duration of the borrow.
            Some(unsafe { &mut *target })
        } else {
            None
        }
    }

    /// Leaves this handle's ownership group and becomes empty, decrementing the
    /// group count. If this handle was the last owner, the target is destroyed.
    pub fn reset(&mut self) {
        if let Some(inner) = self.inner.take() {
            // SAFETY: This handle held exactly one count contribution and has just
            // forgotten the block.
            unsafe {
                control::decref(inner.block);
            }
        }
    }

    /// Moves ownership out through a `&mut`, leaving this handle empty.
    ///
    /// The group count is untouched — the returned handle inherits this handle's
    /// contribution, which is what distinguishes a move from a clone.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            inner: self.inner.take(),
        }
    }

    /// Whether `self` and `other` belong to the same ownership group, i.e. share a
    /// control block — even when their cached target pointers differ after a cast.
    /// Two empty handles are owner-equal.
    #[must_use]
    pub fn owner_eq<U: ?Sized>(&self, other: &SharedPtr<U>) -> bool {
        self.block_addr() == other.block_addr()
    }

    /// Strict weak ordering over ownership groups (control-block identity), for
    /// keying collections by group rather than by target address. Empty handles
    /// sort before all groups.
    #[must_use]
    pub fn owner_before<U: ?Sized>(&self, other: &SharedPtr<U>) -> bool {
        self.block_addr() < other.block_addr()
    }

    /// Converts to a differently typed view of the same target, typically a trait
    /// object, sharing the same control block.
    ///
    /// Both the old view's remaining handles and the new one observe the same single
    /// destruction event, which runs the deleter the group was created with — so an
    /// upcast handle still destroys through the concrete type. The count is
    /// unchanged: the new handle inherits this one's contribution. The
    /// convertibility requirement is enforced at compile time by the callback's
    /// signature. An empty handle converts to an empty handle.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the callback's input and output references
    /// point to the same object (a pure coercion such as `|x| x as &dyn Trait`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::fmt::Display;
    ///
    /// use managed_ptr::SharedPtr;
    ///
    /// let concrete = SharedPtr::new(7_u32);
    /// let keep = concrete.clone();
    ///
    /// // SAFETY: The callback is a pure unsizing coercion of its argument.
    /// let display: SharedPtr<dyn Display> =
    ///     unsafe { concrete.cast_dyn_with_fn(|x| x as &dyn Display) };
    ///
    /// assert_eq!(display.to_string(), "7");
    /// assert!(keep.owner_eq(&display));
    /// assert_eq!(keep.use_count(), 2);
    /// ```
    #[must_use]
    pub unsafe fn cast_dyn_with_fn<U: ?Sized, F>(self, cast_fn: F) -> SharedPtr<U>
    where
        F: FnOnce(&T) -> &U,
    {
        let this = ManuallyDrop::new(self);

        SharedPtr {
            inner: this.inner.map(|inner| {
                // SAFETY: A non-empty handle keeps the target alive.
                let widened = cast_fn(unsafe { inner.target.as_ref() });

                SharedInner {
                    target: NonNull::from(widened),
                    block: inner.block,
                }
            }),
        }
    }

    fn target_addr(&self) -> Option<NonNull<()>> {
        self.inner.map(|inner| inner.target.cast::<()>())
    }

    fn block_addr(&self) -> usize {
        self.inner.map_or(0, |inner| inner.block.addr().get())
    }
}

impl<T: ?Sized> Clone for SharedPtr<T> {
    /// Creates another handle in the same ownership group, incrementing the group
    /// count. The target is destroyed only when every handle is gone.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::SharedPtr;
    ///
    /// let handle = SharedPtr::new(vec![1, 2, 3]);
    /// let other = handle.clone();
    ///
    /// assert_eq!(*handle, *other);
    /// assert_eq!(handle.use_count(), 2);
    /// ```
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner {
            // SAFETY: This handle participates in the group, so the block is live
            // and its count is non-zero.
            unsafe {
                control::incref(inner.block);
            }
        }

        Self { inner: self.inner }
    }
}

impl<T: ?Sized> Drop for SharedPtr<T> {
    /// Leaves the ownership group. The handle that drives the count to zero
    /// destroys the target through the group's deleter, exactly once, and then
    /// frees the control block. Dropping an empty handle does nothing.
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized> Default for SharedPtr<T> {
    /// Creates an empty handle.
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, D> From<UniquePtr<T, D>> for SharedPtr<T>
where
    T: ?Sized + 'static,
    D: Deleter<T> + Send + Sync + 'static,
{
    /// Converts exclusive ownership into shared ownership, transferring the pointer
    /// and deleter into a fresh control block. See
    /// [`UniquePtr::into_shared`].
    fn from(exclusive: UniquePtr<T, D>) -> Self {
        exclusive.into_shared()
    }
}

impl<T: ?Sized> Deref for SharedPtr<T> {
    type Target = T;

    /// Borrows the shared target.
    ///
    /// # Panics
    ///
    /// Panics if the handle is empty. Emptiness is a caller contract violation here;
    /// use [`as_deref()`][Self::as_deref] to observe it instead.
    fn deref(&self) -> &T {
        let inner = self.inner.expect("dereferenced an empty SharedPtr");

        // SAFETY: A non-empty handle keeps the ownership group, and therefore the
        // target, alive for at least as long as this borrow.
        unsafe { inner.target.as_ref() }
    }
}

impl<T: ?Sized> PartialEq for SharedPtr<T> {
    /// Target identity, not value equality: handles are equal when they point at
    /// the same address. Handles in the same group with different cached views
    /// compare unequal here; use [`owner_eq()`][Self::owner_eq] for group identity.
    fn eq(&self, other: &Self) -> bool {
        self.target_addr() == other.target_addr()
    }
}

impl<T: ?Sized> Eq for SharedPtr<T> {}

impl<T: ?Sized> PartialOrd for SharedPtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for SharedPtr<T> {
    /// Orders by target address; empty handles sort first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.target_addr().cmp(&other.target_addr())
    }
}

impl<T: ?Sized> Hash for SharedPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target_addr().hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPtr")
            .field("target", &self.target_addr())
            .field("use_count", &self.use_count())
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> fmt::Pointer for SharedPtr<T> {
    #[cfg_attr(test, mutants::skip)] // Diagnostic formatting only, mutation is meaningless.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(target) => fmt::Pointer::fmt(&target, f),
            None => write!(f, "0x0"),
        }
    }
}

// SAFETY: Sending a handle to another thread can expose `&T` there and can make
// that thread the one that destroys the target, so `T` must be both Sync and Send.
// The erased deleter is constrained to `Send + Sync` at every construction site.
unsafe impl<T: ?Sized + Send + Sync> Send for SharedPtr<T> {}

// SAFETY: `&SharedPtr<T>` allows cloning (count mutation is atomic) and `&T`
// access from multiple threads, and a clone can migrate destruction to another
// thread, so the same bounds apply as for Send.
unsafe impl<T: ?Sized + Send + Sync> Sync for SharedPtr<T> {}
