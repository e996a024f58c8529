use std::alloc::{Layout, alloc};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::{AllocError, DefaultDeleter, Deleter, SharedPtr, control};

/// An exclusive-ownership handle: at most one `UniquePtr` owns a given target at any
/// time, and the handle destroys the target through its [`Deleter`] when it goes away.
///
/// The pointer and the deleter are stored inline; a non-empty handle costs no
/// allocation beyond the owned object itself. The handle is move-only — there is no
/// `Clone`, because exclusive ownership cannot be duplicated.
///
/// A `UniquePtr` may be empty. Dereferencing an empty handle panics; use
/// [`get()`][Self::get] or [`as_deref()`][Self::as_deref] when emptiness is a
/// legitimate state to observe.
///
/// # Example
///
/// ```rust
/// use managed_ptr::UniquePtr;
///
/// let mut handle = UniquePtr::new("hello".to_string());
/// assert_eq!(handle.len(), 5);
///
/// // Moving transfers ownership; `take` does the same through a `&mut`.
/// let moved = handle.take();
/// assert!(handle.is_empty());
/// assert_eq!(*moved, "hello");
/// ```
///
/// # Trait objects
///
/// The safe route to a polymorphic handle goes through `Box` coercion:
///
/// ```rust
/// use std::fmt::Display;
///
/// use managed_ptr::UniquePtr;
///
/// let concrete = UniquePtr::new(42_u32);
/// let boxed: Box<dyn Display> = concrete.into_boxed().unwrap();
/// let display = UniquePtr::from(boxed);
/// assert_eq!(display.to_string(), "42");
/// ```
pub struct UniquePtr<T: ?Sized, D: Deleter<T> = DefaultDeleter> {
    target: Option<NonNull<T>>,
    deleter: D,

    /// The handle drops a `T` when it drops, which the compiler cannot see
    /// through the raw pointer.
    _owns: PhantomData<T>,
}

impl<T> UniquePtr<T, DefaultDeleter> {
    /// Allocates `value` on the heap and wraps it in an owning handle in one step,
    /// so no raw pointer is ever transiently unowned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::UniquePtr;
    ///
    /// let handle = UniquePtr::new(vec![1, 2, 3]);
    /// assert_eq!(handle.len(), 3);
    /// ```
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Like [`new()`][Self::new], but reports allocator exhaustion as an error
    /// instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if the global allocator cannot provide storage for the
    /// value. The value itself is dropped in place; no handle comes into existence.
    pub fn try_new(value: T) -> Result<Self, AllocError> {
        let layout = Layout::new::<T>();

        let target = if layout.size() == 0 {
            let target = NonNull::<T>::dangling();

            // SAFETY: Writing a zero-sized value stores no bytes; a dangling,
            // well-aligned pointer is the canonical location for it.
            unsafe {
                target.as_ptr().write(value);
            }

            target
        } else {
            // SAFETY: `layout` has non-zero size, as checked above.
            let raw = unsafe { alloc(layout) }.cast::<T>();

            let Some(target) = NonNull::new(raw) else {
                return Err(AllocError::Exhausted {
                    what: "the managed object",
                    size: layout.size(),
                });
            };

            // SAFETY: Freshly allocated with the layout of `T`, unaliased.
            unsafe {
                target.as_ptr().write(value);
            }

            target
        };

        // SAFETY: The allocation above is exactly what `Box::from_raw` (and therefore
        // `DefaultDeleter`) will release, and we are its sole owner.
        Ok(unsafe { Self::from_raw(target) })
    }
}

impl<T: ?Sized> UniquePtr<T, DefaultDeleter> {
    /// Takes ownership of a raw pointer, to be released with the default policy.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `target` came from `Box::into_raw` / `Box::leak` (or an allocation with the
    ///    identical layout in the global allocator).
    /// 2. No other owning handle or code path will also destroy it.
    pub unsafe fn from_raw(target: NonNull<T>) -> Self {
        // SAFETY: Forwarding the caller's guarantees; `DefaultDeleter` releases via
        // `Box::from_raw`, matching requirement 1.
        unsafe { Self::from_raw_with(target, DefaultDeleter) }
    }

    /// Unwraps the handle back into the `Box` that owns the allocation, or `None` for
    /// an empty handle.
    ///
    /// Useful for safe trait-object upcasts: coerce the `Box` and wrap it again.
    #[must_use]
    pub fn into_boxed(self) -> Option<Box<T>> {
        let mut this = ManuallyDrop::new(self);

        this.target.take().map(|target| {
            // SAFETY: A non-empty handle with the default policy owns a Box-compatible
            // allocation, and `ManuallyDrop` prevents the handle from deleting it too.
            unsafe { Box::from_raw(target.as_ptr()) }
        })
    }
}

impl<T> UniquePtr<[T], DefaultDeleter> {
    /// Wraps an owned slice allocation. Element access goes through
    /// `Deref<Target = [T]>`, so indexing works directly on the handle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::UniquePtr;
    ///
    /// let handle = UniquePtr::from_boxed_slice(vec![10, 20, 30].into_boxed_slice());
    /// assert_eq!(handle[1], 20);
    /// assert_eq!(handle.len(), 3);
    /// ```
    #[must_use]
    pub fn from_boxed_slice(slice: Box<[T]>) -> Self {
        Self::from(slice)
    }
}

impl<T: ?Sized, D: Deleter<T>> UniquePtr<T, D> {
    /// Creates an empty handle that owns nothing.
    #[must_use]
    pub fn empty() -> Self
    where
        D: Default,
    {
        Self {
            target: None,
            deleter: D::default(),
            _owns: PhantomData,
        }
    }

    /// Takes ownership of a raw pointer, to be released with the given deleter.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `target` points to a live value that `deleter` knows how to destroy.
    /// 2. No other owning handle or code path will also destroy it.
    pub unsafe fn from_raw_with(target: NonNull<T>, deleter: D) -> Self {
        Self {
            target: Some(target),
            deleter,
            _owns: PhantomData,
        }
    }

    /// Returns the target pointer without affecting ownership, or `None` for an
    /// empty handle.
    #[must_use]
    #[inline]
    pub fn get(&self) -> Option<NonNull<T>> {
        self.target
    }

    /// Whether this handle currently owns nothing.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
    }

    /// Borrows the target, or `None` for an empty handle.
    #[must_use]
    pub fn as_deref(&self) -> Option<&T> {
        // SAFETY: A non-empty handle owns a live target for as long as the handle
        // (and therefore this borrow) exists.
        self.target.map(|target| unsafe { target.as_ref() })
    }

    /// Mutably borrows the target, or `None` for an empty handle.
    #[must_use]
    pub fn as_deref_mut(&mut self) -> Option<&mut T> {
        // SAFETY: Exclusive ownership plus `&mut self` means no other reference to
        // the target can exist for the duration of this borrow.
        self.target.map(|mut target| unsafe { target.as_mut() })
    }

    /// Hands the target pointer to the caller and becomes empty, without destroying
    /// anything. Ownership — including the duty to destroy — passes to the caller.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::UniquePtr;
    ///
    /// let mut handle = UniquePtr::new(7_i32);
    /// let raw = handle.release().unwrap();
    /// assert!(handle.is_empty());
    ///
    /// // Re-wrapping reproduces the original ownership.
    /// // SAFETY: `raw` came from a handle with the default policy and has no owner now.
    /// let again = unsafe { UniquePtr::<i32>::from_raw(raw) };
    /// assert_eq!(*again, 7);
    /// ```
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.target.take()
    }

    /// Destroys the current target (if any) through the deleter and becomes empty.
    pub fn reset(&mut self) {
        if let Some(target) = self.target.take() {
            // SAFETY: This handle was the sole owner and has just forgotten the
            // pointer, so this is the first and only destruction of the target.
            unsafe {
                self.deleter.delete(target);
            }
        }
    }

    /// Destroys the current target (if any), then adopts `target`.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw_with()`][Self::from_raw_with]: the new target must
    /// be destroyable by this handle's deleter and owned by no one else.
    pub unsafe fn reset_raw(&mut self, target: NonNull<T>) {
        self.reset();
        self.target = Some(target);
    }

    /// Moves ownership out through a `&mut`, leaving this handle empty.
    ///
    /// This is the observable form of move-transfer: afterwards the source is empty
    /// and the returned handle owns the original target and deleter.
    #[must_use]
    pub fn take(&mut self) -> Self
    where
        D: Default,
    {
        mem::replace(self, Self::empty())
    }

    /// Swaps targets and deleters with another handle.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Borrows the deletion policy.
    #[must_use]
    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    /// Mutably borrows the deletion policy.
    #[must_use]
    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Converts to a differently typed view of the same target, typically a trait
    /// object, carrying the deleter along.
    ///
    /// The convertibility requirement is enforced at compile time by the callback's
    /// signature: only views that Rust can derive from `&mut T` are expressible.
    /// An empty handle converts to an empty handle.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the callback's input and output references
    /// point to the same object, and that the deleter destroys a `U`-typed view of
    /// the target exactly as it would have destroyed the `T`-typed view.
    /// (`DefaultDeleter` satisfies the latter for unsizing coercions such as
    /// `|x| x as &mut dyn Trait`.)
    #[must_use]
    pub unsafe fn cast_dyn_with_fn<U: ?Sized, F>(self, cast_fn: F) -> UniquePtr<U, D>
    where
        D: Deleter<U>,
        F: FnOnce(&mut T) -> &mut U,
    {
        let mut this = ManuallyDrop::new(self);

        // SAFETY: `this` is ManuallyDrop, so the deleter is moved out exactly once
        // and never dropped in place.
        let deleter = unsafe { ptr::read(ptr::addr_of!(this.deleter)) };

        let target = this.target.take().map(|mut target| {
            // SAFETY: A non-empty handle owns a live target and we hold it exclusively.
            let widened = cast_fn(unsafe { target.as_mut() });
            NonNull::from(widened)
        });

        UniquePtr {
            target,
            deleter,
            _owns: PhantomData,
        }
    }

    /// Converts this exclusive handle into a shared one, transferring the target and
    /// the deleter into a freshly allocated control block.
    ///
    /// This is the one sanctioned path from exclusive to shared ownership. The
    /// exclusive handle is consumed (Rust's move semantics make "the source is now
    /// empty" a compile-time fact). An empty handle converts to an empty
    /// [`SharedPtr`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_ptr::UniquePtr;
    ///
    /// let exclusive = UniquePtr::new(5_u32);
    /// let shared = exclusive.into_shared();
    /// let copy = shared.clone();
    /// assert_eq!(shared.use_count(), 2);
    /// assert_eq!(*copy, 5);
    /// ```
    #[must_use]
    pub fn into_shared(self) -> SharedPtr<T>
    where
        T: 'static,
        D: Send + Sync + 'static,
    {
        let mut this = ManuallyDrop::new(self);

        // SAFETY: `this` is ManuallyDrop, so the deleter is moved out exactly once.
        let deleter = unsafe { ptr::read(ptr::addr_of!(this.deleter)) };

        match this.target.take() {
            Some(target) => {
                let block = control::allocate(target, deleter);

                // SAFETY: The block was just created for this target with a count
                // of 1, which the new handle's lifetime accounts for.
                unsafe { SharedPtr::from_parts(target, block) }
            }
            None => {
                drop(deleter);
                SharedPtr::empty()
            }
        }
    }

    /// Like [`into_shared()`][Self::into_shared], but reports control-block
    /// allocation failure instead of panicking.
    ///
    /// # Errors
    ///
    /// On allocator exhaustion the exclusive handle is returned intact alongside the
    /// error — ownership does not change hands on failure.
    pub fn try_into_shared(self) -> Result<SharedPtr<T>, (Self, AllocError)>
    where
        T: 'static,
        D: Send + Sync + 'static,
    {
        let mut this = ManuallyDrop::new(self);

        // SAFETY: `this` is ManuallyDrop, so the deleter is moved out exactly once.
        let deleter = unsafe { ptr::read(ptr::addr_of!(this.deleter)) };

        match this.target.take() {
            Some(target) => match control::try_allocate(target, deleter) {
                // SAFETY: The block was just created for this target with a count
                // of 1, which the new handle's lifetime accounts for.
                Ok(block) => Ok(unsafe { SharedPtr::from_parts(target, block) }),
                Err((deleter, error)) => {
                    // SAFETY: Ownership never left this call: the target is still
                    // exclusively ours and the deleter still matches it.
                    Err((unsafe { Self::from_raw_with(target, deleter) }, error))
                }
            },
            None => {
                drop(deleter);
                Ok(SharedPtr::empty())
            }
        }
    }

    fn target_addr(&self) -> Option<NonNull<()>> {
        self.target.map(|target| target.cast::<()>())
    }
}

impl<T: ?Sized, D: Deleter<T>> Drop for UniquePtr<T, D> {
    /// Destroys the owned target (if any) through the deletion policy, exactly once.
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, D: Deleter<T> + Default> Default for UniquePtr<T, D> {
    /// Creates an empty handle.
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> From<Box<T>> for UniquePtr<T, DefaultDeleter> {
    /// Adopts a `Box` allocation. This also covers slices (`Box<[T]>`) and already
    /// coerced trait objects (`Box<dyn Trait>`).
    fn from(boxed: Box<T>) -> Self {
        let target = NonNull::from(Box::leak(boxed));

        // SAFETY: The pointer was just leaked from a Box and has no other owner;
        // `DefaultDeleter` reverses the leak.
        unsafe { Self::from_raw(target) }
    }
}

impl<T: ?Sized, D: Deleter<T>> Deref for UniquePtr<T, D> {
    type Target = T;

    /// Borrows the owned target.
    ///
    /// # Panics
    ///
    /// Panics if the handle is empty. Emptiness is a caller contract violation here;
    /// use [`as_deref()`][Self::as_deref] to observe it instead.
    fn deref(&self) -> &T {
        let target = self.target.expect("dereferenced an empty UniquePtr");

        // SAFETY: A non-empty handle owns a live target for as long as this borrow.
        unsafe { target.as_ref() }
    }
}

impl<T: ?Sized, D: Deleter<T>> DerefMut for UniquePtr<T, D> {
    /// Mutably borrows the owned target.
    ///
    /// # Panics
    ///
    /// Panics if the handle is empty.
    fn deref_mut(&mut self) -> &mut T {
        let mut target = self.target.expect("dereferenced an empty UniquePtr");

        // SAFETY: Exclusive ownership plus `&mut self` means no other reference to
        // the target can exist for the duration of this borrow.
        unsafe { target.as_mut() }
    }
}

impl<T: ?Sized, D: Deleter<T>> PartialEq for UniquePtr<T, D> {
    /// Target identity, not value equality: two handles are equal only when they
    /// point at the same address (which, for non-empty exclusive handles, means a
    /// contract violation occurred somewhere — or both are empty).
    fn eq(&self, other: &Self) -> bool {
        self.target_addr() == other.target_addr()
    }
}

impl<T: ?Sized, D: Deleter<T>> Eq for UniquePtr<T, D> {}

impl<T: ?Sized, D: Deleter<T>> PartialOrd for UniquePtr<T, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized, D: Deleter<T>> Ord for UniquePtr<T, D> {
    /// Orders by target address; empty handles sort first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.target_addr().cmp(&other.target_addr())
    }
}

impl<T: ?Sized, D: Deleter<T>> Hash for UniquePtr<T, D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target_addr().hash(state);
    }
}

impl<T: ?Sized, D: Deleter<T>> fmt::Debug for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniquePtr")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized, D: Deleter<T>> fmt::Pointer for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => fmt::Pointer::fmt(&target, f),
            None => write!(f, "0x0"),
        }
    }
}

// SAFETY: Sending the handle to another thread sends the target (which will be
// accessed and eventually destroyed there) and the deleter with it, so both must
// be Send.
unsafe impl<T: ?Sized + Send, D: Deleter<T> + Send> Send for UniquePtr<T, D> {}

// SAFETY: Sharing `&UniquePtr` across threads exposes `&T` (via Deref) and `&D`
// (via `deleter()`), so both must be Sync.
unsafe impl<T: ?Sized + Sync, D: Deleter<T> + Sync> Sync for UniquePtr<T, D> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(UniquePtr<u32>: Send, Sync);
    assert_not_impl_any!(UniquePtr<u32>: Clone);
    assert_not_impl_any!(UniquePtr<Rc<u32>>: Send, Sync);

    /// Test helper that tracks how many times it has been dropped.
    struct DropCounter {
        drops: Rc<Cell<usize>>,
    }

    impl DropCounter {
        fn new() -> (Self, Rc<Cell<usize>>) {
            let drops = Rc::new(Cell::new(0));
            (
                Self {
                    drops: Rc::clone(&drops),
                },
                drops,
            )
        }
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.drops.set(self.drops.get().wrapping_add(1));
        }
    }

    #[test]
    fn new_then_drop_destroys_exactly_once() {
        let (counter, drops) = DropCounter::new();

        let handle = UniquePtr::new(counter);
        assert!(!handle.is_empty());
        assert_eq!(drops.get(), 0);

        drop(handle);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn try_new_produces_a_working_handle() {
        let handle = UniquePtr::try_new(99_u64).unwrap();
        assert_eq!(*handle, 99);
    }

    #[test]
    fn try_new_supports_zero_sized_targets() {
        let handle = UniquePtr::try_new(()).unwrap();
        assert!(!handle.is_empty());
        drop(handle);
    }

    #[test]
    fn empty_handle_owns_nothing() {
        let handle = UniquePtr::<String>::empty();
        assert!(handle.is_empty());
        assert!(handle.get().is_none());
        assert!(handle.as_deref().is_none());
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty UniquePtr")]
    fn deref_of_empty_handle_panics() {
        let handle = UniquePtr::<u32>::empty();
        let _ = *handle;
    }

    #[test]
    fn take_leaves_source_empty_and_destination_owning() {
        let (counter, drops) = DropCounter::new();
        let mut source = UniquePtr::new(counter);
        let original = source.get();

        let destination = source.take();

        assert!(source.is_empty());
        assert!(source.get().is_none());
        assert_eq!(destination.get(), original);
        assert_eq!(drops.get(), 0);

        drop(source);
        assert_eq!(drops.get(), 0, "empty source must not destroy anything");

        drop(destination);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn release_then_rewrap_destroys_exactly_once() {
        let (counter, drops) = DropCounter::new();
        let mut original = UniquePtr::new(counter);

        let raw = original.release().unwrap();
        assert!(original.is_empty());

        // SAFETY: `raw` came out of `release()` on a default-policy handle, so it is
        // a Box allocation with no current owner.
        let rewrapped = unsafe { UniquePtr::<DropCounter>::from_raw(raw) };

        drop(original);
        assert_eq!(drops.get(), 0, "the emptied handle must not destroy");

        drop(rewrapped);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn reset_destroys_current_target() {
        let (counter, drops) = DropCounter::new();
        let mut handle = UniquePtr::new(counter);

        handle.reset();
        assert!(handle.is_empty());
        assert_eq!(drops.get(), 1);

        // Resetting an empty handle is a no-op.
        handle.reset();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn reset_raw_destroys_old_and_adopts_new() {
        let (first, first_drops) = DropCounter::new();
        let (second, second_drops) = DropCounter::new();

        let mut handle = UniquePtr::new(first);
        let second_raw = NonNull::from(Box::leak(Box::new(second)));

        // SAFETY: `second_raw` was just leaked from a Box and has no other owner.
        unsafe {
            handle.reset_raw(second_raw);
        }

        assert_eq!(first_drops.get(), 1);
        assert_eq!(second_drops.get(), 0);

        drop(handle);
        assert_eq!(second_drops.get(), 1);
    }

    #[test]
    fn swap_exchanges_ownership() {
        let mut a = UniquePtr::new(1_u8);
        let mut b = UniquePtr::new(2_u8);
        let (a_ptr, b_ptr) = (a.get(), b.get());

        a.swap(&mut b);

        assert_eq!(a.get(), b_ptr);
        assert_eq!(b.get(), a_ptr);
        assert_eq!(*a, 2);
        assert_eq!(*b, 1);
    }

    #[test]
    fn custom_deleter_is_invoked_with_its_state() {
        struct CountingDeleter {
            calls: Rc<Cell<usize>>,
        }

        impl<T> Deleter<T> for CountingDeleter {
            unsafe fn delete(&mut self, target: NonNull<T>) {
                self.calls.set(self.calls.get().wrapping_add(1));

                // SAFETY: Forwarding the caller's guarantee about the allocation.
                drop(unsafe { Box::from_raw(target.as_ptr()) });
            }
        }

        let calls = Rc::new(Cell::new(0));
        let raw = NonNull::from(Box::leak(Box::new(5_i32)));

        // SAFETY: `raw` was just leaked from a Box and has no other owner, and the
        // deleter releases via `Box::from_raw`.
        let handle = unsafe {
            UniquePtr::from_raw_with(
                raw,
                CountingDeleter {
                    calls: Rc::clone(&calls),
                },
            )
        };

        assert_eq!(handle.deleter().calls.get(), 0);
        drop(handle);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn slice_handles_support_indexing() {
        let mut handle = UniquePtr::from_boxed_slice(vec![1_u32, 2, 3].into_boxed_slice());

        assert_eq!(handle.len(), 3);
        assert_eq!(handle[0], 1);

        handle[2] = 30;
        assert_eq!(handle[2], 30);
    }

    #[test]
    fn box_round_trip_preserves_the_allocation() {
        let handle = UniquePtr::new("round trip".to_string());
        let original = handle.get();

        let boxed = handle.into_boxed().unwrap();
        let again = UniquePtr::from(boxed);

        assert_eq!(again.get(), original);
        assert_eq!(*again, "round trip");
    }

    #[test]
    fn into_boxed_of_empty_handle_is_none() {
        let handle = UniquePtr::<u8>::empty();
        assert!(handle.into_boxed().is_none());
    }

    #[test]
    fn cast_to_trait_object_destroys_through_concrete_type() {
        trait Noisy {
            fn noise(&self) -> &'static str;
        }

        struct Dog {
            _counter: DropCounter,
        }

        impl Noisy for Dog {
            fn noise(&self) -> &'static str {
                "bark"
            }
        }

        let (counter, drops) = DropCounter::new();
        let concrete = UniquePtr::new(Dog { _counter: counter });

        // SAFETY: The callback is a pure unsizing coercion of its argument, and
        // `DefaultDeleter` destroys trait objects through the concrete type.
        let erased: UniquePtr<dyn Noisy> =
            unsafe { concrete.cast_dyn_with_fn(|dog| dog as &mut dyn Noisy) };

        assert_eq!(erased.noise(), "bark");
        assert_eq!(drops.get(), 0);

        drop(erased);
        assert_eq!(drops.get(), 1, "the Dog destructor must run exactly once");
    }

    #[test]
    fn identity_comparisons_use_addresses() {
        let a = UniquePtr::new(1_u32);
        let b = UniquePtr::new(1_u32);

        assert_ne!(a, b, "distinct allocations are never equal");
        assert_eq!(a, a);

        let empty_one = UniquePtr::<u32>::empty();
        let empty_two = UniquePtr::<u32>::empty();
        assert_eq!(empty_one, empty_two);
        assert!(empty_one < a, "empty handles sort before non-empty ones");
    }
}
