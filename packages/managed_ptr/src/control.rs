use std::alloc::{Layout, alloc};
use std::ptr::NonNull;
use std::sync::atomic::{self, AtomicUsize};

use crate::{AllocError, Deleter};

/// The accounting object shared by every [`SharedPtr`][crate::SharedPtr] in one
/// ownership group.
///
/// A control block knows two things: how many owners currently share the target
/// (the strong count) and how to destroy the target it was bound to. The latter is
/// dispatched virtually so handles never need to know the concrete deleter type.
///
/// The block outlives every handle that references it; it is freed by the same
/// owner that drives the count to zero, immediately after target destruction.
pub(crate) trait ControlBlock {
    /// The number of owners currently sharing the target.
    ///
    /// Starts at 1 when the block is created for its first owner.
    fn strong(&self) -> &AtomicUsize;

    /// Destroys the target this block was bound to, through the stored deleter.
    ///
    /// # Safety
    ///
    /// The caller must ensure this is called at most once per block, after the strong
    /// count has reached zero, and that nothing accesses the target afterwards.
    unsafe fn destroy_target(&mut self);
}

/// The concrete control block for a target of type `T` destroyed by a deleter of
/// type `D`. Stores the target pointer and the deleter by value; both are erased
/// behind `dyn ControlBlock` the moment the block is allocated.
pub(crate) struct ControlBlockFor<T: ?Sized, D: Deleter<T>> {
    strong: AtomicUsize,
    target: NonNull<T>,
    deleter: D,
}

impl<T: ?Sized, D: Deleter<T>> ControlBlockFor<T, D> {
    fn new(target: NonNull<T>, deleter: D) -> Self {
        Self {
            strong: AtomicUsize::new(1),
            target,
            deleter,
        }
    }
}

impl<T: ?Sized, D: Deleter<T>> ControlBlock for ControlBlockFor<T, D> {
    fn strong(&self) -> &AtomicUsize {
        &self.strong
    }

    unsafe fn destroy_target(&mut self) {
        // SAFETY: Forwarding the block-level contract: called once, after the count
        // reached zero, for the same target the deleter was bound to at creation.
        unsafe {
            self.deleter.delete(self.target);
        }
    }
}

/// Allocates a control block with a strong count of 1, bound to `target` and `deleter`.
///
/// Panics on allocator exhaustion, like every infallible allocation in this crate.
pub(crate) fn allocate<T, D>(target: NonNull<T>, deleter: D) -> NonNull<dyn ControlBlock>
where
    T: ?Sized + 'static,
    D: Deleter<T> + 'static,
{
    let block: Box<dyn ControlBlock> = Box::new(ControlBlockFor::new(target, deleter));
    NonNull::from(Box::leak(block))
}

/// Allocates a control block like [`allocate`], reporting allocator exhaustion as an
/// error instead of panicking.
///
/// On failure the deleter is handed back together with the error and the target
/// pointer remains untouched, so the caller can restore whatever ownership
/// arrangement it had before the attempt.
pub(crate) fn try_allocate<T, D>(
    target: NonNull<T>,
    deleter: D,
) -> Result<NonNull<dyn ControlBlock>, (D, AllocError)>
where
    T: ?Sized + 'static,
    D: Deleter<T> + 'static,
{
    let layout = Layout::new::<ControlBlockFor<T, D>>();

    // SAFETY: The layout of a control block is never zero-sized (it contains an
    // AtomicUsize at minimum).
    let raw = unsafe { alloc(layout) }.cast::<ControlBlockFor<T, D>>();

    let Some(block) = NonNull::new(raw) else {
        return Err((
            deleter,
            AllocError::Exhausted {
                what: "the control block",
                size: layout.size(),
            },
        ));
    };

    // SAFETY: `block` was just allocated with the layout of this exact type and is
    // not aliased by anyone.
    unsafe {
        block.as_ptr().write(ControlBlockFor::new(target, deleter));
    }

    let erased: *mut dyn ControlBlock = block.as_ptr();

    // The allocation above was already checked for null.
    Ok(NonNull::new(erased).expect("pointer is derived from a checked non-null allocation"))
}

/// Records one more owner joining the group.
///
/// # Safety
///
/// `block` must point to a live control block whose count this caller can observe as
/// non-zero (i.e. the caller already participates in the group).
pub(crate) unsafe fn incref(block: NonNull<dyn ControlBlock>) {
    // An increment only publishes a new owner; it synchronizes with nothing by itself,
    // so Relaxed suffices. Release/Acquire pairing happens on the decrement side.
    // SAFETY: The caller guarantees the block is live.
    let previous = unsafe { block.as_ref() }
        .strong()
        .fetch_add(1, atomic::Ordering::Relaxed);

    assert_ne!(
        0, previous,
        "attempted to revive a control block whose target was already destroyed"
    );
}

/// Records one owner leaving the group. The owner that drives the count to zero
/// destroys the target through the block's deleter and then frees the block itself.
///
/// # Safety
///
/// The caller must hold exactly one count contribution in `block` and must not use
/// the block (or the target) through this handle again after the call.
#[cfg_attr(test, mutants::skip)] // Mutating the ordering or the zero check turns tests into UB, not failures.
pub(crate) unsafe fn decref(block: NonNull<dyn ControlBlock>) {
    // Release so that every preceding access to the target through this owner
    // happens-before the final decrement that triggers destruction.
    // SAFETY: The caller guarantees the block is live and owes it one count.
    let previous = unsafe { block.as_ref() }
        .strong()
        .fetch_sub(1, atomic::Ordering::Release);

    match previous {
        1 => {
            // Pair with the Release decrements of every departed owner so the thread
            // that destroys the target observes all of their writes.
            atomic::fence(atomic::Ordering::Acquire);

            // SAFETY: The count reached zero, so this thread is the sole remaining
            // participant; the block was allocated with the global allocator and the
            // layout of its concrete type, which is what `Box::from_raw` will free.
            let mut block = unsafe { Box::from_raw(block.as_ptr()) };

            // SAFETY: First and only destroy call for this block, after the count
            // transition to zero.
            unsafe {
                block.destroy_target();
            }

            // The block's own storage is released here when `block` drops.
        }
        0 => panic!("reference count underflow - a handle decremented a block it did not own"),
        _ => {}
    }
}

/// Observes the current strong count.
///
/// Advisory only: the value may be stale the instant it is produced if other owners
/// are being created or dropped concurrently.
///
/// # Safety
///
/// `block` must point to a live control block the caller participates in.
pub(crate) unsafe fn count(block: NonNull<dyn ControlBlock>) -> usize {
    // SAFETY: The caller guarantees the block is live.
    unsafe { block.as_ref() }
        .strong()
        .load(atomic::Ordering::Relaxed)
}
