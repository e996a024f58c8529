//! Basic exclusive-ownership usage of `UniquePtr`.

use managed_ptr::UniquePtr;

fn main() {
    println!("=== UniquePtr Basic Usage ===");

    // Allocate and wrap in one step.
    let mut config = UniquePtr::new(String::from("mode=fast"));
    println!("config: {}", *config);

    // Mutate through the handle.
    config.push_str(";retries=3");
    println!("config after edit: {}", *config);

    // Transfer ownership; the source is empty afterwards.
    let mut moved = config.take();
    println!("source empty after take: {}", config.is_empty());

    // Hand the raw pointer out and re-adopt it.
    let raw = moved.release().expect("handle was non-empty");
    println!("released; handle empty: {}", moved.is_empty());

    // SAFETY: `raw` came out of `release()` on a default-policy handle and has
    // no owner right now.
    let adopted = unsafe { UniquePtr::<String>::from_raw(raw) };
    println!("re-adopted: {}", *adopted);

    // Slices work through the same handle type.
    let numbers = UniquePtr::from_boxed_slice(vec![1_u32, 2, 3].into_boxed_slice());
    println!("numbers[1] = {}", numbers[1]);

    println!("all values are destroyed when their handles go out of scope");
}
