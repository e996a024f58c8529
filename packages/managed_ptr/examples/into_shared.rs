//! Converting exclusive ownership to shared ownership.
//!
//! A value often starts life with a single owner that configures it, and only
//! later needs to be shared. `into_shared` is the sanctioned crossing: the
//! pointer and the deletion policy move into a fresh control block, and the
//! exclusive handle is consumed.

use managed_ptr::UniquePtr;

struct Config {
    name: String,
    threads: usize,
}

fn main() {
    println!("=== Exclusive to Shared Conversion ===");

    // Build up the value under exclusive ownership.
    let mut config = UniquePtr::new(Config {
        name: "worker-pool".to_string(),
        threads: 1,
    });
    config.threads = 8;

    // Freeze and share it.
    let shared = config.into_shared();
    println!("'{}' with {} threads", shared.name, shared.threads);
    println!("owners: {}", shared.use_count());

    let for_scheduler = shared.clone();
    let for_metrics = shared.clone();
    println!("owners after handing out: {}", shared.use_count());

    drop(shared);
    drop(for_scheduler);
    println!("owners remaining: {}", for_metrics.use_count());

    // The config is destroyed when the last owner goes out of scope.
}
