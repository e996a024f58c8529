//! Basic shared-ownership usage of `SharedPtr`.

use managed_ptr::SharedPtr;

fn main() {
    println!("=== SharedPtr Basic Usage ===");

    let original = SharedPtr::new(vec!["alpha", "beta", "gamma"]);
    println!("owners: {}", original.use_count());

    // Clones join the ownership group.
    let reader_one = original.clone();
    let reader_two = original.clone();
    println!("owners after two clones: {}", original.use_count());

    println!("reader one sees: {:?}", *reader_one);
    println!("reader two sees: {:?}", *reader_two);

    // Owners leave the group in any order; the data survives until the last one.
    drop(original);
    drop(reader_one);
    println!("owners remaining: {}", reader_two.use_count());
    println!("unique now: {}", reader_two.is_unique());

    // The last owner's drop destroys the vector, exactly once.
    drop(reader_two);
    println!("group is gone");
}
