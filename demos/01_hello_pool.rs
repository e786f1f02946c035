//! Hello World demo for enginecore.
//!
//! Demonstrates initializing a memory pool and allocating through it
//! directly.

use enginecore::tag::MemoryTag;
use enginecore::MemoryPool;

fn main() {
    let pool = MemoryPool::init(1 << 20).expect("pool init");

    println!("Hello, enginecore!");

    let message = b"hello from the memory pool";
    let greeting = pool.allocate(message.len(), MemoryTag::String).expect("allocate");
    unsafe {
        MemoryPool::copy(greeting.as_ptr(), message.as_ptr(), message.len());
    }
    let text = unsafe { std::slice::from_raw_parts(greeting.as_ptr(), message.len()) };
    println!("Pool says: {}", String::from_utf8_lossy(text));
    pool.free(greeting, MemoryTag::String).unwrap();

    println!("\nStats after the round trip:");
    let stats = pool.stats();
    println!(
        "  used={} total={} free_list_bytes={} live_allocations={}",
        stats.used, stats.total, stats.free_list_bytes, stats.live_allocations
    );

    let reports = pool.shutdown();
    assert!(reports.is_empty(), "hello demo should not leak");
    println!("\nPool shut down cleanly.");
}
