/*!

A fixed-bucket, multi-arena memory allocator for embedding in
latency-sensitive, long-running processes.

Each [`allocator::Allocator`] partitions its memory into arenas of `B` equally
sized buckets and serves variable-size requests as contiguous runs of those
buckets, tracking occupancy with a per-bucket tag rather than a free list. The
embedder supplies the two opaque callbacks that acquire and release raw byte
regions (see [`hooks`]); everything above that — the run scanner, the
extend-in-place reallocation logic, the arena list's lifecycle, and on-demand
reclamation of empty arenas — lives in this crate.

This is a single-threaded core by design (see the module docs on
[`allocator`]): no compaction or relocation of live allocations, no
coalescing across arenas, and no bounded worst-case latency. [`sync`] offers a
mutex-guarded handle for embedders who need to share one across threads.

*/

#![allow(dead_code)]

pub mod allocator;
pub mod flags;
pub mod hooks;
pub mod log;
pub mod sync;

pub use allocator::{Allocator, AllocatorInfo};
pub use flags::{AllocatorFlag, AllocatorFlags};
