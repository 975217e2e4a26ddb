/*!

Embedder-supplied callback slots.

The core never allocates system memory itself; it asks the embedder for raw
byte regions through these three function-pointer slots. Keeping them as bare
`fn` pointers, rather than trait objects or boxed closures, avoids a vtable or
per-call heap allocation and keeps an `Allocator` cheap to construct and move.

*/

use std::ptr::NonNull;

/// Requests `requested_bytes` from the embedder. On success, returns the base
/// of the granted region together with its actual size, which may be larger
/// than requested (e.g. rounded up to a page). Returns `None` on failure.
pub type PageAcquireFn = fn(requested_bytes: usize) -> Option<(NonNull<u8>, usize)>;

/// Releases a region previously returned by a `PageAcquireFn`. Called exactly
/// once per granted region, with the same size that was granted.
pub type PageReleaseFn = fn(region: NonNull<u8>, granted_bytes: usize);

/// Optional predicate polled before each allocation when the auto-gc switch is
/// compiled in (see [`crate::allocator::Allocator::allocate`]).
pub type GcTriggerFn<const B: usize, const S: usize> =
    fn(&crate::allocator::Allocator<B, S>) -> bool;
