/*!

One contiguous byte region divided into `B` equally sized buckets, plus the
bookkeeping needed to find, grow, and reclaim runs of them.

The header and the bucket bytes live in a single region acquired from the
embedder: the header sits at the base of the region, and the bucket bytes
begin immediately after it, a single trailing-payload allocation rather than
two separate ones. `tags[i]` is 0 when bucket `i` is free, and otherwise holds
the base address of the allocation that owns it — every bucket of one
allocation carries the same value, and that value is itself the pointer
returned to the caller.

*/

use std::ptr::NonNull;

use crate::hooks::{PageAcquireFn, PageReleaseFn};
use crate::trace;

#[repr(C)]
pub(crate) struct ArenaHeader<const B: usize> {
  pub(crate) next: *mut ArenaHeader<B>,
  pub(crate) prev: *mut ArenaHeader<B>,

  /// `B * bucket_size`, fixed for the lifetime of the arena.
  pub(crate) capacity: u64,
  /// Sum of `bucket_size` over occupied buckets.
  pub(crate) used: u64,
  /// Bytes per bucket in this arena. Uniform within the arena, but may differ
  /// from the allocator's current default (oversize arenas, or an arena
  /// created before a `set_default_bucket_size` call).
  pub(crate) bucket_size: u64,

  /// Per-bucket occupancy tag: 0 = free, otherwise the base address of the
  /// owning allocation.
  pub(crate) tags: [usize; B],
}

impl<const B: usize> ArenaHeader<B> {
  const HEADER_BYTES: usize = std::mem::size_of::<Self>();

  /// Requests a region of `header + B * bucket_size` bytes from `acquire` and
  /// lays out a fresh, all-free arena in it. If the embedder grants a larger
  /// region than requested, the surplus is exposed as larger buckets rather
  /// than wasted, per the over-allocation rationale in the allocator's
  /// component design.
  pub(crate) fn create(
    requested_bucket_size: usize,
    acquire: PageAcquireFn,
  ) -> Option<NonNull<ArenaHeader<B>>> {
    let requested_total = Self::HEADER_BYTES + B * requested_bucket_size;
    let (region, granted_total) = acquire(requested_total)?;

    let bucket_size = if granted_total > requested_total {
      (granted_total - Self::HEADER_BYTES) / B
    } else {
      requested_bucket_size
    };

    let header = region.cast::<ArenaHeader<B>>();
    // SAFETY: `region` is a fresh, uniquely owned allocation at least
    // `HEADER_BYTES` bytes long (granted_total >= requested_total).
    unsafe {
      header.as_ptr().write(ArenaHeader {
        next: std::ptr::null_mut(),
        prev: std::ptr::null_mut(),
        capacity: (B * bucket_size) as u64,
        used: 0,
        bucket_size: bucket_size as u64,
        tags: [0; B],
      });
    }

    trace!(
      "created arena at {:p}: bucket_size={} capacity={}",
      header.as_ptr(),
      bucket_size,
      B * bucket_size
    );

    Some(header)
  }

  /// Releases the region previously returned by [`Self::create`]. The caller
  /// must not use `arena` afterwards.
  pub(crate) unsafe fn destroy(arena: NonNull<ArenaHeader<B>>, release: PageReleaseFn) {
    let total = Self::HEADER_BYTES + arena.as_ref().capacity as usize;
    trace!("destroying arena at {:p}", arena.as_ptr());
    release(arena.cast::<u8>(), total);
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.tags.iter().all(|&tag| tag == 0)
  }

  #[inline]
  pub(crate) fn bucket_size(&self) -> usize {
    self.bucket_size as usize
  }

  #[inline]
  pub(crate) fn capacity(&self) -> usize {
    self.capacity as usize
  }

  #[inline]
  pub(crate) fn used(&self) -> usize {
    self.used as usize
  }

  /// Pointer to the first byte of bucket storage, immediately following the header.
  #[inline]
  fn data_ptr(&self) -> *mut u8 {
    let base = self as *const Self as *mut u8;
    unsafe { base.add(Self::HEADER_BYTES) }
  }

  #[inline]
  pub(crate) fn bucket_ptr(&self, index: usize) -> *mut u8 {
    unsafe { self.data_ptr().add(index * self.bucket_size()) }
  }

  /// The identifier a run starting at `index` would carry: its own base address.
  #[inline]
  pub(crate) fn bucket_address(&self, index: usize) -> usize {
    self.bucket_ptr(index) as usize
  }

  /// Does this allocation's base pointer fall within this arena's bucket storage?
  #[inline]
  pub(crate) fn owns(&self, ptr: usize) -> bool {
    let start = self.data_ptr() as usize;
    ptr >= start && ptr < start + self.capacity()
  }
}
