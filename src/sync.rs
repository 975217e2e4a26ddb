/*!

A mutex-guarded handle for embedders who want to share one `Allocator` across
threads, using a `try_lock`-or-panic accessor rather than blocking forever on
a deadlocked holder. The core itself stays single-threaded and lock-free, per
the crate's concurrency model; this is purely an embedder-facing convenience
layered on top.

```
use std::ptr::NonNull;
use once_cell::sync::Lazy;
use bucket_alloc::{allocator::Allocator, sync::SharedAllocator};

fn system_acquire(n: usize) -> Option<(NonNull<u8>, usize)> {
    let layout = std::alloc::Layout::from_size_align(n, 8).ok()?;
    NonNull::new(unsafe { std::alloc::alloc(layout) }).map(|p| (p, n))
}
fn system_release(p: NonNull<u8>, n: usize) {
    let layout = std::alloc::Layout::from_size_align(n, 8).unwrap();
    unsafe { std::alloc::dealloc(p.as_ptr(), layout) };
}

// One process-wide allocator, created lazily on first use.
static GLOBAL: Lazy<SharedAllocator<128, 32>> =
    Lazy::new(|| SharedAllocator::new(system_acquire, system_release));

GLOBAL.acquire().allocate(64);
```

*/

use std::sync::{Mutex, MutexGuard};

use crate::allocator::Allocator;
use crate::hooks::{PageAcquireFn, PageReleaseFn};

pub struct SharedAllocator<const B: usize = 128, const S: usize = 32> {
  inner: Mutex<Allocator<B, S>>,
}

// SAFETY: access to the wrapped `Allocator` is only ever through the mutex.
unsafe impl<const B: usize, const S: usize> Send for SharedAllocator<B, S> {}
unsafe impl<const B: usize, const S: usize> Sync for SharedAllocator<B, S> {}

impl<const B: usize, const S: usize> SharedAllocator<B, S> {
  /// Panics if the initial arena cannot be acquired — see [`Allocator::new`].
  pub fn new(page_acquire: PageAcquireFn, page_release: PageReleaseFn) -> Self {
    let allocator = Allocator::new(page_acquire, page_release)
        .expect("failed to acquire the allocator's initial arena");
    SharedAllocator { inner: Mutex::new(allocator) }
  }

  /// Locks the allocator for exclusive access. Panics rather than blocking
  /// forever if another holder has deadlocked.
  pub fn acquire(&self) -> MutexGuard<'_, Allocator<B, S>> {
    match self.inner.try_lock() {
      Ok(guard) => guard,
      Err(e) => panic!("shared allocator is deadlocked: {}", e),
    }
  }
}
