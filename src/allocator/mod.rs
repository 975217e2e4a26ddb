/*!

The allocator core: the free-bucket run scanner, the reallocation
extend-in-place logic, the arena doubly-linked list with its lifecycle rules,
and the reclamation pass. Everything else in this crate (the object facade,
the optional shared-handle convenience) is built on top of the public API
here.

`Allocator<B, S>` is parameterized by two compile-time shape constants: `B`,
the number of buckets per arena, and `S`, the default bucket byte size.

*/

mod arena;
mod arena_list;
mod facade;
pub mod info;
mod scanner;

#[cfg(test)]
mod tests;

use std::ptr::NonNull;

use arena::ArenaHeader;
use arena_list::ArenaList;
use scanner::{locate_and_try_extend, scan_for_free_run, ExtendOutcome};

use crate::flags::{AllocatorFlag, AllocatorFlags};
use crate::hooks::{PageAcquireFn, PageReleaseFn};
use crate::{debug, trace};

pub use info::AllocatorInfo;

#[cfg(feature = "auto_gc")]
use crate::hooks::GcTriggerFn;

const DEFAULT_BUCKET_COUNT: usize = 128;
const DEFAULT_BUCKET_SIZE: usize = 32;

#[inline]
fn align_up_64(value: usize) -> usize {
  (value + 63) & !63
}

#[inline]
fn div_ceil(numerator: usize, denominator: usize) -> usize {
  (numerator + denominator - 1) / denominator
}

/// A fixed-bucket, multi-arena allocator. Not `Sync`: the core does no
/// internal locking (see the crate's concurrency notes), so sharing one
/// across threads is the embedder's job — see [`crate::sync`] for a
/// mutex-guarded convenience wrapper.
pub struct Allocator<const B: usize = DEFAULT_BUCKET_COUNT, const S: usize = DEFAULT_BUCKET_SIZE> {
  default_bucket_size: usize,
  flags: AllocatorFlags,
  page_acquire: PageAcquireFn,
  page_release: PageReleaseFn,
  #[cfg(feature = "auto_gc")]
  gc_trigger: Option<GcTriggerFn<B, S>>,
  list: ArenaList<B>,
}

impl<const B: usize, const S: usize> Allocator<B, S> {
  /// Constructs an allocator and synthesizes its initial arena of `S * B`
  /// bytes. Returns `None` if that first arena cannot be acquired.
  pub fn new(page_acquire: PageAcquireFn, page_release: PageReleaseFn) -> Option<Self> {
    let mut list = ArenaList::new();
    let first_arena = ArenaHeader::<B>::create(S, page_acquire)?;
    list.push_back(first_arena);

    Some(Allocator {
      default_bucket_size: S,
      flags: AllocatorFlags::empty(),
      page_acquire,
      page_release,
      #[cfg(feature = "auto_gc")]
      gc_trigger: None,
      list,
    })
  }

  pub fn with_flags(mut self, flags: AllocatorFlags) -> Self {
    self.flags = flags;
    self
  }

  /// Installs the predicate polled before each `allocate` call. Only
  /// available when the crate is built with the `auto_gc` feature, a
  /// compile-time switch rather than a runtime flag so the check compiles
  /// away entirely when unused.
  #[cfg(feature = "auto_gc")]
  pub fn with_gc_trigger(mut self, trigger: GcTriggerFn<B, S>) -> Self {
    self.gc_trigger = Some(trigger);
    self
  }

  // region Core API

  /// Finds or creates room for `size` bytes and returns its base pointer.
  /// `allocate(0)` is not special-cased: it is satisfied by the first free
  /// bucket the scanner finds, charging one bucket's worth of space, the same
  /// way the underlying run-scanning algorithm naturally falls out for a
  /// zero-byte request.
  pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
    #[cfg(feature = "auto_gc")]
    {
      if let Some(trigger) = self.gc_trigger {
        if trigger(self) {
          self.gc();
        }
      }
    }

    if let Some(ptr) = self.try_allocate_in_place(size) {
      return Some(ptr);
    }

    let new_bucket_size = if size <= self.default_bucket_size * B {
      self.default_bucket_size
    } else {
      align_up_64(div_ceil(size, B))
    };

    debug!("growing: no run for {} bytes, new arena bucket_size={}", size, new_bucket_size);
    let arena = ArenaHeader::<B>::create(new_bucket_size, self.page_acquire)?;
    self.list.push_back(arena);

    self.try_allocate_in_place(size)
  }

  fn try_allocate_in_place(&mut self, size: usize) -> Option<NonNull<u8>> {
    for arena in self.list.iter() {
      let arena_mut = unsafe { &mut *arena.as_ptr() };
      let Some(run) = scan_for_free_run(arena_mut, size) else { continue };

      let address = arena_mut.bucket_address(run.start);
      for tag in &mut arena_mut.tags[run.start..=run.end_inclusive] {
        *tag = address;
      }
      arena_mut.used += run.run_bytes as u64;

      let result = unsafe { NonNull::new_unchecked(address as *mut u8) };
      if self.flags.contains(AllocatorFlag::ZeroOnAllocate) {
        unsafe { std::ptr::write_bytes(result.as_ptr(), 0, size) };
      }
      trace!("allocated {} bytes at {:p} ({} bucket(s))", size, result.as_ptr(), run.run_bytes / arena_mut.bucket_size());
      return Some(result);
    }
    None
  }

  /// Extends `ptr` in place when possible, otherwise allocates fresh storage,
  /// copies the old contents, and frees `ptr`. `reallocate(None, size)` is
  /// treated as `allocate(size)`, per the resolved open question on
  /// reallocating a null pointer.
  pub fn reallocate(&mut self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
    match ptr {
      None => self.allocate(new_size),
      Some(ptr) => self.reallocate_existing(ptr, new_size),
    }
  }

  fn reallocate_existing(&mut self, ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
    let address = ptr.as_ptr() as usize;
    let old_size = self.size_of_allocation(address)?;

    for arena in self.list.iter() {
      let arena_mut = unsafe { &mut *arena.as_ptr() };
      if arena_mut.is_empty() {
        continue;
      }

      match locate_and_try_extend(arena_mut, address, new_size) {
        ExtendOutcome::Extended { added_bytes, old_end_inclusive, new_end_inclusive, .. } => {
          if added_bytes > 0 {
            for tag in &mut arena_mut.tags[(old_end_inclusive + 1)..=new_end_inclusive] {
              *tag = address;
            }
            arena_mut.used += added_bytes as u64;
            if self.flags.contains(AllocatorFlag::ZeroOnAllocate) {
              let tail = arena_mut.bucket_ptr(old_end_inclusive + 1);
              unsafe { std::ptr::write_bytes(tail, 0, added_bytes) };
            }
          }
          trace!("extended {:p} to {} bytes in place", ptr.as_ptr(), new_size);
          return Some(ptr);
        }
        ExtendOutcome::CannotExtend { .. } => break, // by design: do not search further arenas
        ExtendOutcome::NotFound => continue,
      }
    }

    // Fallback: relocate.
    let new_ptr = self.allocate(new_size)?;
    unsafe {
      std::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_size);
    }
    self.free(Some(ptr));
    trace!("relocated {:p} -> {:p} ({} bytes)", ptr.as_ptr(), new_ptr.as_ptr(), old_size);
    Some(new_ptr)
  }

  fn size_of_allocation(&self, address: usize) -> Option<usize> {
    for arena in self.list.iter() {
      let arena_ref = unsafe { arena.as_ref() };
      if arena_ref.is_empty() || !arena_ref.owns(address) {
        continue;
      }
      let count = arena_ref.tags.iter().filter(|&&tag| tag == address).count();
      if count > 0 {
        return Some(count * arena_ref.bucket_size());
      }
    }
    None
  }

  /// Clears every tag belonging to `ptr`'s run. A no-op returning `None` for
  /// `None` or an unknown pointer; returns `ptr` back when it was found and freed.
  pub fn free(&mut self, ptr: Option<NonNull<u8>>) -> Option<NonNull<u8>> {
    let ptr = ptr?;
    let address = ptr.as_ptr() as usize;

    for arena in self.list.iter() {
      let arena_mut = unsafe { &mut *arena.as_ptr() };
      if arena_mut.is_empty() {
        continue;
      }

      let mut swept = 0usize;
      for tag in arena_mut.tags.iter_mut() {
        if *tag == address {
          *tag = 0;
          swept += 1;
        }
      }
      if swept > 0 {
        let freed_bytes = swept * arena_mut.bucket_size();
        arena_mut.used -= freed_bytes as u64;
        if self.flags.contains(AllocatorFlag::ZeroOnFree) {
          unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, freed_bytes) };
        }
        trace!("freed {:p} ({} bytes)", ptr.as_ptr(), freed_bytes);
        return Some(ptr);
      }
    }
    None
  }

  // endregion

  // region Garbage collection

  /// Releases every empty arena except the head. Returns the number released.
  pub fn gc(&mut self) -> usize {
    self.reclaim(false)
  }

  /// Changes the default bucket size for future arenas, then reclaims empty
  /// arenas including the head; if the head was reclaimed, a fresh arena of
  /// the new default size is created to restore the `head != null` invariant.
  pub fn set_default_bucket_size(&mut self, new_size: usize) {
    self.default_bucket_size = new_size;
    self.reclaim(true);

    if self.list.is_empty() {
      if let Some(arena) = ArenaHeader::<B>::create(new_size, self.page_acquire) {
        self.list.push_back(arena);
      }
    }
  }

  fn reclaim(&mut self, include_head: bool) -> usize {
    let head = self.list.head;
    let mut released = 0usize;
    let mut current = self.list.tail;

    while let Some(arena) = NonNull::new(current) {
      let arena_ptr = arena.as_ptr();
      current = unsafe { (*arena_ptr).prev };

      if !include_head && arena_ptr == head {
        break;
      }

      if unsafe { (*arena_ptr).is_empty() } {
        self.list.unlink(arena);
        unsafe { ArenaHeader::<B>::destroy(arena, self.page_release) };
        released += 1;
      }

      if include_head && arena_ptr == head {
        break;
      }
    }

    debug!("gc reclaimed {} arena(s)", released);
    released
  }

  // endregion

  pub fn collect_information(&self) -> AllocatorInfo {
    let mut info = AllocatorInfo {
      default_bucket_size: self.default_bucket_size,
      ..Default::default()
    };

    for arena in self.list.iter() {
      let arena_ref = unsafe { arena.as_ref() };
      info.arena_count += 1;
      if arena_ref.is_empty() {
        info.empty_arena_count += 1;
      }
      info.reserved_space += arena_ref.capacity();
      info.used_space += arena_ref.used();
    }
    info.free_space = info.reserved_space - info.used_space;

    info
  }
}

impl<const B: usize, const S: usize> Drop for Allocator<B, S> {
  fn drop(&mut self) {
    let mut current = self.list.head;
    while let Some(arena) = NonNull::new(current) {
      current = unsafe { arena.as_ref().next };
      unsafe { ArenaHeader::<B>::destroy(arena, self.page_release) };
    }
  }
}
