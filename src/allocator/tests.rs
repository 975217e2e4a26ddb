use std::alloc::{alloc, dealloc, Layout};
use std::collections::HashMap;
use std::ptr::NonNull;

use rand::Rng;

use super::Allocator;
use crate::flags::{AllocatorFlag, AllocatorFlags};

fn system_acquire(n: usize) -> Option<(NonNull<u8>, usize)> {
  let layout = Layout::from_size_align(n, 8).ok()?;
  let ptr = unsafe { alloc(layout) };
  Some((NonNull::new(ptr)?, n))
}

fn system_release(ptr: NonNull<u8>, n: usize) {
  let layout = Layout::from_size_align(n, 8).unwrap();
  unsafe { dealloc(ptr.as_ptr(), layout) };
}

fn new_default() -> Allocator<128, 32> {
  Allocator::<128, 32>::new(system_acquire, system_release).unwrap()
}

// S1 — Single fit.
#[test]
fn s1_single_fit() {
  let mut a = new_default();
  let p = a.allocate(32);
  assert!(p.is_some());
  assert_eq!(a.collect_information().used_space, 32);

  a.free(p);
  assert_eq!(a.collect_information().used_space, 0);
}

// S2 — Spanning allocation.
#[test]
fn s2_spanning_allocation() {
  let mut a = new_default();
  let p = a.allocate(200);
  assert!(p.is_some());
  // ceil(200 / 32) == 7 buckets
  assert_eq!(a.collect_information().used_space, 7 * 32);
}

// S3 — Oversize.
#[test]
fn s3_oversize() {
  let mut a = new_default();
  let p = a.allocate(32 * 128 + 1).unwrap();

  let info = a.collect_information();
  assert_eq!(info.arena_count, 2); // the original arena plus the oversize arena
  // bucket_size = align_up_64(ceil(4097 / 128)) = align_up_64(33) = 64
  assert_eq!(info.reserved_space, 128 * 32 + 128 * 64);
  // 65 buckets of 64 bytes are needed to cover 4097 bytes; the general
  // run-scanning algorithm in §4.3 charges exactly that, not the whole arena.
  assert_eq!(info.used_space, 65 * 64);

  a.free(Some(p));
}

// S4 — Fragmentation refusal.
#[test]
fn s4_fragmentation_refusal() {
  let mut a = new_default();
  let mut pointers = Vec::with_capacity(128);
  for _ in 0..128 {
    pointers.push(a.allocate(32).unwrap());
  }
  assert_eq!(a.collect_information().arena_count, 1);

  for (i, &p) in pointers.iter().enumerate() {
    if i % 2 == 0 {
      a.free(Some(p));
    }
  }

  // 64 single-bucket holes, none adjacent: a 2-bucket request cannot be
  // satisfied by the first arena and must grow.
  let before = a.collect_information().arena_count;
  a.allocate(64).unwrap();
  assert_eq!(a.collect_information().arena_count, before + 1);
}

// S5 — Realloc extend in place.
#[test]
fn s5_realloc_extend_in_place() {
  let mut a = new_default();
  let p = a.allocate(32).unwrap();
  let q = a.reallocate(Some(p), 64).unwrap();
  assert_eq!(q, p);
  assert_eq!(a.collect_information().used_space, 64);
}

// S6 — Realloc relocate.
#[test]
fn s6_realloc_relocate() {
  let mut a = new_default();
  let p = a.allocate(32).unwrap();
  let _q = a.allocate(32).unwrap(); // occupies the bucket right after p

  let r = a.reallocate(Some(p), 64).unwrap();
  assert_ne!(r, p);
}

// S7 — GC excludes head.
#[test]
fn s7_gc_excludes_head() {
  let mut a = Allocator::<4, 32>::new(system_acquire, system_release).unwrap();
  let p1 = a.allocate(128).unwrap(); // fills arena 1 (head)
  let p2 = a.allocate(128).unwrap(); // forces and fills arena 2
  let p3 = a.allocate(128).unwrap(); // forces and fills arena 3
  assert_eq!(a.collect_information().arena_count, 3);

  a.free(Some(p1));
  a.free(Some(p2));
  a.free(Some(p3));

  let released = a.gc();
  assert_eq!(released, 2);
  assert_eq!(a.collect_information().arena_count, 1);
}

#[test]
fn free_of_none_is_a_noop() {
  let mut a = new_default();
  assert_eq!(a.free(None), None);
}

#[test]
fn free_of_unknown_pointer_is_a_noop() {
  let mut a = new_default();
  let bogus = NonNull::new(0x10 as *mut u8).unwrap();
  assert_eq!(a.free(Some(bogus)), None);
}

#[test]
fn reallocate_of_none_behaves_like_allocate() {
  let mut a = new_default();
  let p = a.reallocate(None, 32);
  assert!(p.is_some());
  assert_eq!(a.collect_information().used_space, 32);
}

#[test]
fn reallocate_of_unknown_pointer_returns_none() {
  let mut a = new_default();
  let bogus = NonNull::new(0x10 as *mut u8).unwrap();
  assert_eq!(a.reallocate(Some(bogus), 64), None);
}

#[test]
fn gc_is_idempotent_in_steady_state() {
  let mut a = new_default();
  let p = a.allocate(32).unwrap();
  assert_eq!(a.gc(), 0);
  a.free(Some(p));
  // Only one arena (the head) exists; gc never reclaims the head.
  assert_eq!(a.gc(), 0);
}

#[test]
fn zero_on_allocate_clears_fresh_bytes() {
  let mut a = Allocator::<128, 32>::new(system_acquire, system_release)
      .unwrap()
      .with_flags(AllocatorFlags::from(AllocatorFlag::ZeroOnAllocate));
  let p = a.allocate(32).unwrap();
  let bytes = unsafe { std::slice::from_raw_parts(p.as_ptr(), 32) };
  assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn zero_on_free_clears_freed_bytes() {
  let mut a = Allocator::<128, 32>::new(system_acquire, system_release)
      .unwrap()
      .with_flags(AllocatorFlags::from(AllocatorFlag::ZeroOnFree));
  let p = a.allocate(32).unwrap();
  unsafe { std::ptr::write_bytes(p.as_ptr(), 0xAB, 32) };
  a.free(Some(p));
  let bytes = unsafe { std::slice::from_raw_parts(p.as_ptr(), 32) };
  assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn object_facade_roundtrip() {
  struct Point {
    x: i64,
    y: i64,
  }

  let mut a = new_default();
  let p = a.construct(Point { x: 3, y: 4 }).unwrap();
  unsafe {
    assert_eq!((*p.as_ptr()).x, 3);
    assert_eq!((*p.as_ptr()).y, 4);
    a.destroy(p);
  }
  assert_eq!(a.collect_information().used_space, 0);
}

/// Randomized allocate/reallocate/free sequence, cross-checked against a
/// shadow map of live pointers and their sizes — a random build-then-collect
/// loop adapted to check the allocator's bookkeeping instead of a tree shape.
#[test]
fn randomized_allocate_free_sequence_stays_consistent() {
  let mut a = new_default();
  let mut live: HashMap<usize, usize> = HashMap::new();
  let mut rng = rand::thread_rng();

  for _ in 0..2000 {
    let roll: f64 = rng.gen_range(0.0..1.0);
    if roll < 0.6 || live.is_empty() {
      let size = rng.gen_range(1..=300);
      if let Some(p) = a.allocate(size) {
        live.insert(p.as_ptr() as usize, size);
      }
    } else if roll < 0.8 {
      let keys: Vec<usize> = live.keys().copied().collect();
      let key = keys[rng.gen_range(0..keys.len())];
      let p = NonNull::new(key as *mut u8).unwrap();
      a.free(Some(p));
      live.remove(&key);
    } else {
      let keys: Vec<usize> = live.keys().copied().collect();
      let key = keys[rng.gen_range(0..keys.len())];
      let p = NonNull::new(key as *mut u8).unwrap();
      let new_size = rng.gen_range(1..=300);
      if let Some(new_p) = a.reallocate(Some(p), new_size) {
        live.remove(&key);
        live.insert(new_p.as_ptr() as usize, new_size);
      }
    }
  }

  let info = a.collect_information();
  assert!(info.used_space <= info.reserved_space);
  assert_eq!(info.free_space, info.reserved_space - info.used_space);

  // Every pointer our shadow map still thinks is live must still read back as
  // occupied by exactly itself somewhere in the allocator.
  for (&addr, _) in live.iter() {
    let p = NonNull::new(addr as *mut u8).unwrap();
    // A no-op reallocate to the pointer's own (unknown to us) current size
    // would require knowing that size; instead, freeing and asserting the
    // free succeeded is the simplest external proof of liveness.
    assert!(a.free(Some(p)).is_some());
    live_len_sanity(&mut live, addr);
  }

  fn live_len_sanity(live: &mut HashMap<usize, usize>, addr: usize) {
    live.remove(&addr);
  }
}

#[cfg(feature = "auto_gc")]
mod auto_gc {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  static TRIGGER_CALLS: AtomicUsize = AtomicUsize::new(0);

  fn counting_trigger(_a: &Allocator<4, 32>) -> bool {
    TRIGGER_CALLS.fetch_add(1, Ordering::SeqCst);
    false
  }

  #[test]
  fn gc_trigger_is_polled_before_each_allocation() {
    TRIGGER_CALLS.store(0, Ordering::SeqCst);
    let mut a = Allocator::<4, 32>::new(system_acquire, system_release)
        .unwrap()
        .with_gc_trigger(counting_trigger);

    a.allocate(16);
    assert_eq!(TRIGGER_CALLS.load(Ordering::SeqCst), 1);
    a.allocate(16);
    assert_eq!(TRIGGER_CALLS.load(Ordering::SeqCst), 2);
  }

  fn always_trigger(_a: &Allocator<4, 32>) -> bool {
    true
  }

  #[test]
  fn gc_trigger_returning_true_reclaims_before_the_allocation_grows() {
    let mut a = Allocator::<4, 32>::new(system_acquire, system_release).unwrap();

    // Fill the head arena (4 buckets of 32 bytes) completely.
    for _ in 0..4 {
      a.allocate(32).unwrap();
    }
    // Force and fill a second arena.
    let mut second_arena_ptrs = Vec::new();
    for _ in 0..4 {
      second_arena_ptrs.push(a.allocate(32).unwrap());
    }
    assert_eq!(a.collect_information().arena_count, 2);

    // Empty the second arena so it becomes reclaimable, but don't call gc()
    // directly — the trigger installed below is what should reclaim it.
    for p in second_arena_ptrs {
      a.free(Some(p));
    }
    assert_eq!(a.collect_information().empty_arena_count, 1);

    let mut a = a.with_gc_trigger(always_trigger);

    // The head arena is still full, so this allocation must grow regardless.
    // If the trigger's gc() ran first, the empty second arena is reclaimed
    // before growth, leaving exactly 2 arenas (head + the freshly grown one).
    // Without the trigger firing, the stale empty arena would still be
    // around, leaving 3.
    a.allocate(32).unwrap();
    assert_eq!(a.collect_information().arena_count, 2);
  }
}
