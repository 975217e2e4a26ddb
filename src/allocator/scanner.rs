/*!

Pure, arena-local scanning logic: finding a free run for a fresh allocation,
and locating + extending an existing one for `reallocate`. Kept free of any
list-walking or arena-creation concerns so each can be unit tested against a
single arena in isolation.

*/

use super::arena::ArenaHeader;

/// A free run of `>= needed_bytes` found at `[start, end_inclusive]`, with its
/// total size in bytes (which may exceed `needed_bytes` — tail slack is
/// charged to the allocation).
pub(crate) struct FreeRun {
  pub(crate) start: usize,
  pub(crate) end_inclusive: usize,
  pub(crate) run_bytes: usize,
}

/// Walks `arena`'s tags from index 0, looking for the first contiguous run of
/// free buckets totalling at least `needed_bytes`. Lowest-index qualifying run
/// wins within the arena.
pub(crate) fn scan_for_free_run<const B: usize>(
  arena: &ArenaHeader<B>,
  needed_bytes: usize,
) -> Option<FreeRun> {
  if arena.capacity() - arena.used() < needed_bytes {
    return None;
  }

  let bucket_size = arena.bucket_size();
  let mut start = None;
  let mut run_bytes = 0usize;

  for i in 0..B {
    if arena.tags[i] == 0 {
      if start.is_none() {
        start = Some(i);
      }
      run_bytes += bucket_size;
    } else {
      start = None;
      run_bytes = 0;
    }

    if run_bytes >= needed_bytes {
      return Some(FreeRun { start: start.unwrap(), end_inclusive: i, run_bytes });
    }
  }

  None
}

/// Outcome of trying to locate allocation `ptr` in `arena` and extend it to `new_size`.
pub(crate) enum ExtendOutcome {
  /// `ptr`'s run already covers `new_size` bytes, possibly after growing into
  /// trailing free buckets `(old_end_inclusive, new_end_inclusive]`.
  Extended {
    added_bytes: usize,
    start: usize,
    old_end_inclusive: usize,
    new_end_inclusive: usize,
  },
  /// `ptr` was found but there isn't enough trailing free space to reach
  /// `new_size`; by design, no other arena is searched in this case.
  CannotExtend { current_size: usize },
  /// `ptr` does not live in this arena.
  NotFound,
}

/// Locates the run of tags equal to `ptr` in `arena` and, if it is
/// undersized, tries to grow it forward into trailing free buckets.
pub(crate) fn locate_and_try_extend<const B: usize>(
  arena: &ArenaHeader<B>,
  ptr: usize,
  new_size: usize,
) -> ExtendOutcome {
  let bucket_size = arena.bucket_size();

  let mut start = None;
  let mut count = 0usize;
  for i in 0..B {
    if arena.tags[i] == ptr {
      if start.is_none() {
        start = Some(i);
      }
      count += 1;
    } else if start.is_some() {
      break;
    }
  }

  let start = match start {
    Some(s) => s,
    None => return ExtendOutcome::NotFound,
  };
  let current_size = count * bucket_size;
  let old_end_inclusive = start + count - 1;

  if current_size >= new_size {
    // Already big enough; also covers the shrink case (new_size < current_size).
    return ExtendOutcome::Extended {
      added_bytes: 0,
      start,
      old_end_inclusive,
      new_end_inclusive: old_end_inclusive,
    };
  }

  let mut total_size = current_size;
  let mut end_inclusive = old_end_inclusive;
  let mut next = start + count;
  while next < B && arena.tags[next] == 0 && total_size < new_size {
    total_size += bucket_size;
    end_inclusive = next;
    next += 1;
  }

  if total_size >= new_size {
    ExtendOutcome::Extended {
      added_bytes: total_size - current_size,
      start,
      old_end_inclusive,
      new_end_inclusive: end_inclusive,
    }
  } else {
    ExtendOutcome::CannotExtend { current_size }
  }
}
