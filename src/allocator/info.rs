use std::fmt::{Display, Formatter};

/// A point-in-time snapshot returned by [`crate::allocator::Allocator::collect_information`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AllocatorInfo {
  pub arena_count: usize,
  pub empty_arena_count: usize,
  pub default_bucket_size: usize,
  pub reserved_space: usize,
  pub used_space: usize,
  pub free_space: usize,
}

impl Display for AllocatorInfo {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "arenas: {} ({} empty)\tdefault bucket: {}\treserved: {}\tused: {}\tfree: {}",
      self.arena_count,
      self.empty_arena_count,
      self.default_bucket_size,
      self.reserved_space,
      self.used_space,
      self.free_space,
    )
  }
}
