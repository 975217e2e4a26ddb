use enumflags2::{bitflags, BitFlags};

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AllocatorFlag {
  /// Bytes handed to the caller are zeroed before `allocate`/`reallocate` returns.
  ZeroOnAllocate,
  /// Bytes within a freed run are zeroed before `free` returns.
  ZeroOnFree,
}

pub type AllocatorFlags = BitFlags<AllocatorFlag, u8>;
