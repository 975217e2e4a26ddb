/*!

Typed construction/destruction layered on top of the raw `allocate`/`free`
API, so the core stays agnostic to what a caller stores in its buckets.

`construct` takes an already-built `T` rather than forwarding constructor
arguments to a placement-new: ordinary Rust construction cannot fail midway
through building a `T`, so there is no unfinished value whose storage could
be left tagged to an incomplete allocation.

*/

use std::ptr::{self, NonNull};

use super::Allocator;

impl<const B: usize, const S: usize> Allocator<B, S> {
  /// Allocates storage for a `T`, moves `value` into it, and returns a typed
  /// pointer. Returns `None` (without touching `value`'s ownership) if no
  /// storage could be found or grown.
  pub fn construct<T>(&mut self, value: T) -> Option<NonNull<T>> {
    let raw = self.allocate(std::mem::size_of::<T>())?;
    let typed = raw.cast::<T>();
    unsafe { typed.as_ptr().write(value) };
    Some(typed)
  }

  /// Runs `T`'s destructor and frees the raw storage. `ptr` must have come
  /// from `construct::<T>` on this allocator and not already be destroyed.
  pub unsafe fn destroy<T>(&mut self, ptr: NonNull<T>) {
    ptr::drop_in_place(ptr.as_ptr());
    self.free(Some(ptr.cast::<u8>()));
  }
}
