/*!

Diagnostic logging for the allocator core, gated behind the `gc_debug`
feature.

The allocator itself never decides what to do with a log message — it just
emits `trace!`/`debug!`/`warning!` events at the interesting points (arena
creation, reclamation, fallback to copy-then-free on reallocate). This module
only wires those events to `tracing`'s global subscriber so that an embedder
who wants allocator diagnostics gets them on stdout for free, and one who
doesn't can install their own subscriber instead.

*/

mod macros;

use std::sync::LazyLock;

use tracing_subscriber::fmt;

pub use macros::*;

static INIT_LOGGER: LazyLock<()> = LazyLock::new(|| {
  let subscriber = fmt()
      .with_target(false)
      .without_time()
      .with_writer(std::io::stderr)
      .finish();

  // An embedder may already have installed their own subscriber; that's fine,
  // we just don't get to install ours.
  let _ = tracing::subscriber::set_global_default(subscriber);
});

/// Initializes the default logging subscriber. Idempotent; called implicitly
/// by the logging macros, so embedders never need to call this directly.
pub fn init_logger() {
  LazyLock::force(&INIT_LOGGER);
}
