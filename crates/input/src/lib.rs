//! Input: pointer and key state, independent of the windowing library.
//!
//! The desktop shell translates its native events into these types; the
//! viewer consumes only these, never raw window events.
//!
//! # Invariants
//! - A pointer-up is flagged `dragged` once the pointer travelled further
//!   than the drag threshold while pressed.

pub mod keys;
pub mod pointer;

pub use keys::{WalkKey, WalkKeys};
pub use pointer::{PointerButton, PointerInfo, PointerKind, PointerTracker};
