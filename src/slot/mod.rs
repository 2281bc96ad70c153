//! Latest-frame latch shared between the producer and viewers
//!
//! The slot holds at most one frame. Publishing replaces whatever is there;
//! nothing is queued, so slow viewers skip frames and fast viewers wait.
//!
//! # Architecture
//!
//! ```text
//!                 Arc<FrameSlot>
//!           ┌──────────────────────────┐
//!           │ latest: Mutex<Option<    │
//!           │   (sequence, Frame)>>    │
//!           │ notify: Notify           │
//!           └────────────┬─────────────┘
//!                        │
//!      ┌─────────────────┼─────────────────┐
//!      │                 │                 │
//!      ▼                 ▼                 ▼
//!  [Producer]        [Session]         [Session]
//!  publish()         wait_newer()      wait_newer()
//! ```
//!
//! # Copy isolation
//!
//! Snapshots copy the pixel buffer while the lock is held, so a reader never
//! shares memory with the frame stored in the slot.

pub mod latch;

pub use latch::{FrameSlot, FrameSnapshot};
