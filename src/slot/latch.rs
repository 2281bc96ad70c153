//! Single-slot frame latch implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::media::Frame;

/// A copy of the slot contents at some point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Publish counter value when this frame was stored (starts at 1)
    pub sequence: u64,
    /// Independent copy of the frame
    pub frame: Frame,
}

#[derive(Debug, Default)]
struct Latest {
    sequence: u64,
    frame: Option<Frame>,
}

/// Single-writer, many-reader "latest value wins" mailbox
///
/// Thread-safe: the producer publishes from a plain OS thread while sessions
/// wait from async tasks.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Latest>,
    notify: Notify,
    closed: AtomicBool,
}

impl FrameSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    // The guarded value is always fully assigned, so a poisoned lock still
    // holds a consistent frame.
    fn lock(&self) -> MutexGuard<'_, Latest> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the slot contents and wake every waiting reader
    ///
    /// Returns the sequence number assigned to the frame.
    pub fn publish(&self, frame: Frame) -> u64 {
        let (sequence, previous) = {
            let mut latest = self.lock();
            latest.sequence += 1;
            let previous = latest.frame.replace(frame);
            (latest.sequence, previous)
        };
        // Release the replaced frame outside the lock
        drop(previous);

        self.notify.notify_waiters();
        tracing::trace!(sequence = sequence, "Frame published");
        sequence
    }

    /// Copy the current frame, or `None` if nothing was published yet
    pub fn snapshot(&self) -> Option<FrameSnapshot> {
        let latest = self.lock();
        latest.frame.as_ref().map(|frame| FrameSnapshot {
            sequence: latest.sequence,
            frame: frame.deep_copy(),
        })
    }

    /// Copy the current frame only if it is newer than `after`
    pub fn snapshot_newer(&self, after: u64) -> Option<FrameSnapshot> {
        let latest = self.lock();
        if latest.sequence <= after {
            return None;
        }
        latest.frame.as_ref().map(|frame| FrameSnapshot {
            sequence: latest.sequence,
            frame: frame.deep_copy(),
        })
    }

    /// Wait until a frame newer than `after` is available
    ///
    /// Pass `0` to wait for the first frame. Returns `None` once the slot is
    /// closed. Cancel-safe.
    pub async fn wait_newer(&self, after: u64) -> Option<FrameSnapshot> {
        loop {
            // Register interest before checking, so a publish between the
            // check and the await is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_closed() {
                return None;
            }
            if let Some(snapshot) = self.snapshot_newer(after) {
                return Some(snapshot);
            }

            notified.await;
        }
    }

    /// Sequence number of the latest publish (0 = empty)
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    /// Check if nothing has been published yet
    pub fn is_empty(&self) -> bool {
        self.lock().frame.is_none()
    }

    /// Stop the slot: waiters return `None` and the producer winds down
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::media::PixelFormat;

    fn filled(value: u8) -> Frame {
        Frame::new(32, 32, PixelFormat::Gray8, Bytes::from(vec![value; 32 * 32])).unwrap()
    }

    #[test]
    fn test_empty_slot() {
        let slot = FrameSlot::new();

        assert!(slot.is_empty());
        assert_eq!(slot.sequence(), 0);
        assert!(slot.snapshot().is_none());
    }

    #[test]
    fn test_publish_replaces_previous() {
        let slot = FrameSlot::new();

        assert_eq!(slot.publish(filled(1)), 1);
        assert_eq!(slot.publish(filled(2)), 2);

        let snapshot = slot.snapshot().unwrap();
        assert_eq!(snapshot.sequence, 2);
        assert!(snapshot.frame.data().iter().all(|&b| b == 2));
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let slot = FrameSlot::new();
        slot.publish(filled(7));

        let a = slot.snapshot().unwrap();
        let b = slot.snapshot().unwrap();

        assert_eq!(a, b);
        assert_ne!(a.frame.data().as_ptr(), b.frame.data().as_ptr());
    }

    #[test]
    fn test_snapshot_newer() {
        let slot = FrameSlot::new();
        assert!(slot.snapshot_newer(0).is_none());

        slot.publish(filled(1));
        assert!(slot.snapshot_newer(0).is_some());
        assert!(slot.snapshot_newer(1).is_none());
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_frames() {
        let slot = Arc::new(FrameSlot::new());

        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..500u32 {
                    slot.publish(filled((i % 256) as u8));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        if let Some(snapshot) = slot.snapshot() {
                            let first = snapshot.frame.data()[0];
                            assert!(snapshot.frame.data().iter().all(|&b| b == first));
                            assert_eq!(snapshot.frame.len(), 32 * 32);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(slot.sequence(), 500);
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_first_publish() {
        let slot = Arc::new(FrameSlot::new());

        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.wait_newer(0).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        slot.publish(filled(9));

        let snapshot = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter was not woken")
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.sequence, 1);
    }

    #[tokio::test]
    async fn test_wait_newer_returns_immediately_when_available() {
        let slot = FrameSlot::new();
        slot.publish(filled(1));
        slot.publish(filled(2));

        let snapshot = slot.wait_newer(1).await.unwrap();
        assert_eq!(snapshot.sequence, 2);
    }

    #[tokio::test]
    async fn test_close_releases_waiters() {
        let slot = Arc::new(FrameSlot::new());

        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.wait_newer(0).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        slot.close();

        let result = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter was not released")
            .unwrap();
        assert!(result.is_none());
        assert!(slot.is_closed());
    }
}
