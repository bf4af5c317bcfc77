//! Bounded output retention.
//!
//! Every executed child gets one [`OutputBuffer`]. All buffers of an engine
//! share one [`BufferLimit`]; when a buffer grows past it, the oldest bytes are
//! dropped. Lowering the limit takes effect on the next write or read.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 1 MiB.
pub const DEFAULT_BUFFER_LIMIT: usize = 1024 * 1024;

/// Shared, live-updatable cap on retained bytes per buffer.
#[derive(Debug, Clone)]
pub struct BufferLimit(Arc<AtomicUsize>);

impl BufferLimit {
    pub fn new(limit: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(limit)))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, limit: usize) {
        self.0.store(limit, Ordering::Relaxed);
    }
}

impl Default for BufferLimit {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_LIMIT)
    }
}

/// Retained output of one child.
#[derive(Debug)]
pub struct OutputBuffer {
    data: VecDeque<u8>,
    limit: BufferLimit,
    dropped: u64,
}

impl OutputBuffer {
    pub fn new(limit: BufferLimit) -> Self {
        Self {
            data: VecDeque::new(),
            limit,
            dropped: 0,
        }
    }

    /// Append bytes, then drop from the front until within the limit.
    pub fn push(&mut self, bytes: &[u8]) {
        let limit = self.limit.get();
        if bytes.len() >= limit {
            // Only the tail of this chunk survives.
            self.dropped += (self.data.len() + bytes.len() - limit) as u64;
            self.data.clear();
            self.data.extend(&bytes[bytes.len() - limit..]);
            return;
        }
        self.data.extend(bytes);
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        let limit = self.limit.get();
        if self.data.len() > limit {
            let excess = self.data.len() - limit;
            self.data.drain(..excess);
            self.dropped += excess as u64;
        }
    }

    /// Copy of the retained bytes. Does not consume them.
    pub fn contents(&mut self) -> Vec<u8> {
        self.enforce_limit();
        self.data.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total bytes discarded to stay within the limit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// An [`OutputBuffer`] shared between a pump task and the engine.
#[derive(Debug, Clone)]
pub struct SharedBuffer(Arc<Mutex<OutputBuffer>>);

impl SharedBuffer {
    pub fn new(limit: BufferLimit) -> Self {
        Self(Arc::new(Mutex::new(OutputBuffer::new(limit))))
    }

    // Poisoned locks are recovered.
    fn lock(&self) -> MutexGuard<'_, OutputBuffer> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, bytes: &[u8]) {
        self.lock().push(bytes);
    }

    /// Retained output as text; invalid UTF-8 is replaced.
    pub fn read_lossy(&self) -> String {
        String::from_utf8_lossy(&self.lock().contents()).into_owned()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lock().contents()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.lock().dropped()
    }
}
