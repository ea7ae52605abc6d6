//! Frame buffer recycling.
//!
//! Buffer ownership passes producer -> queue -> worker -> pool and back;
//! a buffer is owned by exactly one side at a time, so the producer can
//! never overwrite bytes the detector is still reading.

use std::sync::Mutex;

/// Fixed-size frame buffer pool.
pub struct FramePool {
    frame_len: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl FramePool {
    /// Pool handing out `frame_len`-byte buffers, with `initial` of them
    /// preallocated.
    pub fn new(frame_len: usize, initial: usize) -> Self {
        let free = (0..initial).map(|_| vec![0u8; frame_len]).collect();
        Self {
            frame_len,
            free: Mutex::new(free),
        }
    }

    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Take a buffer, allocating a fresh one when the pool is empty.
    pub fn acquire(&self) -> Vec<u8> {
        let recycled = self.free.lock().unwrap().pop();
        recycled.unwrap_or_else(|| vec![0u8; self.frame_len])
    }

    /// Return a buffer for reuse. Buffers of the wrong size (e.g. after a
    /// resolution change) are dropped instead of being recycled.
    pub fn release(&self, buf: Vec<u8>) {
        if buf.len() == self.frame_len {
            self.free.lock().unwrap().push(buf);
        }
    }

    /// Number of idle buffers currently in the pool.
    pub fn available(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}
