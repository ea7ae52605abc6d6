//! Bounded-queue detection worker.
//!
//! The original system ran detection inline in the camera's per-frame
//! callback, stalling capture whenever a frame was slow to process. Here
//! capture and detection are decoupled: the producer submits frames into a
//! depth-bounded queue and is never blocked beyond the queue lock; when the
//! queue is full the *oldest* frame is dropped, because stale detections
//! are worthless. A single detector instance lives on one dedicated thread,
//! so at most one frame is in flight at a time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use apriltag_detect::{Detection, Detector};
use serde::{Deserialize, Serialize};

use crate::FramePool;

/// One frame handed to the worker. `data` holds at least `width * height`
/// luma bytes; NV21 buffers work as-is since the Y plane comes first.
pub struct Frame {
    pub seq: u64,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Detection results for the most recently processed frame.
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub seq: u64,
    pub detections: Vec<Detection>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum queued frames awaiting detection. Depth 1-2 is appropriate:
    /// results are only useful if timely.
    pub queue_depth: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { queue_depth: 2 }
    }
}

/// Bounded FIFO with drop-oldest-on-full semantics.
pub struct FrameQueue {
    depth: usize,
    inner: Mutex<VecDeque<Frame>>,
    ready: Condvar,
}

impl FrameQueue {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            inner: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    /// Enqueue a frame. Never waits for the consumer: when the queue is
    /// full, the oldest queued frame is evicted and its buffer returned so
    /// the caller can recycle it.
    pub fn push(&self, frame: Frame) -> Option<Vec<u8>> {
        let mut q = self.inner.lock().unwrap();
        let dropped = if q.len() >= self.depth {
            q.pop_front().map(|f| f.data)
        } else {
            None
        };
        q.push_back(frame);
        drop(q);
        self.ready.notify_one();
        dropped
    }

    /// Dequeue the next frame, blocking until one arrives or `stop` is set.
    fn pop(&self, stop: &AtomicBool) -> Option<Frame> {
        let mut q = self.inner.lock().unwrap();
        loop {
            if let Some(frame) = q.pop_front() {
                return Some(frame);
            }
            if stop.load(Ordering::Acquire) {
                return None;
            }
            q = self.ready.wait(q).unwrap();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn wake_all(&self) {
        self.ready.notify_all();
    }
}

/// Detection on a dedicated thread, publishing the latest results.
pub struct DetectionWorker {
    queue: Arc<FrameQueue>,
    pool: Arc<FramePool>,
    latest: Arc<Mutex<Option<WorkerReport>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    /// Move `detector` onto a new worker thread. Frame buffers are returned
    /// to `pool` after processing.
    pub fn spawn(detector: Detector, config: WorkerConfig, pool: Arc<FramePool>) -> Self {
        let queue = Arc::new(FrameQueue::new(config.queue_depth));
        let latest = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let queue = Arc::clone(&queue);
            let latest = Arc::clone(&latest);
            let stop = Arc::clone(&stop);
            let pool = Arc::clone(&pool);
            std::thread::Builder::new()
                .name("apriltag-detect".into())
                .spawn(move || worker_loop(detector, &queue, &latest, &stop, &pool))
                .expect("spawn detection worker thread")
        };

        Self {
            queue,
            pool,
            latest,
            stop,
            handle: Some(handle),
        }
    }

    /// Submit one frame. Returns immediately; if the queue was full, the
    /// evicted oldest frame's buffer goes back to the pool.
    pub fn submit(&self, frame: Frame) {
        if let Some(buf) = self.queue.push(frame) {
            log::debug!("frame queue full, dropped oldest");
            self.pool.release(buf);
        }
    }

    /// Most recent report, if any frame has completed yet.
    pub fn latest(&self) -> Option<WorkerReport> {
        self.latest.lock().unwrap().clone()
    }

    /// Frames currently awaiting detection.
    pub fn backlog(&self) -> usize {
        self.queue.len()
    }

    /// Signal shutdown and join the worker thread. Queued frames that were
    /// not yet processed are recycled.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.queue.wake_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("detection worker thread panicked");
            }
        }
        // Drain anything the worker never got to.
        while let Some(frame) = self.queue.inner.lock().unwrap().pop_front() {
            self.pool.release(frame.data);
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

fn worker_loop(
    detector: Detector,
    queue: &FrameQueue,
    latest: &Mutex<Option<WorkerReport>>,
    stop: &AtomicBool,
    pool: &FramePool,
) {
    while !stop.load(Ordering::Acquire) {
        let Some(frame) = queue.pop(stop) else {
            break;
        };

        match detector.detect_bytes(&frame.data, frame.width, frame.height) {
            Ok(detections) => {
                let report = WorkerReport {
                    seq: frame.seq,
                    detections,
                };
                *latest.lock().unwrap() = Some(report);
            }
            Err(err) => {
                log::warn!("frame {} rejected: {err}", frame.seq);
            }
        }

        pool.release(frame.data);
    }
}
