use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared memory accounting.
///
/// Trackers form a tree, consumption charged to a child is also charged to
/// every ancestor. Any number of parses may hold the same tracker.
#[derive(Debug)]
pub struct MemTracker {
    label: String,
    consumption: AtomicUsize,
    peak: AtomicUsize,
    parent: Option<Arc<MemTracker>>,
}

impl MemTracker {
    pub fn new_root(label: impl Into<String>) -> Arc<Self> {
        Arc::new(MemTracker {
            label: label.into(),
            consumption: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            parent: None,
        })
    }

    pub fn new_child(parent: &Arc<MemTracker>, label: impl Into<String>) -> Arc<Self> {
        Arc::new(MemTracker {
            label: label.into(),
            consumption: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            parent: Some(parent.clone()),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn consumption(&self) -> usize {
        self.consumption.load(Ordering::Relaxed)
    }

    pub fn peak_consumption(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn consume(&self, bytes: usize) {
        let current = self.consumption.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak.fetch_max(current, Ordering::Relaxed);
        if let Some(parent) = &self.parent {
            parent.consume(bytes);
        }
    }

    pub fn release(&self, bytes: usize) {
        self.consumption.fetch_sub(bytes, Ordering::Relaxed);
        if let Some(parent) = &self.parent {
            parent.release(bytes);
        }
    }
}

/// Bytes charged to a tracker, released on drop.
#[derive(Debug)]
pub struct MemReservation {
    tracker: Arc<MemTracker>,
    bytes: usize,
}

impl MemReservation {
    pub fn new(tracker: Arc<MemTracker>, bytes: usize) -> Self {
        tracker.consume(bytes);
        MemReservation { tracker, bytes }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn grow(&mut self, bytes: usize) {
        self.tracker.consume(bytes);
        self.bytes += bytes;
    }
}

impl Drop for MemReservation {
    fn drop(&mut self) {
        self.tracker.release(self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn child_charges_parent() {
        let root = MemTracker::new_root("root");
        let child = MemTracker::new_child(&root, "parse");

        {
            let mut res = MemReservation::new(child.clone(), 10);
            res.grow(5);
            assert_eq!(15, child.consumption());
            assert_eq!(15, root.consumption());
        }

        assert_eq!(0, child.consumption());
        assert_eq!(0, root.consumption());
        assert_eq!(15, root.peak_consumption());
    }

    #[test]
    fn concurrent_accounting() {
        let root = MemTracker::new_root("root");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = root.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _res = MemReservation::new(tracker.clone(), 8);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(0, root.consumption());
        assert!(root.peak_consumption() >= 8);
    }
}
