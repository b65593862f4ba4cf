use parking_lot::Mutex;

/// Reusable scratch object
pub trait Poolable: Default + Send {
    /// Return to the freshly-created state, keeping allocations
    fn reset(&mut self);
}

impl Poolable for roaring::RoaringTreemap {
    fn reset(&mut self) {
        self.clear();
    }
}

impl Poolable for roaring::RoaringBitmap {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Bounded free list of scratch objects
///
/// `acquire` moves an object out and `release` moves it back after a reset, so an
/// object can never be handed to two callers at once. Releases beyond `capacity`
/// are dropped.
#[derive(Debug)]
pub struct Pool<T: Poolable> {
    idle: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Poolable> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn acquire(&self) -> T {
        self.idle.lock().pop().unwrap_or_default()
    }

    pub fn release(&self, mut item: T) {
        item.reset();
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(item);
        }
    }

    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}
