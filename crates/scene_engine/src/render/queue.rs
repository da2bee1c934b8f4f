//! Double-buffered entity submission queue
//!
//! Producers append to the future buffer under a mutex while the render
//! thread reads the current buffer. At the end of a frame the two buffers
//! are swapped, so entities submitted before the swap are drawn the next
//! frame and entities submitted after it wait one more frame.

use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard};

use crate::scene::{EntityId, Scene};

/// Entities to draw, shared between producers and the render thread
#[derive(Debug, Default)]
pub struct EntityQueue {
    future: Mutex<Vec<EntityId>>,
    current: RwLock<Vec<EntityId>>,
}

impl EntityQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one entity for the next frame
    pub fn submit(&self, id: EntityId) {
        self.future.lock().unwrap_or_else(PoisonError::into_inner).push(id);
    }

    /// Queue a batch of entities, keeping their order
    pub fn submit_batch<I: IntoIterator<Item = EntityId>>(&self, ids: I) {
        self.future.lock().unwrap_or_else(PoisonError::into_inner).extend(ids);
    }

    /// Queue an entity and all of its descendants in depth-first pre-order
    pub fn submit_recursive(&self, scene: &Scene, id: EntityId) {
        self.submit_batch(scene.subtree(id));
    }

    /// Make the submitted entities current and start a new future buffer
    pub fn swap(&self) {
        let mut future = self.future.lock().unwrap_or_else(PoisonError::into_inner);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::swap(&mut *future, &mut *current);
        future.clear();
    }

    /// Entities to draw this frame
    pub fn current(&self) -> RwLockReadGuard<'_, Vec<EntityId>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of entities waiting for the next swap
    pub fn pending_len(&self) -> usize {
        self.future.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
