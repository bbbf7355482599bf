/// The live render list shared between loaders and the redraw loop.
///
/// The current batch sits behind an `Arc` that is swapped as a whole. The
/// lock is only held long enough to clone or replace that pointer, so a
/// draw pass never waits on a parse and never sees a half-built batch. A
/// replaced batch stays alive until the last draw pass holding it ends.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::geometry::{MeshBatch, Triangle};
use crate::transform::RotationState;

/// Whether a batch is currently committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Empty,
    Loaded,
}

#[derive(Debug, Default)]
pub struct RenderList {
    current: Mutex<Option<Arc<MeshBatch>>>,
    rotation: RwLock<RotationState>,
    generation: AtomicU64,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed batch.
    pub fn submit(&self, batch: MeshBatch) {
        let triangles = batch.len();
        let previous = self.swap(Some(Arc::new(batch)));
        log::trace!(
            "render list swapped in {} triangles (previous: {:?})",
            triangles,
            previous.as_deref().map(MeshBatch::len)
        );
    }

    /// Drop back to the empty state.
    pub fn clear(&self) {
        self.swap(None);
        log::trace!("render list cleared");
    }

    // The old batch is handed back so it is released after the guard.
    fn swap(&self, next: Option<Arc<MeshBatch>>) -> Option<Arc<MeshBatch>> {
        let previous = std::mem::replace(&mut *self.current.lock(), next);
        self.generation.fetch_add(1, Ordering::Release);
        previous
    }

    /// Start a traversal over the batch committed right now.
    pub fn draw(&self) -> DrawPass {
        DrawPass {
            batch: self.current.lock().clone(),
            next: 0,
        }
    }

    /// The batch committed right now, if any
    pub fn current(&self) -> Option<Arc<MeshBatch>> {
        self.current.lock().clone()
    }

    pub fn state(&self) -> RenderState {
        if self.current.lock().is_some() {
            RenderState::Loaded
        } else {
            RenderState::Empty
        }
    }

    /// Bumped on every swap; lets the renderer cache per-batch data.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn rotation(&self) -> RotationState {
        *self.rotation.read()
    }

    pub fn set_rotation(&self, rotation: RotationState) {
        *self.rotation.write() = rotation;
    }

    pub fn rotate(&self, dx: f32, dy: f32) {
        self.rotation.write().rotate(dx, dy);
    }
}

/// One frame's traversal over a committed batch.
///
/// Holds its own reference, so later swaps don't affect it.
#[derive(Debug, Clone)]
pub struct DrawPass {
    batch: Option<Arc<MeshBatch>>,
    next: usize,
}

impl DrawPass {
    /// The batch being traversed
    pub fn batch(&self) -> Option<&Arc<MeshBatch>> {
        self.batch.as_ref()
    }

    fn triangles(&self) -> &[Triangle] {
        self.batch.as_deref().map(MeshBatch::triangles).unwrap_or_default()
    }
}

impl Iterator for DrawPass {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        let triangle = self.triangles().get(self.next).copied()?;
        self.next += 1;
        Some(triangle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.triangles().len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DrawPass {}

impl std::iter::FusedIterator for DrawPass {}
