//! Reference implementations of the host-side scene traits
//!
//! `SimpleScene` and `SimpleDrawableFactory` are real, working implementations
//! with no rendering backend: the scene is an attached-handle set, the factory
//! an arena of drawable records. Sufficient for tests, tooling, and headless
//! hosts; a renderer-backed host replaces them without changing the engine.

use std::collections::HashSet;

use slotmap::{Key, KeyData};

use crate::foundation::collections::{Handle, HandleMap};
use crate::foundation::color::Color;
use crate::foundation::math::Vec3;

use super::{DetailBuild, DetailRequest, DrawableHandle, DrawableFactory, EdgeLine, Scene};

fn handle_from_key(key: Handle) -> DrawableHandle {
    DrawableHandle::from_raw(key.data().as_ffi())
}

fn key_from_handle(handle: DrawableHandle) -> Handle {
    Handle::from(KeyData::from_ffi(handle.raw()))
}

/// Scene implementation backed by a handle set
#[derive(Debug, Default)]
pub struct SimpleScene {
    attached: HashSet<DrawableHandle>,
    attaches: usize,
    detaches: usize,
}

impl SimpleScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently attached
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Whether a handle is currently attached
    pub fn is_attached(&self, handle: DrawableHandle) -> bool {
        self.attached.contains(&handle)
    }

    /// Total attach calls since creation
    pub fn attaches(&self) -> usize {
        self.attaches
    }

    /// Total detach calls since creation
    pub fn detaches(&self) -> usize {
        self.detaches
    }
}

impl Scene for SimpleScene {
    fn attach(&mut self, handle: DrawableHandle) {
        self.attaches += 1;
        if !self.attached.insert(handle) {
            log::warn!("Handle {:?} attached twice", handle);
        }
    }

    fn detach(&mut self, handle: DrawableHandle) {
        self.detaches += 1;
        if !self.attached.remove(&handle) {
            log::warn!("Detach of handle {:?} that was never attached", handle);
        }
    }
}

/// One drawable tracked by the simple factory
#[derive(Debug, Clone)]
enum DrawableRecord {
    Detail {
        id: String,
        position: Vec3,
        color: Color,
    },
    Edge {
        line: EdgeLine,
    },
}

/// Drawable factory backed by a slot-map arena
///
/// Detail builds report the requested height unchanged. Build and dispose
/// counters let callers verify handle accounting.
#[derive(Debug, Default)]
pub struct SimpleDrawableFactory {
    records: HandleMap<DrawableRecord>,
    built: usize,
    disposed: usize,
}

impl SimpleDrawableFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of drawables currently alive
    pub fn live_count(&self) -> usize {
        self.records.len()
    }

    /// Total drawables built since creation
    pub fn built_count(&self) -> usize {
        self.built
    }

    /// Total drawables disposed since creation
    pub fn disposed_count(&self) -> usize {
        self.disposed
    }

    /// Whether a handle refers to a live drawable
    pub fn is_live(&self, handle: DrawableHandle) -> bool {
        self.records.contains_key(key_from_handle(handle))
    }

    /// Entity id a live detail drawable was built for
    pub fn id_of(&self, handle: DrawableHandle) -> Option<&str> {
        match self.records.get(key_from_handle(handle))? {
            DrawableRecord::Detail { id, .. } => Some(id),
            DrawableRecord::Edge { .. } => None,
        }
    }

    /// Current position of a live detail drawable
    pub fn position_of(&self, handle: DrawableHandle) -> Option<Vec3> {
        match self.records.get(key_from_handle(handle))? {
            DrawableRecord::Detail { position, .. } => Some(*position),
            DrawableRecord::Edge { .. } => None,
        }
    }

    /// Current color of a live drawable
    pub fn color_of(&self, handle: DrawableHandle) -> Option<Color> {
        match self.records.get(key_from_handle(handle))? {
            DrawableRecord::Detail { color, .. } => Some(*color),
            DrawableRecord::Edge { line } => Some(line.color),
        }
    }

    /// Geometry of a live edge drawable
    pub fn edge_line_of(&self, handle: DrawableHandle) -> Option<EdgeLine> {
        match self.records.get(key_from_handle(handle))? {
            DrawableRecord::Edge { line } => Some(*line),
            DrawableRecord::Detail { .. } => None,
        }
    }
}

impl DrawableFactory for SimpleDrawableFactory {
    fn build_detail(&mut self, request: &DetailRequest) -> DetailBuild {
        let key = self.records.insert(DrawableRecord::Detail {
            id: request.id.clone(),
            position: request.position,
            color: request.color,
        });
        self.built += 1;
        DetailBuild {
            handle: handle_from_key(key),
            height: request.size.height,
        }
    }

    fn build_edge(&mut self, line: &EdgeLine) -> DrawableHandle {
        let key = self.records.insert(DrawableRecord::Edge { line: *line });
        self.built += 1;
        handle_from_key(key)
    }

    fn set_transform(&mut self, handle: DrawableHandle, position: Vec3) {
        match self.records.get_mut(key_from_handle(handle)) {
            Some(DrawableRecord::Detail { position: p, .. }) => *p = position,
            Some(DrawableRecord::Edge { .. }) => {
                log::warn!("Edge drawables are rebuilt, not moved: {:?}", handle);
            }
            None => log::warn!("set_transform on unknown handle {:?}", handle),
        }
    }

    fn restyle(&mut self, handle: DrawableHandle, color: Color) {
        match self.records.get_mut(key_from_handle(handle)) {
            Some(DrawableRecord::Detail { color: c, .. }) => *c = color,
            Some(DrawableRecord::Edge { line }) => line.color = color,
            None => log::warn!("restyle on unknown handle {:?}", handle),
        }
    }

    fn dispose(&mut self, handle: DrawableHandle) {
        if self.records.remove(key_from_handle(handle)).is_some() {
            self.disposed += 1;
        } else {
            log::warn!("dispose on unknown handle {:?}", handle);
        }
    }
}
