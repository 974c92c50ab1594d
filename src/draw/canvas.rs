//! Compositing canvas: owns the ordered scene and renders it with erasure.
//!
//! Index 0 is the bottom of the stack. Each render pass draws the scene into
//! a scratch surface, bottom to top, applying every eraser path in its place
//! with `DestOut` so that it only removes pixels of objects stacked beneath
//! it. The scratch surface is then composited over the background.

use super::color::Color;
use super::erasable::ShapeError;
use super::geometry::Point;
use super::object::DrawObject;
use super::props::Property;
use super::render::{fill_background, render_edit_icon, render_object};
use crate::util;
use log::{debug, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default pixel budget for the scratch surface (about 10k×10k).
pub const DEFAULT_MAX_SCRATCH_PIXELS: u64 = 100_000_000;

/// Stable handle for an object on a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`CompositingCanvas::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Outcome of [`CompositingCanvas::on_pointer_down`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerHit {
    /// The edit icon of this text object was pressed; it is now editing.
    EditText(ObjectId),
    /// This object is now the active object.
    Selected(ObjectId),
    /// Nothing under the pointer; the selection was cleared.
    Nothing,
}

/// Notifications delivered to canvas listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasEvent {
    ObjectAdded { id: ObjectId, index: usize },
    ObjectRemoved { id: ObjectId },
    Reordered { id: ObjectId, from: usize, to: usize },
    Rotated { id: ObjectId, angle: f64 },
    Rendered { objects: usize, erasers: usize },
    Cleared,
    Disposed,
}

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("object {0} is not on the canvas")]
    ObjectNotFound(ObjectId),

    #[error("object {0} is not an eraser path")]
    NotAnEraser(ObjectId),

    #[error("canvas has been disposed")]
    Disposed,

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("failed to encode PNG: {0}")]
    Png(#[from] cairo::IoError),

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Size and compositing settings for a new canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasOptions {
    pub width: i32,
    pub height: i32,
    /// Painted beneath the scene; erasers never remove it.
    pub background: Option<Color>,
    /// Above this many pixels the scratch surface is not allocated.
    pub max_scratch_pixels: u64,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: None,
            max_scratch_pixels: DEFAULT_MAX_SCRATCH_PIXELS,
        }
    }
}

struct Entry {
    id: ObjectId,
    object: DrawObject,
}

#[derive(Clone, Copy, Debug)]
struct RotationGesture {
    id: ObjectId,
    pivot: Point,
    start: Point,
    start_angle: f64,
    last_pointer: Point,
}

type Listener = Box<dyn FnMut(&CanvasEvent)>;

/// Scene owner and renderer.
pub struct CompositingCanvas {
    entries: Vec<Entry>,
    next_id: u64,
    width: i32,
    height: i32,
    background: Option<Color>,
    max_scratch_pixels: u64,
    scratch: Option<cairo::ImageSurface>,
    scratch_fallback_logged: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    alive: bool,
    rotation: Option<RotationGesture>,
    active: Option<ObjectId>,
}

/// Applies an eraser stroke to `ctx` with subtractive compositing.
///
/// The stroke is made visible only for the duration of the call. Only pixels
/// already on `ctx` are affected, so the caller decides what can be erased by
/// what it has drawn beforehand.
pub fn apply_eraser_stroke(ctx: &cairo::Context, eraser: &mut DrawObject) {
    eraser.props_mut().visible = true;
    ctx.save().ok();
    ctx.set_operator(cairo::Operator::DestOut);
    render_object(ctx, eraser, false);
    ctx.restore().ok();
    eraser.props_mut().visible = false;
}

impl CompositingCanvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_options(CanvasOptions {
            width,
            height,
            ..CanvasOptions::default()
        })
    }

    pub fn with_options(options: CanvasOptions) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            width: options.width.max(0),
            height: options.height.max(0),
            background: options.background,
            max_scratch_pixels: options.max_scratch_pixels,
            scratch: None,
            scratch_fallback_logged: false,
            listeners: Vec::new(),
            next_listener: 1,
            alive: true,
            rotation: None,
            active: None,
        }
    }

    // ========================================================================
    // Scene list
    // ========================================================================

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn set_background(&mut self, background: Option<Color>) {
        self.background = background;
    }

    /// Changes the canvas size; the scratch surface is reallocated on the next render.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.scratch = None;
        self.scratch_fallback_logged = false;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_alive(&self) -> Result<(), CanvasError> {
        if self.alive {
            Ok(())
        } else {
            Err(CanvasError::Disposed)
        }
    }

    /// Adds an object on top of the stack.
    pub fn add(&mut self, object: impl Into<DrawObject>) -> Result<ObjectId, CanvasError> {
        let index = self.entries.len();
        self.insert_at(index, object)
    }

    /// Inserts an object at `index` (clamped to the stack height).
    pub fn insert_at(
        &mut self,
        index: usize,
        object: impl Into<DrawObject>,
    ) -> Result<ObjectId, CanvasError> {
        self.ensure_alive()?;
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let index = index.min(self.entries.len());
        self.entries.insert(
            index,
            Entry {
                id,
                object: object.into(),
            },
        );
        debug!("Added object {id} at index {index}");
        self.emit(CanvasEvent::ObjectAdded { id, index });
        Ok(id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<DrawObject, CanvasError> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        if self.rotation.is_some_and(|g| g.id == id) {
            self.rotation = None;
        }
        self.emit(CanvasEvent::ObjectRemoved { id });
        Ok(entry.object)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.active = None;
        self.rotation = None;
        self.emit(CanvasEvent::Cleared);
    }

    pub fn index_of(&self, id: ObjectId) -> Result<usize, CanvasError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(CanvasError::ObjectNotFound(id))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&DrawObject> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.object)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut DrawObject> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| &mut e.object)
    }

    /// Objects bottom to top.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &DrawObject)> + '_ {
        self.entries.iter().map(|e| (e.id, &e.object))
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Writes a property on an object through its setter path.
    pub fn set(&mut self, id: ObjectId, property: Property) -> Result<(), CanvasError> {
        let object = self.get_mut(id).ok_or(CanvasError::ObjectNotFound(id))?;
        object.set(property)?;
        Ok(())
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: CanvasEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Tears the canvas down.
    ///
    /// The scene is dropped, `Disposed` is delivered, and listeners are
    /// released. Later additions fail with [`CanvasError::Disposed`].
    pub fn dispose(&mut self) {
        if !self.alive {
            return;
        }
        self.entries.clear();
        self.scratch = None;
        self.rotation = None;
        self.active = None;
        self.alive = false;
        self.emit(CanvasEvent::Disposed);
        self.listeners.clear();
        debug!("Canvas disposed");
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Splits the scene into `(normal, erasers)` indices, each in stack order.
    pub fn partition(&self) -> (Vec<usize>, Vec<usize>) {
        let (erasers, normal): (Vec<usize>, Vec<usize>) =
            (0..self.entries.len()).partition(|&i| self.entries[i].object.is_eraser());
        (normal, erasers)
    }

    /// Returns the scratch surface, allocating it when missing or stale.
    fn scratch_surface(&mut self) -> Option<cairo::ImageSurface> {
        let pixels = self.width as u64 * self.height as u64;
        if pixels == 0 {
            debug!(
                "Canvas {}x{} has no area, skipping scratch surface",
                self.width, self.height
            );
            return None;
        }
        if pixels > self.max_scratch_pixels {
            if !self.scratch_fallback_logged {
                warn!(
                    "Canvas {}x{} exceeds scratch budget of {} pixels, compositing directly",
                    self.width, self.height, self.max_scratch_pixels
                );
                self.scratch_fallback_logged = true;
            }
            return None;
        }

        let reusable = self
            .scratch
            .as_ref()
            .is_some_and(|s| s.width() == self.width && s.height() == self.height);
        if !reusable {
            match cairo::ImageSurface::create(cairo::Format::ARgb32, self.width, self.height) {
                Ok(surface) => self.scratch = Some(surface),
                Err(err) => {
                    if !self.scratch_fallback_logged {
                        warn!("Failed to allocate scratch surface, compositing directly: {err}");
                        self.scratch_fallback_logged = true;
                    }
                    self.scratch = None;
                }
            }
        }
        self.scratch.clone()
    }

    /// Draws every object bottom to top, applying erasers in place.
    fn render_layers(&mut self, ctx: &cairo::Context) {
        for entry in self.entries.iter_mut() {
            if entry.object.is_eraser() {
                apply_eraser_stroke(ctx, &mut entry.object);
            } else {
                render_object(ctx, &entry.object, false);
            }
        }
    }

    /// Renders the scene onto `target`, replacing its contents.
    ///
    /// Without a scratch surface the layers are drawn straight onto the
    /// target and the background is slid in underneath afterwards, which
    /// gives the same picture.
    pub fn render_scene(&mut self, target: &cairo::Context) -> Result<(), CanvasError> {
        let (normal, erasers) = self.partition();

        target.save()?;
        target.set_operator(cairo::Operator::Clear);
        target.paint()?;
        target.restore()?;

        match self.scratch_surface() {
            Some(scratch) => {
                {
                    let ctx = cairo::Context::new(&scratch)?;
                    ctx.set_operator(cairo::Operator::Clear);
                    ctx.paint()?;
                    ctx.set_operator(cairo::Operator::Over);
                    self.render_layers(&ctx);
                    ctx.status()?;
                }
                if let Some(background) = self.background {
                    fill_background(target, background);
                }
                target.save()?;
                target.set_source_surface(&scratch, 0.0, 0.0)?;
                target.paint()?;
                target.restore()?;
            }
            None => {
                self.render_layers(target);
                if let Some(background) = self.background {
                    target.save()?;
                    target.set_operator(cairo::Operator::DestOver);
                    background.apply(target);
                    target.paint()?;
                    target.restore()?;
                }
            }
        }
        target.status()?;

        self.emit(CanvasEvent::Rendered {
            objects: normal.len(),
            erasers: erasers.len(),
        });
        Ok(())
    }

    /// Renders the scene plus interactive overlays such as the edit icon of
    /// the active text object.
    pub fn render(&mut self, target: &cairo::Context) -> Result<(), CanvasError> {
        self.render_scene(target)?;
        if let Some(DrawObject::Text(text)) = self.active.and_then(|id| self.get(id)) {
            if text.props.visible && !text.is_editing() {
                render_edit_icon(target, text);
            }
        }
        Ok(())
    }

    /// Applies one eraser stroke to `ctx` immediately, for interactive erasing.
    pub fn apply_eraser(&mut self, ctx: &cairo::Context, id: ObjectId) -> Result<(), CanvasError> {
        let object = self.get_mut(id).ok_or(CanvasError::ObjectNotFound(id))?;
        if !object.is_eraser() {
            return Err(CanvasError::NotAnEraser(id));
        }
        apply_eraser_stroke(ctx, object);
        ctx.status()?;
        Ok(())
    }

    /// Renders the scene without overlays into a PNG file.
    pub fn export_png(&mut self, path: &Path) -> Result<(), CanvasError> {
        let surface =
            cairo::ImageSurface::create(cairo::Format::ARgb32, self.width.max(1), self.height.max(1))?;
        {
            let ctx = cairo::Context::new(&surface)?;
            self.render_scene(&ctx)?;
        }
        let mut file = std::fs::File::create(path).map_err(|source| CanvasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        surface.write_to_png(&mut file)?;
        debug!("Exported canvas to {}", path.display());
        Ok(())
    }

    // ========================================================================
    // Stacking order
    // ========================================================================

    fn overlaps_at(&self, object: &DrawObject, index: usize) -> bool {
        let other = &self.entries[index].object;
        !other.is_eraser() && object.intersects_with(other)
    }

    /// New index for moving the object at `idx` one step down.
    ///
    /// With `intersecting`, scans downwards for the nearest non-eraser
    /// sibling that overlaps the object and returns its index. When nothing
    /// below overlaps, `idx` itself is returned.
    pub fn find_new_lower_index(&self, idx: usize, intersecting: bool) -> usize {
        if idx >= self.entries.len() {
            return idx;
        }
        if !intersecting {
            return idx.saturating_sub(1);
        }
        let object = &self.entries[idx].object;
        (0..idx)
            .rev()
            .find(|&i| self.overlaps_at(object, i))
            .unwrap_or(idx)
    }

    /// New index for moving the object at `idx` one step up.
    ///
    /// Mirror image of [`CompositingCanvas::find_new_lower_index`].
    pub fn find_new_upper_index(&self, idx: usize, intersecting: bool) -> usize {
        let len = self.entries.len();
        if idx >= len {
            return idx;
        }
        if !intersecting {
            return (idx + 1).min(len - 1);
        }
        let object = &self.entries[idx].object;
        (idx + 1..len)
            .find(|&i| self.overlaps_at(object, i))
            .unwrap_or(idx)
    }

    fn move_entry(&mut self, id: ObjectId, from: usize, to: usize) -> usize {
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            debug!("Moved object {id} from {from} to {to}");
            self.emit(CanvasEvent::Reordered { id, from, to });
        }
        to
    }

    /// Moves an object up one step, or past the nearest overlapping sibling.
    ///
    /// Returns the object's new index.
    pub fn bring_forward(&mut self, id: ObjectId, intersecting: bool) -> Result<usize, CanvasError> {
        let idx = self.index_of(id)?;
        if idx + 1 == self.entries.len() {
            return Ok(idx);
        }
        let to = self.find_new_upper_index(idx, intersecting);
        Ok(self.move_entry(id, idx, to))
    }

    /// Moves an object down one step, or past the nearest overlapping sibling.
    pub fn send_backwards(&mut self, id: ObjectId, intersecting: bool) -> Result<usize, CanvasError> {
        let idx = self.index_of(id)?;
        if idx == 0 {
            return Ok(idx);
        }
        let to = self.find_new_lower_index(idx, intersecting);
        Ok(self.move_entry(id, idx, to))
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> Result<usize, CanvasError> {
        let idx = self.index_of(id)?;
        let top = self.entries.len() - 1;
        Ok(self.move_entry(id, idx, top))
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> Result<usize, CanvasError> {
        let idx = self.index_of(id)?;
        Ok(self.move_entry(id, idx, 0))
    }

    /// Moves an object to `index`, clamped to the stack.
    pub fn move_to(&mut self, id: ObjectId, index: usize) -> Result<usize, CanvasError> {
        let idx = self.index_of(id)?;
        let to = index.min(self.entries.len() - 1);
        Ok(self.move_entry(id, idx, to))
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Makes every object inert, remembering its previous flags.
    pub fn disable_selection(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.object.props_mut().suspend_selection();
        }
    }

    /// Restores the flags captured by [`CompositingCanvas::disable_selection`].
    pub fn restore_selection(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.object.props_mut().restore_selection();
        }
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    pub fn set_active(&mut self, id: Option<ObjectId>) -> Result<(), CanvasError> {
        if let Some(id) = id {
            let object = self.get(id).ok_or(CanvasError::ObjectNotFound(id))?;
            if !object.props().selectable {
                debug!("Ignoring activation of non-selectable object {id}");
                return Ok(());
            }
        }
        if let Some(previous) = self.active.filter(|previous| Some(*previous) != id) {
            if let Some(DrawObject::Text(text)) = self.get_mut(previous) {
                text.exit_editing();
            }
        }
        self.active = id;
        Ok(())
    }

    /// Topmost visible, evented, selectable object under `pointer`.
    pub fn find_target(&self, pointer: Point) -> Option<ObjectId> {
        self.entries
            .iter()
            .rev()
            .find(|entry| {
                let props = entry.object.props();
                props.visible
                    && props.evented
                    && props.selectable
                    && entry.object.coords().contains_point(pointer)
            })
            .map(|entry| entry.id)
    }

    /// Routes a pointer press.
    ///
    /// A press on the active text object's edit icon enters edit mode;
    /// anything else selects the object under the pointer, or clears the
    /// selection.
    pub fn on_pointer_down(&mut self, pointer: Point) -> PointerHit {
        if let Some(id) = self.active {
            if let Some(DrawObject::Text(text)) = self.get_mut(id) {
                if text.on_pointer_down(pointer) {
                    return PointerHit::EditText(id);
                }
            }
        }

        let target = self.find_target(pointer);
        if self.set_active(target).is_err() {
            return PointerHit::Nothing;
        }
        match target {
            Some(id) => PointerHit::Selected(id),
            None => PointerHit::Nothing,
        }
    }

    // ========================================================================
    // Rotation gesture
    // ========================================================================

    /// Starts a rotation drag on an object around its center.
    ///
    /// Returns false, without starting a gesture, if the object's rotation is locked.
    pub fn begin_rotation(&mut self, id: ObjectId, pointer: Point) -> Result<bool, CanvasError> {
        let object = self.get(id).ok_or(CanvasError::ObjectNotFound(id))?;
        let props = object.props();
        if props.lock_rotation {
            return Ok(false);
        }
        let (w, h) = object.dimensions();
        self.rotation = Some(RotationGesture {
            id,
            pivot: props.center(w, h),
            start: pointer,
            start_angle: props.angle,
            last_pointer: pointer,
        });
        Ok(true)
    }

    /// Updates the active rotation drag.
    ///
    /// Returns the applied angle in `[0, 360)`, or `None` when no gesture is
    /// running or the object's rotation is locked.
    pub fn rotate_to(&mut self, pointer: Point) -> Result<Option<f64>, CanvasError> {
        let Some(gesture) = self.rotation else {
            return Ok(None);
        };
        let Some(object) = self.get_mut(gesture.id) else {
            self.rotation = None;
            return Err(CanvasError::ObjectNotFound(gesture.id));
        };
        if object.props().lock_rotation {
            return Ok(None);
        }

        let raw = util::drag_rotation_angle(gesture.pivot, gesture.start, pointer, gesture.start_angle);
        object.set(Property::Angle(raw))?;
        let angle = object.props().angle;
        if let Some(g) = self.rotation.as_mut() {
            g.last_pointer = pointer;
        }
        self.emit(CanvasEvent::Rotated {
            id: gesture.id,
            angle,
        });
        Ok(Some(angle))
    }

    /// Last pointer position accepted by the running rotation gesture.
    pub fn rotation_pointer(&self) -> Option<Point> {
        self.rotation.map(|g| g.last_pointer)
    }

    /// Ends the rotation drag, returning the rotated object.
    pub fn end_rotation(&mut self) -> Option<ObjectId> {
        self.rotation.take().map(|g| g.id)
    }
}

impl fmt::Debug for CompositingCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositingCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("background", &self.background)
            .field("objects", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .field("alive", &self.alive)
            .field("has_scratch", &self.scratch.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::eraser::EraserPath;
    use crate::draw::path::PathCommand;
    use crate::draw::polygon::RectShape;
    use crate::draw::props::ObjectProps;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect(left: f64, top: f64, size: f64) -> DrawObject {
        RectShape::new(size, size, ObjectProps::at(left, top)).unwrap().into()
    }

    fn eraser(from: Point, to: Point) -> DrawObject {
        EraserPath::new(
            vec![PathCommand::MoveTo(from), PathCommand::LineTo(to)],
            ObjectProps::default(),
        )
        .unwrap()
        .into()
    }

    /// `[A, B, C]` where only A and C overlap.
    fn abc() -> (CompositingCanvas, [ObjectId; 3]) {
        let mut canvas = CompositingCanvas::new(200, 200);
        let a = canvas.add(rect(0.0, 0.0, 10.0)).unwrap();
        let b = canvas.add(rect(100.0, 100.0, 10.0)).unwrap();
        let c = canvas.add(rect(5.0, 5.0, 10.0)).unwrap();
        (canvas, [a, b, c])
    }

    #[test]
    fn partition_never_puts_erasers_in_normal() {
        let mut canvas = CompositingCanvas::new(50, 50);
        canvas.add(rect(0.0, 0.0, 5.0)).unwrap();
        canvas.add(eraser(Point::new(0.0, 0.0), Point::new(5.0, 5.0))).unwrap();
        canvas.add(rect(1.0, 1.0, 5.0)).unwrap();
        canvas.add(eraser(Point::new(1.0, 0.0), Point::new(2.0, 5.0))).unwrap();

        let (normal, erasers) = canvas.partition();
        assert_eq!(normal, vec![0, 2]);
        assert_eq!(erasers, vec![1, 3]);
        let ids = canvas.ids();
        assert!(normal.iter().all(|&i| !canvas.get(ids[i]).unwrap().is_eraser()));
    }

    #[test]
    fn upper_index_skips_non_overlapping_sibling() {
        let (canvas, _) = abc();
        assert_eq!(canvas.find_new_upper_index(0, true), 2);
        assert_eq!(canvas.find_new_upper_index(0, false), 1);
    }

    #[test]
    fn lower_index_skips_non_overlapping_sibling() {
        let (canvas, _) = abc();
        assert_eq!(canvas.find_new_lower_index(2, true), 0);
        assert_eq!(canvas.find_new_lower_index(2, false), 1);
    }

    #[test]
    fn no_overlapping_sibling_keeps_index() {
        // Falls back to the starting index rather than a one-step move.
        let (canvas, _) = abc();
        assert_eq!(canvas.find_new_upper_index(1, true), 1);
        assert_eq!(canvas.find_new_lower_index(1, true), 1);
    }

    #[test]
    fn erasers_do_not_stop_the_scan() {
        let mut canvas = CompositingCanvas::new(200, 200);
        canvas.add(rect(0.0, 0.0, 10.0)).unwrap();
        canvas.add(eraser(Point::new(0.0, 0.0), Point::new(10.0, 10.0))).unwrap();
        canvas.add(rect(5.0, 5.0, 10.0)).unwrap();
        assert_eq!(canvas.find_new_upper_index(0, true), 2);
    }

    #[test]
    fn containment_counts_as_overlap() {
        let mut canvas = CompositingCanvas::new(200, 200);
        canvas.add(rect(40.0, 40.0, 5.0)).unwrap();
        canvas.add(rect(150.0, 150.0, 5.0)).unwrap();
        canvas.add(rect(0.0, 0.0, 100.0)).unwrap();
        assert_eq!(canvas.find_new_upper_index(0, true), 2);
        assert_eq!(canvas.find_new_lower_index(2, true), 0);
    }

    #[test]
    fn bring_forward_preserves_other_order() {
        let (mut canvas, [a, b, c]) = abc();
        assert_eq!(canvas.bring_forward(a, true).unwrap(), 2);
        assert_eq!(canvas.ids(), vec![b, c, a]);

        assert_eq!(canvas.send_backwards(a, false).unwrap(), 1);
        assert_eq!(canvas.ids(), vec![b, a, c]);

        canvas.send_to_back(c).unwrap();
        assert_eq!(canvas.ids(), vec![c, b, a]);
        canvas.bring_to_front(c).unwrap();
        assert_eq!(canvas.ids(), vec![b, a, c]);
        canvas.move_to(c, 0).unwrap();
        assert_eq!(canvas.ids(), vec![c, b, a]);
    }

    #[test]
    fn moves_at_the_edges_are_no_ops() {
        let (mut canvas, [a, _, c]) = abc();
        assert_eq!(canvas.send_backwards(a, false).unwrap(), 0);
        assert_eq!(canvas.bring_forward(c, false).unwrap(), 2);
    }

    #[test]
    fn unknown_object_is_an_error() {
        let (mut canvas, [a, _, _]) = abc();
        canvas.remove(a).unwrap();
        assert!(matches!(
            canvas.bring_forward(a, true),
            Err(CanvasError::ObjectNotFound(id)) if id == a
        ));
        assert!(matches!(canvas.send_backwards(a, false), Err(CanvasError::ObjectNotFound(_))));
        assert!(matches!(canvas.remove(a), Err(CanvasError::ObjectNotFound(_))));
    }

    #[test]
    fn disable_twice_then_restore_recovers_flags() {
        let mut canvas = CompositingCanvas::new(100, 100);
        let mut props = ObjectProps::default();
        props.evented = false;
        let quiet = canvas
            .add(RectShape::new(5.0, 5.0, props).unwrap())
            .unwrap();
        let normal = canvas.add(rect(0.0, 0.0, 5.0)).unwrap();

        canvas.disable_selection();
        canvas.disable_selection();
        for (_, object) in canvas.objects() {
            assert!(!object.props().evented);
            assert!(!object.props().selectable);
        }

        canvas.restore_selection();
        let q = canvas.get(quiet).unwrap().props();
        assert!(!q.evented);
        assert!(q.selectable);
        let n = canvas.get(normal).unwrap().props();
        assert!(n.evented && n.selectable);
    }

    #[test]
    fn rotation_wraps_negative_angles() {
        let mut canvas = CompositingCanvas::new(100, 100);
        let id = canvas.add(rect(40.0, 40.0, 20.0)).unwrap();
        let pivot = Point::new(50.0, 50.0);

        assert!(canvas.begin_rotation(id, Point::new(pivot.x + 10.0, pivot.y)).unwrap());
        let (sin, cos) = (-30.0_f64).to_radians().sin_cos();
        let angle = canvas
            .rotate_to(Point::new(pivot.x + 10.0 * cos, pivot.y + 10.0 * sin))
            .unwrap()
            .unwrap();
        assert!((angle - 330.0).abs() < 1e-9);
        assert!((canvas.get(id).unwrap().props().angle - 330.0).abs() < 1e-9);
        assert_eq!(canvas.end_rotation(), Some(id));
    }

    #[test]
    fn locked_rotation_is_a_no_op() {
        let mut canvas = CompositingCanvas::new(100, 100);
        let id = canvas.add(rect(40.0, 40.0, 20.0)).unwrap();
        let start = Point::new(60.0, 50.0);
        assert!(canvas.begin_rotation(id, start).unwrap());

        canvas.set(id, Property::LockRotation(true)).unwrap();
        assert_eq!(canvas.rotate_to(Point::new(50.0, 60.0)).unwrap(), None);
        assert_eq!(canvas.get(id).unwrap().props().angle, 0.0);
        assert_eq!(canvas.rotation_pointer(), Some(start));

        canvas.end_rotation();
        assert!(!canvas.begin_rotation(id, start).unwrap());
        assert_eq!(canvas.rotate_to(Point::new(50.0, 60.0)).unwrap(), None);
    }

    #[test]
    fn listeners_see_events_until_unsubscribed() {
        let mut canvas = CompositingCanvas::new(10, 10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener = canvas.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let id = canvas.add(rect(0.0, 0.0, 1.0)).unwrap();
        canvas.remove(id).unwrap();
        assert!(canvas.unsubscribe(listener));
        canvas.clear();

        assert_eq!(
            *seen.borrow(),
            vec![
                CanvasEvent::ObjectAdded { id, index: 0 },
                CanvasEvent::ObjectRemoved { id },
            ]
        );
        assert!(!canvas.unsubscribe(listener));
    }

    #[test]
    fn dispose_drops_scene_and_refuses_additions() {
        let mut canvas = CompositingCanvas::new(10, 10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        canvas.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        canvas.add(rect(0.0, 0.0, 1.0)).unwrap();

        canvas.dispose();
        assert!(!canvas.is_alive());
        assert!(canvas.is_empty());
        assert!(matches!(canvas.add(rect(0.0, 0.0, 1.0)), Err(CanvasError::Disposed)));
        assert_eq!(seen.borrow().last(), Some(&CanvasEvent::Disposed));
    }

    #[test]
    fn render_reports_partition_sizes() {
        let mut canvas = CompositingCanvas::new(20, 20);
        canvas.add(rect(0.0, 0.0, 5.0)).unwrap();
        canvas.add(eraser(Point::new(0.0, 0.0), Point::new(5.0, 5.0))).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        canvas.subscribe(move |e| {
            if let CanvasEvent::Rendered { objects, erasers } = e {
                *sink.borrow_mut() = Some((*objects, *erasers));
            }
        });

        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 20, 20).unwrap();
        let ctx = cairo::Context::new(&surface).unwrap();
        canvas.render(&ctx).unwrap();
        assert_eq!(*seen.borrow(), Some((1, 1)));

        let ids = canvas.ids();
        assert!(!canvas.get(ids[1]).unwrap().props().visible);
    }

    #[test]
    fn apply_eraser_rejects_other_objects() {
        let (mut canvas, [a, _, _]) = abc();
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 4, 4).unwrap();
        let ctx = cairo::Context::new(&surface).unwrap();
        assert!(matches!(canvas.apply_eraser(&ctx, a), Err(CanvasError::NotAnEraser(_))));
    }

    #[test]
    fn pointer_selects_topmost_object() {
        let mut canvas = CompositingCanvas::new(100, 100);
        let _below = canvas.add(rect(0.0, 0.0, 50.0)).unwrap();
        let above = canvas.add(rect(20.0, 20.0, 50.0)).unwrap();
        assert_eq!(
            canvas.on_pointer_down(Point::new(30.0, 30.0)),
            PointerHit::Selected(above)
        );
        assert_eq!(canvas.active(), Some(above));

        assert_eq!(canvas.on_pointer_down(Point::new(95.0, 5.0)), PointerHit::Nothing);
        assert_eq!(canvas.active(), None);
    }

    #[test]
    fn pointer_ignores_inert_objects() {
        let mut canvas = CompositingCanvas::new(100, 100);
        canvas.add(rect(0.0, 0.0, 50.0)).unwrap();
        canvas.disable_selection();
        assert_eq!(canvas.find_target(Point::new(10.0, 10.0)), None);
        canvas.restore_selection();
        assert!(canvas.find_target(Point::new(10.0, 10.0)).is_some());
    }

    #[test]
    fn edit_icon_press_enters_editing() {
        use crate::draw::font::FontDescriptor;
        use crate::draw::text::TextShape;

        let mut canvas = CompositingCanvas::new(300, 300);
        let text = TextShape::new(
            "hello",
            FontDescriptor::default(),
            24.0,
            ObjectProps::at(50.0, 50.0),
        )
        .unwrap();
        let icon = text.edit_icon_center();
        let id = canvas.add(text).unwrap();
        canvas.set_active(Some(id)).unwrap();

        assert_eq!(canvas.on_pointer_down(icon), PointerHit::EditText(id));
        match canvas.get(id) {
            Some(DrawObject::Text(text)) => assert!(text.is_editing()),
            other => panic!("expected text, got {other:?}"),
        }

        canvas.set_active(None).unwrap();
        match canvas.get(id) {
            Some(DrawObject::Text(text)) => assert!(!text.is_editing()),
            other => panic!("expected text, got {other:?}"),
        }
    }

    fn dot(x: f64, y: f64) -> DrawObject {
        use crate::draw::polygon::PolygonShape;
        PolygonShape::new(vec![vec![Point::new(x, y)]], ObjectProps::default())
            .unwrap()
            .into()
    }

    #[test]
    fn single_point_does_not_overlap_distant_objects() {
        let mut canvas = CompositingCanvas::new(200, 200);
        let d = canvas.add(dot(20.0, 20.0)).unwrap();
        let far = canvas.add(rect(150.0, 150.0, 10.0)).unwrap();
        let cover = canvas.add(rect(10.0, 10.0, 20.0)).unwrap();

        assert_eq!(canvas.find_new_upper_index(0, true), 2);
        assert_eq!(canvas.find_new_lower_index(2, true), 0);
        assert_eq!(canvas.find_new_lower_index(1, true), 1);

        canvas.remove(cover).unwrap();
        assert_eq!(canvas.find_new_upper_index(0, true), 0);
        assert_eq!(canvas.bring_forward(d, true).unwrap(), 0);
        assert_eq!(canvas.ids(), [d, far]);
    }

    #[test]
    fn pointer_far_from_a_single_point_selects_nothing() {
        let mut canvas = CompositingCanvas::new(200, 200);
        let d = canvas.add(dot(20.0, 20.0)).unwrap();
        canvas.add(rect(150.0, 150.0, 10.0)).unwrap();

        assert_eq!(canvas.on_pointer_down(Point::new(100.0, 100.0)), PointerHit::Nothing);
        assert_eq!(canvas.find_target(Point::new(21.0, 21.0)), None);
        assert_eq!(canvas.find_target(Point::new(20.0, 20.0)), Some(d));
    }

    #[test]
    fn empty_canvas_is_not_reported_over_budget() {
        let mut canvas = CompositingCanvas::new(0, 0);
        canvas.add(rect(0.0, 0.0, 10.0)).unwrap();
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1).unwrap();
        let ctx = cairo::Context::new(&surface).unwrap();

        assert!(canvas.scratch_surface().is_none());
        canvas.render_scene(&ctx).unwrap();
        assert!(!canvas.scratch_fallback_logged);

        let mut tight = CompositingCanvas::with_options(CanvasOptions {
            width: 20,
            height: 20,
            max_scratch_pixels: 100,
            ..CanvasOptions::default()
        });
        assert!(tight.scratch_surface().is_none());
        assert!(tight.scratch_fallback_logged);
    }
}
