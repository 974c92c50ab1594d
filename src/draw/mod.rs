//! Drawable objects and the compositing canvas (Cairo-based).
//!
//! - [`DrawObject`]: every kind of object a scene can hold, with its
//!   serialised form [`ObjectData`]
//! - [`EraserPath`]: strokes that remove coverage from objects beneath them
//! - [`CompositingCanvas`]: the ordered scene, its compositing pass and the
//!   z-order and rotation operations
//! - Rendering functions for Cairo-based output

pub mod canvas;
pub mod color;
pub mod erasable;
pub mod eraser;
pub mod font;
pub mod geometry;
pub mod image;
pub mod line;
pub mod object;
pub mod path;
pub mod polygon;
pub mod props;
pub mod render;
pub mod text;

pub use canvas::{
    CanvasError, CanvasEvent, CanvasOptions, CompositingCanvas, ListenerId, ObjectId,
    PointerHit, apply_eraser_stroke,
};
pub use color::Color;
pub use erasable::{Erasable, ShapeError};
pub use eraser::EraserPath;
pub use font::FontDescriptor;
pub use geometry::{BoundingBox, Point, Quad};
pub use image::ImageShape;
pub use line::{ArrowShape, LineShape};
pub use object::{DrawObject, ObjectData};
pub use path::{PathCommand, PathShape};
pub use polygon::{CircleShape, PolygonShape, RectShape, TriangleShape};
pub use props::{ObjectProps, Property};
pub use render::{fill_background, render_object};
pub use text::TextShape;

// Re-export color constants for public API
#[allow(unused_imports)]
pub use color::{BLACK, BLUE, GREEN, RED, TRANSPARENT, WHITE};
