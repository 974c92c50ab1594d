//! Properties shared by every drawable object.

use super::color::Color;
use super::geometry::{Point, Quad};
use serde::{Deserialize, Serialize};

/// Position, transform, paint and interaction state common to all objects.
///
/// `left`/`top` locate the top-left corner of the object's unrotated, scaled
/// box; rotation is applied around the box center.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectProps {
    pub left: f64,
    pub top: f64,
    /// Rotation in degrees, always within `[0, 360)` once set through [`Property::Angle`].
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub visible: bool,
    pub selectable: bool,
    pub evented: bool,
    pub lock_rotation: bool,
    /// Whether the object may be rendered through a cached bitmap.
    pub object_caching: bool,

    /// `(evented, selectable)` captured by [`ObjectProps::suspend_selection`].
    #[serde(skip)]
    pub(crate) selection_snapshot: Option<(bool, bool)>,
    /// Canvas-space corners, refreshed whenever a property goes through `set`.
    #[serde(skip)]
    pub(crate) coords: Quad,
}

impl Default for ObjectProps {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            visible: true,
            selectable: true,
            evented: true,
            lock_rotation: false,
            object_caching: true,
            selection_snapshot: None,
            coords: Quad::default(),
        }
    }
}

impl ObjectProps {
    /// Properties positioned at the given top-left corner.
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Color, width: f64) -> Self {
        self.stroke = Some(stroke);
        self.stroke_width = width;
        self
    }

    /// Center of an object of the given intrinsic size, in canvas coordinates.
    pub fn center(&self, width: f64, height: f64) -> Point {
        Point::new(
            self.left + width * self.scale_x / 2.0,
            self.top + height * self.scale_y / 2.0,
        )
    }

    /// Recomputes the cached corner coordinates for the given intrinsic size.
    pub fn set_coords(&mut self, width: f64, height: f64) {
        self.coords = Quad::from_center(
            self.center(width, height),
            width,
            height,
            self.scale_x,
            self.scale_y,
            self.angle,
        );
    }

    pub fn coords(&self) -> &Quad {
        &self.coords
    }

    /// Snapshots `evented`/`selectable` and forces both off.
    ///
    /// A second call before [`ObjectProps::restore_selection`] keeps the first snapshot.
    pub fn suspend_selection(&mut self) {
        if self.selection_snapshot.is_none() {
            self.selection_snapshot = Some((self.evented, self.selectable));
        }
        self.evented = false;
        self.selectable = false;
    }

    /// Puts back the values captured by [`ObjectProps::suspend_selection`].
    pub fn restore_selection(&mut self) {
        if let Some((evented, selectable)) = self.selection_snapshot.take() {
            self.evented = evented;
            self.selectable = selectable;
        }
    }

    pub fn selection_suspended(&self) -> bool {
        self.selection_snapshot.is_some()
    }

    /// Applies a scalar property that does not affect derived geometry.
    ///
    /// Returns the property back when it is a dimension that the owning shape
    /// has to handle itself.
    pub(crate) fn apply(&mut self, property: Property) -> Option<Property> {
        match property {
            Property::Left(v) => self.left = v,
            Property::Top(v) => self.top = v,
            Property::Angle(v) => self.angle = normalize_angle(v),
            Property::ScaleX(v) => self.scale_x = v,
            Property::ScaleY(v) => self.scale_y = v,
            Property::Fill(v) => self.fill = v,
            Property::Stroke(v) => self.stroke = v,
            Property::StrokeWidth(v) => self.stroke_width = v.max(0.0),
            Property::Opacity(v) => self.opacity = v.clamp(0.0, 1.0),
            Property::Visible(v) => self.visible = v,
            Property::Selectable(v) => self.selectable = v,
            Property::Evented(v) => self.evented = v,
            Property::LockRotation(v) => self.lock_rotation = v,
            dimension @ (Property::Width(_) | Property::Height(_) | Property::Radius(_)) => {
                return Some(dimension);
            }
        }
        None
    }
}

/// A single property write routed through [`crate::draw::DrawObject::set`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Property {
    Left(f64),
    Top(f64),
    Angle(f64),
    ScaleX(f64),
    ScaleY(f64),
    Width(f64),
    Height(f64),
    Radius(f64),
    Fill(Option<Color>),
    Stroke(Option<Color>),
    StrokeWidth(f64),
    Opacity(f64),
    Visible(bool),
    Selectable(bool),
    Evented(bool),
    LockRotation(bool),
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    let wrapped = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // Tiny negative inputs round up to exactly 360.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
