//! Segmentable polygon geometry and the closed shapes built on it.
//!
//! A polygon stores one or more point segments. Points start in canvas
//! coordinates; [`PolygonGeometry::apply_point_offset`] moves them once into
//! a local frame centred on the bounding box. Rectangles, circles and
//! triangles generate their segments already centred and regenerate them
//! whenever one of their scalar dimensions is written.

use super::erasable::{Erasable, FromObject, ShapeError, check_dimension};
use super::geometry::{BoundingBox, Point, bounding_box_of_segments};
use super::props::{ObjectProps, Property};
use serde::{Deserialize, Serialize};

/// Number of vertices used to approximate a circle outline.
pub const CIRCLE_VERTICES: usize = 72;

/// Point segments with their bounding box and centring state.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonGeometry {
    segments: Vec<Vec<Point>>,
    bbox: BoundingBox,
    /// Translation subtracted from the points by the centring offset, once applied.
    applied_offset: Option<Point>,
}

impl PolygonGeometry {
    /// Validates the segments and computes their bounding box.
    ///
    /// Points are left in the coordinates they were given in.
    pub fn new(kind: &'static str, segments: Vec<Vec<Point>>) -> Result<Self, ShapeError> {
        if segments.is_empty() {
            return Err(ShapeError::NoSegments { kind });
        }
        if let Some(index) = segments.iter().position(|s| s.is_empty()) {
            return Err(ShapeError::EmptySegment { kind, index });
        }
        let bbox = bounding_box_of_segments(&segments).ok_or(ShapeError::NoSegments { kind })?;
        Ok(Self {
            segments,
            bbox,
            applied_offset: None,
        })
    }

    /// A single two-point segment; cannot be empty so needs no validation.
    pub(crate) fn segment(a: Point, b: Point) -> Self {
        Self {
            segments: vec![vec![a, b]],
            bbox: BoundingBox::from_min_max(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y)),
            applied_offset: None,
        }
    }

    /// Geometry whose points are already expressed around the local origin.
    fn centered(kind: &'static str, segments: Vec<Vec<Point>>) -> Result<Self, ShapeError> {
        let mut geometry = Self::new(kind, segments)?;
        geometry.applied_offset = Some(Point::default());
        Ok(geometry)
    }

    /// Recomputes the bounding box from the current points.
    pub fn calc_dimensions(&mut self) -> BoundingBox {
        if let Some(bbox) = bounding_box_of_segments(&self.segments) {
            self.bbox = bbox;
        }
        self.bbox
    }

    /// Bounding box from the last computation.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn width(&self) -> f64 {
        self.bbox.width
    }

    pub fn height(&self) -> f64 {
        self.bbox.height
    }

    pub fn segments(&self) -> &[Vec<Point>] {
        &self.segments
    }

    /// Moves every point so the bounding box is centred on the origin.
    ///
    /// Runs at most once per point set; later calls return `false` and leave
    /// the points untouched.
    pub fn apply_point_offset(&mut self) -> bool {
        if self.applied_offset.is_some() {
            return false;
        }
        let center = self.bbox.center();
        for point in self.segments.iter_mut().flatten() {
            *point = point.offset(-center.x, -center.y);
        }
        self.bbox.min_x -= center.x;
        self.bbox.min_y -= center.y;
        self.applied_offset = Some(center);
        true
    }

    pub fn offset_applied(&self) -> bool {
        self.applied_offset.is_some()
    }

    /// Translation removed by the centring offset, if it has run.
    pub fn applied_offset(&self) -> Option<Point> {
        self.applied_offset
    }

    /// Total number of points across all segments.
    pub fn complexity(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// A lone point, drawn as a dot while a polygon is still being placed.
    pub fn is_single_point(&self) -> bool {
        self.complexity() == 1
    }

    /// Points translated back out of the local frame so the local origin lands on `center`.
    pub fn to_canvas(&self, center: Point) -> Vec<Vec<Point>> {
        self.segments
            .iter()
            .map(|segment| {
                segment
                    .iter()
                    .map(|p| p.offset(center.x, center.y))
                    .collect()
            })
            .collect()
    }
}

fn unscaled_center(props: &ObjectProps, width: f64, height: f64) -> Point {
    Point::new(props.left + width / 2.0, props.top + height / 2.0)
}

// ============================================================================
// Free-form polygon
// ============================================================================

/// Closed polygon with one or more contours.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonShape {
    pub props: ObjectProps,
    geometry: PolygonGeometry,
}

/// Serialized polygon: contours in canvas coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonData {
    pub points: Vec<Vec<Point>>,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl PolygonShape {
    /// Builds a polygon from canvas-space contours.
    ///
    /// The object is positioned at the contours' bounding box and the points
    /// are centred into the local frame.
    pub fn new(segments: Vec<Vec<Point>>, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let mut geometry = PolygonGeometry::new(Self::TYPE_NAME, segments)?;
        let bbox = geometry.bbox();
        props.left = bbox.min_x;
        props.top = bbox.min_y;
        geometry.apply_point_offset();
        props.set_coords(bbox.width, bbox.height);
        Ok(Self { props, geometry })
    }

    pub fn geometry(&self) -> &PolygonGeometry {
        &self.geometry
    }

    /// Re-runs the centring offset; a no-op once it has been applied.
    pub fn apply_point_offset(&mut self) -> bool {
        self.geometry.apply_point_offset()
    }

    pub fn complexity(&self) -> usize {
        self.geometry.complexity()
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.geometry.width(), self.geometry.height())
    }
}

impl Erasable for PolygonShape {
    const TYPE_NAME: &'static str = "polygon";
    type Data = PolygonData;

    fn to_object(&self) -> PolygonData {
        let (w, h) = self.dimensions();
        PolygonData {
            points: self.geometry.to_canvas(unscaled_center(&self.props, w, h)),
            props: self.props.clone(),
        }
    }
}

impl FromObject for PolygonShape {
    fn from_object(data: PolygonData) -> Result<Self, ShapeError> {
        let mut shape = Self::new(data.points, data.props.clone())?;
        // Position and transform come from the record, not the contour bounds.
        shape.props = data.props;
        let (w, h) = shape.dimensions();
        shape.props.set_coords(w, h);
        Ok(shape)
    }
}

// ============================================================================
// Procedural shapes
// ============================================================================

fn rect_segments(width: f64, height: f64) -> Vec<Vec<Point>> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    vec![vec![
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]]
}

fn triangle_segments(width: f64, height: f64) -> Vec<Vec<Point>> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    vec![vec![
        Point::new(0.0, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]]
}

fn circle_segments(radius: f64) -> Vec<Vec<Point>> {
    let step = std::f64::consts::TAU / CIRCLE_VERTICES as f64;
    vec![
        (0..CIRCLE_VERTICES)
            .map(|i| {
                let (sin, cos) = (step * i as f64).sin_cos();
                Point::new(radius * cos, radius * sin)
            })
            .collect(),
    ]
}

/// Rectangle whose corner points always match `width`×`height`.
#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    pub props: ObjectProps,
    width: f64,
    height: f64,
    geometry: PolygonGeometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectData {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl RectShape {
    pub fn new(width: f64, height: f64, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let width = check_dimension(Self::TYPE_NAME, "width", width)?;
        let height = check_dimension(Self::TYPE_NAME, "height", height)?;
        let geometry = PolygonGeometry::centered(Self::TYPE_NAME, rect_segments(width, height))?;
        props.set_coords(width, height);
        Ok(Self {
            props,
            width,
            height,
            geometry,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn geometry(&self) -> &PolygonGeometry {
        &self.geometry
    }

    /// Handles `width`/`height` writes by regenerating the corner points.
    pub(crate) fn set_dimension(&mut self, property: Property) -> Result<(), ShapeError> {
        match property {
            Property::Width(v) => self.width = check_dimension(Self::TYPE_NAME, "width", v)?,
            Property::Height(v) => self.height = check_dimension(Self::TYPE_NAME, "height", v)?,
            Property::Radius(_) => {
                return Err(ShapeError::UnsupportedProperty {
                    kind: Self::TYPE_NAME,
                    property: "radius",
                });
            }
            _ => return Ok(()),
        }
        self.geometry =
            PolygonGeometry::centered(Self::TYPE_NAME, rect_segments(self.width, self.height))?;
        Ok(())
    }
}

impl Erasable for RectShape {
    const TYPE_NAME: &'static str = "rect";
    type Data = RectData;

    fn to_object(&self) -> RectData {
        RectData {
            width: self.width,
            height: self.height,
            props: self.props.clone(),
        }
    }
}

impl FromObject for RectShape {
    fn from_object(data: RectData) -> Result<Self, ShapeError> {
        Self::new(data.width, data.height, data.props)
    }
}

/// Isosceles triangle pointing up, inscribed in `width`×`height`.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleShape {
    pub props: ObjectProps,
    width: f64,
    height: f64,
    geometry: PolygonGeometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleData {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl TriangleShape {
    pub fn new(width: f64, height: f64, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let width = check_dimension(Self::TYPE_NAME, "width", width)?;
        let height = check_dimension(Self::TYPE_NAME, "height", height)?;
        let geometry =
            PolygonGeometry::centered(Self::TYPE_NAME, triangle_segments(width, height))?;
        props.set_coords(width, height);
        Ok(Self {
            props,
            width,
            height,
            geometry,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn geometry(&self) -> &PolygonGeometry {
        &self.geometry
    }

    pub(crate) fn set_dimension(&mut self, property: Property) -> Result<(), ShapeError> {
        match property {
            Property::Width(v) => self.width = check_dimension(Self::TYPE_NAME, "width", v)?,
            Property::Height(v) => self.height = check_dimension(Self::TYPE_NAME, "height", v)?,
            Property::Radius(_) => {
                return Err(ShapeError::UnsupportedProperty {
                    kind: Self::TYPE_NAME,
                    property: "radius",
                });
            }
            _ => return Ok(()),
        }
        self.geometry =
            PolygonGeometry::centered(Self::TYPE_NAME, triangle_segments(self.width, self.height))?;
        Ok(())
    }
}

impl Erasable for TriangleShape {
    const TYPE_NAME: &'static str = "triangle";
    type Data = TriangleData;

    fn to_object(&self) -> TriangleData {
        TriangleData {
            width: self.width,
            height: self.height,
            props: self.props.clone(),
        }
    }
}

impl FromObject for TriangleShape {
    fn from_object(data: TriangleData) -> Result<Self, ShapeError> {
        Self::new(data.width, data.height, data.props)
    }
}

/// Circle approximated by [`CIRCLE_VERTICES`] points.
///
/// Writing `width` or `height` sets the radius to half the value.
#[derive(Clone, Debug, PartialEq)]
pub struct CircleShape {
    pub props: ObjectProps,
    radius: f64,
    geometry: PolygonGeometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleData {
    pub radius: f64,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl CircleShape {
    pub fn new(radius: f64, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let radius = check_dimension(Self::TYPE_NAME, "radius", radius)?;
        let geometry = PolygonGeometry::centered(Self::TYPE_NAME, circle_segments(radius))?;
        props.set_coords(radius * 2.0, radius * 2.0);
        Ok(Self {
            props,
            radius,
            geometry,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn geometry(&self) -> &PolygonGeometry {
        &self.geometry
    }

    pub(crate) fn set_dimension(&mut self, property: Property) -> Result<(), ShapeError> {
        let radius = match property {
            Property::Radius(v) => v,
            Property::Width(v) | Property::Height(v) => v / 2.0,
            _ => return Ok(()),
        };
        self.radius = check_dimension(Self::TYPE_NAME, "radius", radius)?;
        self.geometry = PolygonGeometry::centered(Self::TYPE_NAME, circle_segments(self.radius))?;
        Ok(())
    }
}

impl Erasable for CircleShape {
    const TYPE_NAME: &'static str = "circle";
    type Data = CircleData;

    fn to_object(&self) -> CircleData {
        CircleData {
            radius: self.radius,
            props: self.props.clone(),
        }
    }
}

impl FromObject for CircleShape {
    fn from_object(data: CircleData) -> Result<Self, ShapeError> {
        Self::new(data.radius, data.props)
    }
}
