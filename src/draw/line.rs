//! Open polylines and arrows.

use super::erasable::{Erasable, FromObject, ShapeError};
use super::geometry::Point;
use super::polygon::PolygonGeometry;
use super::props::ObjectProps;
use crate::util;
use serde::{Deserialize, Serialize};

/// Open polyline sharing the polygon bounding-box and centring logic.
///
/// Segments are never implicitly closed when rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct LineShape {
    pub props: ObjectProps,
    geometry: PolygonGeometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub points: Vec<Vec<Point>>,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl LineShape {
    pub fn new(segments: Vec<Vec<Point>>, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let mut geometry = PolygonGeometry::new(Self::TYPE_NAME, segments)?;
        let bbox = geometry.bbox();
        props.left = bbox.min_x;
        props.top = bbox.min_y;
        geometry.apply_point_offset();
        props.set_coords(bbox.width, bbox.height);
        Ok(Self { props, geometry })
    }

    fn two_point(a: Point, b: Point, mut props: ObjectProps) -> Self {
        let mut geometry = PolygonGeometry::segment(a, b);
        let bbox = geometry.bbox();
        props.left = bbox.min_x;
        props.top = bbox.min_y;
        geometry.apply_point_offset();
        props.set_coords(bbox.width, bbox.height);
        Self { props, geometry }
    }

    /// Single straight segment from `(x1, y1)` to `(x2, y2)`.
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64, props: ObjectProps) -> Self {
        Self::two_point(Point::new(x1, y1), Point::new(x2, y2), props)
    }

    pub fn geometry(&self) -> &PolygonGeometry {
        &self.geometry
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.geometry.width(), self.geometry.height())
    }

    pub fn complexity(&self) -> usize {
        self.geometry.complexity()
    }

    /// Canvas-space segments, ignoring scale and rotation.
    pub fn canvas_points(&self) -> Vec<Vec<Point>> {
        let (w, h) = self.dimensions();
        self.geometry
            .to_canvas(Point::new(self.props.left + w / 2.0, self.props.top + h / 2.0))
    }

    /// Endpoints of a two-point line, in canvas space.
    pub fn coords(&self) -> Option<(Point, Point)> {
        match self.canvas_points().as_slice() {
            [segment] if segment.len() == 2 => Some((segment[0], segment[1])),
            _ => None,
        }
    }

    pub fn x1(&self) -> Option<f64> {
        self.coords().map(|(a, _)| a.x)
    }

    pub fn y1(&self) -> Option<f64> {
        self.coords().map(|(a, _)| a.y)
    }

    pub fn x2(&self) -> Option<f64> {
        self.coords().map(|(_, b)| b.x)
    }

    pub fn y2(&self) -> Option<f64> {
        self.coords().map(|(_, b)| b.y)
    }
}

impl Erasable for LineShape {
    const TYPE_NAME: &'static str = "line";
    type Data = LineData;

    fn to_object(&self) -> LineData {
        LineData {
            points: self.canvas_points(),
            props: self.props.clone(),
        }
    }
}

impl FromObject for LineShape {
    fn from_object(data: LineData) -> Result<Self, ShapeError> {
        let mut line = Self::new(data.points, data.props.clone())?;
        line.props = data.props;
        let (w, h) = line.dimensions();
        line.props.set_coords(w, h);
        Ok(line)
    }
}

/// Default arrowhead length in pixels.
pub const DEFAULT_HEAD_LENGTH: f64 = 20.0;
/// Default angle between arrowhead barbs and the shaft, in degrees.
pub const DEFAULT_HEAD_ANGLE: f64 = 30.0;

/// Straight line with optional arrowheads at either end.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrowShape {
    line: LineShape,
    pub head_length: f64,
    pub head_angle: f64,
    pub start_head: bool,
    pub end_head: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowData {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default = "default_head_length")]
    pub head_length: f64,
    #[serde(default = "default_head_angle")]
    pub head_angle: f64,
    #[serde(default)]
    pub start_head: bool,
    #[serde(default = "default_true")]
    pub end_head: bool,
    #[serde(flatten)]
    pub props: ObjectProps,
}

fn default_head_length() -> f64 {
    DEFAULT_HEAD_LENGTH
}

fn default_head_angle() -> f64 {
    DEFAULT_HEAD_ANGLE
}

fn default_true() -> bool {
    true
}

impl ArrowShape {
    /// Arrow from `(x1, y1)` to `(x2, y2)` with a head at the end point.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, props: ObjectProps) -> Self {
        Self {
            line: LineShape::from_coords(x1, y1, x2, y2, props),
            head_length: DEFAULT_HEAD_LENGTH,
            head_angle: DEFAULT_HEAD_ANGLE,
            start_head: false,
            end_head: true,
        }
    }

    pub fn with_heads(mut self, start: bool, end: bool) -> Self {
        self.start_head = start;
        self.end_head = end;
        self
    }

    pub fn with_head_shape(mut self, length: f64, angle: f64) -> Self {
        self.head_length = length;
        self.head_angle = angle;
        self
    }

    pub fn line(&self) -> &LineShape {
        &self.line
    }

    pub fn props(&self) -> &ObjectProps {
        &self.line.props
    }

    pub fn props_mut(&mut self) -> &mut ObjectProps {
        &mut self.line.props
    }

    /// Barb endpoints for each enabled head, in the local (centred) frame.
    pub fn local_heads(&self) -> Vec<(Point, [Point; 2])> {
        let segment = &self.line.geometry().segments()[0];
        let (start, end) = (segment[0], segment[segment.len() - 1]);
        let mut heads = Vec::with_capacity(2);
        if self.start_head {
            heads.push((
                start,
                util::calculate_arrowhead(start, end, self.head_length, self.head_angle),
            ));
        }
        if self.end_head {
            heads.push((
                end,
                util::calculate_arrowhead(end, start, self.head_length, self.head_angle),
            ));
        }
        heads
    }
}

impl Erasable for ArrowShape {
    const TYPE_NAME: &'static str = "arrow";
    type Data = ArrowData;

    fn to_object(&self) -> ArrowData {
        let segment = &self.line.canvas_points()[0];
        let (a, b) = (segment[0], segment[segment.len() - 1]);
        ArrowData {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            head_length: self.head_length,
            head_angle: self.head_angle,
            start_head: self.start_head,
            end_head: self.end_head,
            props: self.line.props.clone(),
        }
    }
}

impl FromObject for ArrowShape {
    fn from_object(data: ArrowData) -> Result<Self, ShapeError> {
        for (field, value) in [("x1", data.x1), ("y1", data.y1), ("x2", data.x2), ("y2", data.y2)] {
            if !value.is_finite() {
                return Err(ShapeError::InvalidDimension {
                    kind: Self::TYPE_NAME,
                    field,
                    value,
                });
            }
        }
        let mut arrow = Self::new(data.x1, data.y1, data.x2, data.y2, data.props.clone())
            .with_heads(data.start_head, data.end_head)
            .with_head_shape(data.head_length, data.head_angle);
        arrow.line.props = data.props;
        let (w, h) = arrow.line.dimensions();
        arrow.line.props.set_coords(w, h);
        Ok(arrow)
    }
}
