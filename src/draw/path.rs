//! Freehand path commands and the visible brush stroke.
//!
//! Path data serializes the way scene files store it: a list of command
//! arrays such as `["M", 10, 20]`, `["L", 30, 40]`, `["Q", cx, cy, x, y]`.

use super::erasable::{Erasable, FromObject, ShapeError};
use super::geometry::{BoundingBox, Point, bounding_box_of_segments};
use super::props::ObjectProps;
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One drawing command in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

impl PathCommand {
    fn letter(&self) -> &'static str {
        match self {
            PathCommand::MoveTo(_) => "M",
            PathCommand::LineTo(_) => "L",
            PathCommand::QuadTo(..) => "Q",
            PathCommand::CubicTo(..) => "C",
            PathCommand::Close => "Z",
        }
    }

    /// Every point the command references, control points included.
    pub fn points(&self) -> Vec<Point> {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => vec![p],
            PathCommand::QuadTo(c, p) => vec![c, p],
            PathCommand::CubicTo(c1, c2, p) => vec![c1, c2, p],
            PathCommand::Close => Vec::new(),
        }
    }

    fn translated(self, dx: f64, dy: f64) -> Self {
        let t = |p: Point| p.offset(dx, dy);
        match self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(t(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(t(p)),
            PathCommand::QuadTo(c, p) => PathCommand::QuadTo(t(c), t(p)),
            PathCommand::CubicTo(c1, c2, p) => PathCommand::CubicTo(t(c1), t(c2), t(p)),
            PathCommand::Close => PathCommand::Close,
        }
    }

    /// Emits the command into the current Cairo path.
    pub fn trace(&self, ctx: &cairo::Context) {
        match *self {
            PathCommand::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathCommand::LineTo(p) => ctx.line_to(p.x, p.y),
            PathCommand::QuadTo(c, p) => {
                // Cairo has no quadratic curves; elevate to cubic.
                let (x0, y0) = ctx.current_point().unwrap_or((c.x, c.y));
                ctx.curve_to(
                    x0 + 2.0 / 3.0 * (c.x - x0),
                    y0 + 2.0 / 3.0 * (c.y - y0),
                    p.x + 2.0 / 3.0 * (c.x - p.x),
                    p.y + 2.0 / 3.0 * (c.y - p.y),
                    p.x,
                    p.y,
                );
            }
            PathCommand::CubicTo(c1, c2, p) => ctx.curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathCommand::Close => ctx.close_path(),
        }
    }
}

impl Serialize for PathCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let points = self.points();
        let mut seq = serializer.serialize_seq(Some(1 + points.len() * 2))?;
        seq.serialize_element(self.letter())?;
        for p in points {
            seq.serialize_element(&p.x)?;
            seq.serialize_element(&p.y)?;
        }
        seq.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToken {
    Op(String),
    Num(f64),
}

impl<'de> Deserialize<'de> for PathCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Vec::<RawToken>::deserialize(deserializer)?;
        let (op, rest) = match tokens.split_first() {
            Some((RawToken::Op(op), rest)) => (op.as_str(), rest),
            _ => return Err(D::Error::custom("path command must start with a letter")),
        };
        let nums = rest
            .iter()
            .map(|t| match t {
                RawToken::Num(n) => Ok(*n),
                RawToken::Op(s) => Err(D::Error::custom(format!("unexpected '{s}' in path command"))),
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let p = |i: usize| Point::new(nums[i], nums[i + 1]);

        let expected = match op {
            "M" | "L" => 2,
            "Q" => 4,
            "C" => 6,
            "Z" | "z" => 0,
            other => return Err(D::Error::custom(format!("unknown path command '{other}'"))),
        };
        if nums.len() != expected {
            return Err(D::Error::custom(format!(
                "path command '{op}' takes {expected} numbers, got {}",
                nums.len()
            )));
        }

        Ok(match op {
            "M" => PathCommand::MoveTo(p(0)),
            "L" => PathCommand::LineTo(p(0)),
            "Q" => PathCommand::QuadTo(p(0), p(2)),
            "C" => PathCommand::CubicTo(p(0), p(2), p(4)),
            _ => PathCommand::Close,
        })
    }
}

/// Bounding box over every point referenced by the commands.
pub fn path_bounding_box(commands: &[PathCommand]) -> Option<BoundingBox> {
    let points: Vec<Point> = commands.iter().flat_map(PathCommand::points).collect();
    bounding_box_of_segments(&[points])
}

/// Smoothed path through freehand pointer samples, using quadratic segments
/// between sample midpoints the way pencil brushes do.
pub fn smooth_path(samples: &[Point]) -> Vec<PathCommand> {
    let Some((&first, rest)) = samples.split_first() else {
        return Vec::new();
    };
    let mut commands = vec![PathCommand::MoveTo(first)];
    if rest.is_empty() {
        // Zero-length segment so a single click still leaves a round dot.
        commands.push(PathCommand::LineTo(first));
        return commands;
    }

    let mut previous = first;
    for &current in rest {
        let mid = Point::new((previous.x + current.x) / 2.0, (previous.y + current.y) / 2.0);
        commands.push(PathCommand::QuadTo(previous, mid));
        previous = current;
    }
    commands.push(PathCommand::LineTo(previous));
    commands
}

/// Path geometry plus the translation that centres it on the local origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PathGeometry {
    commands: Vec<PathCommand>,
    bbox: BoundingBox,
}

impl PathGeometry {
    pub fn new(kind: &'static str, commands: Vec<PathCommand>) -> Result<Self, ShapeError> {
        let bbox = path_bounding_box(&commands).ok_or(ShapeError::EmptyPath { kind })?;
        Ok(Self { commands, bbox })
    }

    /// Commands in canvas coordinates, as stored.
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Center of the command bounds; rendering translates by its negation.
    pub fn path_offset(&self) -> Point {
        self.bbox.center()
    }

    /// Commands shifted into the local frame centred on the origin.
    pub fn local_commands(&self) -> impl Iterator<Item = PathCommand> + '_ {
        let offset = self.path_offset();
        self.commands
            .iter()
            .map(move |c| c.translated(-offset.x, -offset.y))
    }
}

/// Visible freehand stroke produced by the pencil brush.
#[derive(Clone, Debug, PartialEq)]
pub struct PathShape {
    pub props: ObjectProps,
    geometry: PathGeometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub path: Vec<PathCommand>,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl PathShape {
    pub fn new(commands: Vec<PathCommand>, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let geometry = PathGeometry::new(Self::TYPE_NAME, commands)?;
        let bbox = geometry.bbox();
        props.left = bbox.min_x;
        props.top = bbox.min_y;
        props.set_coords(bbox.width, bbox.height);
        Ok(Self { props, geometry })
    }

    /// Builds a smoothed stroke from raw pointer samples.
    pub fn from_samples(samples: &[Point], props: ObjectProps) -> Result<Self, ShapeError> {
        Self::new(smooth_path(samples), props)
    }

    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.geometry.bbox.width, self.geometry.bbox.height)
    }
}

impl Erasable for PathShape {
    const TYPE_NAME: &'static str = "path";
    type Data = PathData;

    fn to_object(&self) -> PathData {
        PathData {
            path: self.geometry.commands.clone(),
            props: self.props.clone(),
        }
    }
}

impl FromObject for PathShape {
    fn from_object(data: PathData) -> Result<Self, ShapeError> {
        let mut shape = Self::new(data.path, data.props.clone())?;
        shape.props = data.props;
        let (w, h) = shape.dimensions();
        shape.props.set_coords(w, h);
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_as_letter_arrays() {
        let commands = vec![
            PathCommand::MoveTo(Point::new(1.0, 2.0)),
            PathCommand::QuadTo(Point::new(3.0, 4.0), Point::new(5.0, 6.0)),
            PathCommand::Close,
        ];
        let json = serde_json::to_string(&commands).unwrap();
        assert_eq!(json, r#"[["M",1.0,2.0],["Q",3.0,4.0,5.0,6.0],["Z"]]"#);
        let parsed: Vec<PathCommand> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, commands);
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert!(serde_json::from_str::<PathCommand>(r#"["L", 1]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r#"["X", 1, 2]"#).is_err());
        assert!(serde_json::from_str::<PathCommand>(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn single_sample_becomes_a_dot() {
        let commands = smooth_path(&[Point::new(4.0, 4.0)]);
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(Point::new(4.0, 4.0)),
                PathCommand::LineTo(Point::new(4.0, 4.0)),
            ]
        );
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(
            PathShape::new(vec![], ObjectProps::default()).unwrap_err(),
            ShapeError::EmptyPath { kind: "path" }
        );
        assert!(PathShape::from_samples(&[], ObjectProps::default()).is_err());
    }

    #[test]
    fn path_is_positioned_at_its_bounds() {
        let path = PathShape::from_samples(
            &[Point::new(10.0, 10.0), Point::new(30.0, 50.0), Point::new(60.0, 20.0)],
            ObjectProps::default(),
        )
        .unwrap();
        assert_eq!((path.props.left, path.props.top), (10.0, 10.0));
        assert_eq!(path.dimensions(), (50.0, 40.0));
        assert_eq!(path.geometry().path_offset(), Point::new(35.0, 30.0));
    }
}
