//! The flat set of drawable variants and their serialized records.

use super::eraser::{EraserData, EraserPath};
use super::erasable::{Erasable, FromObject, FromObjectAsync, ShapeError, check_dimension};
use super::geometry::{BoundingBox, Quad, quads_overlap};
use super::image::{ImageData, ImageShape};
use super::line::{ArrowData, ArrowShape, LineData, LineShape};
use super::path::{PathData, PathShape};
use super::polygon::{
    CircleData, CircleShape, PolygonData, PolygonShape, RectData, RectShape, TriangleData,
    TriangleShape,
};
use super::props::{ObjectProps, Property};
use super::text::{TextData, TextShape};
use crate::scene::loader::ResourceLoader;
use serde::{Deserialize, Serialize};

/// Any object that can live on the canvas.
#[derive(Clone, Debug)]
pub enum DrawObject {
    Polygon(PolygonShape),
    Rect(RectShape),
    Circle(CircleShape),
    Triangle(TriangleShape),
    Line(LineShape),
    Arrow(ArrowShape),
    Text(TextShape),
    Image(ImageShape),
    Path(PathShape),
    Eraser(EraserPath),
}

/// Serialized record for one object, discriminated by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectData {
    Polygon(PolygonData),
    Rect(RectData),
    Circle(CircleData),
    Triangle(TriangleData),
    Line(LineData),
    Arrow(ArrowData),
    Text(TextData),
    Image(ImageData),
    Path(PathData),
    EraserPath(EraserData),
}

impl ObjectData {
    /// The `type` discriminator of this record.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectData::Polygon(_) => PolygonShape::TYPE_NAME,
            ObjectData::Rect(_) => RectShape::TYPE_NAME,
            ObjectData::Circle(_) => CircleShape::TYPE_NAME,
            ObjectData::Triangle(_) => TriangleShape::TYPE_NAME,
            ObjectData::Line(_) => LineShape::TYPE_NAME,
            ObjectData::Arrow(_) => ArrowShape::TYPE_NAME,
            ObjectData::Text(_) => TextShape::TYPE_NAME,
            ObjectData::Image(_) => ImageShape::TYPE_NAME,
            ObjectData::Path(_) => PathShape::TYPE_NAME,
            ObjectData::EraserPath(_) => EraserPath::TYPE_NAME,
        }
    }

    /// Whether rebuilding this record has to wait for the loader.
    ///
    /// Eraser records with inline path data still report `true`; callers go
    /// through the callback either way.
    pub fn is_async(&self) -> bool {
        match self {
            ObjectData::Image(_) => ImageShape::ASYNC_RECONSTRUCTION,
            ObjectData::EraserPath(_) => EraserPath::ASYNC_RECONSTRUCTION,
            _ => false,
        }
    }
}

fn property_name(property: &Property) -> &'static str {
    match property {
        Property::Width(_) => "width",
        Property::Height(_) => "height",
        Property::Radius(_) => "radius",
        _ => "property",
    }
}

impl DrawObject {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DrawObject::Polygon(_) => PolygonShape::TYPE_NAME,
            DrawObject::Rect(_) => RectShape::TYPE_NAME,
            DrawObject::Circle(_) => CircleShape::TYPE_NAME,
            DrawObject::Triangle(_) => TriangleShape::TYPE_NAME,
            DrawObject::Line(_) => LineShape::TYPE_NAME,
            DrawObject::Arrow(_) => ArrowShape::TYPE_NAME,
            DrawObject::Text(_) => TextShape::TYPE_NAME,
            DrawObject::Image(_) => ImageShape::TYPE_NAME,
            DrawObject::Path(_) => PathShape::TYPE_NAME,
            DrawObject::Eraser(_) => EraserPath::TYPE_NAME,
        }
    }

    pub fn props(&self) -> &ObjectProps {
        match self {
            DrawObject::Polygon(s) => &s.props,
            DrawObject::Rect(s) => &s.props,
            DrawObject::Circle(s) => &s.props,
            DrawObject::Triangle(s) => &s.props,
            DrawObject::Line(s) => &s.props,
            DrawObject::Arrow(s) => s.props(),
            DrawObject::Text(s) => &s.props,
            DrawObject::Image(s) => &s.props,
            DrawObject::Path(s) => &s.props,
            DrawObject::Eraser(s) => &s.props,
        }
    }

    /// Direct access to the shared properties.
    ///
    /// Writes made here bypass derived-state updates; prefer [`DrawObject::set`].
    pub fn props_mut(&mut self) -> &mut ObjectProps {
        match self {
            DrawObject::Polygon(s) => &mut s.props,
            DrawObject::Rect(s) => &mut s.props,
            DrawObject::Circle(s) => &mut s.props,
            DrawObject::Triangle(s) => &mut s.props,
            DrawObject::Line(s) => &mut s.props,
            DrawObject::Arrow(s) => s.props_mut(),
            DrawObject::Text(s) => &mut s.props,
            DrawObject::Image(s) => &mut s.props,
            DrawObject::Path(s) => &mut s.props,
            DrawObject::Eraser(s) => &mut s.props,
        }
    }

    /// Intrinsic (unscaled) width and height.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            DrawObject::Polygon(s) => s.dimensions(),
            DrawObject::Rect(s) => (s.width(), s.height()),
            DrawObject::Circle(s) => (s.radius() * 2.0, s.radius() * 2.0),
            DrawObject::Triangle(s) => (s.width(), s.height()),
            DrawObject::Line(s) => s.dimensions(),
            DrawObject::Arrow(s) => s.line().dimensions(),
            DrawObject::Text(s) => s.dimensions(),
            DrawObject::Image(s) => s.dimensions(),
            DrawObject::Path(s) => s.dimensions(),
            DrawObject::Eraser(s) => s.dimensions(),
        }
    }

    /// Writes one property and refreshes everything derived from it.
    ///
    /// Dimension writes regenerate procedural geometry first; the cached
    /// corner coordinates are recomputed after every write.
    pub fn set(&mut self, property: Property) -> Result<(), ShapeError> {
        if let Some(dimension) = self.props_mut().apply(property) {
            match self {
                DrawObject::Rect(s) => s.set_dimension(dimension)?,
                DrawObject::Triangle(s) => s.set_dimension(dimension)?,
                DrawObject::Circle(s) => s.set_dimension(dimension)?,
                DrawObject::Image(s) => {
                    let (w, h) = s.dimensions();
                    match dimension {
                        Property::Width(v) => {
                            s.set_size(check_dimension(ImageShape::TYPE_NAME, "width", v)?, h)
                        }
                        Property::Height(v) => {
                            s.set_size(w, check_dimension(ImageShape::TYPE_NAME, "height", v)?)
                        }
                        other => {
                            return Err(ShapeError::UnsupportedProperty {
                                kind: ImageShape::TYPE_NAME,
                                property: property_name(&other),
                            });
                        }
                    }
                }
                other => {
                    return Err(ShapeError::UnsupportedProperty {
                        kind: other.kind_name(),
                        property: property_name(&dimension),
                    });
                }
            }
        }
        let (w, h) = self.dimensions();
        self.props_mut().set_coords(w, h);
        Ok(())
    }

    /// Canvas-space corners after scale and rotation.
    pub fn coords(&self) -> &Quad {
        self.props().coords()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.coords().bounding_box()
    }

    /// True if the two objects' outlines cross, or either contains the other.
    pub fn intersects_with(&self, other: &DrawObject) -> bool {
        quads_overlap(self.coords(), other.coords())
    }

    pub fn is_eraser(&self) -> bool {
        matches!(self, DrawObject::Eraser(_))
    }

    pub fn is_erasable(&self) -> bool {
        match self {
            DrawObject::Polygon(s) => s.is_erasable(),
            DrawObject::Rect(s) => s.is_erasable(),
            DrawObject::Circle(s) => s.is_erasable(),
            DrawObject::Triangle(s) => s.is_erasable(),
            DrawObject::Line(s) => s.is_erasable(),
            DrawObject::Arrow(s) => s.is_erasable(),
            DrawObject::Text(s) => s.is_erasable(),
            DrawObject::Image(s) => s.is_erasable(),
            DrawObject::Path(s) => s.is_erasable(),
            DrawObject::Eraser(s) => s.is_erasable(),
        }
    }

    /// Rendering cost estimate: the number of points or commands.
    pub fn complexity(&self) -> usize {
        match self {
            DrawObject::Polygon(s) => s.complexity(),
            DrawObject::Rect(s) => s.geometry().complexity(),
            DrawObject::Circle(s) => s.geometry().complexity(),
            DrawObject::Triangle(s) => s.geometry().complexity(),
            DrawObject::Line(s) => s.complexity(),
            DrawObject::Arrow(s) => s.line().complexity(),
            DrawObject::Path(s) => s.geometry().commands().len(),
            DrawObject::Eraser(s) => s.geometry().commands().len(),
            DrawObject::Text(_) | DrawObject::Image(_) => 1,
        }
    }

    pub fn to_object(&self) -> ObjectData {
        match self {
            DrawObject::Polygon(s) => ObjectData::Polygon(s.to_object()),
            DrawObject::Rect(s) => ObjectData::Rect(s.to_object()),
            DrawObject::Circle(s) => ObjectData::Circle(s.to_object()),
            DrawObject::Triangle(s) => ObjectData::Triangle(s.to_object()),
            DrawObject::Line(s) => ObjectData::Line(s.to_object()),
            DrawObject::Arrow(s) => ObjectData::Arrow(s.to_object()),
            DrawObject::Text(s) => ObjectData::Text(s.to_object()),
            DrawObject::Image(s) => ObjectData::Image(s.to_object()),
            DrawObject::Path(s) => ObjectData::Path(s.to_object()),
            DrawObject::Eraser(s) => ObjectData::EraserPath(s.to_object()),
        }
    }

    /// Rebuilds an object from its record.
    ///
    /// Synchronous kinds call `done` before returning. Image and eraser
    /// records may call it later, from the loader's `run_pending`, or never
    /// if the resource fails to load.
    pub fn from_object(
        data: ObjectData,
        loader: &mut dyn ResourceLoader,
        done: Box<dyn FnOnce(DrawObject)>,
    ) -> Result<(), ShapeError> {
        match data {
            ObjectData::Polygon(d) => done(DrawObject::Polygon(PolygonShape::from_object(d)?)),
            ObjectData::Rect(d) => done(DrawObject::Rect(RectShape::from_object(d)?)),
            ObjectData::Circle(d) => done(DrawObject::Circle(CircleShape::from_object(d)?)),
            ObjectData::Triangle(d) => done(DrawObject::Triangle(TriangleShape::from_object(d)?)),
            ObjectData::Line(d) => done(DrawObject::Line(LineShape::from_object(d)?)),
            ObjectData::Arrow(d) => done(DrawObject::Arrow(ArrowShape::from_object(d)?)),
            ObjectData::Text(d) => done(DrawObject::Text(TextShape::from_object(d)?)),
            ObjectData::Path(d) => done(DrawObject::Path(PathShape::from_object(d)?)),
            ObjectData::Image(d) => ImageShape::from_object_async(
                d,
                loader,
                Box::new(move |img| done(DrawObject::Image(img))),
            )?,
            ObjectData::EraserPath(d) => EraserPath::from_object_async(
                d,
                loader,
                Box::new(move |eraser| done(DrawObject::Eraser(eraser))),
            )?,
        }
        Ok(())
    }
}

macro_rules! impl_from_shape {
    ($($shape:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$shape> for DrawObject {
                fn from(shape: $shape) -> Self {
                    DrawObject::$variant(shape)
                }
            }
        )*
    };
}

impl_from_shape! {
    PolygonShape => Polygon,
    RectShape => Rect,
    CircleShape => Circle,
    TriangleShape => Triangle,
    LineShape => Line,
    ArrowShape => Arrow,
    TextShape => Text,
    ImageShape => Image,
    PathShape => Path,
    EraserPath => Eraser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::color::Color;
    use crate::draw::geometry::Point;
    use crate::draw::path::PathCommand;
    use crate::scene::loader::MemoryLoader;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rebuild(data: ObjectData) -> Option<DrawObject> {
        let out = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&out);
        let mut loader = MemoryLoader::default();
        DrawObject::from_object(data, &mut loader, Box::new(move |o| *sink.borrow_mut() = Some(o)))
            .unwrap();
        loader.run_pending();
        out.borrow_mut().take()
    }

    #[test]
    fn records_are_tagged_by_type() {
        let rect: DrawObject = RectShape::new(4.0, 2.0, ObjectProps::default()).unwrap().into();
        let json = serde_json::to_value(rect.to_object()).unwrap();
        assert_eq!(json["type"], "rect");

        let eraser: DrawObject = EraserPath::new(
            vec![PathCommand::MoveTo(Point::new(0.0, 0.0)), PathCommand::LineTo(Point::new(1.0, 1.0))],
            ObjectProps::default(),
        )
        .unwrap()
        .into();
        let json = serde_json::to_value(eraser.to_object()).unwrap();
        assert_eq!(json["type"], "eraser-path");
    }

    #[test]
    fn setting_width_regenerates_rect_points() {
        let mut rect: DrawObject = RectShape::new(10.0, 10.0, ObjectProps::default()).unwrap().into();
        rect.set(Property::Width(30.0)).unwrap();
        assert_eq!(rect.dimensions(), (30.0, 10.0));
        let DrawObject::Rect(shape) = &rect else {
            panic!("expected rect");
        };
        let bbox = shape.geometry().bbox();
        assert_eq!((bbox.width, bbox.height), (30.0, 10.0));
        assert_eq!(rect.bounding_box().width, 30.0);
    }

    #[test]
    fn circle_width_maps_to_radius() {
        let mut circle: DrawObject = CircleShape::new(5.0, ObjectProps::default()).unwrap().into();
        circle.set(Property::Width(40.0)).unwrap();
        assert_eq!(circle.dimensions(), (40.0, 40.0));
    }

    #[test]
    fn unsupported_dimension_is_an_error() {
        let mut line: DrawObject = LineShape::from_coords(0.0, 0.0, 5.0, 5.0, ObjectProps::default()).into();
        assert_eq!(
            line.set(Property::Radius(3.0)).unwrap_err(),
            ShapeError::UnsupportedProperty {
                kind: "line",
                property: "radius"
            }
        );
    }

    #[test]
    fn angle_goes_through_set_and_updates_coords() {
        let mut rect: DrawObject = RectShape::new(20.0, 10.0, ObjectProps::default()).unwrap().into();
        rect.set(Property::Angle(-90.0)).unwrap();
        assert_eq!(rect.props().angle, 270.0);
        let bbox = rect.bounding_box();
        assert!((bbox.width - 10.0).abs() < 1e-9);
        assert!((bbox.height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn every_sync_kind_rebuilds() {
        let props = || ObjectProps::at(3.0, 4.0).with_fill(Color::from_rgb8(1, 2, 3));
        let objects: Vec<DrawObject> = vec![
            PolygonShape::new(vec![vec![Point::new(0.0, 0.0), Point::new(9.0, 3.0), Point::new(2.0, 8.0)]], props())
                .unwrap()
                .into(),
            RectShape::new(5.0, 6.0, props()).unwrap().into(),
            CircleShape::new(7.0, props()).unwrap().into(),
            TriangleShape::new(5.0, 6.0, props()).unwrap().into(),
            LineShape::from_coords(1.0, 2.0, 9.0, 4.0, props()).into(),
            ArrowShape::new(1.0, 2.0, 9.0, 4.0, props()).with_heads(true, true).into(),
            PathShape::from_samples(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)], props())
                .unwrap()
                .into(),
        ];
        for object in objects {
            let rebuilt = rebuild(object.to_object()).expect("sync kinds call back immediately");
            assert_eq!(rebuilt.kind_name(), object.kind_name());
            assert_eq!(rebuilt.to_object(), object.to_object());
            assert_eq!(rebuilt.bounding_box(), object.bounding_box());
        }
    }

    #[test]
    fn eraser_is_the_only_non_drawing_kind() {
        let eraser: DrawObject = EraserPath::new(
            vec![PathCommand::MoveTo(Point::new(0.0, 0.0))],
            ObjectProps::default(),
        )
        .unwrap()
        .into();
        assert!(eraser.is_eraser());
        assert!(eraser.is_erasable());
        assert!(eraser.to_object().is_async());

        let rect: DrawObject = RectShape::new(1.0, 1.0, ObjectProps::default()).unwrap().into();
        assert!(!rect.is_eraser());
        assert!(!rect.to_object().is_async());
    }
}
