//! Eraser strokes.
//!
//! An eraser path is never drawn as ink. It stays hidden and inert, and the
//! canvas only ever applies it with subtractive compositing, removing the
//! pixels of objects stacked beneath it.

use super::erasable::{Erasable, FromObjectAsync, Reconstructed, ShapeError};
use super::geometry::Point;
use super::path::{PathCommand, PathGeometry};
use super::props::ObjectProps;
use crate::scene::loader::ResourceLoader;
use log::warn;
use serde::{Deserialize, Serialize};

/// Freehand stroke that subtracts coverage from what lies beneath it.
#[derive(Clone, Debug, PartialEq)]
pub struct EraserPath {
    pub props: ObjectProps,
    geometry: PathGeometry,
    polygon_offset: Option<Point>,
}

/// Serialized eraser stroke.
///
/// `path` holds inline commands; `src` names an external resource with the
/// commands as JSON. The polygon offset is written only when both axes are
/// known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathCommand>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_offset_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_offset_y: Option<f64>,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl EraserPath {
    /// Builds an eraser stroke; interaction, caching and visibility are forced off.
    pub fn new(commands: Vec<PathCommand>, mut props: ObjectProps) -> Result<Self, ShapeError> {
        let geometry = PathGeometry::new(Self::TYPE_NAME, commands)?;
        let bbox = geometry.bbox();
        props.left = bbox.min_x;
        props.top = bbox.min_y;
        Self::disable_interaction(&mut props);
        props.set_coords(bbox.width, bbox.height);
        Ok(Self {
            props,
            geometry,
            polygon_offset: None,
        })
    }

    /// Hidden, not selectable, not a hit-test target, never cached.
    ///
    /// The rendered extent depends on the stroke width, which cached bounds
    /// would not follow.
    fn disable_interaction(props: &mut ObjectProps) {
        props.selectable = false;
        props.evented = false;
        props.object_caching = false;
        props.visible = false;
    }

    pub fn geometry(&self) -> &PathGeometry {
        &self.geometry
    }

    pub fn dimensions(&self) -> (f64, f64) {
        let bbox = self.geometry.bbox();
        (bbox.width, bbox.height)
    }

    /// Offset of the polygon the stroke was drawn inside, if any.
    pub fn polygon_offset(&self) -> Option<Point> {
        self.polygon_offset
    }

    /// Records the centring offset of the polygon this stroke was drawn inside,
    /// so the stroke lines up once the polygon's points have been centred.
    ///
    /// The offset is metadata for that realignment only. Stroke commands are
    /// already in canvas coordinates, so rendering never reads it.
    pub fn set_polygon_offset(&mut self, offset: Option<Point>) {
        self.polygon_offset = offset;
    }

    fn from_commands(
        commands: Vec<PathCommand>,
        props: ObjectProps,
        polygon_offset: Option<Point>,
    ) -> Result<Self, ShapeError> {
        let mut eraser = Self::new(commands, props.clone())?;
        eraser.props.left = props.left;
        eraser.props.top = props.top;
        eraser.props.angle = props.angle;
        eraser.props.scale_x = props.scale_x;
        eraser.props.scale_y = props.scale_y;
        let (w, h) = eraser.dimensions();
        eraser.props.set_coords(w, h);
        eraser.polygon_offset = polygon_offset;
        Ok(eraser)
    }
}

impl Erasable for EraserPath {
    const TYPE_NAME: &'static str = "eraser-path";
    const ASYNC_RECONSTRUCTION: bool = true;
    type Data = EraserData;

    fn to_object(&self) -> EraserData {
        EraserData {
            path: Some(self.geometry.commands().to_vec()),
            src: None,
            polygon_offset_x: self.polygon_offset.map(|p| p.x),
            polygon_offset_y: self.polygon_offset.map(|p| p.y),
            props: self.props.clone(),
        }
    }
}

impl FromObjectAsync for EraserPath {
    /// Inline path data resolves before this returns; `src` data resolves
    /// when the loader delivers it.
    fn from_object_async(
        data: EraserData,
        loader: &mut dyn ResourceLoader,
        done: Reconstructed<Self>,
    ) -> Result<(), ShapeError> {
        let polygon_offset = match (data.polygon_offset_x, data.polygon_offset_y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        };

        if let Some(commands) = data.path {
            done(Self::from_commands(commands, data.props, polygon_offset)?);
            return Ok(());
        }

        let Some(src) = data.src else {
            return Err(ShapeError::MissingSource {
                kind: Self::TYPE_NAME,
            });
        };
        let props = data.props;
        let source = src.clone();
        loader.load_text(
            &src,
            Box::new(move |result| {
                let text = match result {
                    Ok(text) => text,
                    Err(err) => {
                        warn!("Eraser path {source} could not be loaded: {err}");
                        return;
                    }
                };
                let commands = match serde_json::from_str::<Vec<PathCommand>>(&text) {
                    Ok(commands) => commands,
                    Err(err) => {
                        warn!("Eraser path {source} is not valid path data: {err}");
                        return;
                    }
                };
                match Self::from_commands(commands, props, polygon_offset) {
                    Ok(eraser) => done(eraser),
                    Err(err) => warn!("Eraser path {source} rejected: {err}"),
                }
            }),
        );
        Ok(())
    }
}
