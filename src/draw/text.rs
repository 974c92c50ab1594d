//! Inline-editable text with a floating edit affordance.

use super::erasable::{Erasable, FromObject, ShapeError, check_dimension};
use super::font::FontDescriptor;
use super::geometry::Point;
use super::props::ObjectProps;
use serde::{Deserialize, Serialize};

/// Default font size in points.
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

/// Floating edit icon drawn next to a text object.
///
/// The icon is click-through for the canvas; only [`TextShape::on_pointer_down`]
/// looks at it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditIcon {
    /// Side length in pixels at scale 1.
    pub size: f64,
    /// Offset from the object's top-right corner, in the object's unrotated frame.
    pub offset: Point,
}

impl Default for EditIcon {
    fn default() -> Self {
        Self {
            size: 20.0,
            offset: Point::new(14.0, -14.0),
        }
    }
}

/// Text object measured with Pango.
#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    pub props: ObjectProps,
    text: String,
    font: FontDescriptor,
    font_size: f64,
    width: f64,
    height: f64,
    editing: bool,
    icon: EditIcon,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(flatten)]
    pub font: FontDescriptor,
    #[serde(flatten)]
    pub props: ObjectProps,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl TextShape {
    pub fn new(
        text: impl Into<String>,
        font: FontDescriptor,
        font_size: f64,
        mut props: ObjectProps,
    ) -> Result<Self, ShapeError> {
        let font_size = check_dimension(Self::TYPE_NAME, "fontSize", font_size)?;
        if font_size == 0.0 {
            return Err(ShapeError::InvalidDimension {
                kind: Self::TYPE_NAME,
                field: "fontSize",
                value: font_size,
            });
        }
        let text = text.into();
        let (width, height) = measure_text(&text, &font, font_size);
        props.set_coords(width, height);
        Ok(Self {
            props,
            text,
            font,
            font_size,
            width,
            height,
            editing: false,
            icon: EditIcon::default(),
        })
    }

    pub fn with_edit_icon(mut self, icon: EditIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> &FontDescriptor {
        &self.font
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn edit_icon(&self) -> EditIcon {
        self.icon
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Replaces the text and re-measures.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let (w, h) = measure_text(&self.text, &self.font, self.font_size);
        self.width = w;
        self.height = h;
        self.props.set_coords(w, h);
    }

    pub fn enter_editing(&mut self) {
        self.editing = true;
    }

    pub fn exit_editing(&mut self) {
        self.editing = false;
    }

    /// Canvas-space center of the edit icon.
    ///
    /// The fixed offset is rotated with the object, so the icon stays at the
    /// same corner whatever the angle.
    pub fn edit_icon_center(&self) -> Point {
        let p = &self.props;
        let local = Point::new(
            self.width * p.scale_x / 2.0 + self.icon.offset.x,
            -self.height * p.scale_y / 2.0 + self.icon.offset.y,
        );
        let center = p.center(self.width, self.height);
        local.rotate(p.angle).offset(center.x, center.y)
    }

    /// Half the side of the square hit box around the icon center.
    fn icon_half_extent(&self) -> f64 {
        let scale = self.props.scale_x.abs().max(self.props.scale_y.abs());
        self.icon.size * scale / 2.0
    }

    pub fn edit_icon_contains(&self, pointer: Point) -> bool {
        let c = self.edit_icon_center();
        let half = self.icon_half_extent();
        (pointer.x - c.x).abs() <= half && (pointer.y - c.y).abs() <= half
    }

    /// Enters edit mode when the pointer lands on the icon.
    ///
    /// Returns whether edit mode was entered by this press.
    pub fn on_pointer_down(&mut self, pointer: Point) -> bool {
        if self.editing || !self.props.evented || !self.edit_icon_contains(pointer) {
            return false;
        }
        self.editing = true;
        true
    }
}

/// Measures the logical extent of `text` with Pango.
///
/// Falls back to a per-character estimate if no Cairo context can be made.
pub fn measure_text(text: &str, font: &FontDescriptor, size: f64) -> (f64, f64) {
    let measured = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
        .ok()
        .and_then(|surface| cairo::Context::new(&surface).ok())
        .map(|ctx| {
            let layout = pangocairo::functions::create_layout(&ctx);
            layout.set_font_description(Some(&font.to_pango(size)));
            layout.set_text(text);
            let (_ink, logical) = layout.extents();
            let scale = pango::SCALE as f64;
            (logical.width() as f64 / scale, logical.height() as f64 / scale)
        });

    measured.unwrap_or_else(|| {
        let lines = text.lines().count().max(1) as f64;
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        (longest * size * 0.6, lines * size * 1.16)
    })
}

impl Erasable for TextShape {
    const TYPE_NAME: &'static str = "text";
    type Data = TextData;

    fn to_object(&self) -> TextData {
        TextData {
            text: self.text.clone(),
            font_size: self.font_size,
            font: self.font.clone(),
            props: self.props.clone(),
        }
    }
}

impl FromObject for TextShape {
    fn from_object(data: TextData) -> Result<Self, ShapeError> {
        Self::new(data.text, data.font, data.font_size, data.props)
    }
}
