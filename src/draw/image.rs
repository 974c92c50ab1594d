//! Bitmap images.

use super::erasable::{Erasable, FromObjectAsync, Reconstructed, ShapeError, check_dimension};
use super::props::ObjectProps;
use crate::scene::loader::ResourceLoader;
use log::warn;
use serde::{Deserialize, Serialize};

/// Bitmap drawn scaled to `width`×`height`.
///
/// Reconstruction always waits for the loader to deliver the pixels. The
/// asynchronous marker is an associated constant, so there is no construction
/// path that can observe an image type without it.
#[derive(Clone)]
pub struct ImageShape {
    pub props: ObjectProps,
    src: String,
    width: f64,
    height: f64,
    surface: cairo::ImageSurface,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub src: String,
    /// Display size; zero means the bitmap's own size.
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(flatten)]
    pub props: ObjectProps,
}

impl ImageShape {
    /// Wraps a decoded bitmap shown at its natural size.
    pub fn new(src: impl Into<String>, surface: cairo::ImageSurface, props: ObjectProps) -> Self {
        let (w, h) = (surface.width() as f64, surface.height() as f64);
        Self::sized(src.into(), surface, w, h, props)
    }

    fn sized(
        src: String,
        surface: cairo::ImageSurface,
        width: f64,
        height: f64,
        mut props: ObjectProps,
    ) -> Self {
        props.set_coords(width, height);
        Self {
            props,
            src,
            width,
            height,
            surface,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn surface(&self) -> &cairo::ImageSurface {
        &self.surface
    }

    /// Pixel size of the underlying bitmap.
    pub fn natural_size(&self) -> (i32, i32) {
        (self.surface.width(), self.surface.height())
    }

    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}

impl std::fmt::Debug for ImageShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageShape")
            .field("src", &self.src)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("natural_size", &self.natural_size())
            .field("props", &self.props)
            .finish()
    }
}

impl Erasable for ImageShape {
    const TYPE_NAME: &'static str = "image";
    const ASYNC_RECONSTRUCTION: bool = true;
    type Data = ImageData;

    fn to_object(&self) -> ImageData {
        ImageData {
            src: self.src.clone(),
            width: self.width,
            height: self.height,
            props: self.props.clone(),
        }
    }
}

impl FromObjectAsync for ImageShape {
    fn from_object_async(
        data: ImageData,
        loader: &mut dyn ResourceLoader,
        done: Reconstructed<Self>,
    ) -> Result<(), ShapeError> {
        if data.src.is_empty() {
            return Err(ShapeError::MissingSource {
                kind: Self::TYPE_NAME,
            });
        }
        let width = check_dimension(Self::TYPE_NAME, "width", data.width)?;
        let height = check_dimension(Self::TYPE_NAME, "height", data.height)?;

        let src = data.src.clone();
        let props = data.props;
        loader.load_image(
            &data.src,
            Box::new(move |result| match result {
                Ok(surface) => {
                    let w = if width > 0.0 { width } else { surface.width() as f64 };
                    let h = if height > 0.0 { height } else { surface.height() as f64 };
                    done(Self::sized(src, surface, w, h, props));
                }
                Err(err) => warn!("Image {src} could not be loaded: {err}"),
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::loader::MemoryLoader;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn loader_with_image() -> MemoryLoader {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 8, 4).unwrap();
        let mut loader = MemoryLoader::default();
        loader.insert_image("photo.png", &surface).unwrap();
        loader
    }

    fn collect() -> (Rc<RefCell<Vec<ImageShape>>>, Reconstructed<ImageShape>) {
        let out = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&out);
        (out, Box::new(move |img| sink.borrow_mut().push(img)))
    }

    #[test]
    fn image_type_is_async() {
        assert!(ImageShape::ASYNC_RECONSTRUCTION);
        assert!(ImageShape::IS_ERASABLE);
    }

    #[test]
    fn image_resolves_only_after_loader_runs() {
        let mut loader = loader_with_image();
        let data = ImageData {
            src: "photo.png".into(),
            width: 0.0,
            height: 0.0,
            props: ObjectProps::at(5.0, 5.0),
        };
        let (out, done) = collect();
        ImageShape::from_object_async(data, &mut loader, done).unwrap();
        assert!(out.borrow().is_empty());

        loader.run_pending();
        let images = out.borrow();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].dimensions(), (8.0, 4.0));
        assert_eq!(images[0].props.left, 5.0);
    }

    #[test]
    fn recorded_size_overrides_natural_size() {
        let mut loader = loader_with_image();
        let data = ImageData {
            src: "photo.png".into(),
            width: 16.0,
            height: 8.0,
            props: ObjectProps::default(),
        };
        let (out, done) = collect();
        ImageShape::from_object_async(data, &mut loader, done).unwrap();
        loader.run_pending();
        assert_eq!(out.borrow()[0].dimensions(), (16.0, 8.0));
        assert_eq!(out.borrow()[0].natural_size(), (8, 4));
    }

    #[test]
    fn missing_image_never_calls_back() {
        let mut loader = MemoryLoader::default();
        let data = ImageData {
            src: "absent.png".into(),
            width: 0.0,
            height: 0.0,
            props: ObjectProps::default(),
        };
        let (out, done) = collect();
        ImageShape::from_object_async(data, &mut loader, done).unwrap();
        assert_eq!(loader.run_pending(), 1);
        assert!(out.borrow().is_empty());
    }

    #[test]
    fn empty_source_is_rejected_synchronously() {
        let mut loader = MemoryLoader::default();
        let data = ImageData {
            src: String::new(),
            width: 0.0,
            height: 0.0,
            props: ObjectProps::default(),
        };
        let (_, done) = collect();
        assert!(ImageShape::from_object_async(data, &mut loader, done).is_err());
        assert_eq!(loader.pending(), 0);
    }
}
