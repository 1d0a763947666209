use crate::decode::ImageDecoder;
use crate::error::Result;
use crate::geometry::{rotate_about, Point, Size};
use log::debug;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Smallest display width a placement can be zoomed down to when no other
/// floor is configured.
pub const MIN_DISPLAY_WIDTH: f64 = 1.0;

/// A decodable image file and its natural pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Height over width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }
}

/// One image on the page: an immutable source plus its screen transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    source: SourceImage,
    position: Point,
    display_width: f64,
    rotation_degrees: f64,
    min_width: f64,
}

impl Placement {
    pub fn new(source: SourceImage, initial_width: f64, position: Point) -> Self {
        let min_width = MIN_DISPLAY_WIDTH;
        Self {
            source,
            position,
            display_width: sanitize_width(initial_width, min_width),
            rotation_degrees: 0.0,
            min_width,
        }
    }

    /// Probes `path` with `decoder` and places it at `position`.
    pub fn create(
        decoder: &dyn ImageDecoder,
        path: &Path,
        initial_width: f64,
        position: Point,
    ) -> Result<Self> {
        let source = decoder.probe(path)?;
        debug!(
            "Probed {} ({}x{})",
            path.display(),
            source.width(),
            source.height()
        );
        Ok(Self::new(source, initial_width, position))
    }

    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = if min_width.is_finite() && min_width > 0.0 {
            min_width
        } else {
            MIN_DISPLAY_WIDTH
        };
        self.display_width = self.display_width.max(self.min_width);
        self
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn display_width(&self) -> f64 {
        self.display_width
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Translates by a screen-space delta. No clamping: an image may be
    /// dragged partially or fully off the page.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position + Point::new(dx, dy);
    }

    pub fn rotate_to(&mut self, angle_degrees: f64) {
        if angle_degrees.is_finite() {
            self.rotation_degrees = angle_degrees;
        }
    }

    /// Multiplies the display width by `factor`, never going below the
    /// minimum width. Non-positive or non-finite factors are ignored.
    /// Returns the new display width.
    pub fn scale_by(&mut self, factor: f64) -> f64 {
        let scaled = self.display_width * factor;
        // An overflowing product leaves the width where it is.
        if factor.is_finite() && factor > 0.0 && scaled.is_finite() {
            self.display_width = scaled.max(self.min_width);
        }
        self.display_width
    }

    /// Pre-rotation size at the current display scale.
    pub fn bounding_box(&self) -> Size {
        Size::new(
            self.display_width,
            self.display_width * self.source.aspect_ratio(),
        )
    }

    pub fn center(&self) -> Point {
        self.position + self.bounding_box().half()
    }

    /// Whether the screen point falls on the image, honouring its rotation.
    pub fn contains(&self, point: Point) -> bool {
        let local = rotate_about(point, self.center(), -self.rotation_degrees);
        let Size { width, height } = self.bounding_box();
        local.x >= self.position.x
            && local.x <= self.position.x + width
            && local.y >= self.position.y
            && local.y <= self.position.y + height
    }
}

fn sanitize_width(width: f64, min_width: f64) -> f64 {
    if width.is_finite() {
        width.max(min_width)
    } else {
        min_width
    }
}
