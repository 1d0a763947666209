use crate::error::{CollageError, Result};
use crate::geometry::Size;
use crate::interaction::InteractionMode;
use crate::layout::Grid;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Page dimensions in PDF points.
    pub fn size(&self) -> Size {
        match *self {
            PageSize::A4 => Size::new(210.0 * POINTS_PER_MM, 297.0 * POINTS_PER_MM),
            PageSize::A3 => Size::new(297.0 * POINTS_PER_MM, 420.0 * POINTS_PER_MM),
            PageSize::A5 => Size::new(148.0 * POINTS_PER_MM, 210.0 * POINTS_PER_MM),
            PageSize::Letter => Size::new(612.0, 792.0),
            PageSize::Legal => Size::new(612.0, 1008.0),
            PageSize::Custom { width, height } => Size::new(width, height),
        }
    }
}

impl FromStr for PageSize {
    type Err = CollageError;

    /// Accepts a named size (`a4`, `letter`, …) or `WIDTHxHEIGHT` in points.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "a3" => Ok(PageSize::A3),
            "a5" => Ok(PageSize::A5),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => {
                let invalid = || CollageError::Settings(format!("Unknown page size '{}'", s));
                let (width, height) = other.split_once('x').ok_or_else(invalid)?;
                let width = width.trim().parse::<f64>().map_err(|_| invalid())?;
                let height = height.trim().parse::<f64>().map_err(|_| invalid())?;
                let page = PageSize::Custom { width, height };
                page.validate()?;
                Ok(page)
            }
        }
    }
}

impl PageSize {
    fn validate(&self) -> Result<()> {
        let Size { width, height } = self.size();
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(CollageError::Settings(format!(
                "Page size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub page: PageSize,
    /// Display width given to a freshly added image.
    pub initial_width: f64,
    /// One scroll step scales by this factor (zoom in) or its reciprocal.
    pub zoom_factor: f64,
    pub min_width: f64,
    pub grid: Grid,
    /// Lower-case file extensions picked up by folder scans.
    pub extensions: Vec<String>,
    pub interaction: InteractionMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page: PageSize::default(),
            initial_width: 200.0,
            zoom_factor: 1.05,
            min_width: 1.0,
            grid: Grid::default(),
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            interaction: InteractionMode::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CollageError::Settings(format!("Couldn't read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let mut settings: Settings = serde_json::from_str(contents)
            .map_err(|e| CollageError::Settings(e.to_string()))?;
        settings.extensions = settings
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;

        if !(self.zoom_factor.is_finite() && self.zoom_factor > 1.0) {
            return Err(CollageError::Settings(format!(
                "zoom_factor must be greater than 1, got {}",
                self.zoom_factor
            )));
        }
        if !(self.min_width.is_finite() && self.min_width > 0.0) {
            return Err(CollageError::Settings(format!(
                "min_width must be positive, got {}",
                self.min_width
            )));
        }
        if !(self.initial_width.is_finite() && self.initial_width >= self.min_width) {
            return Err(CollageError::Settings(format!(
                "initial_width must be at least min_width ({}), got {}",
                self.min_width, self.initial_width
            )));
        }
        if self.grid.per_row == 0 {
            return Err(CollageError::Settings("grid.per_row must be at least 1".into()));
        }
        if self.extensions.is_empty() {
            return Err(CollageError::Settings("extensions can't be empty".into()));
        }
        Ok(())
    }

    pub fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|accepted| *accepted == ext))
    }
}
