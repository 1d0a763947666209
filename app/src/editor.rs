use crate::compositor::{compose, ComposedPage};
use crate::decode::{FsDecoder, ImageDecoder};
use crate::error::{CollageError, Result};
use crate::geometry::Point;
use crate::interaction::{DragState, Gesture, PointerButton};
use crate::layout::arrange;
use crate::pdf::{DocumentWriter, PdfWriter};
use crate::placement::Placement;
use crate::scene::{PlacementId, Scene};
use crate::settings::Settings;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of adding several files: every file either lands in `added` or in
/// `failed`, and one failure never stops the others.
#[derive(Debug, Default)]
pub struct AddReport {
    pub added: Vec<PlacementId>,
    pub failed: Vec<(PathBuf, CollageError)>,
}

impl AddReport {
    fn merge(&mut self, other: AddReport) {
        self.added.extend(other.added);
        self.failed.extend(other.failed);
    }
}

/// Owns the scene and everything the host UI mutates: selection, which image
/// is raised to the front and the in-progress drag.
pub struct Editor {
    settings: Settings,
    decoder: Box<dyn ImageDecoder>,
    writer: Box<dyn DocumentWriter>,
    scene: Scene,
    selected: Option<PlacementId>,
    raised: Option<PlacementId>,
    drag: DragState,
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self::with_backends(settings, Box::new(FsDecoder), Box::new(PdfWriter))
    }

    pub fn with_backends(
        settings: Settings,
        decoder: Box<dyn ImageDecoder>,
        writer: Box<dyn DocumentWriter>,
    ) -> Self {
        Self {
            settings,
            decoder,
            writer,
            scene: Scene::new(),
            selected: None,
            raised: None,
            drag: DragState::Idle,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selected(&self) -> Option<PlacementId> {
        self.selected
    }

    pub fn is_selected(&self, id: PlacementId) -> bool {
        self.selected == Some(id)
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Adds one image and re-flows the grid. A failure leaves the scene as it was.
    pub fn add_file(&mut self, path: &Path) -> Result<PlacementId> {
        let id = self.push_file(path)?;
        self.arrange();
        Ok(id)
    }

    /// Adds every image in `dir` whose extension is accepted, sorted by name.
    pub fn add_folder(&mut self, dir: &Path) -> Result<AddReport> {
        let files = self.scan_folder(dir)?;
        info!("Adding {} images from {}", files.len(), dir.display());

        let report = self.push_files(files);
        self.arrange();
        Ok(report)
    }

    /// Adds files as given and folders as scanned, in argument order.
    pub fn add_paths(&mut self, paths: &[PathBuf]) -> AddReport {
        let mut report = AddReport::default();
        for path in paths {
            if path.is_dir() {
                match self.scan_folder(path) {
                    Ok(files) => report.merge(self.push_files(files)),
                    Err(e) => report.failed.push((path.clone(), e)),
                }
            } else {
                match self.push_file(path) {
                    Ok(id) => report.added.push(id),
                    Err(e) => report.failed.push((path.clone(), e)),
                }
            }
        }
        self.arrange();
        report
    }

    fn scan_folder(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let unreadable = |e: std::io::Error| CollageError::InvalidSource {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        };

        let entries = fs::read_dir(dir).map_err(unreadable)?;
        Ok(self.accepted_files(dir, entries.map(|entry| entry.map(|e| e.path()))))
    }

    /// Sorted image files among `entries`. Entries that can't be read are
    /// logged and skipped.
    fn accepted_files(
        &self,
        dir: &Path,
        entries: impl IntoIterator<Item = std::io::Result<PathBuf>>,
    ) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping an entry of {}: {}", dir.display(), e);
                    continue;
                }
            };
            if path.is_file() && self.settings.accepts_extension(&path) {
                files.push(path);
            } else {
                debug!("Skipping {}", path.display());
            }
        }
        files.sort();
        files
    }

    fn push_files(&mut self, files: Vec<PathBuf>) -> AddReport {
        let mut report = AddReport::default();
        for path in files {
            match self.push_file(&path) {
                Ok(id) => report.added.push(id),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }
        report
    }

    fn push_file(&mut self, path: &Path) -> Result<PlacementId> {
        let origin = Point::new(self.settings.grid.spacing, self.settings.grid.spacing);
        let placement = Placement::create(
            self.decoder.as_ref(),
            path,
            self.settings.initial_width,
            origin,
        )?
        .with_min_width(self.settings.min_width);

        let id = self.scene.push(placement);
        debug!("Added {} as {}", path.display(), id);
        Ok(id)
    }

    pub fn arrange(&mut self) {
        arrange(&mut self.scene, &self.settings.grid);
    }

    pub fn select(&mut self, id: PlacementId) -> Result<()> {
        if !self.scene.contains(id) {
            return Err(CollageError::UnknownPlacement(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Back-to-front display order: scene order, with the last clicked image
    /// moved on top. Export ignores this and always uses scene order.
    pub fn stacking_order(&self) -> Vec<PlacementId> {
        let mut order = self
            .scene
            .ids()
            .filter(|id| Some(*id) != self.raised)
            .collect::<Vec<_>>();
        order.extend(self.raised.filter(|id| self.scene.contains(*id)));
        order
    }

    /// Front-most placement under the screen point.
    pub fn placement_at(&self, point: Point) -> Option<PlacementId> {
        self.stacking_order().into_iter().rev().find(|id| {
            self.scene
                .get(*id)
                .is_some_and(|placement| placement.contains(point))
        })
    }

    /// Selects and raises the image under the pointer, and starts the drag
    /// gesture bound to `button`. Returns the image hit, if any.
    pub fn pointer_pressed(&mut self, point: Point, button: PointerButton) -> Option<PlacementId> {
        let Some(id) = self.placement_at(point) else {
            self.drag = DragState::Idle;
            return None;
        };

        self.selected = Some(id);
        self.raised = Some(id);
        self.drag = match self.settings.interaction.gesture_for(button) {
            Some(gesture) => DragState::Dragging {
                target: id,
                gesture,
                last: point,
            },
            None => DragState::Idle,
        };
        Some(id)
    }

    pub fn pointer_dragged(&mut self, point: Point) {
        let DragState::Dragging {
            target,
            gesture,
            last,
        } = self.drag
        else {
            return;
        };

        let Some(placement) = self.scene.get_mut(target) else {
            self.drag = DragState::Idle;
            return;
        };

        match gesture {
            Gesture::Translate => {
                let delta = point - last;
                placement.move_by(delta.x, delta.y);
            }
            Gesture::Rotate => {
                let angle = (point - placement.center()).angle_degrees();
                placement.rotate_to(angle);
            }
        }

        self.drag = DragState::Dragging {
            target,
            gesture,
            last: point,
        };
    }

    pub fn pointer_released(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Zooms the image under the pointer one step: in for a non-negative
    /// `delta_y`, out otherwise.
    pub fn scroll(&mut self, point: Point, delta_y: f64) -> Option<PlacementId> {
        let id = self.placement_at(point)?;
        self.zoom(id, delta_y).ok()?;
        Some(id)
    }

    pub fn zoom(&mut self, id: PlacementId, delta_y: f64) -> Result<f64> {
        let zoom_factor = self.settings.zoom_factor;
        let placement = self
            .scene
            .get_mut(id)
            .ok_or(CollageError::UnknownPlacement(id))?;

        let factor = if delta_y < 0.0 {
            1.0 / zoom_factor
        } else {
            zoom_factor
        };
        Ok(placement.scale_by(factor))
    }

    pub fn rotate(&mut self, id: PlacementId, degrees: f64) -> Result<()> {
        self.scene
            .get_mut(id)
            .ok_or(CollageError::UnknownPlacement(id))?
            .rotate_to(degrees);
        Ok(())
    }

    /// Removes the selected image and re-flows the grid.
    pub fn delete_selected(&mut self) -> Option<Placement> {
        let id = self.selected.take()?;
        let removed = self.scene.remove(id).ok()?;

        if self.raised == Some(id) {
            self.raised = None;
        }
        if self.drag.target() == Some(id) {
            self.drag = DragState::Idle;
        }
        self.arrange();
        info!("Removed {}", removed.source().file_name());
        Some(removed)
    }

    pub fn plan(&self) -> Result<ComposedPage> {
        compose(&self.scene, self.settings.page.size())
    }

    /// Flattens the scene into a PDF at `path`. The scene is never modified,
    /// whether or not the export succeeds.
    pub fn export(&self, path: &Path) -> Result<()> {
        let page = self.plan()?;
        info!(
            "Exporting {} images to {}",
            page.instructions.len(),
            path.display()
        );
        self.writer.write(&page, self.decoder.as_ref(), path)
    }

    /// Logs a failure the way the UI reports it to the user.
    pub fn report(&self, failure: &CollageError) {
        error!("{}: {}", failure.title(), failure);
    }
}
