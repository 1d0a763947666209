use crate::geometry::Point;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};

/// Row-major grid used to lay out images after they are added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grid {
    pub spacing: f64,
    pub per_row: usize,
    /// Vertical distance between the tops of two consecutive rows.
    pub row_pitch: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            spacing: 10.0,
            per_row: 4,
            row_pitch: 220.0,
        }
    }
}

/// Moves every placement back onto the grid, in scene order.
///
/// Each image advances the cursor by its own display width, so rows of
/// differently sized images stay packed. Rotation is left untouched.
pub fn arrange(scene: &mut Scene, grid: &Grid) {
    let per_row = grid.per_row.max(1);
    let mut cursor = Point::new(grid.spacing, grid.spacing);

    for (index, placement) in scene.iter_mut().enumerate() {
        placement.set_position(cursor);
        cursor.x += placement.display_width() + grid.spacing;

        if (index + 1) % per_row == 0 {
            cursor.x = grid.spacing;
            cursor.y += grid.row_pitch;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::placement::{Placement, SourceImage};

    fn scene_of(widths: &[f64]) -> Scene {
        let mut scene = Scene::new();
        for (index, width) in widths.iter().enumerate() {
            let source = SourceImage::new(format!("{}.png", index), 400, 300);
            scene.push(Placement::new(source, *width, Point::default()));
        }
        scene
    }

    fn positions(scene: &Scene) -> Vec<(f64, f64)> {
        scene
            .iter()
            .map(|placement| (placement.position().x, placement.position().y))
            .collect()
    }

    #[test]
    fn test_arrange_wraps_rows() {
        let mut scene = scene_of(&[200.0; 5]);
        arrange(&mut scene, &Grid::default());

        assert_eq!(
            vec![
                (10.0, 10.0),
                (220.0, 10.0),
                (430.0, 10.0),
                (640.0, 10.0),
                (10.0, 230.0),
            ],
            positions(&scene)
        );
    }

    #[test]
    fn test_arrange_advances_by_each_width() {
        let mut scene = scene_of(&[100.0, 50.0, 80.0]);
        let grid = Grid {
            spacing: 5.0,
            per_row: 2,
            row_pitch: 120.0,
        };
        arrange(&mut scene, &grid);

        assert_eq!(vec![(5.0, 5.0), (110.0, 5.0), (5.0, 125.0)], positions(&scene));
    }

    #[test]
    fn test_arrange_empty_scene() {
        let mut scene = Scene::new();
        arrange(&mut scene, &Grid::default());
        assert!(scene.is_empty());
    }
}
