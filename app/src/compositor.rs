//! Converts a scene laid out in screen space into draw instructions for one
//! fixed-size PDF page.
//!
//! For a placement at screen position `(x, y)` with bounding box `(w, h)` and
//! rotation `θ`, the page transform is
//!
//! ```text
//! M = Translate(x, H - y - h) ∘ Translate(w/2, h/2) ∘ Rotate(-θ) ∘ Translate(-w/2, -h/2)
//! ```
//!
//! where `H` is the page height. The rotation is negated because screen
//! angles grow clockwise (Y down) while PDF angles grow counter-clockwise
//! (Y up), so an image turned clockwise on screen stays clockwise on paper.

use crate::error::{CollageError, Result};
use crate::geometry::{Size, Transform};
use crate::placement::{Placement, SourceImage};
use crate::scene::{PlacementId, Scene};
use log::debug;
use serde::Serialize;

/// Draw `source` filling a `width` x `height` box under `transform`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawInstruction {
    pub placement: PlacementId,
    pub source: SourceImage,
    pub transform: Transform,
    pub width: f64,
    pub height: f64,
}

/// A single flattened page: its size and the images to draw, back to front.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedPage {
    pub size: Size,
    pub instructions: Vec<DrawInstruction>,
}

/// Page-space transform that places the unit-less image box of `placement`.
pub fn page_transform(placement: &Placement, page_height: f64) -> Transform {
    let position = placement.position();
    let size = placement.bounding_box();
    let page_y = page_height - position.y - size.height;
    let translate = Transform::translate(position.x, page_y);

    let rotation = placement.rotation_degrees();
    if rotation == 0.0 {
        return translate;
    }

    let half = size.half();
    translate
        .concat(Transform::translate(half.x, half.y))
        .concat(Transform::rotate(-rotation.to_radians()))
        .concat(Transform::translate(-half.x, -half.y))
}

pub fn compose(scene: &Scene, page_size: Size) -> Result<ComposedPage> {
    if scene.is_empty() {
        return Err(CollageError::EmptyScene);
    }

    let instructions = scene
        .iter_with_ids()
        .map(|(id, placement)| {
            let transform = page_transform(placement, page_size.height);
            let size = placement.bounding_box();
            debug!(
                "{} {} -> [{:.3} {:.3} {:.3} {:.3} {:.3} {:.3}] {:.3}x{:.3}",
                id,
                placement.source().file_name(),
                transform.a,
                transform.b,
                transform.c,
                transform.d,
                transform.e,
                transform.f,
                size.width,
                size.height
            );
            DrawInstruction {
                placement: id,
                source: placement.source().clone(),
                transform,
                width: size.width,
                height: size.height,
            }
        })
        .collect();

    Ok(ComposedPage {
        size: page_size,
        instructions,
    })
}
