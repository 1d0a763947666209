use crate::scene::PlacementId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = CollageError> = std::result::Result<T, E>;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CollageError {
    #[error("{} is not a readable image: {reason}", .path.display())]
    InvalidSource { path: PathBuf, reason: String },

    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot save an empty PDF: add at least one image before exporting")]
    EmptyScene,

    #[error("Source image {} is no longer available: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: BoxedError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BoxedError,
    },

    #[error("No placement with id {0}")]
    UnknownPlacement(PlacementId),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl CollageError {
    pub(crate) fn source_unavailable(
        path: impl Into<PathBuf>,
        source: impl Into<BoxedError>,
    ) -> Self {
        CollageError::SourceUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<BoxedError>) -> Self {
        CollageError::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Short title for the dialog or log line reporting this error.
    pub fn title(&self) -> &'static str {
        match self {
            CollageError::InvalidSource { .. } | CollageError::Decode { .. } => {
                "Error Adding Image"
            }
            CollageError::EmptyScene => "No Content",
            CollageError::SourceUnavailable { .. } | CollageError::Write { .. } => "Save Error",
            CollageError::UnknownPlacement(_) => "Unknown Image",
            CollageError::Settings(_) => "Invalid Settings",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let error = CollageError::InvalidSource {
            path: PathBuf::from("photos/cat.png"),
            reason: "unsupported format".to_string(),
        };
        assert_eq!(
            "photos/cat.png is not a readable image: unsupported format",
            error.to_string()
        );
        assert_eq!("Error Adding Image", error.title());

        let error = CollageError::write(
            "out/page.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!("Failed to write out/page.pdf: denied", error.to_string());
        assert_eq!("Save Error", error.title());
    }

    #[test]
    fn test_empty_scene_title() {
        assert_eq!("No Content", CollageError::EmptyScene.title());
    }
}
