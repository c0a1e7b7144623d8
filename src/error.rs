use std::path::PathBuf;
use thiserror::Error;

/// Result type for segeval library operations
pub type Result<T> = std::result::Result<T, SegError>;

/// Errors raised while configuring or running an evaluation
#[derive(Error, Debug)]
pub enum SegError {
    /// Unsupported identifier or invalid option value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required input (manifest, image, weight file) is not on disk
    #[error("{kind} does not exist: {}", .path.display())]
    MissingFile { kind: &'static str, path: PathBuf },

    /// Enumeration found nothing to evaluate
    #[error("No files in directory: {location}")]
    EmptyImageList { location: String },

    /// An input file could not be decoded as an image
    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Model loading or forward pass failed
    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

impl SegError {
    /// Whether this error belongs to the configuration taxonomy
    /// (unsupported identifiers, missing inputs, empty image list).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SegError::Configuration(_) | SegError::MissingFile { .. } | SegError::EmptyImageList { .. }
        )
    }

    pub(crate) fn missing(kind: &'static str, path: impl Into<PathBuf>) -> Self {
        SegError::MissingFile {
            kind,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_message_names_path() {
        let err = SegError::missing("manifest file", "/data/VOC2012/list/val.txt");
        assert_eq!(
            err.to_string(),
            "manifest file does not exist: /data/VOC2012/list/val.txt"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn model_errors_are_not_configuration() {
        assert!(!SegError::Model("bad output".into()).is_configuration());
    }
}
