use std::path::Path;

/// Errors surfaced by the placement core.
///
/// Window-system failures during the periodic reconciliation pass are logged
/// and isolated per window rather than propagated; these variants reach
/// callers only from explicit operations (capture, save, remove).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{label}' is not in the current {kind} window list")]
    NotFound { kind: &'static str, label: String },

    #[error("window system query failed: {message}")]
    OsQuery { message: String },

    #[error("failed to persist placements to '{path}': {message}")]
    Persistence { path: String, message: String },
}

impl Error {
    pub fn os_query(err: impl std::fmt::Display) -> Self {
        Error::OsQuery {
            message: err.to_string(),
        }
    }

    pub fn persistence(path: &Path, err: impl std::fmt::Display) -> Self {
        Error::Persistence {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = Error::NotFound {
            kind: "live",
            label: "Notes (notes.exe)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "'Notes (notes.exe)' is not in the current live window list"
        );
    }

    #[test]
    fn test_persistence_display_includes_path() {
        let error = Error::persistence(Path::new("/tmp/positions.json"), "disk full");
        assert!(error.to_string().contains("/tmp/positions.json"));
        assert!(error.to_string().contains("disk full"));
    }
}
