use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no .md files found in {}", .0.display())]
    NoFragments(PathBuf),

    #[error("template missing {0} placeholder")]
    MissingPlaceholder(&'static str),

    #[error("{tool} is required to {purpose}")]
    ToolMissing {
        tool: &'static str,
        purpose: &'static str,
    },

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: &'static str, detail: String },

    #[error("pdflatex did not produce {}", .0.display())]
    NoArtifact(PathBuf),
}

impl ReportError {
    pub fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = ReportError::io(
            "read dir",
            Path::new("/tmp/missing"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "read dir /tmp/missing: not found");

        let err = ReportError::ToolMissing {
            tool: "pandoc",
            purpose: "convert markdown to LaTeX",
        };
        assert_eq!(
            err.to_string(),
            "pandoc is required to convert markdown to LaTeX"
        );

        let err = ReportError::MissingPlaceholder("%%MD_BODY%%");
        assert_eq!(err.to_string(), "template missing %%MD_BODY%% placeholder");
    }
}
