//! actlog-sources: file-backed collaborators for actlog.
//!
//! Each adapter implements one of the traits in [`actlog_core::source`]:
//!
//! | Adapter | Trait | Reads / writes |
//! |---------|-------|----------------|
//! | [`FileStreamFactory`] | `StreamFactory` | `<events_dir>/<subscription>.jsonl` |
//! | [`FileDirectoryFactory`] | `DirectoryFactory` | `<directory_dir>/<subscription>.json` |
//! | [`StaticSubscriptionLister`], [`DiscoveringSubscriptionLister`] | `SubscriptionLister` | config / `events_dir` |
//! | [`FsArtifactPublisher`] | `ArtifactPublisher` | `<output_dir>/<name>` |

pub mod directory;
pub mod file;
pub mod lister;
pub mod publisher;

pub use directory::FileDirectoryFactory;
pub use file::FileStreamFactory;
pub use lister::{DiscoveringSubscriptionLister, StaticSubscriptionLister};
pub use publisher::FsArtifactPublisher;

use actlog_core::SourceError;
use std::path::{Path, PathBuf};

/// `<dir>/<name>.<extension>`, refusing names that would escape `dir`.
pub(crate) fn file_in(dir: &Path, name: &str, extension: &str) -> Result<PathBuf, SourceError> {
    check_name(name)?;
    Ok(dir.join(format!("{name}.{extension}")))
}

pub(crate) fn check_name(name: &str) -> Result<(), SourceError> {
    let has_separator = name.contains(|c: char| c == '/' || c == '\\');
    if name.is_empty() || name == "." || name == ".." || has_separator {
        return Err(SourceError::NotFound(format!("invalid name {name:?}")));
    }
    Ok(())
}

/// Map "file missing" to [`SourceError::NotFound`], everything else to `Io`.
pub(crate) fn open_error(path: &Path, err: std::io::Error) -> SourceError {
    if err.kind() == std::io::ErrorKind::NotFound {
        SourceError::NotFound(path.display().to_string())
    } else {
        SourceError::Io(err)
    }
}
