use crate::{
    errors::{RecordError, RecordResult},
    record::AstRecord,
};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Producer of normalized AST records (the parser collaborator)
///
/// Implementations read one file and return exactly one record, or a
/// structured error. A partially decoded record is never returned.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one source can serve several
/// ingestion callers.
pub trait RecordSource: Send + Sync {
    /// Short identifier used in logs (e.g. "json")
    fn name(&self) -> &str;

    /// Check if this source can read the given file
    fn accepts(&self, path: &Path) -> bool;

    /// Read one record file
    ///
    /// # Errors
    /// Returns `RecordError` if:
    /// - File cannot be read
    /// - File is not a well-formed record
    /// - File is of a kind this source does not handle
    fn read_record(&self, path: &Path) -> Result<AstRecord, RecordError>;

    /// Discover record files in a directory
    ///
    /// Default implementation walks the directory recursively in file-name
    /// order and keeps the files this source accepts. Symbolic links are not
    /// followed. Entries that cannot be read are returned as errors in walk
    /// order, so one bad entry does not hide the rest of the tree.
    fn discover_files(&self, dir: &Path) -> Vec<RecordResult<PathBuf>> {
        WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => (entry.file_type().is_file() && self.accepts(entry.path()))
                    .then(|| Ok(entry.into_path())),
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    warn!("Cannot read {} during discovery: {e}", path.display());
                    Some(Err(RecordError::Io(path, e.into())))
                }
            })
            .collect()
    }
}
