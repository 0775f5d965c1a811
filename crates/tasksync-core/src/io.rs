use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode for generated task documents.
#[cfg(unix)]
const DOCUMENT_MODE: u32 = 0o644;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting task documents.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// [`atomic_write`], then relax the tempfile's 0600 mode to 0644.
pub fn write_document(path: &Path, data: &[u8]) -> Result<()> {
    atomic_write(path, data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(DOCUMENT_MODE))?;
    }
    Ok(())
}

/// Remove a file if present. Returns true if something was deleted.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
