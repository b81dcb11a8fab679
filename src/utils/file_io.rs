use std::fs::create_dir_all;
use std::io;
use std::path::Path;

use tracing::error;

pub fn create_parent_dir_if_not_exist(path: &Path) -> io::Result<()> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            if let Err(e) = create_dir_all(parent_dir) {
                error!("Failed to create directory {:?}: {:?}", parent_dir, e);
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Replace `path` with `buf` through a sibling temp file, so readers never
/// observe a partially written file.
pub fn write_atomically(
    path: &Path,
    buf: &[u8],
) -> io::Result<()> {
    create_parent_dir_if_not_exist(path)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, buf)?;
    std::fs::rename(&tmp, path)
}
