use std::{fs, io, path::PathBuf};

use directories::ProjectDirs;
use tempdir::TempDir;

/// Resolve and create the directory the database lives in.
///
/// An explicit ``data_dir`` wins. Otherwise ``ephemeral`` selects a fresh temporary directory
/// and the default is the platform data directory for ``app_name``.
pub fn setup_data_dir(
    app_name: &str,
    data_dir: Option<PathBuf>,
    ephemeral: bool,
) -> io::Result<PathBuf> {
    let dir = match data_dir {
        Some(dir) => dir,
        None if ephemeral => TempDir::new(app_name)?.into_path(),
        None => ProjectDirs::from("", "", app_name)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?,
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
