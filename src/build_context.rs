// ABOUTME: Build context packaging for image builds.
// ABOUTME: Validates the directory and archives it in memory as a tar stream.

use crate::error::{Error, Result};
use std::path::Path;

/// Dockerfile name the engine looks for when none is given.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Reject build input before anything is sent to the engine.
pub fn validate_build_dir(path: &Path, dockerfile: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::BuildContext("no build path given".to_string()));
    }
    if !path.is_dir() {
        return Err(Error::BuildContext(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    if !path.join(dockerfile).is_file() {
        return Err(Error::BuildContext(format!(
            "no {} in {}",
            dockerfile,
            path.display()
        )));
    }
    Ok(())
}

/// Archive every file under `path`, with paths relative to it.
pub fn tar_directory(path: &Path) -> Result<Vec<u8>> {
    let mut ar = tar::Builder::new(Vec::new());
    ar.follow_symlinks(false);
    append_dir(&mut ar, path, Path::new(""))?;
    Ok(ar.into_inner()?)
}

fn append_dir(ar: &mut tar::Builder<Vec<u8>>, root: &Path, relative: &Path) -> Result<()> {
    let mut entries = std::fs::read_dir(root.join(relative))?
        .collect::<std::io::Result<Vec<_>>>()?;
    // Stable ordering keeps the archive (and the engine's build cache) reproducible.
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = relative.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            ar.append_dir(&name, entry.path())?;
            append_dir(ar, root, &name)?;
        } else {
            ar.append_path_with_name(entry.path(), &name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entries(archive: &[u8]) -> Vec<(String, String)> {
        let mut ar = tar::Archive::new(archive);
        ar.entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().display().to_string();
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                (path, content)
            })
            .collect()
    }

    #[test]
    fn archives_nested_files_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/main.sh"), "echo hi\n").unwrap();

        let archive = tar_directory(dir.path()).unwrap();
        let found = entries(&archive);

        assert!(found.contains(&("Dockerfile".to_string(), "FROM scratch\n".to_string())));
        assert!(found.contains(&("app/main.sh".to_string(), "echo hi\n".to_string())));
    }

    #[test]
    fn empty_path_rejected() {
        let err = validate_build_dir(Path::new(""), DEFAULT_DOCKERFILE).unwrap_err();
        assert!(matches!(err, Error::BuildContext(_)));
    }

    #[test]
    fn missing_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(validate_build_dir(&missing, DEFAULT_DOCKERFILE).is_err());
    }

    #[test]
    fn missing_dockerfile_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_build_dir(dir.path(), DEFAULT_DOCKERFILE).unwrap_err();
        assert!(err.to_string().contains("no Dockerfile"));

        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        assert!(validate_build_dir(dir.path(), DEFAULT_DOCKERFILE).is_ok());
    }
}
