//! Local directory assets: content fingerprints and file listings.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Result, StackError};

/// Require `path` to be an existing directory.
pub fn require_directory(path: &Path, role: &str) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(StackError::configuration(
            path,
            format!("{role} must be a directory"),
        )),
        Err(error) => Err(StackError::configuration(
            path,
            format!("{role} does not exist: {error}"),
        )),
    }
}

/// Regular files below `root`, as paths relative to it, sorted. Symlinks are
/// followed and listed under their own path, so a linked file contributes
/// its target's contents. A dangling link or a link cycle is an error.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|error| {
            StackError::configuration(root, format!("failed to walk directory: {error}"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push(relative);
    }
    files.sort();
    Ok(files)
}

/// SHA-256 over every file's relative path and contents. Metadata such as
/// timestamps and permissions does not contribute, so rebuilding identical
/// content yields an identical fingerprint.
pub fn fingerprint_directory(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for relative in list_files(root)? {
        let absolute = root.join(&relative);
        let contents = fs::read(&absolute).map_err(|error| {
            StackError::configuration(&absolute, format!("failed to read asset file: {error}"))
        })?;
        let file_digest = Sha256::digest(&contents);
        hasher.update(relative_key(&relative).as_bytes());
        hasher.update(b":");
        hasher.update(format!("{file_digest:x}").as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_a_configuration_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("absent");

        let error = require_directory(&missing, "code artifact directory")
            .expect_err("missing directory should fail");
        assert!(matches!(error, StackError::Configuration { ref path, .. } if path == &missing));
    }

    #[test]
    fn file_is_not_accepted_as_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("bootstrap");
        fs::write(&file, b"binary").expect("write file");

        assert!(require_directory(&file, "code artifact directory").is_err());
    }

    #[test]
    fn lists_nested_files_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("triage")).expect("mkdir");
        fs::write(temp.path().join("b.yml"), b"b").expect("write");
        fs::write(temp.path().join("a.yml"), b"a").expect("write");
        fs::write(temp.path().join("triage").join("c.yml"), b"c").expect("write");

        let files = list_files(temp.path()).expect("listing should pass");
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.yml"),
                PathBuf::from("b.yml"),
                Path::new("triage").join("c.yml"),
            ]
        );
    }

    #[test]
    fn fingerprint_tracks_content_not_location() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        for dir in [first.path(), second.path()] {
            fs::write(dir.join("prompt.yml"), b"model: a").expect("write");
        }

        let a = fingerprint_directory(first.path()).expect("fingerprint");
        let b = fingerprint_directory(second.path()).expect("fingerprint");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        fs::write(second.path().join("prompt.yml"), b"model: b").expect("write");
        let changed = fingerprint_directory(second.path()).expect("fingerprint");
        assert_ne!(a, changed);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_listed_and_fingerprinted_through_its_target() {
        use std::os::unix::fs::symlink;

        let store = tempfile::tempdir().expect("tempdir");
        let dist = tempfile::tempdir().expect("tempdir");
        let target = store.path().join("analyzer");
        fs::write(&target, b"build one").expect("write");
        symlink(&target, dist.path().join("bootstrap")).expect("symlink");

        let files = list_files(dist.path()).expect("listing should pass");
        assert_eq!(files, vec![PathBuf::from("bootstrap")]);

        let before = fingerprint_directory(dist.path()).expect("fingerprint");
        fs::write(&target, b"build two").expect("write");
        let after = fingerprint_directory(dist.path()).expect("fingerprint");
        assert_ne!(before, after);
        assert_ne!(before, format!("{:x}", Sha256::digest(b"")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_prompt_is_listed_next_to_regular_files() {
        use std::os::unix::fs::symlink;

        let shared = tempfile::tempdir().expect("tempdir");
        let prompts = tempfile::tempdir().expect("tempdir");
        fs::write(shared.path().join("extra.prompt.yml"), b"model: a").expect("write");
        fs::write(prompts.path().join("security-analysis.prompt.yml"), b"model: b")
            .expect("write");
        symlink(
            shared.path().join("extra.prompt.yml"),
            prompts.path().join("extra.prompt.yml"),
        )
        .expect("symlink");

        let files = list_files(prompts.path()).expect("listing should pass");
        assert_eq!(
            files,
            vec![
                PathBuf::from("extra.prompt.yml"),
                PathBuf::from("security-analysis.prompt.yml"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_a_configuration_error() {
        use std::os::unix::fs::symlink;

        let dist = tempfile::tempdir().expect("tempdir");
        symlink(dist.path().join("missing"), dist.path().join("bootstrap")).expect("symlink");

        let error = list_files(dist.path()).expect_err("dangling link should fail");
        assert!(matches!(error, StackError::Configuration { .. }));
    }
}
