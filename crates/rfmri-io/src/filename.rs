//! Filename handling for neuroimaging paths.

use std::path::{Path, PathBuf};

/// Split a path into directory, basename and extension.
///
/// The compound `.nii.gz` extension is treated as one extension, so
/// `/data/epi.nii.gz` splits into `/data`, `epi` and `.nii.gz`.
pub fn split_filename<P: AsRef<Path>>(path: P) -> (PathBuf, String, String) {
    let path = path.as_ref();
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(base) = name.strip_suffix(".nii.gz") {
        return (dir, base.to_string(), ".nii.gz".to_string());
    }
    match name.rfind('.') {
        Some(pos) if pos > 0 => (dir, name[..pos].to_string(), name[pos..].to_string()),
        _ => (dir, name, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_extension() {
        let (dir, base, ext) = split_filename("/data/scans/epi.nii");
        assert_eq!(dir, PathBuf::from("/data/scans"));
        assert_eq!(base, "epi");
        assert_eq!(ext, ".nii");
    }

    #[test]
    fn test_compound_extension() {
        let (_, base, ext) = split_filename("/data/epi2orig.nii.gz");
        assert_eq!(base, "epi2orig");
        assert_eq!(ext, ".nii.gz");
    }

    #[test]
    fn test_mgh_extension() {
        let (_, base, ext) = split_filename("lh.layer5.mgh");
        assert_eq!(base, "lh.layer5");
        assert_eq!(ext, ".mgh");
    }

    #[test]
    fn test_dotted_basename() {
        let (_, base, ext) = split_filename("/anatomy/layer/lh.layer5");
        assert_eq!(base, "lh");
        assert_eq!(ext, ".layer5");
    }

    #[test]
    fn test_no_extension() {
        let (_, base, ext) = split_filename("/anatomy/T1");
        assert_eq!(base, "T1");
        assert_eq!(ext, "");
    }

    #[test]
    fn test_hidden_file() {
        let (_, base, ext) = split_filename("/home/.bashrc");
        assert_eq!(base, ".bashrc");
        assert_eq!(ext, "");
    }
}
