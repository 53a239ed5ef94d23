//! The ordered patch series.
//!
//! A [`PatchSeries`] is the list of diff files meant to be applied, in
//! order, to exactly one vendored tree. Order is significant everywhere:
//! the driver applies front-to-back and reverts back-to-front, and the
//! verifier aligns the *last* element with `HEAD` (the most recently
//! applied patch is the newest commit).

use std::path::{Path, PathBuf};

use crate::error::SeamError;

/// An ordered sequence of patch-file paths bound to one vendored tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchSeries {
    patches: Vec<PathBuf>,
}

impl PatchSeries {
    /// Build a series from an explicit, already-ordered list.
    #[must_use]
    pub const fn new(patches: Vec<PathBuf>) -> Self {
        Self { patches }
    }

    /// Build a series from a glob pattern, sorted lexicographically.
    ///
    /// A pattern that matches nothing is refused — an empty glob is almost
    /// always a typo in the manifest, and silently patching nothing would
    /// defeat the point.
    pub fn from_glob(pattern: &str) -> Result<Self, SeamError> {
        let entries = glob::glob(pattern).map_err(|err| SeamError::Config {
            path: PathBuf::from(pattern),
            detail: format!("invalid glob pattern: {err}"),
        })?;
        let mut patches = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => patches.push(path),
                Err(err) => {
                    return Err(SeamError::Config {
                        path: err.path().to_path_buf(),
                        detail: format!("could not read glob match: {}", err.error()),
                    });
                }
            }
        }
        if patches.is_empty() {
            return Err(SeamError::Config {
                path: PathBuf::from(pattern),
                detail: "patch glob matched no files".to_owned(),
            });
        }
        patches.sort();
        Ok(Self { patches })
    }

    /// Number of patches in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// True if the series has no patches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// The patches, in application order.
    #[must_use]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.patches
    }

    /// Iterate in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.patches.iter()
    }
}

impl<'a> IntoIterator for &'a PatchSeries {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.patches.iter()
    }
}

impl AsRef<[PathBuf]> for PatchSeries {
    fn as_ref(&self) -> &[PathBuf] {
        &self.patches
    }
}

impl FromIterator<PathBuf> for PatchSeries {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            patches: iter.into_iter().collect(),
        }
    }
}

/// Convenience for call sites holding string paths.
impl From<&[&str]> for PatchSeries {
    fn from(paths: &[&str]) -> Self {
        paths.iter().map(PathBuf::from).collect()
    }
}

impl PatchSeries {
    /// Resolve every relative patch path against `base`, in place.
    #[must_use]
    pub fn resolved_against(self, base: &Path) -> Self {
        self.patches
            .into_iter()
            .map(|p| if p.is_absolute() { p } else { base.join(p) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn glob_series_is_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["0002-b.patch", "0001-a.patch", "0010-j.patch"] {
            fs::write(dir.path().join(name), "x").expect("write");
        }
        let pattern = dir.path().join("*.patch");
        let series = PatchSeries::from_glob(&pattern.to_string_lossy()).expect("glob");
        let names: Vec<_> = series
            .iter()
            .map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            names,
            [
                Some("0001-a.patch".to_owned()),
                Some("0002-b.patch".to_owned()),
                Some("0010-j.patch".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_glob_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pattern = dir.path().join("*.patch");
        let err = PatchSeries::from_glob(&pattern.to_string_lossy()).unwrap_err();
        assert!(matches!(err, SeamError::Config { .. }));
    }

    #[test]
    fn explicit_order_is_preserved() {
        let series = PatchSeries::from(["z.patch", "a.patch"].as_slice());
        let names: Vec<_> = series.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(names, ["z.patch", "a.patch"]);
    }

    #[test]
    fn resolution_leaves_absolute_paths_alone() {
        let series = PatchSeries::from(["/abs/a.patch", "rel/b.patch"].as_slice());
        let resolved = series.resolved_against(Path::new("/base"));
        assert_eq!(
            resolved.as_slice(),
            [
                PathBuf::from("/abs/a.patch"),
                PathBuf::from("/base/rel/b.patch")
            ]
        );
    }
}
