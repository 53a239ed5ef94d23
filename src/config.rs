//! The seam manifest (`seam.toml`).
//!
//! The manifest declares where vendored trees live, which tools to use,
//! and — per project — the ordered patch series. Relative paths are
//! resolved against the manifest's own directory, so a checkout can be
//! converged from any working directory.
//!
//! ```toml
//! [vendor]
//! root = "vendor"
//!
//! [tools]
//! git = "git"            # empty string = not available
//! patch = "patch"
//!
//! [[project]]
//! name = "libfoo"
//! patches = ["patches/libfoo/0001-a.patch", "patches/libfoo/0002-b.patch"]
//!
//! [[project]]
//! name = "libbar"
//! patch_glob = "patches/libbar/*.patch"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SeamError;
use crate::series::PatchSeries;

// ---------------------------------------------------------------------------
// Raw deserialized layout
// ---------------------------------------------------------------------------

/// Top-level manifest layout.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    /// Vendor tree settings.
    #[serde(default)]
    vendor: VendorSection,

    /// Tool locations.
    #[serde(default)]
    tools: ToolsSection,

    /// Vendored projects.
    #[serde(default, rename = "project")]
    projects: Vec<RawProject>,
}

/// `[vendor]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VendorSection {
    /// Directory holding vendored trees, relative to the manifest.
    #[serde(default = "default_vendor_root")]
    root: String,
}

impl Default for VendorSection {
    fn default() -> Self {
        Self {
            root: default_vendor_root(),
        }
    }
}

fn default_vendor_root() -> String {
    "vendor".to_owned()
}

/// `[tools]` section. `None` means "use the default name from PATH";
/// an empty string means "this tool is not available".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolsSection {
    git: Option<String>,
    patch: Option<String>,
}

/// One `[[project]]` entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    /// Tree lives at `<vendor.root>/<name>`.
    name: String,

    /// Explicit ordered patch list.
    #[serde(default)]
    patches: Option<Vec<String>>,

    /// Glob for the patch series, sorted lexicographically.
    #[serde(default)]
    patch_glob: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved manifest
// ---------------------------------------------------------------------------

/// A loaded, validated manifest with all paths resolved.
#[derive(Clone, Debug)]
pub struct Manifest {
    /// Path the manifest was loaded from.
    path: PathBuf,
    /// Absolute directory containing the manifest; the source root.
    source_root: PathBuf,
    /// Vendor root relative to the source root.
    vendor_root: PathBuf,
    /// Configured tool paths (`None` = default name).
    git: Option<String>,
    patch: Option<String>,
    projects: Vec<RawProject>,
}

/// One vendored project, resolved and ready to converge or verify.
#[derive(Clone, Debug)]
pub struct Project {
    /// Project name from the manifest.
    pub name: String,
    /// Tree path relative to the source root (`<vendor.root>/<name>`).
    pub tree: PathBuf,
    /// The ordered patch series, absolute paths.
    pub series: PatchSeries,
}

impl Manifest {
    /// Load and validate a manifest.
    pub fn load(path: &Path) -> Result<Self, SeamError> {
        let text = fs::read_to_string(path).map_err(|err| SeamError::Config {
            path: path.to_path_buf(),
            detail: format!("could not read manifest: {err}"),
        })?;
        let raw: RawManifest = toml::from_str(&text).map_err(|err| SeamError::Config {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;

        let mut seen = BTreeSet::new();
        for project in &raw.projects {
            if project.name.is_empty()
                || project.name == "."
                || project.name == ".."
                || project.name.contains(['/', '\\'])
            {
                return Err(SeamError::Config {
                    path: path.to_path_buf(),
                    detail: format!(
                        "invalid project name '{}': names must be plain directory names",
                        project.name
                    ),
                });
            }
            if !seen.insert(project.name.as_str()) {
                return Err(SeamError::Config {
                    path: path.to_path_buf(),
                    detail: format!("project '{}' is declared twice", project.name),
                });
            }
            match (&project.patches, &project.patch_glob) {
                (Some(_), Some(_)) => {
                    return Err(SeamError::Config {
                        path: path.to_path_buf(),
                        detail: format!(
                            "project '{}' declares both `patches` and `patch_glob`; pick one",
                            project.name
                        ),
                    });
                }
                (None, None) => {
                    return Err(SeamError::Config {
                        path: path.to_path_buf(),
                        detail: format!(
                            "project '{}' declares neither `patches` nor `patch_glob`",
                            project.name
                        ),
                    });
                }
                _ => {}
            }
        }

        let absolute = std::path::absolute(path).map_err(SeamError::Io)?;
        let source_root = absolute
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self {
            path: path.to_path_buf(),
            source_root,
            vendor_root: PathBuf::from(&raw.vendor.root),
            git: raw.tools.git,
            patch: raw.tools.patch,
            projects: raw.projects,
        })
    }

    /// Path the manifest was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute directory containing the manifest. All tool invocations
    /// run with this as their working directory.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Configured git path, if the manifest sets one.
    #[must_use]
    pub fn git_tool(&self) -> Option<&str> {
        self.git.as_deref()
    }

    /// Configured patch path, if the manifest sets one.
    #[must_use]
    pub fn patch_tool(&self) -> Option<&str> {
        self.patch.as_deref()
    }

    /// Names of all declared projects, in manifest order.
    #[must_use]
    pub fn project_names(&self) -> Vec<String> {
        self.projects.iter().map(|p| p.name.clone()).collect()
    }

    /// Resolve one project by name.
    pub fn project(&self, name: &str) -> Result<Project, SeamError> {
        let raw = self
            .projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SeamError::ProjectNotFound {
                name: name.to_owned(),
                config: self.path.clone(),
                known: self.project_names(),
            })?;
        self.resolve(raw)
    }

    /// Resolve every project, in manifest order.
    pub fn all_projects(&self) -> Result<Vec<Project>, SeamError> {
        self.projects.iter().map(|raw| self.resolve(raw)).collect()
    }

    fn resolve(&self, raw: &RawProject) -> Result<Project, SeamError> {
        let series = match (&raw.patches, &raw.patch_glob) {
            (Some(patches), None) => patches
                .iter()
                .map(PathBuf::from)
                .collect::<PatchSeries>()
                .resolved_against(&self.source_root),
            (None, Some(pattern)) => {
                let absolute = if Path::new(pattern).is_absolute() {
                    pattern.clone()
                } else {
                    self.source_root.join(pattern).to_string_lossy().into_owned()
                };
                PatchSeries::from_glob(&absolute)?
            }
            // load() validated the combination already.
            _ => PatchSeries::default(),
        };
        Ok(Project {
            name: raw.name.clone(),
            tree: self.vendor_root.join(&raw.name),
            series,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
