//! Environment checks: tools, manifest, trees.
//!
//! `seam doctor` answers "will converge/verify work on this host?" before
//! a build gets halfway through and fails. Each check carries a fix hint.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use seam_tools::Toolchain;

use crate::config::Manifest;
use crate::error::SeamError;
use crate::format::OutputFormat;

#[derive(Serialize)]
struct DoctorEnvelope {
    checks: Vec<DoctorCheck>,
    all_ok: bool,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

fn print_check(check: &DoctorCheck) {
    let prefix = match check.status.as_str() {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "fail" => "[FAIL]",
        _ => "[???]",
    };
    println!("{} {}", prefix, check.message);
    if let Some(fix) = &check.fix {
        println!("       {fix}");
    }
}

/// Check system requirements and configuration
pub fn run(
    config_path: &Path,
    manifest: Result<Manifest, SeamError>,
    tools: &Toolchain,
    format: OutputFormat,
) -> Result<()> {
    let mut checks = Vec::new();

    checks.push(check_git(tools));
    checks.push(check_patch(tools));
    checks.push(check_any_tool(tools));

    let manifest = match manifest {
        Ok(manifest) => {
            checks.push(DoctorCheck {
                name: "manifest".to_owned(),
                status: "ok".to_owned(),
                message: format!(
                    "manifest: {} ({} project(s))",
                    manifest.path().display(),
                    manifest.project_names().len()
                ),
                fix: None,
            });
            Some(manifest)
        }
        Err(err) => {
            checks.push(DoctorCheck {
                name: "manifest".to_owned(),
                status: "fail".to_owned(),
                message: format!("manifest: {} could not be loaded", config_path.display()),
                fix: Some(err.to_string()),
            });
            None
        }
    };

    if let Some(manifest) = &manifest {
        checks.push(check_repository(manifest.source_root()));
        checks.extend(check_projects(manifest));
    }

    // "warn" alone shouldn't fail a doctor run; missing-but-optional tools
    // are normal on minimal build hosts.
    let all_ok = checks.iter().all(|c| c.status != "fail");

    match format {
        OutputFormat::Json => {
            let envelope = DoctorEnvelope { checks, all_ok };
            println!("{}", format.serialize(&envelope)?);
        }
        OutputFormat::Text => {
            println!("seam doctor");
            println!("===========");
            println!();

            for check in &checks {
                print_check(check);
            }

            println!();
            if all_ok {
                println!("All checks passed!");
            } else {
                println!("Some checks failed. See above for details.");
            }
        }
    }

    Ok(())
}

fn check_git(tools: &Toolchain) -> DoctorCheck {
    tools.git.as_ref().map_or_else(
        || DoctorCheck {
            name: "git".to_owned(),
            status: "warn".to_owned(),
            message: "git: not configured".to_owned(),
            fix: Some("Install git or pass --git <path>.".to_owned()),
        },
        |git| match git.version() {
            Ok(version) => DoctorCheck {
                name: "git".to_owned(),
                status: "ok".to_owned(),
                message: format!("git: {version}"),
                fix: None,
            },
            Err(err) => DoctorCheck {
                name: "git".to_owned(),
                status: "warn".to_owned(),
                message: format!("git: {} is not usable", git.exe().display()),
                fix: Some(err.to_string()),
            },
        },
    )
}

fn check_patch(tools: &Toolchain) -> DoctorCheck {
    tools.patch.as_ref().map_or_else(
        || DoctorCheck {
            name: "patch".to_owned(),
            status: "warn".to_owned(),
            message: "patch: not configured".to_owned(),
            fix: Some("Install patch or pass --patch-tool <path>.".to_owned()),
        },
        |patch| match patch.version() {
            Ok(version) => DoctorCheck {
                name: "patch".to_owned(),
                status: "ok".to_owned(),
                message: format!("patch: {version}"),
                fix: None,
            },
            Err(err) => DoctorCheck {
                name: "patch".to_owned(),
                status: "warn".to_owned(),
                message: format!("patch: {} is not usable", patch.exe().display()),
                fix: Some(err.to_string()),
            },
        },
    )
}

fn check_any_tool(tools: &Toolchain) -> DoctorCheck {
    let any_usable = tools.git.as_ref().is_some_and(|g| g.version().is_ok())
        || tools.patch.as_ref().is_some_and(|p| p.version().is_ok());
    if any_usable {
        DoctorCheck {
            name: "patching tools".to_owned(),
            status: "ok".to_owned(),
            message: "patching tools: at least one usable tool found".to_owned(),
            fix: None,
        }
    } else {
        DoctorCheck {
            name: "patching tools".to_owned(),
            status: "fail".to_owned(),
            message: "patching tools: neither git nor patch is usable".to_owned(),
            fix: Some("Install git (preferred) or patch.".to_owned()),
        }
    }
}

fn check_repository(source_root: &Path) -> DoctorCheck {
    if source_root.join(".git").exists() {
        DoctorCheck {
            name: "repository".to_owned(),
            status: "ok".to_owned(),
            message: "source root: git repository ('git am' strategy available)".to_owned(),
            fix: None,
        }
    } else {
        DoctorCheck {
            name: "repository".to_owned(),
            status: "ok".to_owned(),
            message: "source root: not a git repository (diff-apply strategies will be used)"
                .to_owned(),
            fix: None,
        }
    }
}

fn check_projects(manifest: &Manifest) -> Vec<DoctorCheck> {
    let mut checks = Vec::new();
    match manifest.all_projects() {
        Ok(projects) => {
            for project in projects {
                let tree = manifest.source_root().join(&project.tree);
                let missing: Vec<_> = project
                    .series
                    .iter()
                    .filter(|patch| !patch.is_file())
                    .collect();
                let (status, message, fix) = if !tree.is_dir() {
                    (
                        "fail",
                        format!(
                            "project {}: tree '{}' does not exist",
                            project.name,
                            project.tree.display()
                        ),
                        Some("Fetch the vendored sources (e.g. git submodule update --init).".to_owned()),
                    )
                } else if missing.is_empty() {
                    (
                        "ok",
                        format!(
                            "project {}: {} patch(es), tree present",
                            project.name,
                            project.series.len()
                        ),
                        None,
                    )
                } else {
                    (
                        "fail",
                        format!(
                            "project {}: {} patch file(s) missing (first: {})",
                            project.name,
                            missing.len(),
                            missing[0].display()
                        ),
                        Some("Check the `patches` entries in the manifest.".to_owned()),
                    )
                };
                checks.push(DoctorCheck {
                    name: format!("project:{}", project.name),
                    status: status.to_owned(),
                    message,
                    fix,
                });
            }
        }
        Err(err) => checks.push(DoctorCheck {
            name: "projects".to_owned(),
            status: "fail".to_owned(),
            message: "projects: could not resolve patch series".to_owned(),
            fix: Some(err.to_string()),
        }),
    }
    checks
}
