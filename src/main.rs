use std::io;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use seam::config::Manifest;
use seam::driver::{self, PatchApplyOutcome};
use seam::error::SeamError;
use seam::format::OutputFormat;
use seam::{doctor, telemetry, verify};
use seam_tools::{PatchId, Toolchain};

/// Keep vendored trees stitched to their patch series
///
/// seam converges third-party source trees ("vendored dependencies") to
/// exactly the patch series declared in a manifest, and proves by content
/// identity that a checkout's newest commits are precisely that series —
/// independent of commit authors, dates, or messages.
///
/// QUICK START:
///
///   # describe your vendored projects once
///   $EDITOR seam.toml
///
///   # bring a tree to its fully patched state (idempotent)
///   seam converge libfoo
///
///   # prove the checkout matches the series before trusting it
///   seam verify libfoo --format json
#[derive(Parser)]
#[command(name = "seam")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'seam <command> --help' for more information on a specific command.")]
struct Cli {
    /// Path to the manifest
    #[arg(long, global = true, default_value = "seam.toml", env = "SEAM_CONFIG")]
    config: PathBuf,

    /// Path to the git executable (an empty value means "not available")
    #[arg(long, global = true, env = "SEAM_GIT")]
    git: Option<PathBuf>,

    /// Path to the patch executable (an empty value means "not available")
    #[arg(long = "patch-tool", global = true, env = "SEAM_PATCH")]
    patch_tool: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge vendored projects to their fully patched state
    ///
    /// Stateless and idempotent: previously applied patches are reverted
    /// (or wiped, inside a repository) and the whole series is applied
    /// again, so the tree ends identical no matter what state it started
    /// in.
    Converge {
        /// Project name from the manifest; all projects if omitted
        project: Option<String>,
    },

    /// Verify that a project's history matches its patch series
    ///
    /// Compares the content identity of each of the tree's newest commits
    /// against the identity of the corresponding patch file, newest commit
    /// against last series entry. On success, emits the provenance record
    /// a downstream manifest builder may trust.
    Verify {
        /// Project name from the manifest
        project: String,

        /// Output format for the provenance record
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print patch content identities
    ///
    /// Debugging companion to 'verify': identities of patch files and of
    /// commits can be inspected and compared by hand.
    Id(IdArgs),

    /// Check system requirements and configuration
    ///
    /// Verifies that a usable patching tool is present, the manifest
    /// loads, and every declared project has its tree and patch files.
    Doctor {
        /// Output format
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct IdArgs {
    /// Patch files to identify
    files: Vec<PathBuf>,

    /// Also identify the commit at this depth below HEAD (0 = HEAD)
    #[arg(long)]
    depth: Option<usize>,

    /// Repository to read commits from (with --depth)
    #[arg(long, default_value = ".")]
    repo: PathBuf,
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Converge { project } => converge(&cli, project.as_deref()),
        Commands::Verify { project, format } => verify_cmd(&cli, project, *format),
        Commands::Id(args) => id(&cli, args),
        Commands::Doctor { format } => doctor_cmd(&cli, *format),
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "seam", &mut io::stdout());
            Ok(())
        }
    }
}

/// Resolve the toolchain: CLI flag > manifest `[tools]` > PATH defaults.
fn toolchain(cli: &Cli, manifest: Option<&Manifest>) -> Toolchain {
    let git = cli
        .git
        .clone()
        .or_else(|| manifest.and_then(|m| m.git_tool().map(PathBuf::from)))
        .or_else(|| Some(PathBuf::from("git")));
    let patch = cli
        .patch_tool
        .clone()
        .or_else(|| manifest.and_then(|m| m.patch_tool().map(PathBuf::from)))
        .or_else(|| Some(PathBuf::from("patch")));
    Toolchain::from_paths(git, patch)
}

fn converge(cli: &Cli, name: Option<&str>) -> Result<()> {
    let manifest = Manifest::load(&cli.config)?;
    let tools = toolchain(cli, Some(&manifest));
    let projects = match name {
        Some(name) => vec![manifest.project(name)?],
        None => manifest.all_projects()?,
    };

    for project in &projects {
        let outcomes = driver::converge(manifest.source_root(), project, &tools)?;
        let already = outcomes
            .iter()
            .filter(|o| o.outcome == PatchApplyOutcome::AlreadyApplied)
            .count();
        if already > 0 {
            println!(
                "{}: {} patch(es) in place ({} already applied)",
                project.name,
                outcomes.len(),
                already
            );
        } else {
            println!("{}: {} patch(es) applied", project.name, outcomes.len());
        }
    }
    Ok(())
}

fn verify_cmd(cli: &Cli, name: &str, format: Option<OutputFormat>) -> Result<()> {
    let manifest = Manifest::load(&cli.config)?;
    let tools = toolchain(cli, Some(&manifest));
    let git = tools.git.ok_or(SeamError::GitRequired)?;
    let project = manifest.project(name)?;

    let record = verify::provenance(&git, manifest.source_root(), &project)?;
    match OutputFormat::resolve(format) {
        OutputFormat::Json => println!("{}", OutputFormat::Json.serialize(&record)?),
        OutputFormat::Text => {
            println!(
                "{}: verified {} patch(es) (HEAD {})",
                record.project,
                record.patches.len(),
                record.head
            );
            for patch in &record.patches {
                println!("  {}  {}", patch.patch_id, patch.file);
            }
        }
    }
    Ok(())
}

fn id(cli: &Cli, args: &IdArgs) -> Result<()> {
    if args.files.is_empty() && args.depth.is_none() {
        bail!("nothing to identify: pass patch files and/or --depth");
    }

    // The manifest is optional here — it only contributes tool locations.
    let manifest = Manifest::load(&cli.config).ok();
    let tools = toolchain(cli, manifest.as_ref());
    let git = tools.git.ok_or(SeamError::GitRequired)?;

    for file in &args.files {
        println!("{}  {}", PatchId::of_file(&git, file)?, file.display());
    }
    if let Some(depth) = args.depth {
        println!(
            "{}  HEAD~{} ({})",
            PatchId::of_commit(&git, &args.repo, depth)?,
            depth,
            args.repo.display()
        );
    }
    Ok(())
}

fn doctor_cmd(cli: &Cli, format: Option<OutputFormat>) -> Result<()> {
    let manifest = Manifest::load(&cli.config);
    let tools = toolchain(cli, manifest.as_ref().ok());
    doctor::run(&cli.config, manifest, &tools, OutputFormat::resolve(format))
}
