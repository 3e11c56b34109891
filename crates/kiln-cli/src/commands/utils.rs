//! Shared utilities for command implementations: project root resolution,
//! configuration loading and running a build off the async runtime.

use std::path::{Path, PathBuf};

use kiln_config::{ConfigDiscovery, ConfigOverrides, KilnConfig, Mode, validate_schema};
use kiln_pipeline::BuildReport;

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result, ResultExt};

/// A loaded and validated project.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: KilnConfig,
    /// Config file in use, if any
    pub config_file: Option<PathBuf>,
    pub mode: Mode,
}

impl Project {
    pub fn out_dir(&self) -> PathBuf {
        resolve_path(&self.config.output.dir, &self.root)
    }

    pub fn source_dir(&self) -> PathBuf {
        resolve_path(&self.config.source_dir, &self.root)
    }

    /// Files the build reads from outside the source directory: the config
    /// file plus any entry, template or favicon living elsewhere.
    pub fn watch_files(&self) -> Vec<PathBuf> {
        let source_dir = self.source_dir();
        let html = &self.config.html;
        let named = self
            .config
            .entries
            .values()
            .map(|entry| entry.path())
            .chain(html.template.as_deref())
            .chain(html.favicon.as_deref())
            .map(|path| resolve_path(path, &self.root))
            .filter(|path| !path.starts_with(&source_dir) && path.is_file());

        let mut files: Vec<PathBuf> = self.config_file.iter().cloned().chain(named).collect();
        files.sort();
        files.dedup();
        files
    }
}

/// Resolve a path relative to a working directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to read the current directory")
}

/// Resolve `--cwd`, then load configuration with the CLI overrides applied
/// last, validate it and parse the mode.
pub fn load_project(args: &ProjectArgs, overrides: &ConfigOverrides) -> Result<Project> {
    let cwd = get_cwd()?;
    let root = match &args.cwd {
        Some(dir) => resolve_path(dir, &cwd),
        None => cwd.clone(),
    };
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }

    let discovery = ConfigDiscovery::new(&root);
    let (config, config_file) = match &args.config {
        Some(path) => {
            let path = resolve_path(path, &cwd);
            (discovery.load_from(&path, overrides)?, Some(path))
        }
        None => (discovery.load(overrides)?, discovery.find()),
    };

    validate_schema(&config)?;
    let mode = config.resolved_mode()?;

    tracing::debug!(
        "Loaded project {} ({} mode, config {})",
        root.display(),
        mode,
        config_file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string())
    );

    Ok(Project {
        root,
        config,
        config_file,
        mode,
    })
}

/// Run one build on the blocking pool; the pipeline fans out on rayon.
pub async fn run_build(project: &Project) -> Result<BuildReport> {
    let root = project.root.clone();
    let config = project.config.clone();
    let mode = project.mode;

    let report = tokio::task::spawn_blocking(move || kiln_pipeline::build(&root, &config, mode))
        .await
        .map_err(|e| CliError::Custom(format!("Build task failed: {e}")))??;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::{DevOverrides, UnhandledPolicy};
    use std::fs;
    use tempfile::TempDir;

    fn args(root: &Path) -> ProjectArgs {
        ProjectArgs {
            config: None,
            cwd: Some(root.to_path_buf()),
        }
    }

    #[test]
    fn resolve_path_keeps_absolute() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_path(Path::new("/abs/x"), cwd), PathBuf::from("/abs/x"));
        assert_eq!(resolve_path(Path::new("rel/x"), cwd), PathBuf::from("/work/rel/x"));
    }

    #[test]
    fn defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let project = load_project(&args(dir.path()), &ConfigOverrides::default()).unwrap();
        assert_eq!(project.mode, Mode::Production);
        assert!(project.config_file.is_none());
        assert_eq!(project.out_dir(), dir.path().join("dist"));
        assert_eq!(project.source_dir(), dir.path().join("src"));
    }

    #[test]
    fn overrides_win_over_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("kiln.toml"),
            "mode = \"production\"\nunhandled = \"ignore\"\n[dev]\nport = 8080\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            mode: Some("development".to_string()),
            unhandled: Some(UnhandledPolicy::Error),
            dev: Some(DevOverrides { port: Some(3000) }),
        };
        let project = load_project(&args(dir.path()), &overrides).unwrap();

        assert_eq!(project.mode, Mode::Development);
        assert_eq!(project.config.unhandled, UnhandledPolicy::Error);
        assert_eq!(project.config.dev.port, 3000);
        assert_eq!(project.config_file, Some(dir.path().join("kiln.toml")));
    }

    #[test]
    fn unknown_mode_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            mode: Some("staging".to_string()),
            ..Default::default()
        };
        let err = load_project(&args(dir.path()), &overrides).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn out_of_tree_inputs_are_watched() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/app")).unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("src/app/index.js"), "").unwrap();
        fs::write(dir.path().join("vendor/polyfill.js"), "").unwrap();
        fs::write(dir.path().join("assets/fav.png"), "").unwrap();
        fs::write(
            dir.path().join("kiln.toml"),
            "[entries]\napp = \"src/app/index.js\"\npolyfill = \"vendor/polyfill.js\"\n\
             [html]\nfavicon = \"assets/fav.png\"\n",
        )
        .unwrap();

        let project = load_project(&args(dir.path()), &ConfigOverrides::default()).unwrap();
        let watched = project.watch_files();

        assert!(watched.contains(&dir.path().join("kiln.toml")));
        assert!(watched.contains(&dir.path().join("vendor/polyfill.js")));
        assert!(watched.contains(&dir.path().join("assets/fav.png")));
        assert!(!watched.contains(&dir.path().join("src/app/index.js")));
    }

    #[test]
    fn missing_root_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = load_project(&args(&dir.path().join("nope")), &ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }
}
