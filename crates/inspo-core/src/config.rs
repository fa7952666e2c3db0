use crate::activity::ActivitySettings;
use crate::media::{CloudinaryHost, LocalDirHost, MediaHost};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project directory holding data and config.
pub const PROJECT_DIR: &str = ".inspo";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub activity: ActivitySettings,
    #[serde(default)]
    pub comments: CommentsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Item file, relative to `.inspo/`.
    #[serde(default = "default_storage_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: default_storage_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaHostKind {
    #[default]
    Local,
    Cloudinary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub host: MediaHostKind,
    /// Upload directory for the local host, relative to `.inspo/`.
    #[serde(default = "default_media_dir")]
    pub dir: String,
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            host: MediaHostKind::default(),
            dir: default_media_dir(),
            cloud_name: None,
            upload_preset: default_upload_preset(),
        }
    }
}

impl MediaConfig {
    /// Build the configured media host for the project at `project_root`.
    pub fn build_host(&self, project_root: &Path) -> Result<Box<dyn MediaHost>> {
        match self.host {
            MediaHostKind::Local => Ok(Box::new(LocalDirHost::new(
                project_root.join(PROJECT_DIR).join(&self.dir),
            ))),
            MediaHostKind::Cloudinary => {
                let Some(cloud_name) = self.cloud_name.as_deref().filter(|c| !c.is_empty()) else {
                    bail!("[media] host = \"cloudinary\" requires cloud_name");
                };
                Ok(Box::new(CloudinaryHost::new(
                    cloud_name,
                    self.upload_preset.clone(),
                )))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentsConfig {
    /// Root comments shown before a thread is collapsed.
    #[serde(default = "default_preview")]
    pub preview: usize,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            preview: default_preview(),
        }
    }
}

impl ProjectConfig {
    /// Absolute path of the item file for the project at `project_root`.
    #[must_use]
    pub fn storage_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_DIR).join(&self.storage.file)
    }
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .activity
        .validate()
        .with_context(|| format!("Invalid [activity] settings in {}", path.display()))?;
    Ok(config)
}

/// Write `config` to `.inspo/config.toml`, creating the directory.
pub fn save_project_config(project_root: &Path, config: &ProjectConfig) -> Result<PathBuf> {
    let dir = project_root.join(PROJECT_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join("config.toml");
    let content = toml::to_string_pretty(config).context("Failed to serialize project config")?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Walk up from `start` to the first directory containing `.inspo/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Per-user preferences, kept outside any project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Preferences loaded once from disk and written back only when changed.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Load preferences from `path`. A missing file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prefs = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str::<Preferences>(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Preferences::default()
        };
        debug!(path = %path.display(), has_name = prefs.display_name.is_some(), "preferences loaded");
        Ok(Self { path, prefs })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.prefs.display_name.as_deref()
    }

    /// Set (or with `None`, clear) the display name. Blank names clear it.
    ///
    /// Returns whether anything was written.
    pub fn set_display_name(&mut self, name: Option<&str>) -> Result<bool> {
        let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        if name == self.prefs.display_name {
            return Ok(false);
        }
        self.prefs.display_name = name;
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content =
            toml::to_string_pretty(&self.prefs).context("Failed to serialize preferences")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

/// Preferences file location: `INSPO_PREFS`, else `<config dir>/inspo/preferences.toml`.
pub fn preferences_path() -> Result<PathBuf> {
    preferences_path_from(env::var_os("INSPO_PREFS"), dirs::config_dir())
}

fn preferences_path_from(
    override_path: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = override_path.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let Some(dir) = config_dir else {
        bail!("no user config directory; set INSPO_PREFS to a preferences file");
    };
    Ok(dir.join("inspo").join("preferences.toml"))
}

fn default_storage_file() -> String {
    "items.json".to_string()
}

fn default_media_dir() -> String {
    "media".to_string()
}

fn default_upload_preset() -> String {
    "ml_default".to_string()
}

const fn default_preview() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.storage.file, "items.json");
        assert_eq!(cfg.media.host, MediaHostKind::Local);
        assert_eq!(cfg.media.upload_preset, "ml_default");
        assert_eq!(cfg.activity.window_days, 30);
        assert_eq!(cfg.comments.preview, 3);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = TempDir::new().expect("temp dir");
        fs::create_dir_all(root.path().join(PROJECT_DIR)).expect("mkdir");
        fs::write(
            root.path().join(".inspo/config.toml"),
            "[media]\nhost = \"cloudinary\"\ncloud_name = \"demo\"\n\n[activity]\nwindow_days = 7\n",
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.media.host, MediaHostKind::Cloudinary);
        assert_eq!(cfg.media.cloud_name.as_deref(), Some("demo"));
        assert_eq!(cfg.media.dir, "media");
        assert_eq!(cfg.activity.window_days, 7);
        assert_eq!(cfg.activity.item_weight, 3);
        assert!(cfg.media.build_host(root.path()).is_ok());
    }

    #[test]
    fn oversized_activity_window_is_rejected() {
        let root = TempDir::new().expect("temp dir");
        fs::create_dir_all(root.path().join(PROJECT_DIR)).expect("mkdir");
        fs::write(
            root.path().join(".inspo/config.toml"),
            "[activity]\nwindow_days = 4294967295\nitem_weight = 4294967295\n",
        )
        .expect("write config");

        let err = load_project_config(root.path()).expect_err("window too long");
        let msg = format!("{err:#}");
        assert!(msg.contains("[activity]"), "{msg}");
        assert!(msg.contains("3660-day maximum"), "{msg}");
    }

    #[test]
    fn malformed_config_is_an_error_with_path() {
        let root = TempDir::new().expect("temp dir");
        fs::create_dir_all(root.path().join(PROJECT_DIR)).expect("mkdir");
        fs::write(root.path().join(".inspo/config.toml"), "[storage\n").expect("write");
        let err = load_project_config(root.path()).expect_err("should fail");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let root = TempDir::new().expect("temp dir");
        let mut cfg = ProjectConfig::default();
        cfg.comments.preview = 5;
        save_project_config(root.path(), &cfg).expect("save");
        assert_eq!(load_project_config(root.path()).expect("load"), cfg);
        assert_eq!(
            cfg.storage_path(root.path()),
            root.path().join(".inspo/items.json")
        );
    }

    #[test]
    fn cloudinary_without_cloud_name_is_rejected() {
        let media = MediaConfig {
            host: MediaHostKind::Cloudinary,
            ..MediaConfig::default()
        };
        assert!(media.build_host(Path::new(".")).is_err());
    }

    #[test]
    fn find_project_root_walks_up() {
        let root = TempDir::new().expect("temp dir");
        fs::create_dir_all(root.path().join(".inspo")).expect("mkdir");
        let nested = root.path().join("a/b");
        fs::create_dir_all(&nested).expect("mkdir nested");
        assert_eq!(find_project_root(&nested).as_deref(), Some(root.path()));
    }

    #[test]
    fn display_name_saved_only_on_change() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested/preferences.toml");

        let mut prefs = PreferenceStore::load(&path).expect("load missing");
        assert_eq!(prefs.display_name(), None);
        assert!(!prefs.set_display_name(Some("   ")).expect("blank"));
        assert!(!path.exists());

        assert!(prefs.set_display_name(Some(" Ayu ")).expect("set"));
        assert!(!prefs.set_display_name(Some("Ayu")).expect("same"));

        let reloaded = PreferenceStore::load(&path).expect("reload");
        assert_eq!(reloaded.display_name(), Some("Ayu"));

        assert!(prefs.set_display_name(None).expect("clear"));
        assert_eq!(PreferenceStore::load(&path).expect("reload").display_name(), None);
    }

    #[test]
    fn preferences_path_prefers_override() {
        let path = preferences_path_from(
            Some(OsString::from("/tmp/p.toml")),
            Some(PathBuf::from("/home/u/.config")),
        )
        .expect("path");
        assert_eq!(path, PathBuf::from("/tmp/p.toml"));

        let path = preferences_path_from(None, Some(PathBuf::from("/home/u/.config"))).expect("path");
        assert_eq!(path, PathBuf::from("/home/u/.config/inspo/preferences.toml"));

        assert!(preferences_path_from(None, None).is_err());
    }
}
