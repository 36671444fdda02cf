use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::console;
use crate::error::TfmError;

pub const YAML_CONFIG_NAME: &str = ".tfm.yaml";
pub const LEGACY_CONFIG_NAME: &str = ".tfm.conf";
pub const SUPPORTED_CONFIG_VERSION: &str = "2.0";

const DEFAULT_ENV_REL_PATH: &str = "terraform/environments";
const DEFAULT_MODULE_REL_PATH: &str = "terraform/modules";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfmConfig {
    pub repo_name: String,
    pub env_rel_path: String,
    pub module_rel_path: String,
    pub project_dir: PathBuf,
    pub config_path: PathBuf,
    /// `None` for the legacy format.
    pub config_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Legacy,
}

impl ConfigFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigFormat::Yaml => YAML_CONFIG_NAME,
            ConfigFormat::Legacy => LEGACY_CONFIG_NAME,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct YamlConfigFile {
    config_version: Option<String>,
    repo_name: Option<String>,
    env_rel_path: Option<String>,
    module_rel_path: Option<String>,
}

/// The keys written to `.tfm.yaml`; paths are derived at load time.
#[derive(Debug, Serialize)]
struct YamlConfigDocument<'a> {
    config_version: &'a str,
    repo_name: &'a str,
    env_rel_path: &'a str,
    module_rel_path: &'a str,
}

const YAML_CONFIG_HEADER: &str = "# tfm configuration file\n\n";

impl TfmConfig {
    /// Fresh configuration for `project_dir`, named after the directory.
    pub fn for_project(project_dir: &Path, format: ConfigFormat) -> Self {
        let mut config = Self::with_defaults(project_dir, project_dir.join(format.file_name()));
        config.repo_name = project_name(project_dir);
        if format == ConfigFormat::Yaml {
            config.config_version = Some(SUPPORTED_CONFIG_VERSION.to_string());
        }
        config
    }

    fn with_defaults(project_dir: &Path, config_path: PathBuf) -> Self {
        Self {
            repo_name: String::new(),
            env_rel_path: DEFAULT_ENV_REL_PATH.to_string(),
            module_rel_path: DEFAULT_MODULE_REL_PATH.to_string(),
            project_dir: project_dir.to_path_buf(),
            config_path,
            config_version: None,
        }
    }

    pub fn module_path(&self) -> PathBuf {
        self.project_dir.join(&self.module_rel_path)
    }

    pub fn env_path(&self) -> PathBuf {
        self.project_dir.join(&self.env_rel_path)
    }

    pub fn validate(&self) -> Result<(), TfmError> {
        let missing = [
            ("repo_name", &self.repo_name),
            ("env_rel_path", &self.env_rel_path),
            ("module_rel_path", &self.module_rel_path),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty());
        match missing {
            Some((key, _)) => Err(TfmError::InvalidConfig {
                message: format!("{key} is required"),
            }),
            None => Ok(()),
        }
    }
}

pub fn find_repo_root(start: &Path) -> Result<PathBuf, TfmError> {
    git2::Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(|p| p.to_path_buf()))
        .ok_or_else(|| TfmError::NotInRepository {
            start: start.to_path_buf(),
        })
}

pub fn load_config(start: &Path) -> Result<TfmConfig, TfmError> {
    let project_dir = find_repo_root(start)?;
    load_config_from_project_dir(&project_dir)
}

pub fn load_config_from_project_dir(project_dir: &Path) -> Result<TfmConfig, TfmError> {
    let yaml_path = project_dir.join(YAML_CONFIG_NAME);
    let legacy_path = project_dir.join(LEGACY_CONFIG_NAME);

    let config = if yaml_path.is_file() {
        load_yaml_config(project_dir, &yaml_path)?
    } else if legacy_path.is_file() {
        let config = load_legacy_config(project_dir, &legacy_path)?;
        print_deprecation_notice();
        config
    } else {
        return Err(TfmError::ConfigMissing {
            legacy_snippet: legacy_config_snippet(project_dir),
            yaml_snippet: yaml_config_snippet(project_dir),
        });
    };

    config.validate()?;
    Ok(config)
}

fn read_config_text(path: &Path) -> Result<String, TfmError> {
    std::fs::read_to_string(path).map_err(|source| TfmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_yaml_config(project_dir: &Path, path: &Path) -> Result<TfmConfig, TfmError> {
    let raw = read_config_text(path)?;
    let file = if raw.trim().is_empty() {
        YamlConfigFile::default()
    } else {
        serde_yaml::from_str::<YamlConfigFile>(&raw).map_err(|err| TfmError::ConfigParse {
            path: path.to_path_buf(),
            message: format!("invalid YAML format: {err}"),
        })?
    };

    let version = file
        .config_version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| SUPPORTED_CONFIG_VERSION.to_string());
    if version != SUPPORTED_CONFIG_VERSION {
        return Err(TfmError::ConfigParse {
            path: path.to_path_buf(),
            message: format!(
                "unsupported config version: {version} (supported: {SUPPORTED_CONFIG_VERSION})"
            ),
        });
    }

    let mut config = TfmConfig::with_defaults(project_dir, path.to_path_buf());
    config.config_version = Some(version);
    if let Some(repo_name) = file.repo_name {
        config.repo_name = repo_name;
    }
    if let Some(env_rel_path) = file.env_rel_path {
        config.env_rel_path = env_rel_path;
    }
    if let Some(module_rel_path) = file.module_rel_path {
        config.module_rel_path = module_rel_path;
    }
    Ok(config)
}

/// Reads `export __tfm_<key>='value'` assignments; everything else is ignored.
pub fn parse_legacy_assignments(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(|line| line.strip_prefix("export ").unwrap_or(line))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

fn load_legacy_config(project_dir: &Path, path: &Path) -> Result<TfmConfig, TfmError> {
    let raw = read_config_text(path)?;
    let mut config = TfmConfig::with_defaults(project_dir, path.to_path_buf());
    for (key, value) in parse_legacy_assignments(&raw) {
        match key.as_str() {
            "__tfm_repo_name" => config.repo_name = value,
            "__tfm_env_rel_path" => config.env_rel_path = value,
            "__tfm_module_rel_path" => config.module_rel_path = value,
            _ => {}
        }
    }
    Ok(config)
}

fn print_deprecation_notice() {
    console::warn(&format!(
        "DEPRECATION NOTICE: legacy {LEGACY_CONFIG_NAME} format detected; migrate to {YAML_CONFIG_NAME} with `tf config convert`"
    ));
}

fn project_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn yaml_config_snippet(project_dir: &Path) -> String {
    format!(
        "cat > {dir}/{YAML_CONFIG_NAME} <<-EOF\nconfig_version: \"{SUPPORTED_CONFIG_VERSION}\"\nrepo_name: \"{name}\"\nenv_rel_path: \"{DEFAULT_ENV_REL_PATH}\"\nmodule_rel_path: \"{DEFAULT_MODULE_REL_PATH}\"\nEOF",
        dir = project_dir.display(),
        name = project_name(project_dir)
    )
}

pub fn legacy_config_snippet(project_dir: &Path) -> String {
    format!(
        "cat > {dir}/{LEGACY_CONFIG_NAME} <<-EOF\n{body}EOF",
        dir = project_dir.display(),
        body = render_legacy_config(&TfmConfig::for_project(project_dir, ConfigFormat::Legacy))
    )
}

pub fn render_legacy_config(config: &TfmConfig) -> String {
    format!(
        "#!/bin/bash\nexport __tfm_repo_name='{}'\nexport __tfm_env_rel_path='{}'\nexport __tfm_module_rel_path='{}'\n",
        config.repo_name, config.env_rel_path, config.module_rel_path
    )
}

pub fn render_yaml_config(config: &TfmConfig) -> Result<String, TfmError> {
    let document = YamlConfigDocument {
        config_version: config
            .config_version
            .as_deref()
            .unwrap_or(SUPPORTED_CONFIG_VERSION),
        repo_name: &config.repo_name,
        env_rel_path: &config.env_rel_path,
        module_rel_path: &config.module_rel_path,
    };
    let body = serde_yaml::to_string(&document).map_err(|err| TfmError::ConfigWrite {
        path: config.config_path.clone(),
        message: err.to_string(),
    })?;
    Ok(format!("{YAML_CONFIG_HEADER}{body}"))
}

fn write_new_config_file(path: &Path, contents: &str) -> Result<(), TfmError> {
    if path.exists() {
        return Err(TfmError::ConfigExists {
            path: path.to_path_buf(),
        });
    }
    std::fs::write(path, contents).map_err(|source| TfmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a default configuration file of `format` into `project_dir`.
/// An existing file is never overwritten.
pub fn init_config(project_dir: &Path, format: ConfigFormat) -> Result<TfmConfig, TfmError> {
    let config = TfmConfig::for_project(project_dir, format);
    let contents = match format {
        ConfigFormat::Yaml => render_yaml_config(&config)?,
        ConfigFormat::Legacy => render_legacy_config(&config),
    };
    write_new_config_file(&config.config_path, &contents)?;
    Ok(config)
}

/// Rewrites `.tfm.conf` as `.tfm.yaml`. The legacy file is left in place.
pub fn convert_legacy_to_yaml(project_dir: &Path) -> Result<TfmConfig, TfmError> {
    let legacy_path = project_dir.join(LEGACY_CONFIG_NAME);
    if !legacy_path.is_file() {
        return Err(TfmError::LegacyConfigNotFound { path: legacy_path });
    }
    let yaml_path = project_dir.join(YAML_CONFIG_NAME);
    if yaml_path.exists() {
        return Err(TfmError::ConfigExists { path: yaml_path });
    }

    let mut config = load_legacy_config(project_dir, &legacy_path)?;
    config.config_path = yaml_path;
    config.config_version = Some(SUPPORTED_CONFIG_VERSION.to_string());
    write_new_config_file(&config.config_path, &render_yaml_config(&config)?)?;
    Ok(config)
}

/// Label/value pairs shown by `tf config validate`.
pub fn describe_config(config: &TfmConfig) -> Vec<(&'static str, String)> {
    let version = match config.config_version.as_deref() {
        Some(version) => version.to_string(),
        None => "legacy (migrate with `tf config convert`)".to_string(),
    };
    vec![
        ("Config file", config.config_path.display().to_string()),
        ("Repository", config.repo_name.clone()),
        ("Environments", config.env_rel_path.clone()),
        ("Modules", config.module_rel_path.clone()),
        ("Version", version),
    ]
}
