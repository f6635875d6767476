use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub project: Project,
    pub tool: Tool,
    pub venv: Venv,
    pub log: Log,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Project {
    pub marker: String,
}
impl Default for Project {
    fn default() -> Self { Self { marker: "secrets.yaml".to_string() } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Tool {
    pub executable: String,
    pub module: String,
    pub package: String,
    pub substitution: String,
}
impl Default for Tool {
    fn default() -> Self {
        Self {
            executable: "esphome".to_string(),
            module: "esphome".to_string(),
            package: "esphome".to_string(),
            substitution: "device_id".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Venv {
    pub dir: PathBuf,
    pub python: String,
}
impl Default for Venv {
    fn default() -> Self { Self { dir: PathBuf::from(".venv"), python: "python3".to_string() } }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Log {
    pub format: LogFormat,
    pub filter: String,
}
impl Default for Log {
    fn default() -> Self { Self { format: LogFormat::Text, filter: "warn".to_string() } }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Settings from `path` when given, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let marker = Path::new(&self.project.marker);
        let mut parts = marker.components();
        if !matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None)) {
            anyhow::bail!("marker must be a plain file name: {:?}", self.project.marker);
        }
        if self.tool.executable.trim().is_empty() { anyhow::bail!("tool.executable must not be empty"); }
        if self.tool.module.trim().is_empty() { anyhow::bail!("tool.module must not be empty"); }
        if self.tool.package.trim().is_empty() { anyhow::bail!("tool.package must not be empty"); }
        if self.tool.substitution.trim().is_empty() { anyhow::bail!("tool.substitution must not be empty"); }
        if self.venv.python.trim().is_empty() { anyhow::bail!("venv.python must not be empty"); }
        if self.venv.dir.as_os_str().is_empty()
            || self.venv.dir.is_absolute()
            || self.venv.dir.components().any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("venv.dir must be a relative path inside the project root: {}", self.venv.dir.display());
        }
        Ok(())
    }
}
