use serde::Deserialize;
use std::{path::PathBuf, str::FromStr};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub model: ModelConfig,
    pub labels: LabelsConfig,
    pub media: MediaConfig,
    #[serde(default)]
    pub articles: ArticlesConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

fn default_body_limit_mb() -> usize {
    10
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

/// Startup artifacts whose absence must stop the process.
pub trait Validatable {
    fn get_path(&self) -> PathBuf;

    fn validate(&self) -> Result<(), String> {
        let path = self.get_path();
        if !path.is_file() {
            return Err(format!("Required file not found: {:?}", path));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub model_file: String,
    #[serde(default = "default_model_instances")]
    pub num_instances: usize,
}

fn default_model_instances() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Validatable for ModelConfig {
    fn get_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelsConfig {
    pub labels_dir: PathBuf,
    pub labels_file: String,
}

impl Validatable for LabelsConfig {
    fn get_path(&self) -> PathBuf {
        self.labels_dir.join(&self.labels_file)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory persisted images are written under.
    pub root: PathBuf,
    /// Public URL prefix the media root is served at.
    #[serde(default = "default_media_base_url")]
    pub base_url: String,
    /// Scratch directory for uploads awaiting classification.
    pub upload_dir: PathBuf,
}

fn default_media_base_url() -> String {
    "/media/".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArticlesConfig {
    /// JSON array of articles loaded into the store at startup.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

const ENVIRONMENTS: &[(&str, Environment)] = &[
    ("local", Environment::Local),
    ("production", Environment::Production),
];

impl Environment {
    pub fn as_str(&self) -> &'static str {
        name_of(ENVIRONMENTS, *self)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(ENVIRONMENTS, s, "environment")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

const LOG_LEVELS: &[(&str, LogLevel)] = &[("debug", LogLevel::Debug), ("info", LogLevel::Info)];

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        name_of(LOG_LEVELS, *self)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(LOG_LEVELS, s, "minimum log level")
    }
}

// Case-insensitive lookup; the error lists every accepted name.
fn parse_choice<T: Copy>(choices: &[(&str, T)], raw: &str, what: &str) -> Result<T, String> {
    let wanted = raw.trim().to_lowercase();
    choices
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let names: Vec<String> = choices
                .iter()
                .map(|(name, _)| format!("`{}`", name))
                .collect();
            format!(
                "{} is not a supported {}. Use one of {}.",
                raw,
                what,
                names.join(", ")
            )
        })
}

fn name_of<T: Copy + PartialEq>(choices: &[(&'static str, T)], value: T) -> &'static str {
    choices
        .iter()
        .find(|(_, candidate)| *candidate == value)
        .map(|(name, _)| *name)
        .unwrap_or_default()
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no working directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .parse()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    config.try_deserialize::<Config>()
}

/// Fails when either startup artifact is missing.
pub fn validate_artifacts(config: &Config) -> Result<(), config::ConfigError> {
    for result in [config.model.validate(), config.labels.validate()] {
        if let Err(e) = result {
            tracing::error!("Configuration validation failed: {}", e);
            return Err(config::ConfigError::Message(e));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing_is_case_insensitive() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" Info ".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!(LogLevel::Info.as_str(), "info");

        let error = "trace".parse::<LogLevel>().unwrap_err();
        assert!(error.contains("`debug`, `info`"));

        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_validate_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelConfig {
            model_dir: dir.path().to_path_buf(),
            model_file: "plant_disease_model.onnx".to_string(),
            num_instances: 1,
        };
        assert!(model.validate().is_err());

        std::fs::write(model.get_path(), b"onnx").unwrap();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_articles_section_is_optional() {
        let base = r#"
server:
  host: "0.0.0.0"
  port: 8000
log_level: "INFO"
model:
  model_dir: "./cnn_model"
  model_file: "plant_disease_model.onnx"
labels:
  labels_dir: "./cnn_model"
  labels_file: "class_indices.json"
media:
  root: "./media"
  upload_dir: "./media/tmp"
"#;
        let load = |extra: &str| {
            config::Config::builder()
                .add_source(config::File::from_str(
                    &format!("{}{}", base, extra),
                    config::FileFormat::Yaml,
                ))
                .build()
                .unwrap()
                .try_deserialize::<Config>()
                .unwrap()
        };

        let config = load("");
        assert_eq!(config.articles.seed_file, None);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.server.body_limit_mb, 10);
        assert_eq!(config.media.base_url, "/media/");

        let config = load("articles:\n  seed_file: \"./articles.json\"\n");
        assert_eq!(
            config.articles.seed_file,
            Some(PathBuf::from("./articles.json"))
        );
    }

    #[test]
    fn test_body_limit_in_bytes() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            body_limit_mb: 2,
        };
        assert_eq!(server.body_limit_bytes(), 2 * 1024 * 1024);
        assert_eq!(server.get_address(), "127.0.0.1:8000");
    }
}
