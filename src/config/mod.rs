use std::path::{Path, PathBuf};

use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    points: Points,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_static_dir")]
    static_dir: PathBuf,
    #[serde(default = "default_certificates_dir")]
    certificates_dir: PathBuf,
    #[serde(default)]
    certificate_template: Option<PathBuf>,
}

/// Amount of points awarded for each learning milestone.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Points {
    #[serde(default = "default_lesson_points")]
    lesson_completed: i32,
    #[serde(default = "default_quiz_points")]
    quiz_passed: i32,
    #[serde(default = "default_course_points")]
    course_completed: i32,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("client/dist")
}

fn default_certificates_dir() -> PathBuf {
    PathBuf::from("storage/certificates")
}

fn default_lesson_points() -> i32 {
    10
}

fn default_quiz_points() -> i32 {
    20
}

fn default_course_points() -> i32 {
    50
}

impl Default for Points {
    fn default() -> Self {
        Self {
            lesson_completed: default_lesson_points(),
            quiz_passed: default_quiz_points(),
            course_completed: default_course_points(),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let mut config = Self::from_slice(&bytes)?;
                    config.apply_env_overrides(|key| std::env::var(key).ok());
                    Ok(config)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    /// `DATABASE_URL`, `JWT_SECRET` and `LEARNHUB_BIND` take precedence over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("DATABASE_URL") {
            self.app.database_uri = uri;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.app.jwt = secret;
        }
        if let Some(bind) = lookup("LEARNHUB_BIND") {
            self.host.bindto = bind;
        }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn points(&self) -> Points {
        self.points
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    #[inline]
    pub fn certificates_dir(&self) -> &Path {
        &self.certificates_dir
    }

    #[inline]
    pub fn certificate_template(&self) -> Option<&Path> {
        self.certificate_template.as_deref()
    }
}

impl Points {
    #[inline]
    pub fn lesson_completed(&self) -> i32 {
        self.lesson_completed
    }

    #[inline]
    pub fn quiz_passed(&self) -> i32 {
        self.quiz_passed
    }

    #[inline]
    pub fn course_completed(&self) -> i32 {
        self.course_completed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
        [host]
        bindto = "0.0.0.0:8080"

        [app]
        jwt = "secret"
        database_uri = "postgres://localhost/db"
    "#;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_slice(MINIMAL.as_bytes()).unwrap();
        assert!(!config.app().docs());
        assert_eq!(config.app().static_dir(), Path::new("client/dist"));
        assert_eq!(config.app().certificate_template(), None);
        assert_eq!(config.points().lesson_completed(), 10);
        assert_eq!(config.points().quiz_passed(), 20);
        assert_eq!(config.points().course_completed(), 50);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = Config::from_slice(MINIMAL.as_bytes()).unwrap();
        config.apply_env_overrides(|key| match key {
            "DATABASE_URL" => Some("postgres://elsewhere/db".to_string()),
            "JWT_SECRET" => Some("rotated".to_string()),
            _ => None,
        });

        assert_eq!(config.app().database_uri(), "postgres://elsewhere/db");
        assert_eq!(config.app().jwt(), "rotated");
        assert_eq!(config.host().bindto(), "0.0.0.0:8080");
    }

    #[test]
    fn missing_section_is_an_error() {
        let result = Config::from_slice(b"[host]\nbindto = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }
}
