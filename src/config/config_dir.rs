use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::error::ConfigResult;

pub fn find_config_file(use_local: bool) -> PathBuf {
    let app_name = crate::APPLICATION_NAME;

    if use_local {
        return PathBuf::from("./config.toml");
    }

    #[cfg(unix)]
    let path = std::env::var_os("HOME");
    #[cfg(windows)]
    let path = std::env::var_os("APPDATA");

    #[cfg(any(unix, windows))]
    if let Some(app_path) = path {
        if let Some(found) = config_in(Path::new(&app_path), app_name) {
            return found;
        }
    }

    PathBuf::from("./config.toml")
}

fn config_in(base: &Path, app_name: &str) -> Option<PathBuf> {
    let mut path = base.to_path_buf();

    if cfg!(unix) {
        path = path.join(".config");
    }

    path = path.join(app_name).join("config.toml");
    path.exists().then_some(path)
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    read_config_from(&find_config_file(use_local))
}

pub fn read_config_from(filename: &Path) -> ConfigResult<Vec<u8>> {
    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(crate::config::error::ConfigError::ConfigNotFound);
    }

    let filename = filename.canonicalize()?;
    debug!("using {} as configuration file", filename.display());

    let mut fd = File::open(filename)?;
    let mut buf = Vec::new();
    fd.read_to_end(&mut buf)?;

    Ok(buf)
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_find_config_file_local() {
        let path = find_config_file(true);
        assert_eq!(path, PathBuf::from("./config.toml"));
    }

    #[test]
    fn test_config_in_home() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut fake_config = temp_dir.path().to_path_buf();
        if cfg!(unix) {
            fake_config = fake_config.join(".config");
        }
        let fake_config = fake_config.join(crate::APPLICATION_NAME);
        fs::create_dir_all(&fake_config).unwrap();
        let config_file = fake_config.join("config.toml");
        fs::write(&config_file, "dummy = true").unwrap();

        let path = config_in(temp_dir.path(), crate::APPLICATION_NAME);
        assert_eq!(path, Some(config_file));
    }

    #[test]
    fn test_config_in_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(config_in(temp_dir.path(), crate::APPLICATION_NAME), None);
    }

    #[test]
    fn test_read_config_success() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("config.toml");
        fs::write(&file_path, b"foo = 'bar'").unwrap();

        let result = read_config_from(&file_path);

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), b"foo = 'bar'");
    }

    #[test]
    fn test_read_config_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = read_config_from(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound)));
    }
}
