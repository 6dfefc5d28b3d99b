use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_URL: &str = "sqlite://harvests.db?mode=rwc";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_connections: u32,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment. Call `dotenv` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            database_url: non_empty("DATABASE_URL").unwrap_or(defaults.database_url),
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            log_file: non_empty("LOG_FILE").map(PathBuf::from),
        }
    }

    /// Absolute paths are used as-is, relative ones land in the upload directory.
    pub fn resolve_upload(&self, file: &Path) -> PathBuf {
        if file.is_absolute() || file.exists() {
            file.to_path_buf()
        } else {
            self.upload_dir.join(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_with(&[]);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.upload_dir, PathBuf::from(DEFAULT_UPLOAD_DIR));
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_bad_numbers() {
        let cfg = config_with(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("UPLOAD_DIR", "/srv/uploads"),
            ("DB_MAX_CONNECTIONS", "zero"),
            ("LOG_FILE", "  "),
        ]);
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn relative_upload_resolves_under_upload_dir() {
        let cfg = config_with(&[("UPLOAD_DIR", "/srv/uploads")]);
        assert_eq!(
            cfg.resolve_upload(Path::new("no-such-file-here.csv")),
            PathBuf::from("/srv/uploads/no-such-file-here.csv")
        );
        assert_eq!(
            cfg.resolve_upload(Path::new("/tmp/x.csv")),
            PathBuf::from("/tmp/x.csv")
        );
    }
}
