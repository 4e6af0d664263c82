use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<year>-<Month>.txt` archives (optionally in year folders)
    pub archive_root: String,
    /// Where `.eml` files and thread JSON are written
    pub output_dir: String,
    pub start_year: u16,
    pub end_year: u16,
    /// Persist every record as `<output_dir>/<year>/<Month>/<md5>.eml`
    pub write_emails: bool,
    /// Process years concurrently
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_root: "~/archives".to_string(),
            output_dir: ".".to_string(),
            start_year: 2007,
            end_year: 2019,
            write_emails: true,
            parallel: true,
        }
    }
}

impl Config {
    /// Default location: `<config_dir>/mailthreads/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("mailthreads/config.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/mailthreads/config.toml"))
    }

    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Missing or unparsable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Config parse error: {}", e),
                },
                Err(e) => eprintln!("Config read error: {}", e),
            }
        }

        Self::default()
    }

    pub fn archive_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.archive_root).into_owned())
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output_dir).into_owned())
    }

    pub fn years(&self) -> RangeInclusive<u16> {
        self.start_year..=self.end_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("start_year = 2010\nparallel = false\n").unwrap();
        assert_eq!(config.years(), 2010..=2019);
        assert!(!config.parallel);
        assert!(config.write_emails);
        assert_eq!(config.output_dir, ".");
    }

    #[test]
    fn test_load_from_missing_or_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load_from(&dir.path().join("none.toml"));
        assert_eq!(missing.start_year, 2007);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "start_year = \"soon\"").unwrap();
        assert_eq!(Config::load_from(&bad).end_year, 2019);

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "archive_root = \"/srv/lists\"\nwrite_emails = false").unwrap();
        let config = Config::load_from(&good);
        assert_eq!(config.archive_root(), PathBuf::from("/srv/lists"));
        assert!(!config.write_emails);
    }
}
