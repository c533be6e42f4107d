use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use turtle_core::{Account, CoreError};

const CONFIG_FILE: &str = "config.json";
const HOUSE_DB: &str = "house.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    /// Account used when a command is run without `--as`
    pub default_account: Option<Account>,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_account: None,
            verbose: false,
        }
    }
}

impl CliConfig {
    /// Read `config.json` from `data_dir`, falling back to defaults
    pub fn load(data_dir: &Path) -> Result<Self, CoreError> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self {
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config: CliConfig = serde_json::from_str(&content)?;
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(self.data_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }

    pub fn house_db(&self) -> PathBuf {
        self.data_dir.join(HOUSE_DB)
    }

    /// `--as` if given, otherwise the configured default account
    pub fn resolve_account(&self, explicit: Option<Account>) -> Result<Account, CoreError> {
        explicit
            .or_else(|| self.default_account.clone())
            .ok_or_else(|| {
                CoreError::InvalidAccount(
                    "no account given; pass --as or run `turtle init`".to_string(),
                )
            })
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("turtle-race")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = CliConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.data_dir, temp_dir.path());
        assert!(config.default_account.is_none());
        assert!(config.resolve_account(None).is_err());
    }

    #[test]
    fn test_saved_default_account_is_used() {
        let temp_dir = tempdir().unwrap();
        let config = CliConfig {
            data_dir: temp_dir.path().to_path_buf(),
            default_account: Some(Account::new("alice").unwrap()),
            verbose: false,
        };
        config.save().unwrap();

        let loaded = CliConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded.resolve_account(None).unwrap().as_str(), "alice");

        let bob = Account::new("bob").unwrap();
        assert_eq!(loaded.resolve_account(Some(bob.clone())).unwrap(), bob);
    }
}
