// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use ducomm_app::{Authorizer, CurrentUser, DEFAULT_SEARCH_DEBOUNCE, DispatchCenterId, UserRole};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
pub const CONFIG_PATH_ENV: &str = "DUCOMM_CONFIG_PATH";
const DEFAULT_USERNAME: &str = "operator";
const DEFAULT_ROLE: &str = "viewer";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub user: User,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            user: User::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub search_debounce: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            search_debounce: Some("300ms".to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: Option<String>,
    pub role: Option<String>,
    pub can_edit_all: Option<bool>,
    pub editable_dispatch_centers: Option<Vec<i64>>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            username: Some(DEFAULT_USERNAME.to_owned()),
            role: Some(DEFAULT_ROLE.to_owned()),
            can_edit_all: Some(false),
            editable_dispatch_centers: Some(Vec::new()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(ducomm_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("{} is not valid TOML", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and place values under [storage], [ui], and [user]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| {
                format!("decode [storage], [ui] and [user] from {}", path.display())
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            ducomm_db::validate_db_path(db_path)?;
        }

        if let Some(raw) = &self.ui.search_debounce {
            let parsed = parse_duration(raw)?;
            if parsed.is_zero() {
                bail!(
                    "ui.search_debounce in {} must be positive, got {}",
                    path.display(),
                    raw
                );
            }
        }

        if let Some(role) = &self.user.role
            && UserRole::parse(role).is_none()
        {
            bail!(
                "user.role in {} is {role:?}; use one of: super_admin, admin, editor, viewer",
                path.display()
            );
        }

        if let Some(username) = &self.user.username
            && username.trim().is_empty()
        {
            bail!("user.username in {} must not be blank", path.display());
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => ducomm_db::default_db_path(),
        }
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        match self.ui.search_debounce.as_deref() {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_SEARCH_DEBOUNCE),
        }
    }

    pub fn role(&self) -> UserRole {
        self.user
            .role
            .as_deref()
            .and_then(UserRole::parse)
            .unwrap_or(UserRole::Viewer)
    }

    pub fn current_user(&self) -> CurrentUser {
        let username = self.user.username.as_deref().unwrap_or(DEFAULT_USERNAME);
        let mut user = CurrentUser::new(username.trim(), self.role());
        user.can_edit_all = self.user.can_edit_all.unwrap_or(false);
        user.editable_dispatch_centers = self
            .user
            .editable_dispatch_centers
            .iter()
            .flatten()
            .copied()
            .map(DispatchCenterId::new)
            .collect();
        user
    }

    pub fn authorizer(&self) -> Authorizer {
        Authorizer::new(self.current_user())
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# ducomm-forge config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/{app}/{app}.db)\n# db_path = \"/absolute/path/to/{app}.db\"\n\n[ui]\nsearch_debounce = \"300ms\"\n\n[user]\nusername = \"{DEFAULT_USERNAME}\"\n# super_admin | admin | editor | viewer\nrole = \"editor\"\ncan_edit_all = false\neditable_dispatch_centers = [1]\n",
            path.display(),
            app = ducomm_db::APP_NAME,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use <N>ms or <N>s (for example 300ms or 1s)")
}
