use std::{collections::BTreeSet, env, fmt::Display, str::FromStr};

use anyhow::{Context, anyhow};
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ADMINS: &str = "luca,adi";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub roles: Roles,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            port: try_load(&lookup, "PORT", DEFAULT_PORT)?,
            max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            roles: Roles::parse(&lookup("ADMIN_USERS").unwrap_or_else(|| {
                info!("ADMIN_USERS not set, using default: {DEFAULT_ADMINS}");
                DEFAULT_ADMINS.to_string()
            })),
        })
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| {
                warn!("Invalid {key} value: {e}");
                e
            })
            .with_context(|| format!("invalid {key}: {raw:?}")),
    }
}

/// People allowed to mark topics as discussed. Names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    admins: BTreeSet<String>,
}

impl Roles {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admins: admins
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Parses a comma separated list of names.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_admin(&self, name: &str) -> bool {
        self.admins.contains(&name.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y")])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.max_connections, 5);
        assert!(config.roles.is_admin("Luca"));
        assert!(config.roles.is_admin("adi"));
        assert!(!config.roles.is_admin("Piotr"));
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn invalid_port_is_an_error() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn admin_list_is_trimmed_and_case_insensitive() {
        let roles = Roles::parse(" Kris , ,MARTA");
        assert!(roles.is_admin("kris"));
        assert!(roles.is_admin("Marta"));
        assert!(!roles.is_admin(""));
        assert!(!roles.is_admin("luca"));
    }
}
