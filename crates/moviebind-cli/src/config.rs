use crate::CliError;

/// Database settings resolved from `DB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl DatabaseSettings {
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, falling back to local defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let port = get("DB_PORT", "5432");
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| CliError::InvalidConfig(format!("DB_PORT is not a port: {port}")))?;

        Ok(Self {
            user: get("DB_USER", "postgres"),
            password: get("DB_PASS", ""),
            host: get("DB_HOST", "localhost"),
            port,
            name: get("DB_NAME", "moviebind"),
        })
    }

    pub fn url(&self) -> String {
        let auth = if self.password.is_empty() {
            self.user.clone()
        } else {
            format!("{}:{}", self.user, self.password)
        };
        format!(
            "postgres://{auth}@{}:{}/{}",
            self.host, self.port, self.name
        )
    }
}

/// Connection string from `--conn`, or from the environment when absent.
pub fn resolve_connection(conn: Option<String>) -> Result<String, CliError> {
    match conn {
        Some(conn) => Ok(conn),
        None => Ok(DatabaseSettings::from_env()?.url()),
    }
}
