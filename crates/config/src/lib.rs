use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "roster.toml",
    "config/roster.toml",
    "../roster.toml",
    "../config/roster.toml",
];

/// Placeholder secret shipped in the defaults. The runtime warns when it is
/// still in use at startup.
pub const DEFAULT_JWT_SECRET: &str = "default_secret_change_in_production";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppInfoConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Issuer string stamped into every session token.
    ///
    /// ```
    /// use roster_config::AppConfig;
    ///
    /// let config = AppConfig::default();
    /// assert_eq!(config.issuer(), "roster:1.0.0");
    /// ```
    pub fn issuer(&self) -> String {
        format!("{}:{}", self.app.name, self.app.version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfoConfig {
    pub name: String,
    pub version: String,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            name: "roster".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// What the user controller does when an actor lacks permission to update or
/// delete a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForbiddenPolicy {
    /// Report success without touching the record.
    #[default]
    Silent,
    /// Fail the call with a `Forbidden` error.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_token_ttl")]
    pub token_ttl_seconds: u64,
    #[serde(default)]
    pub forbidden_policy: ForbiddenPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_jwt_secret(),
            token_ttl_seconds: Self::default_token_ttl(),
            forbidden_policy: ForbiddenPolicy::default(),
        }
    }
}

impl AuthConfig {
    fn default_jwt_secret() -> String {
        DEFAULT_JWT_SECRET.to_string()
    }

    const fn default_token_ttl() -> u64 {
        15 * 60
    }
}

/// Settings for the avatar URL generator.
///
/// ```
/// use roster_config::AvatarConfig;
///
/// let avatar = AvatarConfig::default();
/// assert_eq!(avatar.base_url, "https://avatars.roster.local");
/// assert_eq!(avatar.segment_length, 8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    #[serde(default = "AvatarConfig::default_base_url")]
    pub base_url: String,
    /// Length of the random path segment appended to `base_url`.
    #[serde(default = "AvatarConfig::default_segment_length")]
    pub segment_length: usize,
}

impl AvatarConfig {
    fn default_base_url() -> String {
        "https://avatars.roster.local".to_string()
    }

    const fn default_segment_length() -> usize {
        8
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            segment_length: Self::default_segment_length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Create the admin, user and immutable example accounts at startup.
    #[serde(default)]
    pub examples: bool,
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use roster_config::load;
///
/// std::env::remove_var("ROSTER_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let token_ttl = i64::try_from(defaults.auth.token_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("app.name", defaults.app.name.clone())?
        .set_default("app.version", defaults.app.version.clone())?
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())?
        .set_default("auth.token_ttl_seconds", token_ttl)?
        .set_default("auth.forbidden_policy", "silent")?
        .set_default("avatar.base_url", defaults.avatar.base_url.clone())?
        .set_default(
            "avatar.segment_length",
            i64::try_from(defaults.avatar.segment_length).unwrap_or(i64::MAX),
        )?
        .set_default("log.level", defaults.log.level.clone())?
        .set_default("log.format", "text")?
        .set_default("seed.examples", defaults.seed.examples)?;

    let environment_overrides = config::Environment::with_prefix("ROSTER").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("ROSTER_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via ROSTER_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.token_ttl_seconds > i64::MAX as u64 {
        config.auth.token_ttl_seconds = i64::MAX as u64;
    }

    if config.auth.jwt_secret.is_empty() {
        anyhow::bail!("invalid configuration: auth.jwt_secret must not be empty");
    }

    if config.avatar.segment_length == 0 {
        anyhow::bail!("invalid configuration: avatar.segment_length must be positive");
    }

    debug!(
        app = %config.app.name,
        version = %config.app.version,
        address = %config.http.address,
        port = config.http.port,
        "loaded backend configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_policy_defaults_to_silent() {
        assert_eq!(AuthConfig::default().forbidden_policy, ForbiddenPolicy::Silent);
    }

    #[test]
    fn token_ttl_defaults_to_fifteen_minutes() {
        assert_eq!(AuthConfig::default().token_ttl_seconds, 900);
    }
}
