//! Configuration manager for the admin panel.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_UPLOADS: &str = "wwwroot/uploads";
const DEFAULT_ADMIN_ROLE: &str = "Admin";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024; // 5 MiB.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that may occur while loading `config.yaml`.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize `config.yaml`: {0}")]
    Deserialize(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Listening port.
    pub port: u16,
    /// Directory receiving uploaded profile photos.
    pub uploads: PathBuf,
    /// Maximum accepted photo size, in bytes.
    pub max_upload_size: usize,
    /// Role required to reach admin routes.
    pub admin_role: String,
    #[serde(skip_deserializing)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to JsonWebToken configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Rules enforced on passwords.
    #[serde(skip_serializing)]
    pub password_policy: PasswordPolicy,
    /// Accounts inserted on start.
    #[serde(skip_serializing)]
    pub users: Vec<SeedUser>,
    /// Related to metrics export.
    #[serde(skip_serializing)]
    pub telemetry: Telemetry,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            port: DEFAULT_PORT,
            uploads: PathBuf::from(DEFAULT_UPLOADS),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            admin_role: DEFAULT_ADMIN_ROLE.to_owned(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            token: None,
            argon2: None,
            password_policy: PasswordPolicy::default(),
            users: Vec::new(),
            telemetry: Telemetry::default(),
        }
    }
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Password policy.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub required_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
    pub required_unique_chars: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 6,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
            required_unique_chars: 1,
        }
    }
}

/// Json Web Token configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    /// HMAC secret shared with the issuer.
    pub secret: String,
    /// Expected audience.
    pub audience: Option<String>,
}

/// Account created on start.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    /// Plain password, hashed before insertion.
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// Expose `/metrics` for Prometheus.
    #[serde(default)]
    pub prometheus: bool,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Running crate version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    ///
    /// A missing file is not an error: defaults are used and logged.
    pub fn read(self) -> Result<Self, ConfigError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(&file_path) {
            Ok(file) => serde_yaml::from_reader::<_, Configuration>(file)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(
                    path = %file_path.display(),
                    "`config.yaml` file not found, using defaults"
                );
                Configuration::default()
            },
            Err(err) => return Err(err.into()),
        };

        config.version = VERSION.to_owned();
        config.path = file_path;

        if let Ok(secret) = std::env::var("TOKEN_SECRET") {
            match config.token.as_mut() {
                Some(token) => token.secret = secret,
                None => {
                    config.token = Some(Token {
                        secret,
                        audience: None,
                    })
                },
            }
        }

        Ok(config)
    }
}
