// Service configuration read from the environment.
//
// Variables
// - TALLY_BIND_ADDR: socket address of the http server, default 0.0.0.0:8080.
// - TALLY_DATA_DIR: folder backing the directory remote file service, default ./TallyAnythingDocs.
// - TALLY_USER_NAME: display name of the session user, default tally-user.
// - TALLY_ACCESS_TOKEN: token handed out by the authenticator. Login fails without it.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_DIR: &str = "./TallyAnythingDocs";
pub const DEFAULT_USER_NAME: &str = "tally-user";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TALLY_BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub user_name: String,
    pub access_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("TALLY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr))?;

        let data_dir = lookup("TALLY_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        if data_dir.trim().is_empty() {
            return Err(ConfigError::Empty("TALLY_DATA_DIR"));
        }

        let user_name = lookup("TALLY_USER_NAME").unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        if user_name.trim().is_empty() {
            return Err(ConfigError::Empty("TALLY_USER_NAME"));
        }

        let access_token = lookup("TALLY_ACCESS_TOKEN").filter(|token| !token.trim().is_empty());

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(data_dir),
            user_name,
            access_token,
        })
    }
}
