use log::*;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
  DEFAULT_COLLECTION, DEFAULT_ENTITY_LABEL, DEFAULT_ID_COLUMN, DEFAULT_RLS_RPC,
  DEFAULT_STORE_TIMEOUT, ENV_SERVICE_KEY, ENV_STORE_URL,
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
  #[error("Missing store url, set {ENV_STORE_URL}")]
  MissingUrl,
  #[error("Missing service role key, set {ENV_SERVICE_KEY}")]
  MissingServiceKey,
  #[error("Invalid store url: {0}")]
  InvalidUrl(url::ParseError),
  #[error("Unsupported store url scheme: {0}")]
  UnsupportedScheme(String),
  #[error("Empty value for: {0}")]
  Empty(&'static str),
  #[error("Invalid name for {0}: '{1}'")]
  InvalidName(&'static str, String),
  #[error("Timeout must be positive")]
  InvalidTimeout,
}

/// Process-wide settings for talking to the record store.
///
/// Constructed once at startup. Both `url` and `service_key` are mandatory, a missing value
/// aborts initialization rather than failing individual requests later.
#[derive(Clone, Debug)]
pub struct StoreConfig {
  /// Base URL of the store, e.g. "https://<project>.supabase.co".
  pub url: Option<String>,

  /// Service-role credential. Bypasses per-row access policies.
  pub service_key: Option<String>,

  /// Collection (table) records are deleted from.
  pub collection: String,

  /// Column matched against the caller-supplied identifier.
  pub id_column: String,

  /// Human readable entity name used in validation messages.
  pub entity_label: String,

  /// Whether to call `rls_rpc` before every delete.
  pub relax_rls: bool,
  pub rls_rpc: String,

  /// Bound for each individual store call.
  pub timeout: Duration,
}

impl Default for StoreConfig {
  fn default() -> Self {
    return Self {
      url: None,
      service_key: None,
      collection: DEFAULT_COLLECTION.to_string(),
      id_column: DEFAULT_ID_COLUMN.to_string(),
      entity_label: DEFAULT_ENTITY_LABEL.to_string(),
      relax_rls: true,
      rls_rpc: DEFAULT_RLS_RPC.to_string(),
      timeout: DEFAULT_STORE_TIMEOUT,
    };
  }
}

/// Validated connection parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreCredentials<'a> {
  pub url: url::Url,
  pub service_key: &'a str,
}

impl StoreConfig {
  /// Checks everything but the credentials.
  pub fn validate_options(&self) -> Result<(), ConfigError> {
    validate_name("collection", &self.collection)?;
    validate_name("id_column", &self.id_column)?;
    if self.relax_rls {
      validate_name("rls_rpc", &self.rls_rpc)?;
    }

    if self.entity_label.is_empty() {
      return Err(ConfigError::Empty("entity_label"));
    }

    if self.timeout.is_zero() {
      return Err(ConfigError::InvalidTimeout);
    }

    return Ok(());
  }

  pub fn credentials(&self) -> Result<StoreCredentials<'_>, ConfigError> {
    let url = match self.url.as_deref() {
      None | Some("") => return Err(ConfigError::MissingUrl),
      Some(url) => url::Url::parse(url).map_err(ConfigError::InvalidUrl)?,
    };

    match url.scheme() {
      "http" | "https" => {}
      scheme => return Err(ConfigError::UnsupportedScheme(scheme.to_string())),
    };

    if url.path() != "/" {
      warn!("Ignoring path of store url: {url}");
    }

    let service_key = match self.service_key.as_deref() {
      None | Some("") => return Err(ConfigError::MissingServiceKey),
      Some(key) => key,
    };

    return Ok(StoreCredentials { url, service_key });
  }

  pub fn validate(&self) -> Result<StoreCredentials<'_>, ConfigError> {
    self.validate_options()?;
    return self.credentials();
  }
}

/// Names end up in URL paths of the store's REST API.
fn validate_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
  if name.is_empty() {
    return Err(ConfigError::Empty(field));
  }

  let valid = name
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  if !valid {
    return Err(ConfigError::InvalidName(field, name.to_string()));
  }

  return Ok(());
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> StoreConfig {
    return StoreConfig {
      url: Some("https://project.supabase.co".to_string()),
      service_key: Some("secret".to_string()),
      ..Default::default()
    };
  }

  #[test]
  fn test_default_config_requires_credentials() {
    let config = StoreConfig::default();
    assert_eq!(config.validate_options(), Ok(()));
    assert_eq!(config.validate(), Err(ConfigError::MissingUrl));
  }

  #[test]
  fn test_valid_config() {
    let config = config();
    let credentials = config.validate().unwrap();
    assert_eq!(credentials.url.as_str(), "https://project.supabase.co/");
    assert_eq!(credentials.service_key, "secret");
  }

  #[test]
  fn test_missing_credentials() {
    let mut config = config();
    config.service_key = None;
    assert_eq!(config.validate(), Err(ConfigError::MissingServiceKey));

    config.service_key = Some(String::new());
    assert_eq!(config.validate(), Err(ConfigError::MissingServiceKey));

    let mut config = self::config();
    config.url = Some(String::new());
    assert_eq!(config.validate(), Err(ConfigError::MissingUrl));
  }

  #[test]
  fn test_invalid_url() {
    let mut config = config();
    config.url = Some("project.supabase.co".to_string());
    assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

    config.url = Some("ftp://project.supabase.co".to_string());
    assert_eq!(
      config.validate(),
      Err(ConfigError::UnsupportedScheme("ftp".to_string()))
    );
  }

  #[test]
  fn test_invalid_options() {
    let mut config = config();
    config.collection = "faqs?select=*".to_string();
    assert_eq!(
      config.validate(),
      Err(ConfigError::InvalidName(
        "collection",
        "faqs?select=*".to_string()
      ))
    );

    let mut config = self::config();
    config.id_column = String::new();
    assert_eq!(config.validate(), Err(ConfigError::Empty("id_column")));

    let mut config = self::config();
    config.timeout = Duration::ZERO;
    assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));

    // The RPC name only matters if it's used.
    let mut config = self::config();
    config.rls_rpc = "not valid".to_string();
    assert!(config.validate().is_err());
    config.relax_rls = false;
    assert!(config.validate().is_ok());
  }
}
