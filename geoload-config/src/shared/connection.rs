use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_postgres::{Config as TokioPgConnectOptions, config::SslMode as TokioPgSslMode};

use crate::shared::ValidationError;

/// Application name reported to Postgres by the loader.
const APP_NAME_LOADER: &str = "geoload_loader";

/// Session settings applied to every source connection.
///
/// Timestamps and floats are rendered in a stable format and the full-table scan is not cut
/// short by a statement timeout.
const SESSION_OPTIONS: &str = "-c datestyle=ISO -c intervalstyle=postgres -c extra_float_digits=3 -c client_encoding=UTF8 -c timezone=UTC -c statement_timeout=0";

/// Configuration for connecting to the source Postgres database.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PgConnectionConfig {
    /// Hostname or IP address of the Postgres server.
    pub host: String,
    /// Port number on which the Postgres server is listening.
    pub port: u16,
    /// Name of the Postgres database to connect to.
    pub name: String,
    /// Username for authenticating with the Postgres server.
    pub username: String,
    /// Password for the specified user.
    pub password: Option<SecretString>,
    /// TLS configuration for secure connections.
    #[serde(default = "TlsConfig::disabled")]
    pub tls: TlsConfig,
}

impl PgConnectionConfig {
    /// Validates the connection configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier("source.host"));
        }

        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier("source.name"));
        }

        self.tls.validate()
    }
}

/// TLS settings for secure Postgres connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// PEM-encoded trusted root certificates.
    pub trusted_root_certs: String,
    /// Whether TLS is enabled for the connection.
    pub enabled: bool,
}

impl TlsConfig {
    /// Returns a configuration with TLS turned off.
    pub fn disabled() -> Self {
        Self {
            trusted_root_certs: "".to_string(),
            enabled: false,
        }
    }

    /// Validates the [`TlsConfig`].
    ///
    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled but no certificates are provided.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// Converts the implementation into driver specific connect options.
pub trait IntoConnectOptions<Output> {
    /// Creates connection options without selecting a database.
    fn without_db(&self) -> Output;

    /// Creates connection options for the configured database.
    fn with_db(&self) -> Output;
}

impl IntoConnectOptions<TokioPgConnectOptions> for PgConnectionConfig {
    fn without_db(&self) -> TokioPgConnectOptions {
        // Certificate verification is done by rustls when TLS is enabled, so the driver only needs
        // to know whether to negotiate TLS at all.
        let ssl_mode = if self.tls.enabled {
            TokioPgSslMode::Require
        } else {
            TokioPgSslMode::Disable
        };

        let mut config = TokioPgConnectOptions::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.username)
            .application_name(APP_NAME_LOADER)
            .options(SESSION_OPTIONS)
            .ssl_mode(ssl_mode);

        if let Some(password) = &self.password {
            config.password(password.expose_secret());
        }

        config
    }

    fn with_db(&self) -> TokioPgConnectOptions {
        let mut config: TokioPgConnectOptions = self.without_db();
        config.dbname(&self.name);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_config(tls: TlsConfig) -> PgConnectionConfig {
        PgConnectionConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "oogeo_samples".to_string(),
            username: "postgres".to_string(),
            password: Some(SecretString::new("secret".to_string())),
            tls,
        }
    }

    #[test]
    fn tokio_options_carry_connection_parameters() {
        let options: TokioPgConnectOptions = connection_config(TlsConfig::disabled()).with_db();

        assert_eq!(options.get_user(), Some("postgres"));
        assert_eq!(options.get_dbname(), Some("oogeo_samples"));
        assert_eq!(options.get_ports(), &[5432]);
        assert_eq!(options.get_password(), Some(b"secret".as_slice()));
        assert_eq!(options.get_ssl_mode(), TokioPgSslMode::Disable);
        assert_eq!(options.get_application_name(), Some(APP_NAME_LOADER));
    }

    #[test]
    fn tls_requires_root_certificates() {
        let config = connection_config(TlsConfig {
            trusted_root_certs: String::new(),
            enabled: true,
        });

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingTrustedRootCerts)
        ));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = connection_config(TlsConfig::disabled());

        let rendered = format!("{config:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("\"secret\""));
    }
}
