use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tiberius::{AuthMethod, Config as TiberiusConfig};

use crate::error::TdsHelperError;

const DEFAULT_PORT: u16 = 1433;

/// `[tcp:]host[\instance][,port]`
static SERVER_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:tcp:)?([^\\,]+)(?:\\([^,]+))?(?:,\s*([0-9]+))?$").expect("server value pattern")
});

/// The value of the server key of an ADO.NET connection string.
fn server_entry(connection_string: &str) -> Option<&str> {
    connection_string.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        match key.trim().to_ascii_lowercase().as_str() {
            "server" | "data source" | "address" | "addr" | "network address" => Some(value.trim()),
            _ => None,
        }
    })
}

/// Connection settings for SQL Server.
///
/// Deserialisable, so it can be loaded from a JSON or TOML file; missing optional
/// fields take their defaults.
#[derive(Clone, Deserialize)]
pub struct MssqlOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(skip)]
    connection_string: Option<String>,
}

fn default_trust_cert() -> bool {
    true
}

impl fmt::Debug for MssqlOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlOptions")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("instance_name", &self.instance_name)
            .field("trust_cert", &self.trust_cert)
            .field("application_name", &self.application_name)
            .field("connection_string", &self.connection_string.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MssqlOptions {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
            trust_cert: true,
            application_name: None,
            connection_string: None,
        }
    }

    /// Use an ADO.NET connection string
    /// (`server=tcp:host\INSTANCE,1433;database=db;user=sa;password=...;TrustServerCertificate=true`).
    /// It takes precedence over every other field; `server`, `instance_name` and `port`
    /// are filled in from its server entry for reference.
    ///
    /// # Errors
    /// Returns `TdsHelperError::ConfigError` if tiberius cannot parse the string.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, TdsHelperError> {
        TiberiusConfig::from_ado_string(connection_string)
            .map_err(|e| TdsHelperError::ConfigError(format!("invalid connection string: {e}")))?;
        let mut opts = Self::new(String::new(), String::new(), String::new(), String::new());
        if let Some(caps) = server_entry(connection_string).and_then(|v| SERVER_VALUE.captures(v)) {
            opts.server = caps[1].trim().to_owned();
            opts.instance_name = caps.get(2).map(|m| m.as_str().trim().to_owned());
            opts.port = caps.get(3).and_then(|m| m.as_str().parse().ok());
        }
        opts.connection_string = Some(connection_string.to_owned());
        Ok(opts)
    }

    /// Read `MSSQL_SERVER`, `MSSQL_DATABASE`, `MSSQL_USER`, `MSSQL_PASSWORD` and the
    /// optional `MSSQL_PORT` and `MSSQL_INSTANCE`.
    ///
    /// # Errors
    /// Returns `TdsHelperError::ConfigError` if a required variable is unset or the
    /// port is not a number.
    pub fn from_env() -> Result<Self, TdsHelperError> {
        fn required(key: &str) -> Result<String, TdsHelperError> {
            std::env::var(key).map_err(|_| TdsHelperError::ConfigError(format!("{key} is not set")))
        }

        let port = match std::env::var("MSSQL_PORT") {
            Ok(port) => Some(port.parse::<u16>().map_err(|e| {
                TdsHelperError::ConfigError(format!("MSSQL_PORT is not a port number: {e}"))
            })?),
            Err(_) => None,
        };

        Ok(Self::new(
            required("MSSQL_SERVER")?,
            required("MSSQL_DATABASE")?,
            required("MSSQL_USER")?,
            required("MSSQL_PASSWORD")?,
        )
        .with_port(port)
        .with_instance_name(std::env::var("MSSQL_INSTANCE").ok()))
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn builder(server: String, database: String, user: String, password: String) -> MssqlOptionsBuilder {
        MssqlOptionsBuilder::new(server, database, user, password)
    }

    /// Whether the SQL Browser must be asked for the instance's port.
    #[must_use]
    pub fn uses_named_instance(&self) -> bool {
        self.instance_name.is_some()
    }

    /// Build the tiberius configuration for these options.
    ///
    /// # Errors
    /// Returns `TdsHelperError::ConfigError` for an unparseable connection string or an
    /// empty server name.
    pub fn to_tiberius_config(&self) -> Result<TiberiusConfig, TdsHelperError> {
        if let Some(connection_string) = &self.connection_string {
            return TiberiusConfig::from_ado_string(connection_string).map_err(|e| {
                TdsHelperError::ConfigError(format!("invalid connection string: {e}"))
            });
        }
        if self.server.trim().is_empty() {
            return Err(TdsHelperError::ConfigError("server must not be empty".into()));
        }

        let mut config = TiberiusConfig::new();
        config.host(&self.server);
        config.database(&self.database);
        config.port(self.port.unwrap_or(DEFAULT_PORT));
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        if let Some(instance) = &self.instance_name {
            config.instance_name(instance);
        }
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }
        if self.trust_cert {
            config.trust_cert();
        }
        Ok(config)
    }
}

/// Fluent builder for MSSQL options.
#[derive(Debug, Clone)]
pub struct MssqlOptionsBuilder {
    opts: MssqlOptions,
}

impl MssqlOptionsBuilder {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            opts: MssqlOptions::new(server, database, user, password),
        }
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.opts.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn trust_cert(mut self, trust_cert: bool) -> Self {
        self.opts.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.opts.application_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> MssqlOptions {
        self.opts
    }
}
