//! Configuration types
//!
//! Field names are snake_case; the aliases keep configuration files written for
//! the legacy tool (PascalCase keys, `MongoDB`/`PostgresDB` sections) loadable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default cap on table metadata documents read per run
pub const DEFAULT_TABLE_META_LIMIT: usize = 100;

/// Default cap on link documents read per run
pub const DEFAULT_RECORD_LINK_LIMIT: usize = 10_000_000;

/// Top-level configuration for a migration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocgeomConfig {
    /// Log file; logs go to stderr when unset
    #[serde(default, alias = "Logfile", alias = "LogFile")]
    pub logfile: Option<PathBuf>,

    /// Log level used when none is given on the command line
    #[serde(default, alias = "LogLevel")]
    pub log_level: Option<String>,

    /// Source document store
    #[serde(alias = "MongoDB", alias = "Source")]
    pub source: SourceStoreConfig,

    /// Relational store holding the geometry tables and the output table
    #[serde(alias = "PostgresDB", alias = "Destination")]
    pub destination: RelationalConfig,

    /// Pipeline tuning
    #[serde(default, alias = "Pipeline")]
    pub pipeline: PipelineSettings,
}

/// Document store connection and collection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStoreConfig {
    /// Endpoint, e.g. `ws://localhost:8000`, `rocksdb://./docs.db` or `mem://`
    #[serde(alias = "Host")]
    pub host: String,

    /// Namespace holding the document database
    #[serde(default = "default_source_namespace", alias = "Namespace")]
    pub namespace: String,

    /// Database holding the metadata and link tables
    #[serde(default = "default_source_database", alias = "Database")]
    pub database: String,

    /// Root user for remote endpoints
    #[serde(default, alias = "User", alias = "Username")]
    pub username: Option<String>,

    /// Root password for remote endpoints
    #[serde(default, alias = "Password")]
    pub password: Option<String>,

    /// Table holding table metadata documents
    #[serde(default = "default_table_meta_table")]
    pub table_meta_table: String,

    /// Table holding link documents
    #[serde(default = "default_record_link_table")]
    pub record_link_table: String,

    /// Maximum number of table metadata documents to read
    #[serde(default = "default_table_meta_limit")]
    pub table_meta_limit: usize,

    /// Maximum number of link documents to read
    #[serde(default = "default_record_link_limit")]
    pub record_link_limit: usize,
}

/// Relational backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationalDriver {
    /// PostgreSQL (PostGIS geometry tables)
    #[default]
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    /// SQLite file, geometry stored as hex EWKB text
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl fmt::Display for RelationalDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationalDriver::Postgres => write!(f, "postgres"),
            RelationalDriver::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Relational store connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// Backend driver
    #[serde(default, alias = "Driver")]
    pub driver: RelationalDriver,

    /// Server host (postgres only)
    #[serde(default, alias = "Host")]
    pub host: String,

    /// Server port, 0 selects the driver default
    #[serde(default, alias = "Port")]
    pub port: u16,

    /// Database name, or file path for sqlite
    #[serde(alias = "Database")]
    pub database: String,

    /// Login user
    #[serde(default, alias = "User")]
    pub user: String,

    /// Login password
    #[serde(default, alias = "Password")]
    pub password: String,

    /// Require TLS
    #[serde(default, alias = "SSL", alias = "Ssl")]
    pub ssl: bool,

    /// Table receiving the output rows
    #[serde(default = "default_output_table", alias = "OutputTable")]
    pub output_table: String,

    /// Geometry column read from the foreign tables
    #[serde(default = "default_geometry_column", alias = "GeometryColumn")]
    pub geometry_column: String,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl RelationalConfig {
    /// SQLite database at `path` with default table names
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: RelationalDriver::Sqlite,
            host: String::new(),
            port: 0,
            database: path.into(),
            user: String::new(),
            password: String::new(),
            ssl: false,
            output_table: default_output_table(),
            geometry_column: default_geometry_column(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }

    /// libpq-style keyword/value connection string.
    ///
    /// Contains the password; use the `Display` impl for logging.
    pub fn connection_string(&self) -> String {
        self.render(&self.password)
    }

    fn render(&self, password: &str) -> String {
        let sslmode = if self.ssl { "require" } else { "disable" };
        let mut conn = format!(
            "host={} user={} password={} sslmode={} dbname={}",
            self.host, self.user, password, sslmode, self.database
        );
        if self.port != 0 {
            conn.push_str(&format!(" port={}", self.port));
        }
        conn
    }
}

impl fmt::Display for RelationalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.driver {
            RelationalDriver::Sqlite => write!(f, "sqlite:{}", self.database),
            RelationalDriver::Postgres => write!(f, "{}", self.render("***")),
        }
    }
}

impl fmt::Debug for RelationalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationalConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("ssl", &self.ssl)
            .field("output_table", &self.output_table)
            .field("geometry_column", &self.geometry_column)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Rows per insert statement
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,

    /// Wrap truncate and all inserts in one transaction
    #[serde(default)]
    pub atomic_replace: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            insert_batch_size: default_insert_batch_size(),
            atomic_replace: false,
        }
    }
}

fn default_source_namespace() -> String {
    "docs".to_string()
}

fn default_source_database() -> String {
    "docs".to_string()
}

fn default_table_meta_table() -> String {
    "table_meta".to_string()
}

fn default_record_link_table() -> String {
    "record_link".to_string()
}

fn default_table_meta_limit() -> usize {
    DEFAULT_TABLE_META_LIMIT
}

fn default_record_link_limit() -> usize {
    DEFAULT_RECORD_LINK_LIMIT
}

fn default_output_table() -> String {
    "DocumentGeometry".to_string()
}

fn default_geometry_column() -> String {
    "Geometry".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_insert_batch_size() -> usize {
    500
}
