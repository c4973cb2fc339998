//! Configuration loading.
//!
//! The configuration is a flat document (JSON or YAML) holding the connection
//! parameters and the ordered list of tables to export, optionally followed
//! by an `export` block. CLI flags are merged on top of the file.

use crate::domain::cell::BinaryFormat;
use crate::domain::entities::{ConnectionParams, ExportJob};
use crate::domain::errors::{ExportError, Result};
use crate::domain::export_options::{LineEnding, UnencodablePolicy};
use clap::Parser;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const PASSWORD_ENV_VAR: &str = "MYSQL_PASSWORD";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Server address, either `host` or `host:port`.
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub user: String,
    #[serde(default, alias = "password")]
    pub pw: Option<String>,
    pub database: String,
    #[serde(default)]
    pub tables: Vec<String>,
    /// Reserved by older deployments; read but never used.
    #[serde(default)]
    pub ready: Vec<String>,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: String,
    pub archive_name: String,
    /// WHATWG label of the target encoding (e.g. "euc-kr", "shift_jis").
    pub encoding: String,
    pub on_unencodable: UnencodablePolicy,
    pub replacement: char,
    pub line_ending: LineEnding,
    pub binary_format: BinaryFormat,
    pub query_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            archive_name: "result.zip".to_string(),
            encoding: "euc-kr".to_string(),
            on_unencodable: UnencodablePolicy::Fail,
            replacement: '?',
            line_ending: LineEnding::Lf,
            binary_format: BinaryFormat::Base64,
            query_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }
}

impl ExportConfig {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_path().join(&self.archive_name)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Resolves the configured label to an encoding.
    ///
    /// Labels whose encoder writes something else (UTF-16 and `replacement`
    /// encode to UTF-8) are rejected.
    pub fn target_encoding(&self) -> Result<&'static encoding_rs::Encoding> {
        let encoding = encoding_rs::Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| {
                ExportError::ConfigError(format!("unknown encoding label '{}'", self.encoding))
            })?;
        if encoding.output_encoding() != encoding {
            return Err(ExportError::ConfigError(format!(
                "encoding '{}' cannot be written, it encodes as {}",
                self.encoding,
                encoding.output_encoding().name()
            )));
        }
        Ok(encoding)
    }
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (JSON or YAML)
    #[arg(short, long, default_value = "conf.json")]
    pub config: String,

    // Overrides for ad-hoc runs
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub database: Option<String>,
    /// Table to export; repeat to export several (replaces the configured list)
    #[arg(long = "table")]
    pub tables: Vec<String>,
    #[arg(short, long)]
    pub output_dir: Option<String>,
    #[arg(long)]
    pub archive_name: Option<String>,
    #[arg(long)]
    pub encoding: Option<String>,
    /// Either "fail" or "substitute"
    #[arg(long)]
    pub on_unencodable: Option<UnencodablePolicy>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ExportError::ConfigError(format!("cannot open {}: {}", path, e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ExportError::ConfigError(format!("cannot read {}: {}", path, e)))?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)
                .map_err(|e| ExportError::ConfigError(format!("{}: {}", path, e)))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| ExportError::ConfigError(format!("{}: {}", path, e)))?
        };

        Ok(config)
    }

    /// Loads the file named on the command line, applies overrides, validates.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let mut config = Self::from_file(&args.config)?;
        config.merge_cli(args);
        config.validate()?;
        Ok(config)
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(h) = &args.host { self.host = h.clone(); }
        if let Some(p) = args.port { self.port = Some(p); }
        if let Some(u) = &args.user { self.user = u.clone(); }
        if let Some(p) = &args.password { self.pw = Some(p.clone()); }
        if let Some(d) = &args.database { self.database = d.clone(); }
        if !args.tables.is_empty() { self.tables = args.tables.clone(); }
        if let Some(o) = &args.output_dir { self.export.output_dir = o.clone(); }
        if let Some(a) = &args.archive_name { self.export.archive_name = a.clone(); }
        if let Some(e) = &args.encoding { self.export.encoding = e.clone(); }
        if let Some(p) = args.on_unencodable { self.export.on_unencodable = p; }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ExportError::ConfigError("host is required".into()));
        }
        if self.user.trim().is_empty() {
            return Err(ExportError::ConfigError("user is required".into()));
        }
        if self.database.trim().is_empty() {
            return Err(ExportError::ConfigError("database is required".into()));
        }
        if self.tables.is_empty() {
            return Err(ExportError::ConfigError(
                "at least one table must be listed".into(),
            ));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.trim().is_empty() {
                return Err(ExportError::ConfigError("table names must not be empty".into()));
            }
            if !seen.insert(table.as_str()) {
                return Err(ExportError::ConfigError(format!(
                    "table '{}' is listed more than once",
                    table
                )));
            }
        }

        self.endpoint()?;

        if self.export.archive_name.trim().is_empty() {
            return Err(ExportError::ConfigError("export.archive_name is required".into()));
        }
        if self.export.query_timeout_secs == 0 {
            return Err(ExportError::ConfigError(
                "export.query_timeout_secs must be at least 1".into(),
            ));
        }
        if self.export.connect_timeout_secs == 0 {
            return Err(ExportError::ConfigError(
                "export.connect_timeout_secs must be at least 1".into(),
            ));
        }

        let encoding = self.export.target_encoding()?;
        let replacement = self.export.replacement.to_string();
        let (_, _, unmappable) = encoding.encode(&replacement);
        if unmappable {
            return Err(ExportError::ConfigError(format!(
                "replacement {:?} cannot be represented in {}",
                self.export.replacement,
                encoding.name()
            )));
        }

        Ok(())
    }

    /// Splits `host` into address and port, honouring an explicit `port`.
    pub fn endpoint(&self) -> Result<(String, u16)> {
        let host = self.host.trim();
        if let Some(port) = self.port {
            return Ok((host.to_string(), port));
        }
        match host.rsplit_once(':') {
            Some((addr, port)) if !addr.contains(':') => {
                let port = port.parse::<u16>().map_err(|_| {
                    ExportError::ConfigError(format!("invalid port in host '{}'", host))
                })?;
                Ok((addr.to_string(), port))
            }
            _ => Ok((host.to_string(), DEFAULT_MYSQL_PORT)),
        }
    }

    /// Builds the immutable job description for this run.
    pub fn to_job(&self) -> Result<ExportJob> {
        let (host, port) = self.endpoint()?;
        let password = self
            .pw
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV_VAR).ok())
            .unwrap_or_default();

        Ok(ExportJob::new(
            ConnectionParams {
                host,
                port,
                user: self.user.clone(),
                password,
                database: self.database.clone(),
            },
            self.tables.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{
            "host": "10.0.0.5:3307",
            "user": "exporter",
            "pw": "secret",
            "database": "shop",
            "tables": ["users", "orders"],
            "ready": ["ignored"]
        }"#;
        let file = write_config(".json", json);
        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.user, "exporter");
        assert_eq!(config.tables, vec!["users", "orders"]);
        assert_eq!(config.ready, vec!["ignored"]);
        assert_eq!(config.endpoint().unwrap(), ("10.0.0.5".to_string(), 3307));
        assert_eq!(config.export.archive_name, "result.zip");
        assert_eq!(config.export.encoding, "euc-kr");
        assert_eq!(config.export.on_unencodable, UnencodablePolicy::Fail);
        assert_eq!(config.export.binary_format, BinaryFormat::Base64);
        config.validate().unwrap();

        let job = config.to_job().unwrap();
        assert_eq!(job.connection().password, "secret");
        assert_eq!(job.tables(), ["users", "orders"]);
    }

    #[test]
    fn test_load_yaml_config_with_export_block() {
        let yaml = r#"
host: "db.internal"
user: "exporter"
password: "secret"
database: "shop"
tables:
  - users
export:
  output_dir: "./out"
  encoding: "shift_jis"
  on_unencodable: substitute
  line_ending: crlf
  binary_format: raw
"#;
        let file = write_config(".yaml", yaml);
        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.pw.as_deref(), Some("secret"));
        assert_eq!(config.endpoint().unwrap(), ("db.internal".to_string(), 3306));
        assert_eq!(config.export.output_dir, "./out");
        assert_eq!(config.export.on_unencodable, UnencodablePolicy::Substitute);
        assert_eq!(config.export.line_ending, LineEnding::Crlf);
        assert_eq!(config.export.binary_format, BinaryFormat::Raw);
        assert_eq!(config.export.target_encoding().unwrap(), encoding_rs::SHIFT_JIS);
        assert_eq!(config.export.query_timeout_secs, 300);
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::from_file("/nonexistent/conf.json").unwrap_err();
        assert!(err.is_fatal_startup());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let file = write_config(".json", "{ \"host\": ");
        let err = AppConfig::from_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ExportError::ConfigError(_)));
    }

    fn base_config() -> AppConfig {
        AppConfig {
            host: "localhost".into(),
            port: None,
            user: "root".into(),
            pw: None,
            database: "shop".into(),
            tables: vec!["users".into()],
            ready: vec![],
            export: ExportConfig::default(),
        }
    }

    #[test]
    fn test_validation_rules() {
        base_config().validate().unwrap();

        let mut c = base_config();
        c.tables.clear();
        assert!(c.validate().is_err());

        let mut c = base_config();
        c.tables = vec!["users".into(), "users".into()];
        assert!(c.validate().unwrap_err().to_string().contains("more than once"));

        let mut c = base_config();
        c.export.encoding = "klingon".into();
        assert!(c.validate().is_err());

        let mut c = base_config();
        c.export.replacement = '😀';
        assert!(c.validate().is_err());

        let mut c = base_config();
        c.host = "localhost:notaport".into();
        assert!(c.validate().is_err());

        let mut c = base_config();
        c.export.query_timeout_secs = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = base_config();
        let args = CliArgs {
            config: "conf.json".into(),
            host: Some("replica:3310".into()),
            tables: vec!["orders".into(), "items".into()],
            encoding: Some("windows-949".into()),
            on_unencodable: Some(UnencodablePolicy::Substitute),
            ..Default::default()
        };
        config.merge_cli(&args);

        assert_eq!(config.endpoint().unwrap(), ("replica".to_string(), 3310));
        assert_eq!(config.tables, vec!["orders", "items"]);
        assert_eq!(config.export.encoding, "windows-949");
        assert_eq!(config.export.on_unencodable, UnencodablePolicy::Substitute);
        assert_eq!(config.user, "root");
    }

    #[test]
    fn test_encodings_without_own_encoder_rejected() {
        for label in ["utf-16le", "utf-16be", "replacement", "iso-2022-kr"] {
            let mut c = base_config();
            c.export.encoding = label.into();
            let err = c.validate().unwrap_err();
            assert!(err.is_fatal_startup(), "{} should be rejected", label);
        }

        let mut c = base_config();
        c.export.encoding = "utf-8".into();
        c.validate().unwrap();
    }

    #[test]
    fn test_explicit_port_wins() {
        let mut config = base_config();
        config.host = "db".into();
        config.port = Some(3308);
        assert_eq!(config.endpoint().unwrap(), ("db".to_string(), 3308));
    }
}
