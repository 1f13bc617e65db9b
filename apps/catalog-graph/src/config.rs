use clap::Parser;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::net::SocketAddr;

/// Startup configuration. Every flag can also be supplied through the
/// environment (or a `.env` file loaded before parsing).
#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-graph")]
#[command(about = "Seller and category counts over the catalog table", long_about = None)]
#[command(version)]
pub struct Config {
    /// Full connection URL; takes precedence over the individual db-* parts
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    #[arg(long, env = "DB_NAME", default_value = "cartesian")]
    pub db_name: String,

    /// Catalog table holding `seller_id` and `category_name`
    #[arg(long, env = "CATALOG_TABLE", default_value = "cartesian_catalog_data_flat", value_parser = parse_table_name)]
    pub table: String,

    /// Listen address; loopback unless exposed explicitly
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// Serve Prometheus metrics on this port (separate listener)
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Connection URL handed to the database driver.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => self.mysql_url(),
        }
    }

    /// URL assembled from the db-* parts, credentials percent-encoded.
    pub fn mysql_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            utf8_percent_encode(&self.db_user, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.db_password, NON_ALPHANUMERIC),
            self.db_host,
            self.db_port,
            self.db_name,
        )
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }

    pub fn metrics_addr(&self) -> anyhow::Result<Option<SocketAddr>> {
        match self.metrics_port {
            Some(port) => Ok(Some(format!("{}:{}", self.host, port).parse()?)),
            None => Ok(None),
        }
    }
}

/// The table name is interpolated into static SQL, so only plain
/// identifiers are accepted.
pub fn parse_table_name(s: &str) -> Result<String, String> {
    let mut chars = s.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(s.to_string())
    } else {
        Err(format!("`{s}` is not a plain SQL identifier"))
    }
}
