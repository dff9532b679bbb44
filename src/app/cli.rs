use crate::mosaic::{Bounds, MAX_ZOOM, ResolverConfig};
use clap::{Parser, error::ErrorKind};
use std::{net::Ipv4Addr, str::FromStr};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UrlPrefix(String);

impl UrlPrefix {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl FromStr for UrlPrefix {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err("URL prefix cannot be empty".into());
        }

        if !trimmed.starts_with('/') {
            return Err(format!("URL prefix must start with '/': {trimmed}"));
        }

        if trimmed == "/" {
            Ok(Self("/".to_string()))
        } else {
            Ok(Self(trimmed.trim_end_matches('/').to_string()))
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// HTTP bind address.
    #[arg(long, env = "TILER_HOST", default_value_t = Ipv4Addr::LOCALHOST)]
    pub host: Ipv4Addr,

    /// HTTP bind port.
    #[arg(long, env = "TILER_PORT", default_value_t = 3050)]
    pub port: u16,

    /// Number of raster reading worker threads.
    #[arg(long, env = "TILER_WORKER_COUNT", default_value_t = 4)]
    pub worker_count: usize,

    /// Maximum concurrent HTTP connections.
    #[arg(long, env = "TILER_MAX_CONCURRENT_CONNECTIONS", default_value_t = 4096)]
    pub max_concurrent_connections: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "TILER_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// URL path prefix of the mosaic routes.
    #[arg(long, env = "TILER_URL_PREFIX", default_value = "/mosaic")]
    pub url_prefix: UrlPrefix,

    /// Public base URL used in TileJSON tile URLs (e.g. https://tiles.example.com).
    /// Derived from the Host header when unset.
    #[arg(long, env = "TILER_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Enable cors
    #[arg(
        long,
        env = "TILER_CORS",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub cors: bool,

    /// Allowed tile scales (e.g. 1,2,3).
    #[arg(
        long,
        env = "TILER_ALLOWED_SCALES",
        value_delimiter = ',',
        default_value = "1,2"
    )]
    pub allowed_scales: Vec<u8>,

    /// Declared mosaic bounds as west,south,east,north.
    #[arg(
        long,
        env = "TILER_DEFAULT_BOUNDS",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_value = "-180,-90,180,90"
    )]
    pub default_bounds: Vec<f64>,

    /// Declared mosaic minimum zoom.
    #[arg(long, env = "TILER_DEFAULT_MINZOOM", default_value_t = 0)]
    pub default_minzoom: u8,

    /// Declared mosaic maximum zoom.
    #[arg(long, env = "TILER_DEFAULT_MAXZOOM", default_value_t = 30)]
    pub default_maxzoom: u8,
}

impl Cli {
    pub fn parse_checked() -> Self {
        let cli = Self::parse();

        if let Err(err) = cli.validate() {
            clap::Error::raw(ErrorKind::ValueValidation, err).exit();
        }

        cli
    }

    fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("--worker-count must be at least 1".into());
        }

        if self.allowed_scales.is_empty() {
            return Err("at least one allowed scale is required".into());
        }

        if let Some(scale) = self.allowed_scales.iter().find(|s| !(1..=3).contains(*s)) {
            return Err(format!("allowed scales must be 1, 2 or 3, got {scale}"));
        }

        self.resolver_config()?;

        Ok(())
    }

    pub fn resolver_config(&self) -> Result<ResolverConfig, String> {
        let bounds = Bounds::try_from(self.default_bounds.as_slice())?;

        if self.default_maxzoom > MAX_ZOOM {
            return Err(format!(
                "--default-maxzoom must be at most {MAX_ZOOM}, got {}",
                self.default_maxzoom
            ));
        }

        if self.default_minzoom > self.default_maxzoom {
            return Err(format!(
                "--default-minzoom ({}) must not exceed --default-maxzoom ({})",
                self.default_minzoom, self.default_maxzoom
            ));
        }

        Ok(ResolverConfig {
            bounds,
            minzoom: self.default_minzoom,
            maxzoom: self.default_maxzoom,
            ..ResolverConfig::default()
        })
    }
}
