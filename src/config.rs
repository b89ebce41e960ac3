use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::style::MissingValuePolicy;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal map of Mauritanian census (RGPH) statistics", long_about = None)]
pub struct Cli {
    /// Base URL of the census API server.
    #[arg(long, env = "RGPH_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,
    /// Read JSON payloads from this directory instead of the API.
    #[arg(long, env = "RGPH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Where downloaded spreadsheets are written.
    #[arg(long, env = "RGPH_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,
    /// Census year to open with (defaults to the latest available).
    #[arg(long)]
    pub year: Option<i32>,
    /// Shade zones without data as if their value were 0.
    #[arg(long)]
    pub missing_as_zero: bool,
    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Where census payloads come from
#[derive(Clone, Debug, PartialEq)]
pub enum SourceConfig {
    Http { base_url: String, timeout: Duration },
    Dir(PathBuf),
}

/// Resolved runtime settings
#[derive(Clone, Debug)]
pub struct Config {
    pub source: SourceConfig,
    pub export_dir: PathBuf,
    pub initial_year: Option<i32>,
    pub missing_values: MissingValuePolicy,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let source = match cli.data_dir {
            Some(dir) => SourceConfig::Dir(dir),
            None => SourceConfig::Http {
                base_url: cli.api_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(cli.timeout_secs.max(1)),
            },
        };
        Self {
            source,
            export_dir: cli.export_dir,
            initial_year: cli.year,
            missing_values: if cli.missing_as_zero {
                MissingValuePolicy::AsZero
            } else {
                MissingValuePolicy::NoData
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from(Cli::parse_from(["rgph-map", "--api-url", "http://census.example/"]));
        assert_eq!(
            config.source,
            SourceConfig::Http {
                base_url: "http://census.example".into(),
                timeout: Duration::from_secs(30),
            }
        );
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.missing_values, MissingValuePolicy::NoData);
        assert!(config.initial_year.is_none());
    }

    #[test]
    fn test_offline_and_flags() {
        let config = Config::from(Cli::parse_from([
            "rgph-map",
            "--data-dir",
            "/tmp/rgph",
            "--year",
            "2013",
            "--missing-as-zero",
        ]));
        assert_eq!(config.source, SourceConfig::Dir(PathBuf::from("/tmp/rgph")));
        assert_eq!(config.initial_year, Some(2013));
        assert_eq!(config.missing_values, MissingValuePolicy::AsZero);
    }
}
