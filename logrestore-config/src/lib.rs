mod error;
pub mod profile;

use std::{env, path::PathBuf, time::Duration};

use chrono::{NaiveDateTime, Utc};
use clap::Parser;
use logrestore_models::core::{DEFAULT_LOG_NAME, ListingMode, TimeWindow};

pub use error::{ConfigError, Result};
pub use profile::{OciProfile, default_config_path, load_profile};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const REGION_ENV_VAR: &str = "OCI_REGION";

/// Waiting policy for a freshly created log group or log to show up in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub compartment_id: String,
    pub bucket: String,
    pub folder: String,
    pub window: TimeWindow,
    pub log_name: String,
    pub listing: ListingMode,
    pub work_dir: PathBuf,
    pub provision: ProvisionPolicy,
    pub config_file: PathBuf,
    pub profile: String,
    pub region: Option<String>,
    pub log_file: PathBuf,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Restore archived logs to the OCI Logging service", long_about = None)]
pub struct CliArgs {
    /// Compartment OCID
    #[arg(long, short = 'c')]
    compartment: String,

    /// Object Storage bucket
    #[arg(long, short = 'b')]
    bucket: String,

    /// Object Storage folder (object name prefix)
    #[arg(long, short = 'f')]
    folder: String,

    /// Start time for the log source, `YYYY-MM-DD HH:MM:SS` [default: now]
    #[arg(long, short = 's')]
    start: Option<String>,

    /// End time for the log source, `YYYY-MM-DD HH:MM:SS` [default: now]
    #[arg(long, short = 'e')]
    end: Option<String>,

    /// Display name of the log the archives are restored into
    #[arg(long, short = 'l', default_value = DEFAULT_LOG_NAME)]
    logname: String,

    /// Follow the bucket listing past its first 1000 objects
    #[arg(long)]
    all_pages: bool,

    /// Directory archives are downloaded into while being restored
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// OCI config file [default: ~/.oci/config]
    #[arg(long)]
    config_file: Option<PathBuf>,

    #[arg(long, default_value = "DEFAULT")]
    profile: String,

    #[arg(long, default_value = "log-restore.log")]
    log_file: PathBuf,

    #[arg(long, default_value_t = 10)]
    provision_attempts: u32,

    #[arg(long, default_value_t = 2)]
    provision_interval_secs: u64,
}

pub fn parse_config() -> Result<RestoreConfig> {
    let args = CliArgs::parse();
    let region = env::var(REGION_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty());
    build_config(args, Utc::now().naive_utc(), region)
}

/// Resolve parsed flags into a [`RestoreConfig`]; `now` stands in for omitted times.
pub fn build_config(
    args: CliArgs,
    now: NaiveDateTime,
    region: Option<String>,
) -> Result<RestoreConfig> {
    let start = match args.start {
        Some(ref value) => parse_timestamp(value)?,
        None => now,
    };
    let end = match args.end {
        Some(ref value) => parse_timestamp(value)?,
        None => now,
    };

    let config_file = match args.config_file {
        Some(path) => path,
        None => default_config_path()?,
    };

    let listing = if args.all_pages {
        ListingMode::AllPages
    } else {
        ListingMode::SinglePage
    };

    Ok(RestoreConfig {
        compartment_id: args.compartment,
        bucket: args.bucket,
        folder: args.folder,
        window: TimeWindow::from_args(start, end),
        log_name: args.logname,
        listing,
        work_dir: args.work_dir,
        provision: ProvisionPolicy {
            attempts: args.provision_attempts.max(1),
            interval: Duration::from_secs(args.provision_interval_secs),
        },
        config_file,
        profile: args.profile,
        region,
        log_file: args.log_file,
    })
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|source| {
        ConfigError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "log-restore",
            "-c",
            "ocid1.compartment.oc1..aaaa",
            "-b",
            "archive",
            "-f",
            "logs/2021",
            "--config-file",
            "/tmp/oci-config",
        ];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 10, 10)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn omitted_times_default_to_now() {
        let config = build_config(args(&[]), now(), None).unwrap();
        assert_eq!(config.window.end, now().and_utc());
        assert_eq!(
            config.window.start,
            now().and_utc() - chrono::Duration::hours(24)
        );
        assert_eq!(config.log_name, "archive-restore-log");
        assert_eq!(config.listing, ListingMode::SinglePage);
        assert_eq!(config.provision, ProvisionPolicy::default());
    }

    #[test]
    fn explicit_window_and_flags() {
        let config = build_config(
            args(&[
                "-s",
                "2021-10-01 00:00:00",
                "-e",
                "2021-10-02 12:00:00",
                "-l",
                "restored",
                "--all-pages",
            ]),
            now(),
            Some("us-ashburn-1".into()),
        )
        .unwrap();

        assert_eq!(
            config.window.start,
            parse_timestamp("2021-09-30 00:00:00").unwrap().and_utc()
        );
        assert_eq!(
            config.window.end,
            parse_timestamp("2021-10-02 12:00:00").unwrap().and_utc()
        );
        assert_eq!(config.log_name, "restored");
        assert_eq!(config.listing, ListingMode::AllPages);
        assert_eq!(config.region.as_deref(), Some("us-ashburn-1"));
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let err = build_config(args(&["-s", "2021-10-01T00:00:00"]), now(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimestamp { .. }));
    }

    #[test]
    fn required_flags_are_enforced() {
        assert!(CliArgs::try_parse_from(["log-restore", "-b", "archive"]).is_err());
    }
}
