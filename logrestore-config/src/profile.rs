use std::path::{Path, PathBuf};

use ini::{Ini, Properties};

use crate::error::{ConfigError, Result};

const DEFAULT_SECTION: &str = "DEFAULT";

/// API-key credentials of one profile in an OCI config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub tenancy: String,
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub region: Option<String>,
}

impl OciProfile {
    /// `keyId` used when signing requests with this profile's key.
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }

    /// Region from the environment if given, otherwise from the profile.
    pub fn resolve_region(&self, override_region: Option<&str>) -> Result<String> {
        override_region
            .or(self.region.as_deref())
            .map(str::to_string)
            .ok_or(ConfigError::MissingRegion)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".oci").join("config"))
        .ok_or(ConfigError::NoHomeDir)
}

/// Load `profile` from the INI file at `path`. The profile must exist; keys
/// missing from a named profile fall back to the `DEFAULT` section.
pub fn load_profile(path: &Path, profile: &str) -> Result<OciProfile> {
    let ini = Ini::load_from_file(path).map_err(|source| ConfigError::ReadProfile {
        path: path.to_path_buf(),
        source,
    })?;
    profile_from_ini(&ini, path, profile)
}

fn profile_from_ini(ini: &Ini, path: &Path, profile: &str) -> Result<OciProfile> {
    let section = ini
        .section(Some(profile))
        .ok_or_else(|| ConfigError::MissingProfile {
            profile: profile.to_string(),
            path: path.to_path_buf(),
        })?;
    let fallback = ini
        .section(Some(DEFAULT_SECTION))
        .filter(|_| profile != DEFAULT_SECTION);

    let lookup = |key: &'static str| -> Option<String> {
        section
            .get(key)
            .or_else(|| fallback.and_then(|props: &Properties| props.get(key)))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let require = |key: &'static str| -> Result<String> {
        lookup(key).ok_or_else(|| ConfigError::MissingKey {
            profile: profile.to_string(),
            path: path.to_path_buf(),
            key,
        })
    };

    Ok(OciProfile {
        tenancy: require("tenancy")?,
        user: require("user")?,
        fingerprint: require("fingerprint")?,
        key_file: expand_home(&require("key_file")?),
        region: lookup("region"),
    })
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
