//! Organizations (tenants) and their settings.
//!
//! Each organization carries a free-form settings map. The CAS login flow
//! reads a handful of recognized keys from it (see [`settings_keys`]); the
//! map itself is owned and edited by the wider application.

use casbridge_cas::{CasError, ProtocolVersion};
use casbridge_core::OrgId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::SettingsError;
use crate::policy::UnknownUserPolicy;

/// Recognized organization setting keys.
pub mod settings_keys {
    /// Whether CAS login is enabled (bool, default false).
    pub const CAS_ENABLED: &str = "auth_cas_enabled";
    /// Base URL of the organization's CAS server (string).
    pub const CAS_SERVER_URL: &str = "auth_cas_server_url";
    /// CAS protocol version (int, default 2).
    pub const CAS_PROTOCOL_VERSION: &str = "auth_cas_protocol_version";
    /// Policy for authenticated principals without a membership record
    /// (`"permissive_pending"` or `"strict"`).
    pub const CAS_UNKNOWN_USER_POLICY: &str = "auth_cas_unknown_user_policy";
}

/// Free-form organization settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgSettings(Map<String, Value>);

impl OrgSettings {
    /// Creates an empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the setting under `key`, or `default` if it is absent or
    /// does not have the expected type.
    #[must_use]
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.find(key).unwrap_or(default)
    }

    /// Returns the setting under `key` if it is present and well-typed.
    #[must_use]
    pub fn find<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Stores a setting, replacing any previous value.
    pub fn set_setting(&mut self, key: &str, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.to_string(), value);
    }

    /// Removes a setting.
    pub fn remove_setting(&mut self, key: &str) {
        self.0.remove(key);
    }

    /// Returns the raw JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for OrgSettings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

const MAX_SLUG_LEN: usize = 64;

/// A tenant with independent CAS configuration and membership.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    id: OrgId,
    /// Routing identifier used in URLs (`/{slug}/...`).
    slug: String,
    name: String,
    /// Public organizations admit any authenticated principal.
    is_public: bool,
    settings: OrgSettings,
}

impl Organization {
    /// Creates a private organization with empty settings.
    #[must_use]
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: OrgId::new(),
            slug: slug.into(),
            name: name.into(),
            is_public: false,
            settings: OrgSettings::new(),
        }
    }

    /// Creates an organization with all fields specified.
    ///
    /// Use this when reconstituting an organization from storage.
    #[must_use]
    pub fn with_all_fields(
        id: OrgId,
        slug: String,
        name: String,
        is_public: bool,
        settings: OrgSettings,
    ) -> Self {
        Self {
            id,
            slug,
            name,
            is_public,
            settings,
        }
    }

    /// Sets whether the organization is public.
    #[must_use]
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Replaces the settings map.
    #[must_use]
    pub fn with_settings(mut self, settings: OrgSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns true if `slug` can be routed and embedded in a path.
    ///
    /// Slugs are 1 to 64 ASCII letters, digits, `-` or `_`.
    #[must_use]
    pub fn is_valid_slug(slug: &str) -> bool {
        (1..=MAX_SLUG_LEN).contains(&slug.len())
            && slug
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    #[must_use]
    pub fn id(&self) -> OrgId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    #[must_use]
    pub fn settings(&self) -> &OrgSettings {
        &self.settings
    }

    /// Returns a mutable reference to the settings map.
    pub fn settings_mut(&mut self) -> &mut OrgSettings {
        &mut self.settings
    }

    /// Returns the setting under `key`, or `default`.
    #[must_use]
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.settings.get_setting(key, default)
    }

    /// Returns true if CAS login is enabled for this organization.
    #[must_use]
    pub fn cas_enabled(&self) -> bool {
        self.get_setting(settings_keys::CAS_ENABLED, false)
    }

    /// Returns the configured CAS server URL, if any.
    #[must_use]
    pub fn cas_server_url(&self) -> Option<String> {
        self.settings
            .find::<String>(settings_keys::CAS_SERVER_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }

    /// Returns the configured CAS protocol version (default 2).
    ///
    /// # Errors
    ///
    /// Returns `CasError::Configuration` if a version number outside 1–3 is
    /// configured.
    pub fn cas_protocol_version(&self) -> Result<ProtocolVersion, CasError> {
        match self.settings.find::<i64>(settings_keys::CAS_PROTOCOL_VERSION) {
            Some(number) => ProtocolVersion::try_from(number),
            None => Ok(ProtocolVersion::DEFAULT),
        }
    }

    /// Returns the tenant's policy for principals without a membership
    /// record, if it overrides the server default.
    #[must_use]
    pub fn unknown_user_policy(&self) -> Option<UnknownUserPolicy> {
        self.settings.find(settings_keys::CAS_UNKNOWN_USER_POLICY)
    }
}

/// The administrator-editable CAS settings of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: i64,
}

fn default_protocol_version() -> i64 {
    ProtocolVersion::DEFAULT.number()
}

impl CasSettings {
    /// Reads the current CAS settings of an organization.
    #[must_use]
    pub fn from_org(org: &Organization) -> Self {
        Self {
            enabled: org.cas_enabled(),
            server_url: org.cas_server_url(),
            protocol_version: org.get_setting(
                settings_keys::CAS_PROTOCOL_VERSION,
                default_protocol_version(),
            ),
        }
    }

    /// Checks the settings before they are stored.
    ///
    /// A server URL is only required while CAS is enabled, so a tenant can
    /// be switched off without clearing it.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if ProtocolVersion::try_from(self.protocol_version).is_err() {
            return Err(SettingsError::UnsupportedProtocolVersion {
                version: self.protocol_version,
            });
        }

        let server_url = self
            .server_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        match server_url {
            None if self.enabled => Err(SettingsError::MissingServerUrl),
            None => Ok(()),
            Some(raw) => {
                let url = Url::parse(raw).map_err(|e| SettingsError::InvalidServerUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })?;
                if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
                    return Err(SettingsError::InvalidServerUrl {
                        url: raw.to_string(),
                        reason: "must be an absolute http(s) URL".to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Writes these settings into an organization's settings map.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the map untouched, if validation fails.
    pub fn apply(&self, settings: &mut OrgSettings) -> Result<(), SettingsError> {
        self.validate()?;

        settings.set_setting(settings_keys::CAS_ENABLED, self.enabled);
        match self.server_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                settings.set_setting(settings_keys::CAS_SERVER_URL, url);
            }
            _ => settings.remove_setting(settings_keys::CAS_SERVER_URL),
        }
        settings.set_setting(settings_keys::CAS_PROTOCOL_VERSION, self.protocol_version);
        Ok(())
    }
}
