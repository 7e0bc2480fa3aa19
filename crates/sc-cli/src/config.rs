//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use sc_core::ComplianceConfig;
use sc_zendesk::ZendeskCredentials;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Zendesk account URL, e.g. `https://example.zendesk.com`.
    pub base_url: Option<String>,
    /// Zendesk subdomain, used when `base_url` is not set.
    pub subdomain: Option<String>,
    /// Chat API OAuth token.
    pub chat_token: Option<String>,
    /// Agent email for Support API token auth.
    pub email: Option<String>,
    /// Support API token.
    pub api_token: Option<String>,
    /// First day of the week for `this` and `prev` ranges.
    pub week_start: Weekday,
    /// Where `--dump` writes its diagnostic JSON.
    pub dump_path: PathBuf,
    /// Show a desktop notification when a check completes.
    pub notify: bool,
    /// Tolerances for the compliance analysis.
    pub compliance: ComplianceConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("subdomain", &self.subdomain)
            .field("chat_token", &self.chat_token.as_ref().map(|_| "[REDACTED]"))
            .field("email", &self.email)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("week_start", &self.week_start)
            .field("dump_path", &self.dump_path)
            .field("notify", &self.notify)
            .field("compliance", &self.compliance)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            subdomain: None,
            chat_token: None,
            email: None,
            api_token: None,
            week_start: Weekday::Mon,
            dump_path: PathBuf::from("shift-check-dump.json"),
            notify: false,
            compliance: ComplianceConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Zendesk credentials keep their conventional names (ZENDESK_CHAT_TOKEN, ...)
        figment = figment.merge(Env::prefixed("ZENDESK_").only(&[
            "base_url",
            "subdomain",
            "chat_token",
            "email",
            "api_token",
        ]));

        // Everything else from SHIFT_CHECK_*, nested keys split on `__`
        figment = figment.merge(Env::prefixed("SHIFT_CHECK_").split("__"));

        figment.extract()
    }

    /// The account URL, from `base_url` or derived from `subdomain`.
    pub fn zendesk_base_url(&self) -> Option<String> {
        non_blank(self.base_url.as_deref())
            .map(str::to_string)
            .or_else(|| {
                non_blank(self.subdomain.as_deref())
                    .map(|subdomain| format!("https://{subdomain}.zendesk.com"))
            })
    }

    /// Credentials for the Zendesk client, or the names of what is missing.
    pub fn credentials(&self) -> Result<ZendeskCredentials, Vec<&'static str>> {
        let base_url = self.zendesk_base_url();
        let chat_token = non_blank(self.chat_token.as_deref());
        let email = non_blank(self.email.as_deref());
        let api_token = non_blank(self.api_token.as_deref());

        match (base_url, chat_token, email, api_token) {
            (Some(base_url), Some(chat_token), Some(email), Some(api_token)) => {
                Ok(ZendeskCredentials {
                    base_url,
                    chat_token: chat_token.to_string(),
                    email: email.to_string(),
                    api_token: api_token.to_string(),
                })
            }
            (base_url, chat_token, email, api_token) => {
                let mut missing = Vec::new();
                if base_url.is_none() {
                    missing.push("ZENDESK_BASE_URL or ZENDESK_SUBDOMAIN");
                }
                if chat_token.is_none() {
                    missing.push("ZENDESK_CHAT_TOKEN");
                }
                if email.is_none() {
                    missing.push("ZENDESK_EMAIL");
                }
                if api_token.is_none() {
                    missing.push("ZENDESK_API_TOKEN");
                }
                Err(missing)
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Returns the platform-specific config directory for shift-check.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("shift-check"))
}
