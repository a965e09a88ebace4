use crate::error::FetchError;
use crate::parse::Args;
use std::env;
use url::Url;

pub const USERNAME_VAR: &str = "EBIRD_USERNAME";
pub const PASSWORD_VAR: &str = "EBIRD_PASSWORD";

pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Both variables must be set and non-empty.
    pub fn from_env() -> Result<Self, FetchError> {
        Self::from_values(env::var(USERNAME_VAR).ok(), env::var(PASSWORD_VAR).ok())
    }

    fn from_values(username: Option<String>, password: Option<String>) -> Result<Self, FetchError> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok(Self { username, password })
            }
            _ => Err(FetchError::MissingCredentials(USERNAME_VAR, PASSWORD_VAR)),
        }
    }
}

/// Where the alert page and its links live.
pub struct SiteConfig {
    pub base_url: Url,
    pub alert_url: String,
    pub login_url: String,
}

impl SiteConfig {
    pub fn from_args(args: &Args) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(&args.base_url)?,
            alert_url: args.url.clone(),
            login_url: args.login_url.clone(),
        })
    }
}

/// Fixed text and layout of the generated page, built once at startup.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub title: String,
    pub source_name: String,
    pub source_url: String,
    pub page_length: usize,
}

impl ReportConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            title: args.title.clone(),
            source_name: "eBird".to_string(),
            source_url: args.base_url.clone(),
            page_length: args.page_length,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "eBird Rare Bird Alerts".to_string(),
            source_name: "eBird".to_string(),
            source_url: "https://ebird.org".to_string(),
            page_length: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_credentials_required() {
        assert!(Credentials::from_values(None, None).is_err());
        assert!(Credentials::from_values(Some("me".into()), None).is_err());
        assert!(Credentials::from_values(Some("me".into()), Some(String::new())).is_err());

        let creds = Credentials::from_values(Some("me".into()), Some("pw".into())).unwrap();
        assert_eq!(creds.username, "me");
        assert_eq!(creds.password, "pw");
    }

    #[test]
    fn test_missing_credentials_message() {
        let err = Credentials::from_values(None, None).err().unwrap();
        assert_eq!(
            err.to_string(),
            "EBIRD_USERNAME and EBIRD_PASSWORD environment variables required"
        );
    }

    #[test]
    fn test_configs_from_args() {
        let args = Args::try_parse_from(["warbler", "--title", "Local Rarities", "--page-length", "50"]).unwrap();

        let site = SiteConfig::from_args(&args).unwrap();
        assert_eq!(site.base_url.as_str(), "https://ebird.org/");
        assert_eq!(site.alert_url, "https://ebird.org/alert/summary?sid=SN35466");

        let report = ReportConfig::from_args(&args);
        assert_eq!(report.title, "Local Rarities");
        assert_eq!(report.page_length, 50);
    }

    #[test]
    fn test_bad_base_url() {
        let args = Args::try_parse_from(["warbler", "--base-url", "not a url"]).unwrap();
        assert!(SiteConfig::from_args(&args).is_err());
    }
}
