use crate::config::Credentials;
use crate::error::FetchError;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

/// At least one of these must be present before the page counts as loaded.
pub const READY_SELECTOR: &str = ".Observation, .sighting, table, .ResultsStats";

pub struct AlertFetcher {
    client: Client,
    pub(crate) base_delay: Duration,
    pub(crate) max_retries: u32,
}

impl AlertFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            client,
            base_delay: Duration::from_millis(1000),
            max_retries: 3,
        })
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.base_delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sign in through the login form, keeping the session cookie for later
    /// requests. The form's hidden fields are echoed back with the credentials.
    pub async fn login(&self, login_url: &str, credentials: &Credentials) -> Result<(), FetchError> {
        info!("Logging in at {}", login_url);
        let page = self.get_text(login_url).await?;

        let mut form = hidden_inputs(&page);
        form.push(("username".to_string(), credentials.username.clone()));
        form.push(("password".to_string(), credentials.password.clone()));

        let response = self.client.post(login_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: login_url.to_string(),
            });
        }

        let body = response.text().await?;
        if has_password_field(&body) {
            return Err(FetchError::LoginRejected(credentials.username.clone()));
        }

        info!("Login successful!");
        Ok(())
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let jitter = if base > 0 { rand::rng().random_range(0..base) } else { 0 };
        Duration::from_millis(
            2_u64
                .saturating_pow(attempt)
                .saturating_mul(base)
                .saturating_add(jitter),
        )
    }

    /// Fetch the alert page with exponential backoff retry, then check that
    /// sighting content is actually on it.
    pub async fn fetch_alerts(&self, url: &str) -> Result<String, FetchError> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Fetching {}", url));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = self.fetch_with_retry(url).await;
        spinner.finish_and_clear();

        let html = result?;
        if !is_ready(&html) {
            return Err(FetchError::ContentNotFound(url.to_string()));
        }
        info!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                info!(
                    "Retrying {} (attempt {}) after {}ms delay",
                    url,
                    attempt + 1,
                    delay.as_millis()
                );
                sleep(delay).await;
            }

            match self.get_text(url).await {
                Ok(html) => return Ok(html),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    warn!("Fetching {} failed, retrying...: {}", url, e);
                }
                Err(e) => {
                    error!("Fetching {} failed after {} attempts: {}", url, attempt + 1, e);
                    return Err(e);
                }
            }
            attempt += 1;
        }
    }
}

fn is_retryable(e: &FetchError) -> bool {
    match e {
        FetchError::Http(_) => true,
        FetchError::Status { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Read a previously saved alert page.
pub fn read_html_file(path: &Path) -> Result<String, FetchError> {
    let html = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if !is_ready(&html) {
        return Err(FetchError::ContentNotFound(path.display().to_string()));
    }
    Ok(html)
}

pub fn is_ready(html: &str) -> bool {
    let document = Html::parse_document(html);
    match Selector::parse(READY_SELECTOR) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

fn hidden_inputs(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("input[type=\"hidden\"][name]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or("");
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn has_password_field(html: &str) -> bool {
    let document = Html::parse_document(html);
    match Selector::parse("input[type=\"password\"]") {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetcher_creation() {
        let fetcher = AlertFetcher::new(Duration::from_secs(30)).unwrap();
        assert_eq!(fetcher.base_delay, Duration::from_millis(1000));
        assert_eq!(fetcher.max_retries, 3);
    }

    #[tokio::test]
    async fn test_fetcher_configuration() {
        let fetcher = AlertFetcher::new(Duration::from_secs(30))
            .unwrap()
            .with_delay(2000)
            .with_max_retries(5);

        assert_eq!(fetcher.base_delay, Duration::from_millis(2000));
        assert_eq!(fetcher.max_retries, 5);
    }

    #[tokio::test]
    async fn test_backoff_grows() {
        let fetcher = AlertFetcher::new(Duration::from_secs(30)).unwrap().with_delay(100);
        let first = fetcher.backoff(1);
        let third = fetcher.backoff(3);
        assert!(first >= Duration::from_millis(200) && first < Duration::from_millis(300));
        assert!(third >= Duration::from_millis(800) && third < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_backoff_saturates() {
        let fetcher = AlertFetcher::new(Duration::from_secs(30)).unwrap();
        assert_eq!(fetcher.backoff(64), Duration::from_millis(u64::MAX));
        assert_eq!(fetcher.backoff(u32::MAX), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_is_ready() {
        assert!(is_ready("<div class=\"Observation\"></div>"));
        assert!(is_ready("<table><tr><td>x</td></tr></table>"));
        assert!(is_ready("<p class=\"ResultsStats\">0 results</p>"));
        assert!(!is_ready("<html><body><p>Loading...</p></body></html>"));
    }

    #[test]
    fn test_retryable() {
        let status = |status| FetchError::Status { status, url: String::new() };
        assert!(is_retryable(&status(429)));
        assert!(is_retryable(&status(503)));
        assert!(!is_retryable(&status(404)));
        assert!(!is_retryable(&FetchError::ContentNotFound(String::new())));
    }

    #[test]
    fn test_hidden_inputs() {
        let html = r#"
            <form>
              <input type="hidden" name="execution" value="e1s1">
              <input type="hidden" name="_eventId" value="submit">
              <input type="hidden" value="no-name">
              <input type="text" name="username">
            </form>"#;
        assert_eq!(
            hidden_inputs(html),
            vec![
                ("execution".to_string(), "e1s1".to_string()),
                ("_eventId".to_string(), "submit".to_string()),
            ]
        );
    }

    #[test]
    fn test_password_field_detection() {
        assert!(has_password_field("<form><input type=\"password\" name=\"password\"></form>"));
        assert!(!has_password_field("<div>Welcome back</div>"));
    }

    #[test]
    fn test_read_html_file() {
        let dir = tempdir().unwrap();
        let ok = dir.path().join("alerts.html");
        fs::write(&ok, "<div class=\"Observation\">Blue Jay</div>").unwrap();
        assert!(read_html_file(&ok).is_ok());

        let empty = dir.path().join("empty.html");
        fs::write(&empty, "<p>Sign in</p>").unwrap();
        assert!(matches!(read_html_file(&empty), Err(FetchError::ContentNotFound(_))));

        let missing = dir.path().join("missing.html");
        assert!(matches!(read_html_file(&missing), Err(FetchError::Io { .. })));
    }
}
