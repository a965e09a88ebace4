use thiserror::Error;

/// Failures while retrieving the alert page. All of these end the run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0} and {1} environment variables required")]
    MissingCredentials(&'static str, &'static str),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Login rejected for {0}")]
    LoginRejected(String),

    #[error("No sighting content found at {0}")]
    ContentNotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single element produced no record. Never escapes the extractor.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no species text")]
    MissingSpecies,

    #[error("cannot resolve href {href:?} against {base}: no origin")]
    BadHref { href: String, base: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed history in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
