//! CZSO public database ("VDB") export download.
//!
//! The consumer price table (`CEN082A`) is exported one year at a time. The
//! endpoint is the same one the web UI uses, so the request carries
//! browser-like headers and a matching `Referer`.

use chrono::{Datelike, Local};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};

use crate::error::{AppError, EXIT_INPUT, EXIT_REMOTE};

const BASE_URL: &str = "https://vdb.czso.cz/vdbvo2/faces/cs/xmlexp";
const INDEX_URL: &str = "https://vdb.czso.cz/vdbvo2/faces/cs/index.jsf";
const BASE_URL_ENV: &str = "INFLACKA_VDB_URL";

/// Dataset version of the price table export.
pub const DEFAULT_DATASET_VERSION: &str = "v10111";
/// First year the export covers.
pub const FIRST_YEAR: i32 = 1990;

const TABLE: &str = "CEN082A";
const CLASSIFICATION_VIEW: &str = "v9744_!_CEN08klasifikacelek-kopie_1";

pub struct CzsoClient {
    client: Client,
    base_url: String,
}

impl CzsoClient {
    /// Build a client; `INFLACKA_VDB_URL` (environment or `.env`) overrides
    /// the export endpoint.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| BASE_URL.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0"),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::new(EXIT_REMOTE, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Download the price export for one year and return the XML text.
    pub fn download_price_data(&self, year: i32, version: &str) -> Result<String, AppError> {
        validate_year(year, Local::now().year())?;
        info!("downloading price data for {year} ({version})");

        let referer = referer_url(year, version);
        let referer = HeaderValue::from_str(&referer)
            .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid dataset version '{version}': {e}")))?;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&export_query(year, version))
            .header(REFERER, referer)
            .send()
            .map_err(|e| AppError::new(EXIT_REMOTE, format!("CZSO request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                EXIT_REMOTE,
                format!("CZSO request failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(EXIT_REMOTE, format!("Failed to read CZSO response: {e}")))?;
        debug!("received {} bytes", body.len());
        Ok(body)
    }
}

/// The export covers `FIRST_YEAR..=current_year`.
pub fn validate_year(year: i32, current_year: i32) -> Result<(), AppError> {
    if (FIRST_YEAR..=current_year).contains(&year) {
        Ok(())
    } else {
        Err(AppError::new(
            EXIT_INPUT,
            format!("Year must be between {FIRST_YEAR} and {current_year}, got {year}."),
        ))
    }
}

/// Query parameters of the XML export (`evo` is repeated).
pub fn export_query(year: i32, version: &str) -> Vec<(&'static str, String)> {
    vec![
        ("page", "vystup-objekt".to_string()),
        ("z", "T".to_string()),
        ("f", "TABULKA".to_string()),
        ("skupId", "2198".to_string()),
        ("katalog", "31779".to_string()),
        ("pvo", TABLE.to_string()),
        ("evo", year_view(year, version)),
        ("evo", CLASSIFICATION_VIEW.to_string()),
        ("str", "v3409".to_string()),
        ("kodjaz", "203".to_string()),
        ("nasexp", "ss".to_string()),
        ("expJenKody", "N".to_string()),
        ("expdefinice", "A".to_string()),
        ("datovytyp", "A".to_string()),
        ("expatrib", "A".to_string()),
        ("expcasdb", "A".to_string()),
    ]
}

fn year_view(year: i32, version: &str) -> String {
    format!("{version}_!_{TABLE}-{year}_1")
}

fn referer_url(year: i32, version: &str) -> String {
    format!(
        "{INDEX_URL}?page=vystup-objekt&pvo={TABLE}&z=T&f=TABULKA&skupId=2198&katalog=31779&evo={}&&evo={CLASSIFICATION_VIEW}&str=v3409",
        year_view(year, version)
    )
}
