//! Consumer price index series and deflation
//!
//! Annual CPI-U averages come either from a local `year,cpi` table or from
//! the BLS public API. The API is called once per run with no retry; any
//! failure aborts the run.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{CpiSource, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::sources::schemas::{cpi_schema, validate_columns};
use crate::utils::arrow::{extract_float64, extract_int32};
use crate::utils::io::read_csv;

/// BLS public API endpoint
pub const BLS_API_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
/// CPI-U, U.S. city average, all items, not seasonally adjusted
pub const CPI_SERIES_ID: &str = "CUUR0000SA0";
const USER_AGENT: &str = concat!("sfr-panel/", env!("CARGO_PKG_VERSION"));
/// Years per request without a registration key
const UNREGISTERED_SPAN: i32 = 10;
/// Years per request with a registration key
const REGISTERED_SPAN: i32 = 20;

#[derive(Debug, Serialize)]
struct BlsRequest<'a> {
    seriesid: [&'a str; 1],
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
    annualaverage: bool,
}

#[derive(Debug, Deserialize)]
struct BlsResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results")]
    results: Option<BlsResults>,
}

#[derive(Debug, Deserialize)]
struct BlsResults {
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    data: Vec<BlsObservation>,
}

#[derive(Debug, Deserialize)]
struct BlsObservation {
    year: String,
    period: String,
    value: String,
}

/// Annual CPI values by year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpiSeries {
    values: BTreeMap<i32, f64>,
}

impl CpiSeries {
    /// Series from (year, index) pairs
    pub fn from_values(values: impl IntoIterator<Item = (i32, f64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Read a `year,cpi` table
    pub fn from_csv(path: &Path) -> Result<Self> {
        let schema = cpi_schema();
        let mut values = BTreeMap::new();
        for batch in read_csv(path)? {
            validate_columns(&batch, &schema).map_err(|e| PipelineError::with_path(path, e.to_string()))?;
            let years = extract_int32(&batch, "year", true)?;
            let cpi = extract_float64(&batch, "cpi", true)?;
            for (year, cpi) in years.into_iter().zip(cpi) {
                if let (Some(year), Some(cpi)) = (year, cpi) {
                    values.insert(year, cpi);
                }
            }
        }
        log::info!("Loaded CPI for {} years from {}", values.len(), path.display());
        Ok(Self { values })
    }

    /// Fetch annual averages for `years` from the BLS API
    pub async fn fetch_bls(
        client: &reqwest::Client,
        api_key: Option<&str>,
        years: RangeInclusive<i32>,
    ) -> Result<Self> {
        let span = if api_key.is_some() {
            REGISTERED_SPAN
        } else {
            UNREGISTERED_SPAN
        };

        let end = *years.end();
        let requests: Vec<(i32, i32)> = years
            .step_by(span as usize)
            .map(|first| (first, (first + span - 1).min(end)))
            .collect();

        let mut values = BTreeMap::new();
        for (first, last) in requests {
            let request = BlsRequest {
                seriesid: [CPI_SERIES_ID],
                startyear: first.to_string(),
                endyear: last.to_string(),
                registrationkey: api_key,
                annualaverage: api_key.is_some(),
            };

            log::debug!("Requesting CPI {first}-{last} from BLS");
            let response = client.post(BLS_API_URL).json(&request).send().await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(PipelineError::Api(format!("BLS returned {status}: {body}")));
            }
            values.extend(parse_bls_response(&body)?);
        }

        log::info!("Fetched CPI for {} years from BLS", values.len());
        Ok(Self { values })
    }

    /// Load the series named by the configuration, if any
    pub async fn load(config: &PipelineConfig, years: RangeInclusive<i32>) -> Result<Option<Self>> {
        match &config.cpi_source {
            CpiSource::None => Ok(None),
            CpiSource::File(path) => Self::from_csv(path).map(Some),
            CpiSource::Bls { api_key } => {
                let client = reqwest::Client::builder()
                    .user_agent(USER_AGENT)
                    .timeout(Duration::from_secs(30))
                    .build()?;
                Self::fetch_bls(&client, api_key.as_deref(), years).await.map(Some)
            }
        }
    }

    /// Index value of a year
    #[must_use]
    pub fn get(&self, year: i32) -> Option<f64> {
        self.values.get(&year).copied()
    }

    /// Number of years covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no year is covered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Express `value` from `year` dollars in `base_year` dollars
    pub fn deflate(&self, value: f64, year: i32, base_year: i32) -> Result<f64> {
        let lookup = |y: i32| {
            self.get(y)
                .filter(|cpi| *cpi > 0.0)
                .ok_or_else(|| PipelineError::Lookup(format!("no CPI value for {y}")))
        };
        Ok(value * lookup(base_year)? / lookup(year)?)
    }
}

/// Annual values from a BLS API response body
///
/// The annual average (`M13`) is used when present; otherwise the mean of
/// the monthly values reported for the year.
fn parse_bls_response(body: &str) -> Result<BTreeMap<i32, f64>> {
    let response: BlsResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::Api(format!("unreadable BLS response: {e}")))?;
    if response.status != "REQUEST_SUCCEEDED" {
        return Err(PipelineError::Api(format!(
            "BLS request failed ({}): {}",
            response.status,
            response.message.join("; ")
        )));
    }

    let mut annual: BTreeMap<i32, f64> = BTreeMap::new();
    let mut monthly: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    let series = response.results.map(|r| r.series).unwrap_or_default();
    for observation in series.into_iter().flat_map(|s| s.data) {
        let (Ok(year), Ok(value)) = (observation.year.parse::<i32>(), observation.value.parse::<f64>()) else {
            continue;
        };
        match observation.period.as_str() {
            "M13" => {
                annual.insert(year, value);
            }
            period if period.starts_with('M') => monthly.entry(year).or_default().push(value),
            _ => {}
        }
    }

    for (year, months) in monthly {
        annual
            .entry(year)
            .or_insert_with(|| months.iter().sum::<f64>() / months.len() as f64);
    }
    Ok(annual)
}
