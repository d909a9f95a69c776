//! Exchange-rate fetch for the Belgrade value cap.
//!
//! The National Bank of Serbia publishes an indicative-rate page whose
//! EUR cells carry the `kurs_e` class; the first cell is the mid rate.
//! The Belgrade shrink cap is `caps.unit_price` EUR converted at this
//! rate, fetched once per run and reused for every Belgrade waybill.

use regex::Regex;

use crate::net;
use crate::CliError;

pub(crate) struct RateClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl RateClient {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            http: net::client(),
            url: url.to_string(),
        }
    }

    /// Fetch the rate page and extract the EUR rate.
    pub(crate) fn fetch(&self) -> Result<f64, CliError> {
        let resp = net::get_with_retry(&self.http, &self.url, "rate page")?;
        let html = resp
            .text()
            .map_err(|e| CliError::network(format!("failed to read rate page: {}", e)))?;
        parse_rate(&html)
    }
}

/// Pull the first `kurs_e` cell out of the page HTML.
fn parse_rate(html: &str) -> Result<f64, CliError> {
    let re = Regex::new(r#"<th class="kurs_e">([\d.]+)</th>"#).unwrap();
    let caps = re.captures(html).ok_or_else(|| {
        CliError::network("no exchange-rate cell found in the page")
            .with_hint("the page layout may have changed; check rate_url in settings")
    })?;
    caps[1]
        .parse::<f64>()
        .map_err(|e| CliError::network(format!("bad rate value {:?}: {}", &caps[1], e)))
}
