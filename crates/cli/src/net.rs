//! HTTP plumbing shared by the rate fetch and the waybill download.
//!
//! Both endpoints are plain unauthenticated GETs against servers that
//! occasionally flap, so one retry loop serves them all. Callers decide
//! how to consume the response (text for the rate page, bytes for the
//! waybill document).

use std::thread;
use std::time::Duration;

use crate::CliError;

pub(crate) const MAX_RETRIES: u32 = 3;
pub(crate) const USER_AGENT: &str = concat!("prefile/", env!("CARGO_PKG_VERSION"));

/// Build the blocking client used for every outbound request.
pub(crate) fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build HTTP client")
}

/// Make a GET request with retry + exponential backoff.
///
/// 4xx statuses other than 429 fail immediately. 429 and 5xx retry with
/// the `Retry-After` header honored; transport errors retry on the plain
/// backoff. `label` names the endpoint in error and warning lines.
pub(crate) fn get_with_retry(
    http: &reqwest::blocking::Client,
    url: &str,
    label: &str,
) -> Result<reqwest::blocking::Response, CliError> {
    let mut backoff_secs = 1u64;

    for attempt in 0..=MAX_RETRIES {
        let result = http.get(url).send();

        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();

                // Client errors other than 429: fail immediately
                if status >= 400 && status < 500 && status != 429 {
                    return Err(CliError::network(format!(
                        "{} request failed (HTTP {})",
                        label, status,
                    )));
                }

                // Retryable: 429, 5xx
                if status == 429 || status >= 500 {
                    if attempt == MAX_RETRIES {
                        return Err(CliError::network(format!(
                            "{} error (HTTP {}) after {} attempts",
                            label, status, MAX_RETRIES,
                        )));
                    }

                    // Respect Retry-After header for 429
                    let wait = if status == 429 {
                        resp.headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(backoff_secs)
                    } else {
                        backoff_secs
                    };

                    eprintln!(
                        "warning: retry {}/{} in {}s (HTTP {})",
                        attempt + 1,
                        MAX_RETRIES,
                        wait,
                        status,
                    );
                    thread::sleep(Duration::from_secs(wait));
                    backoff_secs *= 2;
                    continue;
                }

                return Ok(resp);
            }
            Err(e) => {
                // Network/timeout errors: retry
                if attempt == MAX_RETRIES {
                    return Err(CliError::network(format!(
                        "{} unreachable after {} attempts: {}",
                        label, MAX_RETRIES, e,
                    )));
                }

                eprintln!(
                    "warning: retry {}/{} in {}s ({})",
                    attempt + 1,
                    MAX_RETRIES,
                    backoff_secs,
                    e,
                );
                thread::sleep(Duration::from_secs(backoff_secs));
                backoff_secs *= 2;
            }
        }
    }

    unreachable!()
}
