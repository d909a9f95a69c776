//! Waybill document download.

use std::fs;
use std::path::{Path, PathBuf};

use crate::net;
use crate::CliError;

/// Download the waybill document to `{awb}.pdf` under `dir`.
///
/// The document is attached to the pre-alert, so this runs before the
/// mail step. Returns the written path.
pub(crate) fn download_document(
    http: &reqwest::blocking::Client,
    url: &str,
    dir: &Path,
    awb: &str,
) -> Result<PathBuf, CliError> {
    let resp = net::get_with_retry(http, url, "waybill document")?;
    let bytes = resp
        .bytes()
        .map_err(|e| CliError::network(format!("failed to read waybill document: {}", e)))?;

    let path = dir.join(format!("{awb}.pdf"));
    fs::write(&path, &bytes)
        .map_err(|e| CliError::data(format!("cannot write {}: {}", path.display(), e)))?;
    Ok(path)
}
