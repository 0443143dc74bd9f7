use std::error::Error;

use crate::log;

/// Fetch a URL and return the response body as text. One blocking GET,
/// fully buffered; any transport or status error is fatal to the run.
pub fn get(url: &str) -> Result<String, Box<dyn Error>> {
    log::info(format!("fetching {url}"));

    let body = ureq::get(url).call()?.into_string()?;
    Ok(body)
}
