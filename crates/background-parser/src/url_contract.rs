//! URL validation: absolute, with a cleaned path (no redundant `.` or `..`
//! segments). Relative or empty URLs are rejected at entry.

use crate::error::InvalidRequest;

/// Validates `raw` against the URL contract, returning the parsed,
/// normalized form.
pub fn validate(raw: &str) -> Result<url::Url, InvalidRequest> {
	if raw.is_empty() {
		return Err(InvalidRequest::NotAbsolute(raw.to_string()));
	}
	let parsed = url::Url::parse(raw).map_err(|_| InvalidRequest::NotAbsolute(raw.to_string()))?;
	if parsed.cannot_be_a_base() {
		return Err(InvalidRequest::NotAbsolute(raw.to_string()));
	}
	if has_redundant_segments(parsed.path()) {
		return Err(InvalidRequest::NotNormalized(raw.to_string()));
	}
	Ok(parsed)
}

fn has_redundant_segments(path: &str) -> bool {
	path.split('/').any(|segment| segment == "." || segment == "..")
}
