use url::Url;

/// Schemes whose entries are browser plumbing rather than pages a user would
/// want back: internal pages, extension pages, local files, data URIs.
const EXCLUDED_SCHEMES: &[&str] =
	&["chrome:", "chrome-extension:", "about:", "file:", "data:"];

const MIN_URL_LEN: usize = 10;

/// Whether a history URL is worth keeping as a candidate.
pub fn is_useful_url(url: &str) -> bool {
	if url.len() < MIN_URL_LEN {
		return false;
	}

	!EXCLUDED_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// Host portion of a URL, for presenting candidates to the ranker. Falls
/// back to the raw string when the URL does not parse.
pub fn host_of(url: &str) -> String {
	Url::parse(url)
		.ok()
		.and_then(|parsed| parsed.host_str().map(str::to_string))
		.unwrap_or_else(|| url.to_string())
}
