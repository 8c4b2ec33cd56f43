// std
use std::time::Duration as StdDuration;

// crates.io
use regex::Regex;
use reqwest::Client;

use crate::BoxFuture;

/// Readable content pulled out of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
	pub title: String,
	pub text: String,
	/// Declared document language, when the page carries one.
	pub lang: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
	#[error("Failed to build the HTTP client.")]
	Client(#[source] reqwest::Error),
	#[error("Failed to fetch {url}.")]
	Fetch { url: String, source: reqwest::Error },
	#[error("Fetched {url} but could not read the response body.")]
	Body { url: String, source: reqwest::Error },
	#[error("Extraction failed: {message}")]
	Failed { message: String },
}

pub trait ContentExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Extracted, ExtractError>>;
}

/// Fetches pages over HTTP and reduces the markup to plain text.
pub struct HttpExtractor {
	client: Client,
}

impl HttpExtractor {
	pub fn new(cfg: &retrace_config::Extractor) -> Result<Self, ExtractError> {
		let client = Client::builder()
			.timeout(StdDuration::from_millis(cfg.timeout_ms))
			.user_agent(cfg.user_agent.clone())
			.build()
			.map_err(ExtractError::Client)?;

		Ok(Self { client })
	}
}

impl ContentExtractor for HttpExtractor {
	fn extract<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Extracted, ExtractError>> {
		Box::pin(async move {
			let response = self
				.client
				.get(url)
				.send()
				.await
				.and_then(|res| res.error_for_status())
				.map_err(|err| ExtractError::Fetch { url: url.to_string(), source: err })?;
			let html = response
				.text()
				.await
				.map_err(|err| ExtractError::Body { url: url.to_string(), source: err })?;

			Ok(parse_page(&html))
		})
	}
}

fn parse_page(html: &str) -> Extracted {
	let title = Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
		.ok()
		.and_then(|re| re.captures(html).map(|cap| collapse_whitespace(&cap[1])))
		.unwrap_or_default();
	let lang = Regex::new(r#"(?is)<html[^>]*\blang\s*=\s*["']?([a-zA-Z-]+)"#)
		.ok()
		.and_then(|re| re.captures(html).map(|cap| cap[1].to_lowercase()));
	let without_blocks = match Regex::new(
		r"(?is)<head[^>]*>.*?</head>|<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<noscript[^>]*>.*?</noscript>|<!--.*?-->",
	) {
		Ok(re) => re.replace_all(html, " ").into_owned(),
		Err(_) => html.to_string(),
	};
	let without_tags = match Regex::new(r"(?s)<[^>]*>") {
		Ok(re) => re.replace_all(&without_blocks, " ").into_owned(),
		Err(_) => without_blocks,
	};
	let text = collapse_whitespace(&decode_entities(&without_tags));

	Extracted { title, text, lang }
}

fn decode_entities(text: &str) -> String {
	text.replace("&nbsp;", " ")
		.replace("&amp;", "&")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}
