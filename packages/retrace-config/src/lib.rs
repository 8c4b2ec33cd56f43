mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Extractor, Indexing, Oracle, Search, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.oracle.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "oracle.max_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.oracle.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "oracle.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.oracle.max_attempts == 0 {
		return Err(Error::Validation {
			message: "oracle.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_limit == 0 {
		return Err(Error::Validation {
			message: "search.candidate_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.batch_size == 0 {
		return Err(Error::Validation {
			message: "search.batch_size must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.confidence_floor.is_finite() {
		return Err(Error::Validation {
			message: "search.confidence_floor must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.confidence_floor) {
		return Err(Error::Validation {
			message: "search.confidence_floor must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.search.broad_terms == 0 {
		return Err(Error::Validation {
			message: "search.broad_terms must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.scan_window_hours == 0 {
		return Err(Error::Validation {
			message: "indexing.scan_window_hours must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.scan_interval_minutes == 0 {
		return Err(Error::Validation {
			message: "indexing.scan_interval_minutes must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.batch_size == 0 {
		return Err(Error::Validation {
			message: "indexing.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.max_concurrent_pages == 0 {
		return Err(Error::Validation {
			message: "indexing.max_concurrent_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.extractor.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "extractor.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.extractor.user_agent.trim().is_empty() {
		return Err(Error::Validation {
			message: "extractor.user_agent must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.extractor.user_agent = cfg.extractor.user_agent.trim().to_string();
}
