mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, EmptyQuery, Pagination, Postgres, Qdrant, Search, Service, Storage};

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
	for (field, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.qdrant.url", &cfg.storage.qdrant.url),
		("storage.qdrant.collection", &cfg.storage.qdrant.collection),
	] {
		if value.is_empty() {
			return Err(Error::invalid(field, "must be non-empty."));
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}
	if cfg.pagination.default_page_size == 0 {
		return Err(Error::invalid("pagination.default_page_size", "must be greater than zero."));
	}
	if cfg.pagination.default_page_size > cfg.pagination.max_page_size {
		return Err(Error::invalid(
			"pagination.default_page_size",
			format!("must not exceed pagination.max_page_size ({}).", cfg.pagination.max_page_size),
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for value in [
		&mut cfg.service.http_bind,
		&mut cfg.service.admin_bind,
		&mut cfg.service.log_level,
		&mut cfg.storage.postgres.dsn,
		&mut cfg.storage.qdrant.url,
		&mut cfg.storage.qdrant.collection,
	] {
		let trimmed = value.trim();

		if trimmed.len() != value.len() {
			*value = trimmed.to_string();
		}
	}

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
