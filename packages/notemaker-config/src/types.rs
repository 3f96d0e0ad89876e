use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub pagination: Pagination,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pagination {
	pub default_page_size: u32,
	pub max_page_size: u32,
}
impl Default for Pagination {
	fn default() -> Self {
		Self { default_page_size: 20, max_page_size: 100 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Search {
	pub empty_query: EmptyQuery,
}

/// What the search endpoint does with a blank query string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyQuery {
	#[default]
	MatchAll,
	Reject,
}

fn default_log_level() -> String {
	"info".to_string()
}
