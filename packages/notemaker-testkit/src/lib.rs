mod error;

pub use error::{Error, Result};

use std::{env, future::Future, str::FromStr, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

pub const PG_DSN_ENV: &str = "NOTEMAKER_PG_DSN";
pub const QDRANT_URL_ENV: &str = "NOTEMAKER_QDRANT_URL";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];
const NAME_PREFIX: &str = "notemaker_test";

/// A uniquely named Postgres database that is dropped on cleanup or drop.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse {PG_DSN_ENV}: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = unique_name();

		admin_conn
			.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn postgres_config(&self, pool_max_conns: u32) -> notemaker_config::Postgres {
		notemaker_config::Postgres { dsn: self.dsn.clone(), pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		drop_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();

		run_detached(async move { drop_database(&name, &admin_options).await });
	}
}

/// A uniquely named Qdrant collection that is deleted on cleanup or drop. The collection itself
/// is created by the code under test.
pub struct TestCollection {
	name: String,
	url: String,
	cleaned: bool,
}
impl TestCollection {
	pub fn new(url: &str) -> Self {
		Self { name: unique_name(), url: url.to_string(), cleaned: false }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn qdrant_config(&self) -> notemaker_config::Qdrant {
		notemaker_config::Qdrant { url: self.url.clone(), collection: self.name.clone() }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		delete_collection(&self.url, &self.name).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestCollection {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let url = self.url.clone();
		let name = self.name.clone();

		run_detached(async move { delete_collection(&url, &name).await });
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(PG_DSN_ENV).ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var(QDRANT_URL_ENV).ok()
}

/// Runs `f` against a fresh database and drops the database afterwards. A panic inside `f` still
/// drops it through [`TestDatabase`]'s `Drop`.
pub async fn with_test_db<F, Fut, T>(base_dsn: &str, pool_max_conns: u32, f: F) -> Result<T>
where
	F: FnOnce(notemaker_config::Postgres) -> Fut,
	Fut: Future<Output = T>,
{
	let mut db = TestDatabase::new(base_dsn).await?;
	let output = f(db.postgres_config(pool_max_conns)).await;

	db.cleanup_inner().await?;

	Ok(output)
}

fn unique_name() -> String {
	format!("{NAME_PREFIX}_{}", Uuid::new_v4().simple())
}

// Drop may run inside a runtime, so cleanup gets its own thread and runtime.
fn run_detached<F>(cleanup: F)
where
	F: Future<Output = Result<()>> + Send + 'static,
{
	let handle = thread::spawn(move || match Builder::new_current_thread().enable_all().build() {
		Ok(runtime) =>
			if let Err(err) = runtime.block_on(cleanup) {
				eprintln!("Test resource cleanup failed: {err}.");
			},
		Err(err) => eprintln!("Test resource cleanup failed: {err}."),
	});
	let _ = handle.join();
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn drop_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}

async fn delete_collection(url: &str, name: &str) -> Result<()> {
	let client = Qdrant::from_url(url).build()?;
	let max_attempts = 4;
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=max_attempts {
		match time::timeout(Duration::from_secs(10), client.delete_collection(name.to_string()))
			.await
		{
			Ok(Ok(_)) => return Ok(()),
			Ok(Err(err)) if attempt == max_attempts => return Err(err.into()),
			Err(_) if attempt == max_attempts =>
				return Err(Error::Message(format!(
					"Timed out deleting Qdrant collection {name:?} after {attempt} attempts."
				))),
			_ => {},
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn names_are_unique_and_prefixed() {
		let first = unique_name();
		let second = unique_name();

		assert!(first.starts_with("notemaker_test_"));
		assert_ne!(first, second);
	}

	#[test]
	fn collection_config_points_at_its_own_name() {
		let mut collection = TestCollection::new("http://127.0.0.1:6334");
		let cfg = collection.qdrant_config();

		assert_eq!(cfg.collection, collection.name());
		assert_eq!(cfg.url, "http://127.0.0.1:6334");

		collection.cleaned = true;
	}
}
