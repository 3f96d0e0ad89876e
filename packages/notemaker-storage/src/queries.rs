use sqlx::PgExecutor;

use crate::{Result, db::Db, models::NoteRow};
use notemaker_domain::{Sort, SortDirection, SortField};

// No-op unless the caller id is ahead of the last value handed out.
const ADVANCE_SEQUENCE_SQL: &str = "\
SELECT setval(seq, GREATEST($1, pg_sequence_last_value(seq)))
FROM (SELECT pg_get_serial_sequence('notes', 'id')::regclass AS seq) AS notes_seq
WHERE $1 > COALESCE(pg_sequence_last_value(seq), 0)";

pub async fn insert_note<'e, E>(executor: E, text: Option<&str>) -> Result<NoteRow>
where
	E: PgExecutor<'e>,
{
	let row =
		sqlx::query_as::<_, NoteRow>("INSERT INTO notes (text) VALUES ($1) RETURNING id, text")
			.bind(text)
			.fetch_one(executor)
			.await?;

	Ok(row)
}

/// Writes the row under a caller-chosen id and moves the identity sequence past it, so later
/// generated ids never land on an id that is already taken. The sequence only ever moves forward;
/// ids freed by deletes stay retired.
pub async fn upsert_note(db: &Db, id: i64, text: Option<&str>) -> Result<NoteRow> {
	let mut tx = db.pool.begin().await?;
	let row = sqlx::query_as::<_, NoteRow>(
		"\
INSERT INTO notes (id, text)
VALUES ($1, $2)
ON CONFLICT (id) DO UPDATE
SET text = EXCLUDED.text
RETURNING id, text",
	)
	.bind(id)
	.bind(text)
	.fetch_one(&mut *tx)
	.await?;

	sqlx::query(ADVANCE_SEQUENCE_SQL).bind(id).execute(&mut *tx).await?;

	tx.commit().await?;

	Ok(row)
}

pub async fn find_note<'e, E>(executor: E, id: i64) -> Result<Option<NoteRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, NoteRow>("SELECT id, text FROM notes WHERE id = $1")
		.bind(id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn list_notes<'e, E>(
	executor: E,
	sort: Sort,
	offset: i64,
	limit: i64,
) -> Result<Vec<NoteRow>>
where
	E: PgExecutor<'e>,
{
	let sql =
		format!("SELECT id, text FROM notes ORDER BY {} LIMIT $1 OFFSET $2", order_by(sort));
	let rows =
		sqlx::query_as::<_, NoteRow>(&sql).bind(limit).bind(offset).fetch_all(executor).await?;

	Ok(rows)
}

pub async fn count_notes<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count =
		sqlx::query_scalar::<_, i64>("SELECT count(*) FROM notes").fetch_one(executor).await?;

	Ok(count)
}

/// Returns whether a row was removed.
pub async fn delete_note<'e, E>(executor: E, id: i64) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM notes WHERE id = $1").bind(id).execute(executor).await?;

	Ok(result.rows_affected() > 0)
}

// Only whitelisted column names reach the SQL text.
fn order_by(sort: Sort) -> String {
	let (direction, nulls) = match sort.direction {
		SortDirection::Asc => ("ASC", "NULLS FIRST"),
		SortDirection::Desc => ("DESC", "NULLS LAST"),
	};

	match sort.field {
		SortField::Id => format!("id {direction}"),
		SortField::Text => format!("text {direction} {nulls}, id {direction}"),
	}
}
