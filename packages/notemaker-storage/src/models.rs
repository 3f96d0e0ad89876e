use notemaker_domain::Note;

#[derive(Debug, sqlx::FromRow)]
pub struct NoteRow {
	pub id: i64,
	pub text: Option<String>,
}
impl From<NoteRow> for Note {
	fn from(row: NoteRow) -> Self {
		Note::new(Some(row.id), row.text)
	}
}
