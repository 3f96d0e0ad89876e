const INIT: &str = include_str!("../../../sql/init.sql");
const TABLES: [(&str, &str); 1] =
	[("tables/001_notes.sql", include_str!("../../../sql/tables/001_notes.sql"))];

/// The bootstrap script with every `\ir` include inlined.
pub fn render_schema() -> String {
	let mut out = String::new();

	for line in INIT.lines() {
		let included = line
			.trim()
			.strip_prefix("\\ir ")
			.and_then(|path| TABLES.iter().find(|(name, _)| *name == path.trim()))
			.map(|(_, sql)| *sql);

		out.push_str(included.unwrap_or(line));
		out.push('\n');
	}

	out
}

pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}
