//! Query-string syntax accepted by note search.
//!
//! Terms are separated by whitespace and combined with OR unless prefixed: `+term` is required and
//! `-term` is excluded. A term is `id:<n>`, `text:<value>`, a bare value (matched against `text`),
//! a `"quoted phrase"`, or `*` / `*:*` for everything. Text values match a note when every word of
//! the value occurs in the note's text, ignoring case and punctuation.

use crate::note::{Note, NoteId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
	#[error("Search query is empty.")]
	Empty,
	#[error("Unknown search field {0:?}; expected id or text.")]
	UnknownField(String),
	#[error("Search id {0:?} is not an integer.")]
	InvalidId(String),
	#[error("Search term {0:?} has no searchable value.")]
	MissingValue(String),
	#[error("Search query has an unterminated quoted phrase.")]
	UnterminatedPhrase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occur {
	Should,
	Must,
	MustNot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
	All,
	Id(NoteId),
	Text(String),
}
impl Term {
	pub fn matches(&self, note: &Note) -> bool {
		match self {
			Self::All => true,
			Self::Id(id) => note.id == Some(*id),
			Self::Text(value) => {
				let Some(text) = note.text.as_deref() else {
					return false;
				};
				let haystack = words(text).collect::<Vec<_>>();

				words(value).all(|word| haystack.contains(&word))
			},
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
	pub occur: Occur,
	pub term: Term,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteQuery {
	clauses: Vec<Clause>,
}
impl NoteQuery {
	pub fn parse(input: &str) -> Result<Self, QueryError> {
		let mut clauses = Vec::new();
		let mut chars = input.char_indices().peekable();

		while let Some(&(start, ch)) = chars.peek() {
			if ch.is_whitespace() {
				chars.next();

				continue;
			}

			let mut in_quote = false;
			let mut end = input.len();

			for (idx, ch) in chars.by_ref() {
				if ch == '"' {
					in_quote = !in_quote;
				} else if ch.is_whitespace() && !in_quote {
					end = idx;

					break;
				}
			}

			if in_quote {
				return Err(QueryError::UnterminatedPhrase);
			}

			clauses.push(parse_clause(&input[start..end])?);
		}

		if clauses.is_empty() {
			return Err(QueryError::Empty);
		}

		Ok(Self { clauses })
	}

	pub fn match_all() -> Self {
		Self { clauses: vec![Clause { occur: Occur::Should, term: Term::All }] }
	}

	pub fn clauses(&self) -> &[Clause] {
		&self.clauses
	}

	pub fn plan(&self) -> QueryPlan {
		let mut plan = QueryPlan::default();
		let mut optional_satisfied = false;

		for clause in &self.clauses {
			match (clause.occur, &clause.term) {
				(Occur::Must, Term::All) => {},
				(Occur::Should, Term::All) => optional_satisfied = true,
				(Occur::MustNot, Term::All) => plan.matches_nothing = true,
				(Occur::Must, term) => plan.required.push(term.clone()),
				(Occur::Should, term) => plan.optional.push(term.clone()),
				(Occur::MustNot, term) => plan.excluded.push(term.clone()),
			}
		}

		// Optional terms only narrow the result when nothing is required.
		if optional_satisfied || !plan.required.is_empty() {
			plan.optional.clear();
		}

		plan
	}

	/// Words to rank matches by. Only present when every match is bound to contain at least one
	/// of them, so ranking on them never drops a match.
	pub fn ranking_text(&self) -> Option<String> {
		let plan = self.plan();
		let is_text = |term: &Term| matches!(term, Term::Text(_));
		let bound = plan.required.iter().any(is_text)
			|| (!plan.optional.is_empty() && plan.optional.iter().all(is_text));

		if plan.matches_nothing || !bound {
			return None;
		}

		let text = plan
			.required
			.iter()
			.chain(&plan.optional)
			.filter_map(|term| match term {
				Term::Text(value) => Some(value.as_str()),
				_ => None,
			})
			.collect::<Vec<_>>()
			.join(" ");

		Some(text)
	}

	pub fn matches(&self, note: &Note) -> bool {
		self.plan().matches(note)
	}
}

/// A query reduced to filter form: every `required` term, at least one `optional` term when any
/// are listed, and no `excluded` term.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPlan {
	pub required: Vec<Term>,
	pub optional: Vec<Term>,
	pub excluded: Vec<Term>,
	pub matches_nothing: bool,
}
impl QueryPlan {
	pub fn matches(&self, note: &Note) -> bool {
		if self.matches_nothing {
			return false;
		}

		self.required.iter().all(|term| term.matches(note))
			&& !self.excluded.iter().any(|term| term.matches(note))
			&& (self.optional.is_empty() || self.optional.iter().any(|term| term.matches(note)))
	}
}

fn parse_clause(raw: &str) -> Result<Clause, QueryError> {
	let (occur, body) = if let Some(body) = raw.strip_prefix('+') {
		(Occur::Must, body)
	} else if let Some(body) = raw.strip_prefix('-') {
		(Occur::MustNot, body)
	} else {
		(Occur::Should, raw)
	};

	Ok(Clause { occur, term: parse_term(raw, body)? })
}

fn parse_term(raw: &str, body: &str) -> Result<Term, QueryError> {
	if body == "*" || body == "*:*" {
		return Ok(Term::All);
	}

	let value = match body.split_once(':') {
		Some((field, value)) if !body.starts_with('"') => match field {
			"id" => {
				let value = unquote(value);

				return value
					.trim()
					.parse::<NoteId>()
					.map(Term::Id)
					.map_err(|_| QueryError::InvalidId(value));
			},
			"text" => unquote(value),
			_ => return Err(QueryError::UnknownField(field.to_string())),
		},
		_ => unquote(body),
	};

	if words(&value).next().is_none() {
		return Err(QueryError::MissingValue(raw.to_string()));
	}

	Ok(Term::Text(value))
}

fn unquote(value: &str) -> String {
	value.replace('"', "")
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn clause(occur: Occur, term: Term) -> Clause {
		Clause { occur, term }
	}

	fn text(value: &str) -> Term {
		Term::Text(value.to_string())
	}

	#[test]
	fn parses_fields_prefixes_and_phrases() {
		let query = NoteQuery::parse(r#"id:7 +text:rust -"old draft" note"#)
			.expect("Expected query to parse.");

		assert_eq!(
			query.clauses(),
			&[
				clause(Occur::Should, Term::Id(7)),
				clause(Occur::Must, text("rust")),
				clause(Occur::MustNot, text("old draft")),
				clause(Occur::Should, text("note")),
			]
		);
	}

	#[test]
	fn field_values_may_be_quoted() {
		let query = NoteQuery::parse(r#"text:"hello world" id:"12""#).expect("Expected query to parse.");

		assert_eq!(
			query.clauses(),
			&[clause(Occur::Should, text("hello world")), clause(Occur::Should, Term::Id(12))]
		);
	}

	#[test]
	fn wildcards_match_everything() {
		for input in ["*", "*:*", "  *:*  "] {
			let query = NoteQuery::parse(input).expect("Expected wildcard to parse.");

			assert_eq!(query, NoteQuery::match_all());
			assert!(query.matches(&Note::default()));
		}
	}

	#[test]
	fn rejects_malformed_input() {
		assert_eq!(NoteQuery::parse("   "), Err(QueryError::Empty));
		assert_eq!(NoteQuery::parse("title:x"), Err(QueryError::UnknownField("title".to_string())));
		assert_eq!(NoteQuery::parse("id:abc"), Err(QueryError::InvalidId("abc".to_string())));
		assert_eq!(NoteQuery::parse("\"open phrase"), Err(QueryError::UnterminatedPhrase));
		assert_eq!(NoteQuery::parse("+"), Err(QueryError::MissingValue("+".to_string())));
		assert_eq!(NoteQuery::parse("text:!!"), Err(QueryError::MissingValue("text:!!".to_string())));
	}

	#[test]
	fn id_query_matches_only_that_note() {
		let query = NoteQuery::parse("id:5").expect("Expected query to parse.");

		assert!(query.matches(&Note::with_text("anything").with_id(5)));
		assert!(!query.matches(&Note::with_text("anything").with_id(6)));
		assert!(!query.matches(&Note::with_text("anything")));
	}

	#[test]
	fn text_matching_ignores_case_and_punctuation() {
		let note = Note::with_text("Rust, notes & Tests!").with_id(1);

		assert!(NoteQuery::parse("rust").expect("Expected parse.").matches(&note));
		assert!(NoteQuery::parse("\"tests notes\"").expect("Expected parse.").matches(&note));
		assert!(!NoteQuery::parse("rusty").expect("Expected parse.").matches(&note));
		assert!(!NoteQuery::parse("rust").expect("Expected parse.").matches(&Note::default()));
	}

	#[test]
	fn default_operator_is_or() {
		let query = NoteQuery::parse("alpha beta").expect("Expected query to parse.");

		assert!(query.matches(&Note::with_text("alpha")));
		assert!(query.matches(&Note::with_text("beta")));
		assert!(!query.matches(&Note::with_text("gamma")));
	}

	#[test]
	fn required_terms_make_optional_terms_irrelevant() {
		let query = NoteQuery::parse("+alpha beta").expect("Expected query to parse.");
		let plan = query.plan();

		assert_eq!(plan.required, vec![text("alpha")]);
		assert!(plan.optional.is_empty());
		assert!(query.matches(&Note::with_text("alpha only")));
	}

	#[test]
	fn exclusions_apply_on_their_own() {
		let query = NoteQuery::parse("-draft").expect("Expected query to parse.");

		assert!(query.matches(&Note::with_text("final")));
		assert!(!query.matches(&Note::with_text("draft")));

		let nothing = NoteQuery::parse("alpha -*").expect("Expected query to parse.");

		assert!(nothing.plan().matches_nothing);
		assert!(!nothing.matches(&Note::with_text("alpha")));
	}

	#[test]
	fn ranking_text_only_uses_words_every_match_contains() {
		let required = NoteQuery::parse("id:3 alpha +\"beta gamma\" -delta")
			.expect("Expected query to parse.");

		assert_eq!(required.ranking_text().as_deref(), Some("beta gamma"));

		let optional = NoteQuery::parse("alpha beta -delta").expect("Expected query to parse.");

		assert_eq!(optional.ranking_text().as_deref(), Some("alpha beta"));

		for input in ["id:3", "id:3 alpha", "*", "-alpha"] {
			let query = NoteQuery::parse(input).expect("Expected query to parse.");

			assert_eq!(query.ranking_text(), None, "Unexpected ranking text for {input:?}.");
		}
	}
}
