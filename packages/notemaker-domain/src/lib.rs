pub mod note;
pub mod paging;
pub mod query;
pub mod transcoder;

pub use note::{Note, NoteDto, NoteId};
pub use paging::{Page, PageError, PageLimits, PageRequest, Sort, SortDirection, SortField};
pub use query::{NoteQuery, QueryError, QueryPlan, Term};
