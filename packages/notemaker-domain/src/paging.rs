use std::{fmt, str::FromStr};

use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
	#[error("Page size must be greater than zero.")]
	ZeroSize,
	#[error("Page offset overflows the store range.")]
	OffsetOverflow,
	#[error("Unknown sort field {0:?}; expected id or text.")]
	UnknownSortField(String),
	#[error("Unknown sort direction {0:?}; expected asc or desc.")]
	UnknownSortDirection(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
	pub default_size: u32,
	pub max_size: u32,
}
impl Default for PageLimits {
	fn default() -> Self {
		Self { default_size: 20, max_size: 100 }
	}
}

/// Zero-based page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
	pub page: u32,
	pub size: u32,
}
impl PageRequest {
	pub fn new(page: u32, size: u32) -> Result<Self, PageError> {
		if size == 0 {
			return Err(PageError::ZeroSize);
		}

		Ok(Self { page, size })
	}

	/// Fills in absent values from `limits` and caps `size` at `limits.max_size`.
	pub fn resolve(
		page: Option<u32>,
		size: Option<u32>,
		limits: PageLimits,
	) -> Result<Self, PageError> {
		let size = size.unwrap_or(limits.default_size).min(limits.max_size);

		Self::new(page.unwrap_or(0), size)
	}

	pub fn offset(&self) -> u64 {
		u64::from(self.page) * u64::from(self.size)
	}

	/// Offset and limit in the signed form SQL expects.
	pub fn sql_window(&self) -> Result<(i64, i64), PageError> {
		let offset = i64::try_from(self.offset()).map_err(|_| PageError::OffsetOverflow)?;

		Ok((offset, i64::from(self.size)))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
	#[default]
	Id,
	Text,
}
impl SortField {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Id => "id",
			Self::Text => "text",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
	#[default]
	Asc,
	Desc,
}
impl SortDirection {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

/// `field[,direction]`, e.g. `id,desc`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort {
	pub field: SortField,
	pub direction: SortDirection,
}
impl Sort {
	pub fn new(field: SortField, direction: SortDirection) -> Self {
		Self { field, direction }
	}
}
impl FromStr for Sort {
	type Err = PageError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let (field, direction) = match raw.split_once(',') {
			Some((field, direction)) => (field.trim(), Some(direction.trim())),
			None => (raw.trim(), None),
		};
		let field = match field.to_ascii_lowercase().as_str() {
			"id" => SortField::Id,
			"text" => SortField::Text,
			_ => return Err(PageError::UnknownSortField(field.to_string())),
		};
		let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
			None | Some("") | Some("asc") => SortDirection::Asc,
			Some("desc") => SortDirection::Desc,
			Some(other) => return Err(PageError::UnknownSortDirection(other.to_string())),
		};

		Ok(Self { field, direction })
	}
}
impl fmt::Display for Sort {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{},{}", self.field.as_str(), self.direction.as_str())
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub total: u64,
	pub page: u32,
	pub size: u32,
}
impl<T> Page<T> {
	pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
		Self { items, total, page: request.page, size: request.size }
	}

	pub fn empty(request: PageRequest) -> Self {
		Self::new(Vec::new(), 0, request)
	}

	pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
		Page {
			items: self.items.into_iter().map(f).collect(),
			total: self.total,
			page: self.page,
			size: self.size,
		}
	}

	pub fn total_pages(&self) -> u64 {
		if self.size == 0 {
			return 0;
		}

		self.total.div_ceil(u64::from(self.size))
	}

	pub fn has_next(&self) -> bool {
		u64::from(self.page) + 1 < self.total_pages()
	}

	pub fn has_prev(&self) -> bool {
		self.page > 0
	}
}
