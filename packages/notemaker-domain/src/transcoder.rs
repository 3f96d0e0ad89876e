use crate::note::{Note, NoteDto, NoteId};

pub fn to_dto(note: Note) -> NoteDto {
	NoteDto { id: note.id, text: note.text }
}

pub fn to_entity(dto: NoteDto) -> Note {
	Note { id: dto.id, text: dto.text }
}

pub fn to_dtos(notes: Vec<Note>) -> Vec<NoteDto> {
	notes.into_iter().map(to_dto).collect()
}

pub fn to_entities(dtos: Vec<NoteDto>) -> Vec<Note> {
	dtos.into_iter().map(to_entity).collect()
}

/// Reference-only stub for callers that hold an id but not the record.
pub fn from_id(id: Option<NoteId>) -> Option<Note> {
	id.map(|id| Note { id: Some(id), text: None })
}

impl From<Note> for NoteDto {
	fn from(note: Note) -> Self {
		to_dto(note)
	}
}

impl From<NoteDto> for Note {
	fn from(dto: NoteDto) -> Self {
		to_entity(dto)
	}
}
