//! Form validation for note drafts.
//!
//! Drafts are checked here before anything is sent to the service. A rejected
//! draft produces field-scoped [`FieldError`]s meant to be shown next to the
//! offending input, never as a global notification.

use crate::api::{CreateNoteInput, UpdateNoteInput};
use derive_more::Display;

/// The form fields of a note.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    #[display("title")]
    Title,
    #[display("content")]
    Content,
}

/// A rule violated by a single field.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Content is required")]
    ContentRequired,
}

impl FieldError {
    /// The field this error belongs to.
    pub fn field(&self) -> Field {
        match self {
            FieldError::TitleRequired => Field::Title,
            FieldError::ContentRequired => Field::Content,
        }
    }
}

/// Every field error of a rejected draft, in form order.
#[derive(thiserror::Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn join_messages(errors: &[FieldError]) -> String {
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    messages.join(", ")
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the error to display next to `field`, if any.
    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field() == field)
    }

    fn check(&mut self, ok: bool, error: FieldError) {
        if !ok {
            self.0.push(error);
        }
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// A payload that can be checked before it is submitted.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for CreateNoteInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(!self.title.is_empty(), FieldError::TitleRequired);
        errors.check(!self.content.is_empty(), FieldError::ContentRequired);
        errors.into_result()
    }
}

/// Fields left out of an update are untouched; fields that are present must not be empty.
impl Validate for UpdateNoteInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(
            self.title.as_ref().map_or(true, |t| !t.is_empty()),
            FieldError::TitleRequired,
        );
        errors.check(
            self.content.as_ref().map_or(true, |c| !c.is_empty()),
            FieldError::ContentRequired,
        );
        errors.into_result()
    }
}

/// The state of a create/update form while the user edits it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub is_published: bool,
}

impl NoteDraft {
    /// Turns the draft into a create payload, or the errors to show inline.
    pub fn to_create(&self) -> Result<CreateNoteInput, ValidationErrors> {
        let input = CreateNoteInput {
            title: self.title.clone(),
            content: self.content.clone(),
            is_published: Some(self.is_published),
        };
        input.validate()?;
        Ok(input)
    }

    /// Turns the draft into an update payload carrying every form field.
    pub fn to_update(&self) -> Result<UpdateNoteInput, ValidationErrors> {
        let input = UpdateNoteInput {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            is_published: Some(self.is_published),
        };
        input.validate()?;
        Ok(input)
    }
}

impl From<&crate::api::Note> for NoteDraft {
    fn from(note: &crate::api::Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            is_published: note.is_published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_title_and_content() {
        let errors = CreateNoteInput::new("", "").validate().unwrap_err();
        assert_eq!(
            errors.errors(),
            &[FieldError::TitleRequired, FieldError::ContentRequired]
        );
        assert_eq!(errors.to_string(), "Title is required, Content is required");
        assert_eq!(
            errors.for_field(Field::Content),
            Some(&FieldError::ContentRequired)
        );
    }

    #[test]
    fn test_create_accepts_complete_input() {
        assert!(CreateNoteInput::new("Title", "Body").validate().is_ok());
    }

    #[test]
    fn test_update_allows_absent_fields() {
        assert!(UpdateNoteInput::default().published(true).validate().is_ok());
        let errors = UpdateNoteInput::default().title("").validate().unwrap_err();
        assert_eq!(errors.errors(), &[FieldError::TitleRequired]);
        assert_eq!(errors.for_field(Field::Content), None);
    }

    #[test]
    fn test_draft_defaults_to_unpublished() {
        let draft = NoteDraft {
            title: "Title".into(),
            content: "Body".into(),
            ..Default::default()
        };
        let input = draft.to_create().unwrap();
        assert_eq!(input.is_published, Some(false));
        assert_eq!(draft.to_update().unwrap().title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_draft_with_empty_content_is_rejected() {
        let draft = NoteDraft {
            title: "Title".into(),
            ..Default::default()
        };
        let errors = draft.to_create().unwrap_err();
        assert_eq!(errors.errors(), &[FieldError::ContentRequired]);
        assert_eq!(Field::Content.to_string(), "content");
    }
}
