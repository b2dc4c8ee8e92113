use crate::model::post::CreatePost;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Title,
    Content,
    Author,
}

impl DraftField {
    pub const ALL: [DraftField; 3] = [DraftField::Title, DraftField::Content, DraftField::Author];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Content => "content",
            DraftField::Author => "author",
        }
    }
}

impl Display for DraftField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unsaved form values for a new post.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub author: String,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("Please fill in all fields")]
pub struct DraftValidationError {
    missing: Vec<DraftField>,
}

impl DraftValidationError {
    #[must_use]
    pub fn missing(&self) -> &[DraftField] {
        &self.missing
    }
}

impl Draft {
    #[must_use]
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::Content => &self.content,
            DraftField::Author => &self.author,
        }
    }

    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Title => self.title = value,
            DraftField::Content => self.content = value,
            DraftField::Author => self.author = value,
        }
    }

    /// Fields that are empty once surrounding whitespace is ignored.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(|&field| self.get(field).trim().is_empty())
            .collect()
    }

    /// Turns the draft into a create request body.
    ///
    /// Values are sent as entered; trimming is only used for the presence check.
    pub fn validate(&self) -> Result<CreatePost, DraftValidationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(DraftValidationError { missing });
        }

        Ok(CreatePost {
            title: self.title.clone(),
            content: self.content.clone(),
            author: self.author.clone(),
        })
    }
}
