use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::{Serialize, de::DeserializeOwned};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{CreateEvaluationRequest, CreateVacancyRequest, UpdateProfileRequest},
};

pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 10;
pub const MAX_LIST_ENTRIES: usize = 20;
pub const MAX_LIST_ENTRY_CHARS: usize = 40;
pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// FieldError
///
/// One rule violation, reported back to the client under `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request payloads that carry rules beyond their JSON shape.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// ValidatedJson
///
/// `Json<T>` followed by `T::validate`. Shape errors (wrong types, missing
/// fields, non-string list entries) and rule violations both answer 400.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate().map_err(AppError::Validation)?;
        Ok(Self(value))
    }
}

fn check_rating(errors: &mut Vec<FieldError>, field: &str, value: i32) {
    if !(RATING_MIN..=RATING_MAX).contains(&value) {
        errors.push(FieldError::new(
            field,
            format!("must be between {RATING_MIN} and {RATING_MAX}"),
        ));
    }
}

fn check_text(errors: &mut Vec<FieldError>, field: &str, value: &str, max: usize, required: bool) {
    if required && value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
    } else if value.chars().count() > max {
        errors.push(FieldError::new(field, format!("must be at most {max} characters")));
    }
}

fn check_list(errors: &mut Vec<FieldError>, field: &str, entries: Option<&[String]>) {
    let Some(entries) = entries else {
        return;
    };
    if entries.len() > MAX_LIST_ENTRIES {
        errors.push(FieldError::new(
            field,
            format!("must have at most {MAX_LIST_ENTRIES} entries"),
        ));
    }
    for (i, entry) in entries.iter().enumerate() {
        check_text(errors, &format!("{field}[{i}]"), entry, MAX_LIST_ENTRY_CHARS, true);
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

impl Validate for CreateEvaluationRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_rating(&mut errors, "rating", self.rating);
        if let Some(comment) = &self.comment {
            check_text(&mut errors, "comment", comment, MAX_COMMENT_CHARS, false);
        }
        check_list(&mut errors, "tags", self.tags.as_deref());
        finish(errors)
    }
}

impl Validate for CreateVacancyRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_text(&mut errors, "title", &self.title, MAX_TITLE_CHARS, true);
        if let Some(description) = &self.description {
            check_text(&mut errors, "description", description, MAX_DESCRIPTION_CHARS, false);
        }
        check_list(&mut errors, "positions", self.positions.as_deref());
        check_list(&mut errors, "age_groups", self.age_groups.as_deref());
        finish(errors)
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.display_name {
            check_text(&mut errors, "display_name", name, MAX_TITLE_CHARS, true);
        }
        if let Some(position) = &self.position {
            check_text(&mut errors, "position", position, MAX_LIST_ENTRY_CHARS, true);
        }
        if let Some(club) = &self.club_name {
            check_text(&mut errors, "club_name", club, MAX_TITLE_CHARS, false);
        }
        if let Some(bio) = &self.bio {
            check_text(&mut errors, "bio", bio, MAX_DESCRIPTION_CHARS, false);
        }
        if let Some(year) = self.birth_year {
            if !(1900..=2100).contains(&year) {
                errors.push(FieldError::new("birth_year", "must be a plausible year"));
            }
        }
        finish(errors)
    }
}
