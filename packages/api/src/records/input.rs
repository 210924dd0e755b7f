//! # Record input: transport parsing and normalization
//!
//! Create and update requests arrive either as JSON or as `multipart/form-data`
//! (the latter carrying an optional `photo` file part). Both are read into the same
//! loosely-typed [`RecordForm`], and only then validated into a [`NewRecordInput`]
//! or a [`RecordChanges`]. Nothing downstream sees raw transport values: `isPublic`
//! in particular is parsed by [`parse_flag`] here and reaches the ownership policy
//! as a plain `bool`.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, FieldError};

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Raw record fields as they came off the wire.
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub is_public: Option<String>,
    pub photo: Option<UploadedFile>,
}

/// Validated input for creating a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecordInput {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub is_public: bool,
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_public: Option<bool>,
}

/// Parse a visibility flag from its transport form.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a calendar date. Accepts `YYYY-MM-DD` or an ISO 8601 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn required_text(
    field: &'static str,
    label: &str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(FieldError::new(field, format!("{} is required", label)));
            None
        }
    }
}

fn optional_text(
    field: &'static str,
    label: &str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let v = value?.trim().to_string();
    if v.is_empty() {
        errors.push(FieldError::new(field, format!("{} cannot be empty", label)));
        return None;
    }
    Some(v)
}

fn date_field(value: Option<String>, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    let raw = value?;
    let date = parse_date(&raw);
    if date.is_none() {
        errors.push(FieldError::new("date", "Valid date is required"));
    }
    date
}

fn flag_field(value: Option<String>, errors: &mut Vec<FieldError>) -> Option<bool> {
    let raw = value?;
    let flag = parse_flag(&raw);
    if flag.is_none() {
        errors.push(FieldError::new("isPublic", "isPublic must be a boolean"));
    }
    flag
}

impl RecordForm {
    /// Validate for creation. Title, description and date are required.
    pub fn into_new(self) -> Result<(NewRecordInput, Option<UploadedFile>), ApiError> {
        let mut errors = Vec::new();

        let title = required_text("title", "Title", self.title, &mut errors);
        let description = required_text("description", "Description", self.description, &mut errors);
        let date = match self.date {
            Some(raw) => date_field(Some(raw), &mut errors),
            None => {
                errors.push(FieldError::new("date", "Valid date is required"));
                None
            }
        };
        let is_public = flag_field(self.is_public, &mut errors);

        match (title, description, date) {
            (Some(title), Some(description), Some(date)) if errors.is_empty() => Ok((
                NewRecordInput {
                    title,
                    description,
                    date,
                    is_public: is_public.unwrap_or(false),
                },
                self.photo,
            )),
            _ => Err(ApiError::Validation(errors)),
        }
    }

    /// Validate for a partial update. Every field is optional.
    pub fn into_changes(self) -> Result<(RecordChanges, Option<UploadedFile>), ApiError> {
        let mut errors = Vec::new();

        let changes = RecordChanges {
            title: optional_text("title", "Title", self.title, &mut errors),
            description: optional_text("description", "Description", self.description, &mut errors),
            date: date_field(self.date, &mut errors),
            is_public: flag_field(self.is_public, &mut errors),
        };

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }
        Ok((changes, self.photo))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonRecordBody {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    is_public: Option<Value>,
}

fn flag_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn malformed(message: String) -> ApiError {
    ApiError::Validation(vec![FieldError::new("body", message)])
}

async fn read_multipart(mut multipart: Multipart) -> Result<RecordForm, ApiError> {
    let mut form = RecordForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| malformed(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| malformed(e.body_text()))?;
                if !bytes.is_empty() {
                    form.photo = Some(UploadedFile { file_name, bytes });
                }
            }
            "title" | "description" | "date" | "isPublic" => {
                let text = field.text().await.map_err(|e| malformed(e.body_text()))?;
                let slot = match name.as_str() {
                    "title" => &mut form.title,
                    "description" => &mut form.description,
                    "date" => &mut form.date,
                    _ => &mut form.is_public,
                };
                *slot = Some(text);
            }
            // Unknown parts (including any owner field) are ignored.
            _ => {}
        }
    }
    Ok(form)
}

impl<S> FromRequest<S> for RecordForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| malformed(e.body_text()))?;
            return read_multipart(multipart).await;
        }

        let Json(body) = Json::<JsonRecordBody>::from_request(req, state)
            .await
            .map_err(|e| malformed(e.body_text()))?;
        Ok(RecordForm {
            title: body.title,
            description: body.description,
            date: body.date,
            is_public: body.is_public.and_then(flag_to_text),
            photo: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, description: &str, date: &str) -> RecordForm {
        RecordForm {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_parse_date() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(parse_date("2024-01-01"), jan1);
        assert_eq!(parse_date("2024-01-01T10:30:00Z"), jan1);
        assert_eq!(parse_date("2024-01-01T10:30:00"), jan1);
        assert_eq!(parse_date("01/01/2024"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_into_new_defaults_to_private() {
        let (input, photo) = form(" T ", "D", "2024-01-01").into_new().unwrap();
        assert_eq!(input.title, "T");
        assert!(!input.is_public);
        assert!(photo.is_none());
    }

    #[test]
    fn test_into_new_string_flag() {
        let mut f = form("T", "D", "2024-01-01");
        f.is_public = Some("true".to_string());
        assert!(f.into_new().unwrap().0.is_public);
    }

    #[test]
    fn test_into_new_reports_missing_fields() {
        let err = RecordForm::default().into_new().unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "description", "date"]);
    }

    #[test]
    fn test_into_new_rejects_bad_flag() {
        let mut f = form("T", "D", "2024-01-01");
        f.is_public = Some("sometimes".to_string());
        assert!(matches!(f.into_new(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_into_changes_keeps_omitted_fields_unset() {
        let f = RecordForm {
            description: Some("New".to_string()),
            is_public: Some("0".to_string()),
            ..Default::default()
        };
        let (changes, _) = f.into_changes().unwrap();
        assert_eq!(
            changes,
            RecordChanges {
                description: Some("New".to_string()),
                is_public: Some(false),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_into_changes_rejects_empty_title() {
        let f = RecordForm {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(f.into_changes(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_json_flag_coercion() {
        assert_eq!(flag_to_text(Value::Bool(true)), Some("true".to_string()));
        assert_eq!(flag_to_text(Value::String("false".into())), Some("false".to_string()));
        assert_eq!(flag_to_text(Value::Null), None);
        assert_eq!(flag_to_text(serde_json::json!(1)), Some("1".to_string()));
    }
}
