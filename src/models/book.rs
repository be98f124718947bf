use serde::{Deserialize, Serialize};

pub const NAME_MAX_LENGTH: usize = 50;
pub const WRITER_MAX_LENGTH: usize = 100;
pub const YEAR_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub writer: String,
    pub year: String,
    pub main_contents: String,
}

/// The four mutable fields as they arrive on the wire. Every key is
/// optional at the deserialization level so that `validate` can report
/// every missing key in one pass instead of stopping at the first.
#[derive(Debug, Clone, Deserialize)]
pub struct BookPayload {
    pub name: Option<String>,
    pub writer: Option<String>,
    // Free text on purpose ("circa 1965" is a legal value), so no
    // numeric parsing or range checks here.
    pub year: Option<String>,
    pub main_contents: Option<String>,
}

/// A validated field set, ready to hand to the store.
#[derive(Debug, Clone)]
pub struct BookFields {
    pub name: String,
    pub writer: String,
    pub year: String,
    pub main_contents: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

fn check_field(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    max: Option<usize>,
) -> Option<String> {
    let Some(value) = value else {
        errors.push(FieldError {
            field,
            error: "this field is required".to_string(),
        });
        return None;
    };

    if value.trim().is_empty() {
        errors.push(FieldError {
            field,
            error: "this field may not be blank".to_string(),
        });
        return None;
    }

    if let Some(max) = max {
        let len = value.chars().count();
        if len > max {
            errors.push(FieldError {
                field,
                error: format!("must be at most {} characters, got {}", max, len),
            });
            return None;
        }
    }

    Some(value)
}

impl BookPayload {
    /// Checks required-ness, blankness and the per-field length caps,
    /// collecting every violation so the client gets the full list in one
    /// response.
    pub fn validate(self) -> Result<BookFields, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = check_field(&mut errors, "name", self.name, Some(NAME_MAX_LENGTH));
        let writer = check_field(&mut errors, "writer", self.writer, Some(WRITER_MAX_LENGTH));
        let year = check_field(&mut errors, "year", self.year, Some(YEAR_MAX_LENGTH));
        // main_contents is unbounded.
        let main_contents = check_field(&mut errors, "main_contents", self.main_contents, None);

        if let (Some(name), Some(writer), Some(year), Some(main_contents)) =
            (name, writer, year, main_contents)
        {
            Ok(BookFields {
                name,
                writer,
                year,
                main_contents,
            })
        } else {
            Err(errors)
        }
    }
}

impl Book {
    pub fn from_fields(id: i64, fields: BookFields) -> Self {
        Self {
            id,
            name: fields.name,
            writer: fields.writer,
            year: fields.year,
            main_contents: fields.main_contents,
        }
    }
}
