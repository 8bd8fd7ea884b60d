//! App request helpers

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::FromRequest;
use axum::extract::Multipart;
use axum::extract::Request;
use axum::extract::rejection::FormRejection;
use axum::http::header::CONTENT_TYPE;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Deserializer;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::ids::Id;

use super::Error;

fn parse_form<F>(form: Result<axum::Form<F>, FormRejection>) -> Result<F, Error> {
    match form {
        Ok(axum::Form(form)) => Ok(form),
        Err(err) => match err {
            FormRejection::InvalidFormContentType(_err) => Err(Error::bad_request(
                "Missing `application/x-www-form-urlencoded` content type",
            )),
            FormRejection::FailedToDeserializeForm(err) => {
                Err(Error::bad_request("Invalid form data").with_description(err))
            }
            FormRejection::FailedToDeserializeFormBody(err) => {
                Err(Error::bad_request("Invalid form data").with_description(err))
            }
            err => Err(Error::bad_request("Unknown form error").with_description(err)),
        },
    }
}

/// Wrapper for the form extractor
pub struct Form<F>(pub F);

impl<S, F> FromRequest<S> for Form<F>
where
    S: Send + Sync,
    F: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = Result::<axum::Form<F>, FormRejection>::from_request(req, state)
            .await
            .map_err(|_| Error::internal_server_error("Could not extract form"))?;

        parse_form(form).map(Form)
    }
}

/// A file sent with a multipart form
#[derive(Debug)]
pub struct Upload {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// The file inlined as a `data:` URI, `None` when it is not an image
    pub fn image_data_uri(&self) -> Option<String> {
        let content_type = self
            .content_type
            .as_deref()
            .filter(|content_type| content_type.starts_with("image/"))?;

        Some(format!(
            "data:{content_type};base64,{}",
            STANDARD.encode(&self.bytes)
        ))
    }
}

/// Form extractor that also accepts `multipart/form-data` with files
///
/// Text fields of a multipart body are read as strings. Url-encoded bodies have no files.
pub struct UploadForm<F> {
    pub fields: F,

    /// Non-empty files by field name
    pub files: HashMap<String, Upload>,
}

fn invalid_multipart<E>(err: E) -> Error
where
    E: ToString,
{
    Error::bad_request("Invalid multipart form").with_description(err)
}

impl<S, F> FromRequest<S> for UploadForm<F>
where
    S: Send + Sync,
    F: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<F>::from_request(req, state).await?;

            return Ok(Self {
                fields,
                files: HashMap::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(invalid_multipart)?;

        let mut fields = Map::new();
        let mut files = HashMap::new();

        while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field.bytes().await.map_err(invalid_multipart)?;

                // no file picked, browsers still send the part
                if !bytes.is_empty() {
                    files.insert(name, Upload { content_type, bytes });
                }
            } else {
                let text = field.text().await.map_err(invalid_multipart)?;

                fields.insert(name, Value::String(text));
            }
        }

        let fields = serde_json::from_value(Value::Object(fields))
            .map_err(|err| Error::bad_request("Invalid form data").with_description(err))?;

        Ok(Self { fields, files })
    }
}

/// Trimmed form value, empty values count as missing
pub fn present(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

/// Deserialize an optional ID field, empty values count as missing
///
/// Forms always send their hidden ID field, empty when creating something new
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    Ok(value.and_then(|value| value.parse().ok()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct NoteForm {
        #[serde(default, deserialize_with = "optional_id")]
        id: Option<Id>,
    }

    #[test]
    fn test_present() {
        assert_eq!(Some("ada"), present("  ada "));
        assert_eq!(None, present("   "));
        assert_eq!(None, present(""));
    }

    #[test]
    fn test_only_images_are_inlined() {
        let png = Upload {
            content_type: Some(String::from("image/png")),
            bytes: Bytes::from_static(b"\x89PNG"),
        };
        assert_eq!(
            Some(String::from("data:image/png;base64,iVBORw==")),
            png.image_data_uri()
        );

        let text = Upload {
            content_type: Some(String::from("text/plain")),
            bytes: Bytes::from_static(b"hello"),
        };
        assert_eq!(None, text.image_data_uri());

        let unknown = Upload {
            content_type: None,
            bytes: Bytes::from_static(b"hello"),
        };
        assert_eq!(None, unknown.image_data_uri());
    }

    #[test]
    fn test_optional_id() {
        let form: NoteForm = serde_json::from_str(r#"{ "id": "" }"#).unwrap();
        assert_eq!(None, form.id);

        let form: NoteForm = serde_json::from_str(r#"{ "id": "12" }"#).unwrap();
        assert_eq!(Some(Id::Number(12)), form.id);

        let form: NoteForm = serde_json::from_str("{}").unwrap();
        assert_eq!(None, form.id);
    }
}
