/// Form and query extractors
///
/// Drop-in replacements for `axum::Form` and `axum::Query` that reject with
/// [`ApiError`], so malformed input gets the same JSON error body as every
/// other failure.
///
/// Both tolerate repeated keys: the last value wins. Browsers send the
/// key twice when a hidden `complete=false` input precedes its checkbox.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Form,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use taskboard_shared::validation::FieldError;

use crate::error::ApiError;

/// URL-encoded form body
#[derive(Debug, Clone)]
pub struct ApiForm<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state).await?;

        from_pairs(pairs).map(ApiForm)
    }
}

/// Query string
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;

        from_pairs(pairs).map(ApiQuery)
    }
}

/// Collapses repeated keys (last wins) and deserializes the result
fn from_pairs<T: DeserializeOwned>(pairs: Vec<(String, String)>) -> Result<T, ApiError> {
    let fields: Map<String, Value> = pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::ValidationError(vec![FieldError::new("__all__", e.to_string())]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Form {
        title: String,
        complete: Option<String>,
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let form: Form = from_pairs(pairs(&[
            ("title", "x"),
            ("complete", "false"),
            ("complete", "on"),
        ]))
        .unwrap();

        assert_eq!(form.title, "x");
        assert_eq!(form.complete.as_deref(), Some("on"));
    }

    #[test]
    fn test_missing_and_unknown_keys() {
        let form: Form = from_pairs(pairs(&[("owner", "1")])).unwrap();

        assert_eq!(form.title, "");
        assert_eq!(form.complete, None);
    }

    #[test]
    fn test_required_field_missing_is_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Strict {
            #[allow(dead_code)]
            name: String,
        }

        let err = from_pairs::<Strict>(Vec::new()).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref errors) if errors.len() == 1));
    }
}
