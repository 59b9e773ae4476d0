//! Custom field validators used by the `validator` derives on input structs.

use std::borrow::Cow;
use url::Url;
use validator::ValidationError;

/// Accepts only absolute `http` and `https` URLs.
pub fn http_url(value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value).map_err(|_| {
        ValidationError::new("url").with_message(Cow::Borrowed("must be a valid URL"))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::new("url_scheme")
            .with_message(Cow::Borrowed("only http and https URLs are allowed"))),
    }
}

/// Accepts `http`, `https` and `file` URLs; used for description documents.
pub fn document_url(value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value).map_err(|_| {
        ValidationError::new("url").with_message(Cow::Borrowed("must be a valid URL"))
    })?;

    match url.scheme() {
        "http" | "https" | "file" => Ok(()),
        _ => Err(ValidationError::new("url_scheme")
            .with_message(Cow::Borrowed("unsupported document URL scheme"))),
    }
}
