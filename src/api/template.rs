//! URI template expansion.
//!
//! The root resource publishes named URI templates such as
//! `https://rb.example.com/api/review-requests/{review_request_id}/`. A call
//! through a template fills each `{name}` placeholder from the call
//! parameters; the parameters left over are sent as the query string.
//!
//! # Example
//!
//! ```rust
//! use reviewboard_api::api::{Params, UriTemplate};
//!
//! let template = UriTemplate::new("https://rb.example.com/api/repositories/{repository_id}/");
//! let mut params = Params::new();
//! params.insert("repository_id".to_string(), "3".to_string());
//! params.insert("only-fields".to_string(), "name".to_string());
//!
//! let url = template.expand(&mut params).unwrap();
//! assert_eq!(url, "https://rb.example.com/api/repositories/3/");
//! assert_eq!(params.len(), 1);
//! ```

use crate::api::errors::ResourceError;
use crate::api::Params;

/// A URI with `{name}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UriTemplate {
    template: String,
}

impl UriTemplate {
    /// Creates a template from its text.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Returns the placeholder names in order of appearance.
    #[must_use]
    pub fn parameters(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            names.push(&after[..close]);
            rest = &after[close + 1..];
        }

        names
    }

    /// Expands the template, consuming the parameters it uses.
    ///
    /// Values are percent-encoded. An unterminated `{` is copied verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingTemplateParameter`] if a placeholder
    /// has no value in `params`.
    pub fn expand(&self, params: &mut Params) -> Result<String, ResourceError> {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };

            let name = &after[..close];
            let value =
                params
                    .remove(name)
                    .ok_or_else(|| ResourceError::MissingTemplateParameter {
                        template: self.template.clone(),
                        parameter: name.to_string(),
                    })?;

            result.push_str(&rest[..open]);
            result.push_str(&urlencoding::encode(&value));
            rest = &after[close + 1..];
        }

        result.push_str(rest);
        Ok(result)
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}
