//! Link table parsing.
//!
//! Every resource payload may carry a `links` object mapping relation names
//! to link descriptors:
//!
//! ```json
//! "links": {
//!     "self":  {"href": "https://rb.example.com/api/review-requests/8/", "method": "GET"},
//!     "update": {"href": "https://rb.example.com/api/review-requests/8/", "method": "PUT"},
//!     "diffs": {"href": "https://rb.example.com/api/review-requests/8/diffs/", "method": "GET"}
//! }
//! ```
//!
//! Four relation names are reserved. `self` becomes the resource's refetch
//! method; `create`, `update` and `delete` back the explicit mutation verbs
//! on [`Resource`](crate::api::Resource). Every other relation becomes a
//! navigation method.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::errors::{json_type_name, ResourceError};
use crate::clients::HttpMethod;

/// Payload key holding the link table.
pub const LINKS_KEY: &str = "links";
/// Payload key holding the request status (`ok` or `fail`).
pub const STAT_KEY: &str = "stat";
/// Root payload key holding named URI templates.
pub const URI_TEMPLATES_KEY: &str = "uri_templates";

/// Relation used to refetch the resource.
pub const SELF_RELATION: &str = "self";
/// Relation used to create a child resource.
pub const CREATE_RELATION: &str = "create";
/// Relation used to update the resource.
pub const UPDATE_RELATION: &str = "update";
/// Relation used to delete the resource.
pub const DELETE_RELATION: &str = "delete";

/// Relation names that never become navigation methods.
pub const RESERVED_RELATIONS: [&str; 4] = [
    SELF_RELATION,
    CREATE_RELATION,
    UPDATE_RELATION,
    DELETE_RELATION,
];

/// Returns `true` if the relation name is reserved.
#[must_use]
pub fn is_reserved_relation(relation: &str) -> bool {
    RESERVED_RELATIONS.contains(&relation)
}

/// A single link descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// The absolute URL of the target.
    pub href: String,
    /// The method used to follow the link. Defaults to `GET`.
    pub method: HttpMethod,
}

/// The parsed `links` object of a payload, keyed by relation name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: BTreeMap<String, Link>,
}

impl LinkTable {
    /// Parses the link table of a payload object.
    ///
    /// A payload without `links` has an empty table.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::MalformedLinks`] if `links` is not an object
    /// - [`ResourceError::InvalidPayload`] if an entry is not an object, has
    ///   no string `href`, or names an unsupported method
    ///
    /// # Example
    ///
    /// ```rust
    /// use reviewboard_api::api::LinkTable;
    /// use reviewboard_api::clients::HttpMethod;
    /// use serde_json::json;
    ///
    /// let payload = json!({
    ///     "links": {
    ///         "self": {"href": "https://rb.example.com/api/", "method": "GET"},
    ///         "users": {"href": "https://rb.example.com/api/users/"}
    ///     }
    /// });
    ///
    /// let table = LinkTable::parse(payload.as_object().unwrap()).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.get("users").unwrap().method, HttpMethod::Get);
    /// assert_eq!(table.navigation().count(), 1);
    /// ```
    pub fn parse(payload: &Map<String, Value>) -> Result<Self, ResourceError> {
        let entries = match payload.get(LINKS_KEY) {
            None => return Ok(Self::default()),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                return Err(ResourceError::MalformedLinks {
                    found: json_type_name(other),
                })
            }
        };

        let mut links = BTreeMap::new();
        for (relation, entry) in entries {
            links.insert(relation.clone(), parse_link(relation, entry)?);
        }

        Ok(Self { links })
    }

    /// Returns the link for a relation.
    #[must_use]
    pub fn get(&self, relation: &str) -> Option<&Link> {
        self.links.get(relation)
    }

    /// Returns the number of relations in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if the table has no relations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Iterates over all relations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the non-reserved relations in name order.
    pub fn navigation(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.iter().filter(|(relation, _)| !is_reserved_relation(relation))
    }
}

#[derive(Deserialize)]
struct LinkEntry {
    href: String,
    #[serde(default)]
    method: Option<String>,
}

fn parse_link(relation: &str, entry: &Value) -> Result<Link, ResourceError> {
    let entry = LinkEntry::deserialize(entry).map_err(|e| ResourceError::InvalidPayload {
        reason: format!("link '{relation}' is invalid: {e}"),
    })?;

    let method = match entry.method.as_deref() {
        None => HttpMethod::Get,
        Some(method) => method
            .parse::<HttpMethod>()
            .map_err(|_| ResourceError::InvalidPayload {
                reason: format!("link '{relation}' has unsupported method '{method}'"),
            })?,
    };

    Ok(Link {
        href: entry.href,
        method,
    })
}
