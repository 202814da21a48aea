//! Resource bindings for the Review Board Web API.
//!
//! The Web API is hypermedia-driven: every payload carries a `links` table
//! naming the resources reachable from it. This module turns payloads into
//! [`Resource`]s whose methods are synthesized from those links, so clients
//! navigate the API without hard-coding URLs.
//!
//! # Overview
//!
//! - [`ResourceBuilder`]: Builds resources from payloads and runs requests
//! - [`Resource`]: Fields, change tracking and synthesized methods
//! - [`ResourceList`]: A collection response with pagination via [`ResourceList::all`]
//! - [`Binding`]: Either of the two, as returned by every call
//! - [`BoundOperation`]: A method synthesized from a link or URI template
//! - [`LinkTable`]: The parsed `links` of a payload
//! - [`ResourceError`]: Everything that can go wrong
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_api::api::{Params, ResourceBuilder};
//! use reviewboard_api::clients::HttpClient;
//!
//! let builder = ResourceBuilder::new(HttpClient::new(&config));
//! let root = builder.build_root(&config.api_root_url()).await?;
//!
//! let mut params = Params::new();
//! params.insert("status".to_string(), "pending".to_string());
//! let pending = root.call("get_review_requests", params).await?;
//!
//! println!("{} pending review requests", pending.as_list().unwrap().len());
//! ```

mod builder;
mod errors;
mod format;
mod links;
mod list;
mod operation;
mod resource;
mod template;
mod tracking;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;

/// Call parameters, sent as query parameters or form fields.
pub type Params = HashMap<String, String>;

pub use builder::{ResourceBuilder, UnhandledErrorHook};
pub use errors::{RequestError, RequestErrorKind, ResourceError};
pub use format::JsonFormat;
pub use links::{
    is_reserved_relation, Link, LinkTable, CREATE_RELATION, DELETE_RELATION, LINKS_KEY,
    RESERVED_RELATIONS, SELF_RELATION, STAT_KEY, UPDATE_RELATION, URI_TEMPLATES_KEY,
};
pub use list::{AllItems, ResourceList, START_PARAM, TOTAL_COUNT_FIELD};
pub use operation::{
    async_method_name, method_name, BoundOperation, CallMode, Target, ASYNC_METHOD_SUFFIX,
    FETCH_METHOD_PREFIX,
};
pub use resource::{Attribute, Binding, Resource};
pub use template::UriTemplate;
pub use tracking::{FieldStore, TrackingState};
