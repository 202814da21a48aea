//! The resource type bound to a payload.
//!
//! A [`Resource`] is built by [`ResourceBuilder`](crate::api::ResourceBuilder)
//! from one payload. Its schema is known only at runtime, so fields and
//! methods are kept in maps and reached through accessor functions:
//!
//! - [`Resource::field`] reads a field, failing for unknown names
//! - [`Resource::set`] assigns a field and records the change
//! - [`Resource::call`] and [`Resource::call_async`] invoke a method
//!   synthesized from the `links` table
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_api::api::Params;
//!
//! let root = client.root().await?;
//! let requests = root.call("get_review_requests", Params::new()).await?;
//!
//! for request in requests.as_list().unwrap() {
//!     println!("{}", request.field("summary")?);
//! }
//!
//! let mut request = root
//!     .call("get_review_request", [("review_request_id".to_string(), "8".to_string())].into())
//!     .await?;
//! request.set("summary", "Fix the frobnicator");
//! request.save().await?;
//! ```

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::api::errors::ResourceError;
use crate::api::links::{CREATE_RELATION, DELETE_RELATION, SELF_RELATION, UPDATE_RELATION};
use crate::api::list::ResourceList;
use crate::api::operation::BoundOperation;
use crate::api::tracking::FieldStore;
use crate::api::Params;
use crate::clients::FilePart;

/// A field value or a method, as returned by [`Resource::attribute`].
#[derive(Clone, Copy, Debug)]
pub enum Attribute<'a> {
    /// A field bound from the payload or assigned later.
    Field(&'a Value),
    /// A method synthesized from a link or URI template.
    Method(&'a BoundOperation),
}

#[derive(Clone, Debug, Default)]
struct Verbs {
    create: Option<BoundOperation>,
    update: Option<BoundOperation>,
    delete: Option<BoundOperation>,
}

/// A resource bound to one payload.
///
/// The set of methods is fixed when the resource is built. Field values may
/// be reassigned, and every assignment after construction is recorded as a
/// pending change until [`Resource::get_delta`] or [`Resource::save`]
/// flushes it.
#[derive(Clone, Debug)]
pub struct Resource {
    fields: FieldStore,
    methods: BTreeMap<String, BoundOperation>,
    refetch: Option<BoundOperation>,
    verbs: Verbs,
    token: Option<String>,
}

impl Resource {
    pub(crate) fn new(fields: FieldStore, token: Option<String>) -> Self {
        Self {
            fields,
            methods: BTreeMap::new(),
            refetch: None,
            verbs: Verbs::default(),
            token,
        }
    }

    /// Attaches a method. Returns `false` if the name is already taken.
    pub(crate) fn attach(&mut self, operation: BoundOperation) -> bool {
        if self.methods.contains_key(operation.name()) {
            return false;
        }
        self.methods.insert(operation.name().to_string(), operation);
        true
    }

    pub(crate) fn set_refetch(&mut self, operation: BoundOperation) {
        self.refetch = Some(operation);
    }

    pub(crate) fn set_verb(&mut self, relation: &str, operation: BoundOperation) {
        match relation {
            CREATE_RELATION => self.verbs.create = Some(operation),
            UPDATE_RELATION => self.verbs.update = Some(operation),
            DELETE_RELATION => self.verbs.delete = Some(operation),
            _ => {}
        }
    }

    /// Returns the token this resource was unwrapped with, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns a field value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoSuchAttribute`] if there is no such field.
    pub fn field(&self, name: &str) -> Result<&Value, ResourceError> {
        self.fields
            .get(name)
            .ok_or_else(|| ResourceError::NoSuchAttribute {
                name: name.to_string(),
            })
    }

    /// Looks a name up among fields first, then methods.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoSuchAttribute`] if the name is neither.
    pub fn attribute(&self, name: &str) -> Result<Attribute<'_>, ResourceError> {
        if let Some(value) = self.fields.get(name) {
            return Ok(Attribute::Field(value));
        }
        self.method(name).map(Attribute::Method)
    }

    /// Returns all field values.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        self.fields.values()
    }

    /// Returns the changes assigned since construction or the last flush.
    #[must_use]
    pub const fn pending_changes(&self) -> &Map<String, Value> {
        self.fields.pending()
    }

    /// Assigns a field, recording the change.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.assign(name, value.into());
    }

    /// Returns `true` if any change is pending.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.fields.is_changed()
    }

    /// Returns the pending changes and clears them.
    ///
    /// Calling this twice in a row returns the changes, then an empty map.
    pub fn get_delta(&mut self) -> Map<String, Value> {
        self.fields.take_delta()
    }

    /// Returns a synthesized method.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoSuchAttribute`] if there is no such method.
    pub fn method(&self, name: &str) -> Result<&BoundOperation, ResourceError> {
        self.methods
            .get(name)
            .ok_or_else(|| ResourceError::NoSuchAttribute {
                name: name.to_string(),
            })
    }

    /// Returns `true` if a method with this name exists.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Iterates over method names in sorted order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Calls a blocking method.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoSuchAttribute`] for unknown names,
    /// [`ResourceError::CallMode`] for `_async` methods, and any error
    /// produced by the request.
    pub async fn call(&self, name: &str, params: Params) -> Result<Binding, ResourceError> {
        self.method(name)?.invoke(params).await
    }

    /// Calls a blocking method with file parts.
    ///
    /// The parameters and files are sent as one `multipart/form-data` body,
    /// as needed for uploads such as diffs and screenshots.
    ///
    /// # Errors
    ///
    /// Same as [`Resource::call`]. Files on a `GET` or `DELETE` method are
    /// rejected before sending.
    pub async fn call_with_files(
        &self,
        name: &str,
        params: Params,
        files: Vec<FilePart>,
    ) -> Result<Binding, ResourceError> {
        self.method(name)?.invoke_with_files(params, files).await
    }

    /// Calls a blocking method, handing a failure to `on_failure`.
    ///
    /// The handler's return value becomes the result.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoSuchAttribute`] or
    /// [`ResourceError::CallMode`]; request failures go to the handler.
    pub async fn call_or_else<F>(
        &self,
        name: &str,
        params: Params,
        on_failure: F,
    ) -> Result<Option<Binding>, ResourceError>
    where
        F: FnOnce(ResourceError) -> Option<Binding>,
    {
        self.method(name)?.invoke_or_else(params, on_failure).await
    }

    /// Calls an `_async` method without blocking.
    ///
    /// `on_success` runs on the Tokio runtime with the built resource.
    /// Failures go to the builder's unhandled-error hook.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NoSuchAttribute`], [`ResourceError::CallMode`]
    /// for blocking methods, or [`ResourceError::NoRuntime`].
    pub fn call_async<S>(
        &self,
        name: &str,
        params: Params,
        on_success: S,
    ) -> Result<JoinHandle<()>, ResourceError>
    where
        S: FnOnce(Binding) + Send + 'static,
    {
        self.method(name)?.spawn(params, on_success)
    }

    /// Calls an `_async` method with success and failure callbacks.
    ///
    /// # Errors
    ///
    /// Same as [`Resource::call_async`].
    pub fn call_async_with_failure<S, F>(
        &self,
        name: &str,
        params: Params,
        on_success: S,
        on_failure: F,
    ) -> Result<JoinHandle<()>, ResourceError>
    where
        S: FnOnce(Binding) + Send + 'static,
        F: FnOnce(ResourceError) + Send + 'static,
    {
        self.method(name)?
            .spawn_with_failure(params, on_success, on_failure)
    }

    pub(crate) fn refetch_operation(&self) -> Option<&BoundOperation> {
        self.refetch.as_ref()
    }

    /// Fetches the resource again through its `self` link.
    ///
    /// The response is unwrapped with the token this resource was built with.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingRelation`] without a `self` link, or
    /// any error produced by the request.
    pub async fn refresh(&self) -> Result<Binding, ResourceError> {
        self.refetch_operation()
            .ok_or(ResourceError::MissingRelation {
                relation: SELF_RELATION,
            })?
            .fetch(Params::new())
            .await
    }

    /// Sends the pending changes through the `update` link.
    ///
    /// Without pending changes no request is made and `Ok(None)` is
    /// returned. On success the changes are flushed and the updated resource
    /// is returned; on failure they remain pending.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingRelation`] without an `update` link,
    /// or any error produced by the request.
    pub async fn save(&mut self) -> Result<Option<Binding>, ResourceError> {
        let update = self
            .verbs
            .update
            .clone()
            .ok_or(ResourceError::MissingRelation {
                relation: UPDATE_RELATION,
            })?;

        if !self.is_changed() {
            tracing::debug!("Skipping save of unchanged resource");
            return Ok(None);
        }

        let delta = self.get_delta();
        let params = update.encode_fields(&delta);

        match update.fetch(params).await {
            Ok(binding) => Ok(Some(binding)),
            Err(error) => {
                self.fields.restore_delta(delta);
                Err(error)
            }
        }
    }

    /// Deletes the resource through its `delete` link.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingRelation`] without a `delete` link,
    /// or any error produced by the request.
    pub async fn delete(&self) -> Result<(), ResourceError> {
        self.verbs
            .delete
            .as_ref()
            .ok_or(ResourceError::MissingRelation {
                relation: DELETE_RELATION,
            })?
            .fetch_discarding(Params::new())
            .await
    }

    /// Creates a child resource through the `create` link.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingRelation`] without a `create` link,
    /// or any error produced by the request.
    pub async fn create(&self, params: Params) -> Result<Binding, ResourceError> {
        self.verbs
            .create
            .as_ref()
            .ok_or(ResourceError::MissingRelation {
                relation: CREATE_RELATION,
            })?
            .fetch(params)
            .await
    }

    /// Creates a child resource through the `create` link, uploading files
    /// alongside `params`.
    ///
    /// # Errors
    ///
    /// Same as [`Resource::create`].
    pub async fn create_with_files(
        &self,
        params: Params,
        files: Vec<FilePart>,
    ) -> Result<Binding, ResourceError> {
        self.verbs
            .create
            .as_ref()
            .ok_or(ResourceError::MissingRelation {
                relation: CREATE_RELATION,
            })?
            .fetch_with_files(params, files)
            .await
    }

    /// Returns `true` if the resource has a link for the reserved relation.
    #[must_use]
    pub fn supports(&self, relation: &str) -> bool {
        match relation {
            CREATE_RELATION => self.verbs.create.is_some(),
            UPDATE_RELATION => self.verbs.update.is_some(),
            DELETE_RELATION => self.verbs.delete.is_some(),
            SELF_RELATION => self.refetch.is_some(),
            _ => false,
        }
    }
}

/// The result of building a payload: a single resource or a list.
///
/// Dereferences to [`Resource`], so a list's own fields and methods are
/// reachable the same way as a single resource's.
#[derive(Clone, Debug)]
pub enum Binding {
    /// A single resource.
    Resource(Resource),
    /// A collection response.
    List(ResourceList),
}

impl Binding {
    /// Returns `true` for collection responses.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the list, if this is a collection response.
    #[must_use]
    pub const fn as_list(&self) -> Option<&ResourceList> {
        match self {
            Self::List(list) => Some(list),
            Self::Resource(_) => None,
        }
    }

    /// Converts into a single resource, if this is one.
    #[must_use]
    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            Self::List(_) => None,
        }
    }

    /// Converts into a list, if this is a collection response.
    #[must_use]
    pub fn into_list(self) -> Option<ResourceList> {
        match self {
            Self::List(list) => Some(list),
            Self::Resource(_) => None,
        }
    }
}

impl Deref for Binding {
    type Target = Resource;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Resource(resource) => resource,
            Self::List(list) => list,
        }
    }
}

impl DerefMut for Binding {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Resource(resource) => resource,
            Self::List(list) => list,
        }
    }
}

impl From<Resource> for Binding {
    fn from(resource: Resource) -> Self {
        Self::Resource(resource)
    }
}

impl From<ResourceList> for Binding {
    fn from(list: ResourceList) -> Self {
        Self::List(list)
    }
}
