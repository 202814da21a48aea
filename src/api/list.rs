//! Collection responses and pagination.
//!
//! A collection response wraps one page of items next to metadata such as
//! the server's total count:
//!
//! ```json
//! {"stat": "ok", "total_results": 120,
//!  "review_requests": [{"id": 1, ...}, {"id": 2, ...}],
//!  "links": {"self": {"href": ".../review-requests/", "method": "GET"}}}
//! ```
//!
//! [`ResourceList`] exposes the materialized page through [`ResourceList::iter`]
//! and the complete collection through [`ResourceList::all`], which fetches
//! further pages via the `self` link as it goes.
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_api::api::Params;
//!
//! let list = root.call("get_review_requests", Params::new()).await?.into_list().unwrap();
//! println!("{} review requests on the server", list.len());
//!
//! let mut all = list.all(Params::new());
//! while let Some(item) = all.next_item().await {
//!     println!("{}", item?.field("summary")?);
//! }
//! ```

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use crate::api::errors::ResourceError;
use crate::api::links::SELF_RELATION;
use crate::api::operation::BoundOperation;
use crate::api::resource::{Binding, Resource};
use crate::api::Params;

/// Field holding the server-side total of a collection.
pub const TOTAL_COUNT_FIELD: &str = "total_results";

/// Query parameter carrying the pagination offset.
pub const START_PARAM: &str = "start";

/// A collection response.
///
/// Dereferences to the [`Resource`] built from the outer payload, so the
/// list's own fields and methods are reachable directly.
#[derive(Clone, Debug)]
pub struct ResourceList {
    resource: Resource,
    items: Vec<Resource>,
    total_count: Option<u64>,
}

impl ResourceList {
    pub(crate) fn new(resource: Resource, items: Vec<Resource>) -> Self {
        let total_count = resource
            .fields()
            .get(TOTAL_COUNT_FIELD)
            .and_then(serde_json::Value::as_u64);

        Self {
            resource,
            items,
            total_count,
        }
    }

    /// Returns the number of items on the server.
    ///
    /// This is the server-reported total, which may exceed the number of
    /// materialized items. Without a reported total, the number of
    /// materialized items is returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total_count
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(self.items.len())
    }

    /// Returns `true` if the collection is empty on the server.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the server-reported total, if present.
    #[must_use]
    pub const fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Returns the materialized items.
    #[must_use]
    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    /// Iterates over the materialized items without fetching more.
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.items.iter()
    }

    /// Consumes the list, returning the materialized items.
    #[must_use]
    pub fn into_items(self) -> Vec<Resource> {
        self.items
    }

    /// Returns a pager over every item of the collection.
    ///
    /// The pager yields the materialized items, then fetches further pages
    /// through the `self` link with `start` set to the number of items
    /// yielded so far. `params` are sent with every page request. The pager
    /// ends at the first empty page.
    ///
    /// Each pager keeps its own offset, so several pagers over one list do
    /// not interfere.
    #[must_use]
    pub fn all(&self, params: Params) -> AllItems {
        AllItems {
            buffer: self.items.iter().cloned().collect(),
            yielded: 0,
            params,
            fetch: self.resource.refetch_operation().cloned(),
            finished: false,
        }
    }
}

impl Deref for ResourceList {
    type Target = Resource;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl DerefMut for ResourceList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.resource
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for ResourceList {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// A finite, non-restartable pager over a whole collection.
///
/// Returned by [`ResourceList::all`]. Pages are fetched one at a time, and
/// only after the previous page has been consumed. Once the pager has ended,
/// either at an empty page or after an error, it yields nothing more.
#[derive(Debug)]
pub struct AllItems {
    buffer: VecDeque<Resource>,
    yielded: usize,
    params: Params,
    fetch: Option<BoundOperation>,
    finished: bool,
}

impl AllItems {
    /// Returns the next item, fetching the next page when needed.
    ///
    /// Returns `None` once the collection is exhausted. A failed page fetch
    /// is returned once as `Some(Err(_))`, after which the pager ends.
    pub async fn next_item(&mut self) -> Option<Result<Resource, ResourceError>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(item));
            }

            if let Err(error) = self.fetch_page().await {
                self.finished = true;
                return Some(Err(error));
            }
        }
    }

    /// Drains the pager into a vector, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced while fetching pages.
    pub async fn try_collect(mut self) -> Result<Vec<Resource>, ResourceError> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// Returns the number of items yielded so far.
    #[must_use]
    pub const fn yielded(&self) -> usize {
        self.yielded
    }

    async fn fetch_page(&mut self) -> Result<(), ResourceError> {
        let operation = self.fetch.as_ref().ok_or(ResourceError::MissingRelation {
            relation: SELF_RELATION,
        })?;

        let mut params = self.params.clone();
        params.insert(START_PARAM.to_string(), self.yielded.to_string());

        tracing::debug!(
            "Fetching page of {} starting at {}",
            operation.target().as_str(),
            self.yielded
        );

        match operation.fetch(params).await? {
            Binding::List(page) if page.items.is_empty() => {
                self.finished = true;
            }
            Binding::List(page) => {
                self.buffer.extend(page.into_items());
            }
            Binding::Resource(_) => {
                return Err(ResourceError::InvalidPayload {
                    reason: "page request returned a single resource instead of a list"
                        .to_string(),
                });
            }
        }

        Ok(())
    }
}
