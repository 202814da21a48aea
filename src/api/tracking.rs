//! Change tracking for resource fields.
//!
//! [`FieldStore`] holds a resource's field values and records which fields
//! the caller assigned after the resource was built. The recorded changes
//! form the delta sent by [`Resource::save`](crate::api::Resource::save).
//!
//! # How It Works
//!
//! A store starts in [`TrackingState::Constructing`]. While constructing,
//! assignments only store values; this is how payload fields are bound.
//! Sealing the store moves it to [`TrackingState::Ready`], after which
//! every assignment is also recorded as a pending change.
//!
//! # Example
//!
//! ```rust
//! use reviewboard_api::api::FieldStore;
//! use serde_json::json;
//!
//! let mut fields = FieldStore::constructing();
//! fields.assign("summary", json!("Old summary"));
//! fields.seal();
//!
//! // Nothing is pending right after construction
//! assert!(!fields.is_changed());
//!
//! fields.assign("summary", json!("New summary"));
//! assert!(fields.is_changed());
//!
//! // Taking the delta flushes it
//! let delta = fields.take_delta();
//! assert_eq!(delta.get("summary"), Some(&json!("New summary")));
//! assert!(!fields.is_changed());
//! ```

use serde_json::{Map, Value};

/// Lifecycle of a [`FieldStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingState {
    /// Fields are being bound from a payload; assignments are not recorded.
    Constructing,
    /// Construction is finished; assignments are recorded as changes.
    Ready,
}

/// Field values plus the changes made to them since construction.
///
/// Invariant: every key in the pending set is also a key of the values,
/// holding the same value.
#[derive(Clone, Debug)]
pub struct FieldStore {
    values: Map<String, Value>,
    pending: Map<String, Value>,
    state: TrackingState,
}

impl FieldStore {
    /// Creates an empty store in the constructing state.
    #[must_use]
    pub fn constructing() -> Self {
        Self {
            values: Map::new(),
            pending: Map::new(),
            state: TrackingState::Constructing,
        }
    }

    /// Ends construction. Later assignments are recorded as changes.
    pub fn seal(&mut self) {
        self.state = TrackingState::Ready;
    }

    /// Returns the tracking state.
    #[must_use]
    pub const fn state(&self) -> TrackingState {
        self.state
    }

    /// Stores a field value, recording it as a change once sealed.
    pub fn assign(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if self.state == TrackingState::Ready {
            self.pending.insert(name.clone(), value.clone());
        }
        self.values.insert(name, value);
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns all field values.
    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Returns the changes recorded since construction or the last flush.
    #[must_use]
    pub const fn pending(&self) -> &Map<String, Value> {
        &self.pending
    }

    /// Returns `true` if any change is pending.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the pending changes and clears them.
    pub fn take_delta(&mut self) -> Map<String, Value> {
        std::mem::take(&mut self.pending)
    }

    /// Puts a taken delta back after a failed save.
    ///
    /// Fields assigned again since the delta was taken keep their newer
    /// pending value.
    pub(crate) fn restore_delta(&mut self, delta: Map<String, Value>) {
        for (name, value) in delta {
            self.pending.entry(name).or_insert(value);
        }
    }
}

impl Default for FieldStore {
    fn default() -> Self {
        Self::constructing()
    }
}
