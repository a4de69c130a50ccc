//! Tri-state field wrapper for partial updates.
//!
//! A patch payload has to tell "leave this field alone" apart from "clear
//! this field". Plain `Option<T>` collapses both into `None`, so patch DTOs
//! wrap every field in [`Patch`] instead:
//!
//! | JSON                 | `Patch`          |
//! |----------------------|------------------|
//! | field missing        | `Patch::Absent`  |
//! | `"field": null`      | `Patch::Null`    |
//! | `"field": value`     | `Patch::Value`   |
//!
//! Fields must be annotated `#[serde(default)]` so that a missing key
//! deserializes to `Absent`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Patch::Null)
    }

    /// Apply onto a nullable field. `Absent` leaves it untouched.
    pub fn apply(self, target: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *target = None,
            Patch::Value(v) => *target = Some(v),
        }
    }

    /// Apply onto a non-nullable field.
    ///
    /// `Null` resets the field to `T::default()`; the service re-validates
    /// the patched entity, so a cleared required field is rejected there.
    pub fn apply_required(self, target: &mut T)
    where
        T: Default,
    {
        match self {
            Patch::Absent => {}
            Patch::Null => *target = T::default(),
            Patch::Value(v) => *target = v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// A present JSON key: `None` is an explicit null.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    /// `Absent` fields should be skipped with
    /// `#[serde(skip_serializing_if = "Patch::is_absent")]`; if not, they
    /// serialize as `null` like `Null`.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            Patch::Absent | Patch::Null => serializer.serialize_none(),
        }
    }
}
