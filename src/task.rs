// SPDX-License-Identifier: MPL-2.0

//! The `Task` contract: declared inputs, positional execution, and the
//! data items a task produces.

use std::borrow::Cow;
use std::fmt;

use crate::data_cache::Payload;

/// Short tag identifying the kind of data a [`crate::data_cache::DataItem`]
/// holds (e.g. `"FRAME"`).
///
/// Task authors outside this crate mint their own tags, so this wraps a
/// string rather than a closed enum — the source treats `type` the same
/// way, as free-form text rather than a fixed vocabulary.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DataType(Cow<'static, str>);

impl DataType {
    /// The tag the scheduler uses for the data item it creates on each
    /// frame ingestion.
    pub const FRAME: &'static str = "FRAME";
}

impl From<&'static str> for DataType {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl AsRef<str> for DataType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One input a task needs, resolved positionally in `required()` order.
#[derive(Clone)]
pub enum RequestKey {
    /// The task cannot run until a data item with exactly this key
    /// exists.
    Required { ty: DataType, frame_id: u64 },
    /// If the data item is absent at evaluation time, a synthetic item
    /// carrying `default` is substituted and execution proceeds. A cache
    /// hit still takes precedence over the default.
    Optional {
        ty: DataType,
        frame_id: u64,
        default: Payload,
    },
}

impl RequestKey {
    #[must_use]
    pub fn required(ty: impl Into<DataType>, frame_id: u64) -> Self {
        Self::Required {
            ty: ty.into(),
            frame_id,
        }
    }

    #[must_use]
    pub fn optional(ty: impl Into<DataType>, frame_id: u64, default: Payload) -> Self {
        Self::Optional {
            ty: ty.into(),
            frame_id,
            default,
        }
    }

    #[must_use]
    pub fn type_tag(&self) -> &DataType {
        match self {
            Self::Required { ty, .. } | Self::Optional { ty, .. } => ty,
        }
    }

    #[must_use]
    pub fn frame_id(&self) -> u64 {
        match self {
            Self::Required { frame_id, .. } | Self::Optional { frame_id, .. } => *frame_id,
        }
    }

    #[must_use]
    pub fn key(&self) -> (DataType, u64) {
        (self.type_tag().clone(), self.frame_id())
    }
}

/// A newly produced data item returned from [`Task::execute`]. Unlike
/// the source's untyped, variable-length tuples, this is fixed at three
/// elements by the type system — a malformed-arity product is no longer
/// representable, let alone a runtime error to guard against.
pub type Produced = (DataType, u64, Payload);

/// Error raised by a task's `execute`. Treated as fatal: it aborts the
/// in-flight `add_frame` call without corrupting scheduler state.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TaskError(String);

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An abstract unit of work: declares required inputs (by key pattern)
/// and, given those inputs, produces zero or more new data items.
pub trait Task {
    /// The frame this task is owed for, used for eviction accounting.
    fn frame_id(&self) -> u64;

    /// Ordered keys describing this task's inputs. Order determines the
    /// positional order of payloads passed to `execute`. May be empty,
    /// in which case the task fires on the first evaluation pass it is
    /// considered in.
    fn required(&self) -> Vec<RequestKey>;

    /// Run with one positional payload per entry of `required()`, in the
    /// same order, producing new data items. Produced items need not
    /// share this task's frame id — cross-frame products are permitted.
    ///
    /// # Errors
    ///
    /// Any `Err` is a fatal usage error and aborts the enclosing
    /// `add_frame` call.
    fn execute(&self, payloads: Vec<Payload>) -> Result<Vec<Produced>, TaskError>;
}
