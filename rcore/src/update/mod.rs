// Indexed assignment into vectors: x[i] <- v, x[[i]] <- v and x[i, j, ...] <- v
// Classification, coercion of the receiver, flat, recursive and multi-dimensional writers

pub mod coerce_vector;
pub mod dispatch;
pub mod helper;
pub mod multi_dim;
pub mod positions;

pub use coerce_vector::{coerce_vector, coercion_for, Coercion};
pub use dispatch::{select, PositionKind, ScalarPosition, Transition, UpdateContext, ValueKind, VectorKind};
pub use helper::UpdateArrayHelper;
pub use multi_dim::SetMultiDimData;
pub use positions::{PathElement, Positions, ResolvedIndex, Subscript};
