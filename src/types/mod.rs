//! Public types for the Hoard API.

mod argument;
mod identity;
mod options;
mod policy;

pub use argument::{Argument, ObjectRef};
pub use identity::{ObjectId, TargetIdentity};
pub use options::CallOptions;
pub use policy::CachePolicy;
