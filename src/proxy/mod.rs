//! Call-site facade

mod builder;
mod method;

pub use builder::{Hoard, HoardBuilder};
pub use method::MethodProxy;
