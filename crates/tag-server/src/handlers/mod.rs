//! Route handlers, one module per resource.

pub mod games;
pub mod users;
