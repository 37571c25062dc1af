//! Operation implementations

mod func;
mod http;

pub use func::{from_fn, FnOperation};
pub use http::{HttpOperation, HttpResponse};
