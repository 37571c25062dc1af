//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Dispatch Model
//! - A caller submits a list of [`WorkItem`]s and a deadline
//! - One worker per item runs an [`Operation`] and publishes exactly one [`Outcome`]
//! - The collector returns a [`ResultSet`] in arrival order, possibly shorter
//!   than the input when the deadline expires first

mod blueprint;
mod config;
mod error;
mod operation;
mod outcome;
mod result_set;
mod work_item;

pub use blueprint::*;
pub use config::*;
pub use error::*;
pub use operation::{LocalOperation, Operation};
pub use outcome::*;
pub use result_set::*;
pub use work_item::WorkItem;
