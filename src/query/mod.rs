//! Query building and execution.
//!
//! The query layer turns declarative filter/join/order/pagination inputs into
//! an immutable [`QueryPlan`] and executes it against a session:
//!
//! - **Plan**: the unexecuted representation of one read ([`plan`])
//! - **Build**: pure augmentation steps that fail closed before any I/O
//!   ([`build`])
//! - **Execution**: the single driver-fault translation point for reads
//!   ([`execution`])
//!
//! Building follows joins → filters → order → pagination; a plan is either
//! fully built and executed once, or abandoned on the first building error.

pub mod plan;
#[doc(inline)]
pub use plan::{JoinSpec, OrderDirection, OrderSpec, Projection, QueryPlan};

pub mod build;
#[doc(inline)]
pub use build::Page;

pub mod execution;
#[doc(inline)]
pub use execution::{execute, fetch_all, fetch_count, fetch_exists, fetch_first};
