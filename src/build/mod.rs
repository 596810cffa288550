//! Pipeline orchestration core for taskline
//!
//! Turns configured tasks into ordered, fail-fast runs over the project's
//! artifact tree.
//!
//! # Overview
//!
//! The orchestration core consists of:
//! - **Store**: the source, intermediate and distribution trees
//! - **Registry**: task names mapped to their configured targets
//! - **Executor**: resolves one target, expands its inputs and runs its kind
//! - **Pipeline**: named reference lists run in order, stopping at the first failure
//!
//! # Example
//!
//! ```ignore
//! use taskline::project::Project;
//!
//! let project = Project::load(None, &Default::default())?;
//! let runner = project.into_runner();
//!
//! let result = runner.run("build")?;
//! println!("{}", result.summary());
//! ```

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod result;
pub mod store;

pub use descriptor::*;
pub use discovery::*;
pub use error::*;
pub use executor::*;
pub use pipeline::*;
pub use registry::*;
pub use result::*;
pub use store::*;
