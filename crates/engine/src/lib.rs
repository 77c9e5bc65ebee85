//! # Commandeer Engine
//!
//! The engine sits between the declarative catalog and the terminal
//! presentation. It owns:
//!
//! - **`process`**: the boundary to external programs (one blocking call per
//!   invocation)
//! - **`exec`**: argument assembly with placeholder substitution, execution,
//!   and pagination-token extraction
//! - **`cursor`**: cursor history for forward/backward paging
//! - **`parse`**: normalization of heterogeneous structured output into the
//!   tabular model
//! - **`dynamo`**: the typed-value encoding used by DynamoDB, reserved-word
//!   aliasing, and query parameter synthesis
//! - **`profiles`**: credential profile discovery with bounded parallel
//!   metadata fetch
//! - **`session`**: the breadcrumb-backed navigation state machine driving
//!   all of the above

pub mod cursor;
pub mod dynamo;
pub mod exec;
pub mod parse;
pub mod process;
pub mod profiles;
pub mod session;

pub use cursor::CursorState;
pub use dynamo::{IndexKind, KeyRole, KeySpec, QueryError, QueryParams};
pub use exec::{Bindings, Execution};
pub use process::{CommandRunner, ProcessRunner};
pub use profiles::Profile;
pub use session::{FrameKind, NavOutcome, Session};
