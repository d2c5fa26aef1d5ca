pub mod cache;
pub mod diagnostics;
pub mod op;
pub mod orchestrator;
pub mod prepare;
pub mod report;
pub mod session;

pub use cache::*;
pub use diagnostics::*;
pub use op::*;
pub use orchestrator::*;
pub use prepare::*;
pub use report::*;
pub use session::*;
