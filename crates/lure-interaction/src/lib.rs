//! External collaborators of the engagement core.
//!
//! - `callback_transport`: HTTP delivery of final reports to the evaluation endpoint
//! - `tactic_generator`: Offline reply generator built from state tactics
//! - `dry_run`: Transport that logs reports instead of sending them

pub mod callback_transport;
pub mod dry_run;
pub mod tactic_generator;

pub use callback_transport::HttpCallbackTransport;
pub use dry_run::DryRunTransport;
pub use tactic_generator::TacticReplyGenerator;
