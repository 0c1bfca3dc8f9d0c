// Approval workflow exports
pub mod approval;
pub mod controller;
pub mod ticket;

pub use approval::{ApprovalKey, ApprovalLedger, ApprovalOutcome, ApprovalState};
pub use controller::{ApprovalController, FetchOutcome, ListState, MatchView, SessionContext};
pub use ticket::{FetchSlot, FetchTicket};
