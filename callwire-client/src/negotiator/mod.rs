mod candidate_queue;
mod close_handle;
mod events;
mod negotiator;
mod restart;

pub use candidate_queue::CandidateQueue;
pub use close_handle::CloseHandle;
pub use events::NegotiatorEvent;
pub use negotiator::{AnswerOutcome, Negotiator, TrackSwap};
pub use restart::{RestartBudget, RestartDecision};
