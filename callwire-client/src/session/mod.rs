mod call_session;
mod session_actor;
mod session_command;

pub use call_session::{CallSession, SessionDeps};
pub use session_command::{SessionCommand, SessionSnapshot};
