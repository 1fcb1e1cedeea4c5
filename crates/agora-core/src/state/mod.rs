//! Client-side state machines for reactions and edits

mod edit_session;
mod reaction_view;

pub use edit_session::{EditPhase, EditSession, SaveDecision};
pub use reaction_view::{EdgeOp, ReactionViewState, ToggleTransition};
