mod ast;
mod bindings;
mod compile;
mod compiled;
mod error;
mod state;

pub use ast::PatternExpr;
pub use bindings::VarGroupBindings;
pub use compiled::SequencePattern;
pub use error::{PatternError, PatternResult};
pub use state::{StateFlags, StateId};

pub(crate) use state::StateKind;
