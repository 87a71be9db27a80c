mod error;
mod multi;
mod pattern;
mod text;

pub use error::{NodeError, NodeResult};
pub use multi::{MultiNodePattern, NodeSequenceSet, SharedMultiNodePattern};
pub use pattern::{
    AnyNode, ConjunctionNode, DisjunctionNode, EqualsNode, NegateNode, NodeEquality, NodePattern,
    PredicateNode, SharedNodeEquality, SharedNodePattern, StructuralEquality, SubResult,
};
pub use text::{LiteralNode, RegexNode};
