//! Policy conditions: parsing, operators and evaluation

pub mod evaluator;
pub mod node;
pub mod operator;
pub mod ops;

pub use evaluator::ConditionEvaluator;
pub use node::{Condition, ConditionNode};
pub use operator::Operator;
pub use ops::temporal::BusinessHours;
