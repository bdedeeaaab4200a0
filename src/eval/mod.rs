// Mon Oct 12 2026 - Alex

pub mod evaluator;
pub mod hash;
pub mod scalar;
pub mod value;

pub use evaluator::{coerce, literal, CastTarget, EmptyScope, EvalIssue, Evaluator, Lookup, ValueScope};
pub use hash::{fnv1a_32, fnv1a_64, Intrinsic};
pub use scalar::ScalarType;
pub use value::{IntType, IntValue, ResolvedValue};
