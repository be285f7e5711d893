//! Grading of player queries.
//!
//! - [`FloorSpec`] - how a floor judges queries
//! - [`QueryValidator`] - applies a floor's strategy to a query
//! - [`ResultNormalizer`] - order and alias insensitive result comparison
//! - [`Diagnostics`] - structure for explaining a failed attempt

pub mod diagnostics;
pub mod floor;
pub mod normalize;
pub mod validator;

pub use diagnostics::Diagnostics;
pub use floor::{FloorSpec, GradingStrategy, SpecialValidation};
pub use normalize::{CanonicalRow, ResultNormalizer};
pub use validator::{GradeReport, QueryValidator, validate};
