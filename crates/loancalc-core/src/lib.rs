pub mod amortization;
pub mod error;
pub mod types;
pub mod widget;

pub use error::LoanCalcError;
pub use types::*;

/// Standard result type for all loancalc operations
pub type LoanCalcResult<T> = Result<T, LoanCalcError>;
