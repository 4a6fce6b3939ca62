//! User-defined variables
//!
//! Holds the variable namespace, the template evaluator used for every
//! interpolated string, command substitution and namespace resolution.

pub mod namespace;
pub mod resolve;
pub mod substitute;
pub mod template;

// Re-export main types
pub use namespace::*;
pub use resolve::*;
pub use substitute::*;
pub use template::*;
