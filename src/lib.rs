pub mod academic;
pub mod ast;
pub mod error;
pub mod functions;
pub mod schedule;
pub mod scientific;
pub mod store;

pub use ast::AngleMode;
pub use error::CalcError;
pub use scientific::{evaluate, format_number, Calculator};
