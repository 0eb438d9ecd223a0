//! Internal representation of the SQL we send to the engine, and its conversion to text.

pub mod ast;
pub mod convert;
pub mod execution_plan;
pub mod helpers;
pub mod string;
