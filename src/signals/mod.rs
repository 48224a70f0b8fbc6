pub mod field;
pub mod signalsystem;
