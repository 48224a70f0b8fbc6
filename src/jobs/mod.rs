pub mod behavior;
pub mod data;
pub mod jobsystem;
