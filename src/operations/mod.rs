pub mod overmind;
pub mod overmindsystem;
