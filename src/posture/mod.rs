pub mod data;
pub mod posturesystem;
