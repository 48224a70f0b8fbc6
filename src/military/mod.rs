pub mod threatmap;
