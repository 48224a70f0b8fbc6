pub mod createroomsystem;
pub mod data;
pub mod observation;
pub mod updateroomsystem;
