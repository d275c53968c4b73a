pub mod month;
pub mod observation;
pub mod station;
pub mod window;
