mod doctor;
mod serve;

pub use doctor::doctor;
pub use serve::serve;
