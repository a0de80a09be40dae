pub mod interpolate;
pub mod physics;


pub use interpolate::*;
pub use physics::*;
