// Domain layer: registry models and the seams to the outside world.

pub mod model;
pub mod ports;
