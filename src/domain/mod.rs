// Domain layer: records, geocoding results, outcomes and the ports the engine consumes.

pub mod model;
pub mod ports;
