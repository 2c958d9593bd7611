pub mod balancing;
pub mod conflicts;
pub mod enrollment;
pub mod overrides;
