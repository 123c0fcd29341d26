pub mod doctor;
pub mod hospital_tool;
pub mod location;
pub mod medicine;

pub use doctor::Doctor;
pub use hospital_tool::{Complexity, HospitalTool};
pub use location::Location;
pub use medicine::Medicine;
