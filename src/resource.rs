use serde::{Deserialize, Serialize};

/// A resource (person, crew, equipment) with a daily capacity, supplied by
/// the resource-management collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    /// Units of work the resource can absorb per working day.
    pub capacity: f64,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
        }
    }
}

/// Assignment of a resource to a task for a total amount of work, spread
/// evenly over the task's working days by the leveling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub resource_id: String,
    /// Total planned units for the whole task (e.g. FTE-days). Non-negative.
    pub work_units: f64,
}

impl ResourceAssignment {
    pub fn new(resource_id: impl Into<String>, work_units: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            work_units,
        }
    }
}
