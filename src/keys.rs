/// Store keys for one job type.
///
/// Every persisted fact about a job lives under exactly three string keys,
/// all derived from the caller-supplied job-type name. Two job types never
/// collide as long as their names differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeys {
    /// Opaque scheduler-assigned trigger id; absent when nothing is armed.
    pub trigger_id: String,
    /// Decimal next-iteration index; absent means 1.
    pub next_iteration: String,
    /// Serialized `JobSettings` record.
    pub settings: String,
}

impl PropertyKeys {
    pub fn for_job_type(job_type: &str) -> Self {
        Self {
            trigger_id: format!("{job_type}TriggerId"),
            next_iteration: format!("{job_type}NextIteration"),
            settings: format!("{job_type}Settings"),
        }
    }
}
