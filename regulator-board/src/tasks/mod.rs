pub mod sampling_task;
pub mod telemetry_task;
