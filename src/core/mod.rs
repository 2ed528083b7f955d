pub(crate) mod config;
pub(crate) mod signals;
pub(crate) mod telemetry;
pub(crate) mod time;
