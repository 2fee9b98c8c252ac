pub mod cem;
pub mod control_type;
pub mod measurements;
pub mod schedule;
pub mod sensor;
pub mod time;
