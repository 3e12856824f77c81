pub mod actuator;
pub mod files;
