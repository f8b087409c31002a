use thiserror::Error;

/// Invalid construction parameters; fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("machine id {0} out of range 0-255")]
    MachineIdOutOfRange(u32),
}
