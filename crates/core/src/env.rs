use serde::{Deserialize, Serialize};

/// Execution context a task asks to run under.
///
/// Carried on every task as advisory metadata. The scheduler does not route
/// on it yet; executors may read it once environment-aware dispatch lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnvDescr {
    /// Any already-running environment will do.
    #[default]
    AnyEnvironment = 0,
    /// A freshly provisioned environment.
    NewEnvironment = 1,
}

/// Number of environment kinds. Reserved sentinel, never a valid tag.
pub const ENVIRONMENTS_COUNT: usize = 2;

impl EnvDescr {
    pub const ALL: [EnvDescr; ENVIRONMENTS_COUNT] =
        [EnvDescr::AnyEnvironment, EnvDescr::NewEnvironment];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for EnvDescr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvDescr::AnyEnvironment => write!(f, "AnyEnvironment"),
            EnvDescr::NewEnvironment => write!(f, "NewEnvironment"),
        }
    }
}
