//! The builder's conservative/aggressive mode flag.

/// In [`BuilderMode::Conservative`], generators whose outputs are hard to
/// type-track (spreads, destructuring-in-for-of) self-disable. Program
/// templates run in conservative mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderMode {
    #[default]
    Conservative,
    Aggressive,
}

impl BuilderMode {
    pub fn is_conservative(self) -> bool {
        matches!(self, BuilderMode::Conservative)
    }
}
