use serde::Serialize;

/// Load state of a lazily initialized store.
///
/// `Loading` is only observable by subscribers; concurrent `initialize` calls
/// queue behind the store's init lock instead of issuing a second fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl Lifecycle {
    pub fn is_ready(self) -> bool {
        self == Lifecycle::Ready
    }
}
