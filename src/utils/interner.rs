//! Identifier interner
//!
//! Parameter, part and drawable names are interned into compact [`CubismId`]
//! handles so that per-frame lookups compare integers instead of strings.
//!
//! Unlike a process-wide interner, [`IdManager`] is an explicit handle: the
//! [`Framework`](crate::runtime::Framework) owns one and clones of it are
//! handed to every model and parser that needs to resolve names. All clones
//! share the same registry, which only ever grows.

use std::fmt;
use std::sync::Arc;

use lasso::{Spur, ThreadedRodeo};

/// Interned identifier of a parameter, part or drawable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubismId(Spur);

impl fmt::Debug for CubismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CubismId({:?})", self.0)
    }
}

pub type ParameterId = CubismId;
pub type PartId = CubismId;
pub type DrawableId = CubismId;

/// Shared id registry.
#[derive(Clone, Default)]
pub struct IdManager {
    rodeo: Arc<ThreadedRodeo>,
}

impl IdManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning the existing id if it was seen before.
    #[inline]
    pub fn id(&self, name: &str) -> CubismId {
        CubismId(self.rodeo.get_or_intern(name))
    }

    /// Looks up `name` without registering it.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CubismId> {
        self.rodeo.get(name).map(CubismId)
    }

    /// Resolves an id back to its string.
    #[inline]
    #[must_use]
    pub fn resolve(&self, id: CubismId) -> &str {
        self.rodeo.resolve(&id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Interns the standard parameter names used by the runtime.
    pub fn preload_standard_ids(&self) {
        for name in crate::runtime::ids::STANDARD_IDS {
            self.id(name);
        }
    }
}

impl fmt::Debug for IdManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdManager").field("len", &self.len()).finish()
    }
}
