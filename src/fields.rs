//! Interned field names.

use std::{
    fmt,
    sync::{Arc, LazyLock, RwLock},
};

use indexmap::IndexSet;

/// A canonical field identifier.
///
/// Every spelling of a field name collapses to a single interned id, so
/// `"age"` interned from a `&str`, a `String`, or re-interned later all
/// resolve to the same key. Field tables and accessor registries store these
/// ids rather than strings.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldName(pub(crate) u32);

static FIELDTAB: LazyLock<RwLock<IndexSet<Arc<str>>>> =
    LazyLock::new(|| RwLock::new(IndexSet::new()));

impl FieldName {
    pub fn intern(s: &str) -> Self {
        let mut tab = FIELDTAB.write().unwrap();
        let id = if let Some(id) = tab.get_index_of(s) {
            id
        } else {
            let (id, _) = tab.insert_full(Arc::from(s));
            id
        };
        Self(id.try_into().unwrap())
    }

    /// Resolve a name without interning it. Lets negative reflection queries
    /// avoid growing the table.
    pub fn lookup(s: &str) -> Option<Self> {
        let tab = FIELDTAB.read().unwrap();
        tab.get_index_of(s).map(|id| Self(id as u32))
    }

    pub fn to_str(self) -> Arc<str> {
        let tab = FIELDTAB.read().unwrap();
        tab[self.0 as usize].clone()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl From<&str> for FieldName {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl From<String> for FieldName {
    fn from(s: String) -> Self {
        Self::intern(&s)
    }
}

impl PartialEq<&'_ str> for FieldName {
    fn eq(&self, rhs: &&str) -> bool {
        self.to_str().as_ref() == *rhs
    }
}
