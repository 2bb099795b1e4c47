//! Hash-backed records whose field accessors are cached per class.

use std::{
    cell::RefCell,
    fmt,
    hash::{DefaultHasher, Hash, Hasher},
    sync::{Arc, RwLock},
};

use indexmap::IndexMap;

use crate::{conditions::Condition, fields::FieldName, shape::Shape, value::Value};

type Table = IndexMap<FieldName, Value>;

struct RecordInner {
    table: Table,
    frozen: bool,
}

/// A dynamic record: an insertion-ordered map from interned field names to
/// [`Value`]s, tied to the [`Shape`] it was created from.
///
/// The first `set` of a field name materializes its accessor pair on the
/// shape, where it is shared by every instance of that class; the field's
/// presence in this record's own table stays an instance-level, mutable
/// matter. Deleting a field never unregisters its accessors.
///
/// `Record` is a cheap-clone handle; clones alias the same record. Use
/// [`Record::duplicate`] for an independent copy.
#[derive(Clone)]
pub struct Record {
    shape: Arc<Shape>,
    inner: Arc<RwLock<RecordInner>>,
}

impl Record {
    pub fn new() -> Self {
        Self::with_shape(&Shape::base())
    }

    pub fn with_shape(shape: &Arc<Shape>) -> Self {
        Self {
            shape: shape.clone(),
            inner: Arc::new(RwLock::new(RecordInner {
                table: Table::new(),
                frozen: false,
            })),
        }
    }

    /// Build a record of the base class from any pair source: a plain
    /// key/value sequence, or another record via [`Record::pairs`]. Each key
    /// is normalized and its accessors materialized. The resulting table is
    /// independent of the source.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<FieldName>,
        V: Into<Value>,
    {
        Self::from_pairs_with_shape(&Shape::base(), pairs)
    }

    pub fn from_pairs_with_shape<K, V>(
        shape: &Arc<Shape>,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<FieldName>,
        V: Into<Value>,
    {
        let record = Self::with_shape(shape);
        {
            let mut inner = record.inner.write().unwrap();
            for (key, value) in pairs {
                let key = key.into();
                shape.materialize(key);
                inner.table.insert(key, value.into());
            }
        }
        record
    }

    /// An independent copy: same class, cloned table, never frozen.
    pub fn duplicate(&self) -> Self {
        let inner = self.inner.read().unwrap();
        Self {
            shape: self.shape.clone(),
            inner: Arc::new(RwLock::new(RecordInner {
                table: inner.table.clone(),
                frozen: false,
            })),
        }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Read a field. Returns [`Value::Nil`] for a field that was never set
    /// or has been deleted; never fails, even for names with no registered
    /// accessor. Reads are always permitted, frozen or not.
    pub fn get(&self, name: impl Into<FieldName>) -> Value {
        let name = name.into();
        let inner = self.inner.read().unwrap();
        inner.table.get(&name).cloned().unwrap_or(Value::Nil)
    }

    /// Write a field, materializing its accessors on the shape if this name
    /// has not been seen there before.
    ///
    /// The frozen check comes first: a rejected write must not register an
    /// accessor on the shared shape.
    pub fn set(
        &self,
        name: impl Into<FieldName>,
        value: impl Into<Value>,
    ) -> Result<(), Condition> {
        let name = name.into();
        let mut inner = self.inner.write().unwrap();
        if inner.frozen {
            return Err(Condition::modify_frozen(self.shape.name()));
        }
        self.shape.materialize(name);
        inner.table.insert(name, value.into());
        Ok(())
    }

    /// Remove a field from the table, returning its value ([`Value::Nil`]
    /// if absent). The field's accessors stay registered on the shape: a
    /// later read yields `Nil` and a later `set` re-adds the field.
    pub fn delete_field(&self, name: impl Into<FieldName>) -> Result<Value, Condition> {
        let name = name.into();
        let mut inner = self.inner.write().unwrap();
        if inner.frozen {
            return Err(Condition::modify_frozen(self.shape.name()));
        }
        Ok(inner.table.shift_remove(&name).unwrap_or(Value::Nil))
    }

    pub fn contains_field(&self, name: impl Into<FieldName>) -> bool {
        let name = name.into();
        self.inner.read().unwrap().table.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().table.is_empty()
    }

    /// One-way. A frozen record rejects every subsequent mutation while
    /// still permitting reads.
    pub fn freeze(&self) {
        self.inner.write().unwrap().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.read().unwrap().frozen
    }

    /// An independent copy of the current field table. Mutating the copy
    /// never affects the record.
    pub fn to_table(&self) -> Table {
        self.inner.read().unwrap().table.clone()
    }

    /// A lazy, restartable iterator over `(field, value)` pairs in
    /// insertion order. Reads the live table, one index per step.
    pub fn pairs(&self) -> Pairs {
        Pairs {
            record: self.clone(),
            index: 0,
        }
    }

    /// Serialization hook: the raw field table for host serialization
    /// frameworks.
    pub fn marshal_dump(&self) -> Table {
        self.to_table()
    }

    /// Restore from a dumped table, replacing the current one wholesale and
    /// re-registering accessors for every restored key.
    pub fn marshal_load(&self, table: Table) -> Result<(), Condition> {
        let mut inner = self.inner.write().unwrap();
        if inner.frozen {
            return Err(Condition::modify_frozen(self.shape.name()));
        }
        for field in table.keys() {
            self.shape.materialize(*field);
        }
        inner.table = table;
        Ok(())
    }

    /// True iff this record's class has materialized accessors for the
    /// field, in either its getter (`"age"`) or setter (`"age="`) spelling.
    /// The field need not be present in this record's own table.
    pub fn responds_to(&self, name: &str) -> bool {
        let base = name.strip_suffix('=').unwrap_or(name);
        FieldName::lookup(base).is_some_and(|field| self.shape.knows(field))
    }

    /// Dynamic dispatch fallback for accessor-style calls by name.
    ///
    /// A name ending in `=` is a setter call and requires exactly one
    /// argument; it performs [`Record::set`] and returns the assigned
    /// value. A bare name with no arguments is a getter call and behaves as
    /// [`Record::get`], registering nothing. Anything else is an undefined
    /// operation.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, Condition> {
        if let Some(base) = name.strip_suffix('=') {
            if args.len() != 1 {
                return Err(Condition::wrong_number_of_arguments(1, args.len()));
            }
            self.set(base, args[0].clone())?;
            Ok(args[0].clone())
        } else if args.is_empty() {
            Ok(self.get(name))
        } else {
            Err(Condition::undefined_operation(name, args, self.to_string()))
        }
    }

    /// Loose equality by shared comparator; see `PartialEq` and
    /// [`Record::eql`].
    ///
    /// Cycle-safe: a record pair already being compared further up the
    /// current call stack is presumed equal, so structurally identical
    /// cycles terminate with the outer comparison deciding the result.
    fn compare(&self, other: &Self, value_eq: fn(&Value, &Value) -> bool) -> bool {
        if !Arc::ptr_eq(&self.shape, &other.shape) {
            return false;
        }
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let pair = (
            Arc::as_ptr(&self.inner) as usize,
            Arc::as_ptr(&other.inner) as usize,
        );
        let in_progress = COMPARING.with(|pairs| {
            let mut pairs = pairs.borrow_mut();
            if pairs.contains(&pair) {
                true
            } else {
                pairs.push(pair);
                false
            }
        });
        if in_progress {
            return true;
        }
        let result = {
            let a = self.inner.read().unwrap();
            let b = other.inner.read().unwrap();
            a.table.len() == b.table.len()
                && a.table
                    .iter()
                    .all(|(k, v)| b.table.get(k).is_some_and(|w| value_eq(v, w)))
        };
        COMPARING.with(|pairs| {
            pairs.borrow_mut().pop();
        });
        result
    }

    /// Strict equality: exact same class and tables equal with no numeric
    /// coercion. This is the relation `Hash` is consistent with; loose `==`
    /// is deliberately not.
    pub fn eql(&self, other: &Self) -> bool {
        self.compare(other, Value::strict_eq)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// Loose equality: exact same class (shape identity) and tables equal by
/// value, with numeric cross-type comparison permitted. Insertion order is
/// irrelevant.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, Value::loose_eq)
    }
}

/// A value hash over the field table alone; the shape does not participate.
///
/// Consistent with [`Record::eql`], intentionally NOT with `==`: loosely
/// equal records holding `Int(70)` and `Float(70.0)` hash differently.
/// Order-independent, since equality ignores insertion order.
///
/// Cycle-safe: a record already being hashed further up the current call
/// stack contributes a fixed sentinel instead of recursing.
impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let id = Arc::as_ptr(&self.inner) as usize;
        let in_progress = HASHING.with(|ids| {
            let mut ids = ids.borrow_mut();
            if ids.contains(&id) {
                true
            } else {
                ids.push(id);
                false
            }
        });
        if in_progress {
            u64::MAX.hash(state);
            return;
        }
        let inner = self.inner.read().unwrap();
        let mut acc: u64 = 0;
        for (k, v) in &inner.table {
            let mut h = DefaultHasher::new();
            k.hash(&mut h);
            v.hash(&mut h);
            acc ^= h.finish();
        }
        inner.table.len().hash(state);
        acc.hash(state);
        HASHING.with(|ids| {
            ids.borrow_mut().pop();
        });
    }
}

thread_local! {
    /// Identities of records currently being rendered on this call stack.
    static INSPECTING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    /// Record pairs currently being compared on this call stack.
    static COMPARING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
    /// Identities of records currently being hashed on this call stack.
    static HASHING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Renders `#<ShapeName field1=val1, field2=val2>` in insertion order.
///
/// Cycle-safe: a record already being rendered further up the current call
/// stack renders as `#<ShapeName ...>`, so self-referential structures
/// terminate.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = Arc::as_ptr(&self.inner) as usize;
        let in_progress = INSPECTING.with(|ids| {
            let mut ids = ids.borrow_mut();
            if ids.contains(&id) {
                true
            } else {
                ids.push(id);
                false
            }
        });
        if in_progress {
            return write!(f, "#<{} ...>", self.shape.name());
        }
        let result = (|| {
            write!(f, "#<{}", self.shape.name())?;
            let inner = self.inner.read().unwrap();
            let mut first = true;
            for (k, v) in &inner.table {
                if first {
                    write!(f, " {k}={v}")?;
                    first = false;
                } else {
                    write!(f, ", {k}={v}")?;
                }
            }
            write!(f, ">")
        })();
        INSPECTING.with(|ids| {
            ids.borrow_mut().pop();
        });
        result
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Iterator returned by [`Record::pairs`].
pub struct Pairs {
    record: Record,
    index: usize,
}

impl Iterator for Pairs {
    type Item = (FieldName, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.record.inner.read().unwrap();
        let (k, v) = inner.table.get_index(self.index)?;
        self.index += 1;
        Some((*k, v.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .record
            .inner
            .read()
            .unwrap()
            .table
            .len()
            .saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pairs {}
