use super::{Lazy, LazyOptions, Loader, ObjectType};
use crate::{stmt::Value, Error, Result};

use by_address::ByAddress;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

/// Shared handle to a mapped object.
///
/// Equality and hashing use the address of the object, not its contents: two
/// handles are equal when they point at the same instance. This is what lets
/// the mapping engine detect that a nested row resolved to an object it has
/// already built.
///
/// Circular graphs (a child pointing back at its parent) are reference
/// cycles and are not reclaimed when the last outside handle is dropped.
#[derive(Clone)]
pub struct ObjectRef(ByAddress<Arc<Shared>>);

struct Shared {
    ty: Arc<ObjectType>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    fields: IndexMap<String, Lazy>,

    /// Set once a deferred property has been installed
    lazy: Option<LazyOptions>,
}

impl ObjectRef {
    /// Creates an empty instance of `ty`.
    pub fn new(ty: Arc<ObjectType>) -> ObjectRef {
        ObjectRef(ByAddress(Arc::new(Shared {
            ty,
            state: Mutex::new(State::default()),
        })))
    }

    pub fn ty(&self) -> &Arc<ObjectType> {
        &self.0.ty
    }

    pub fn type_name(&self) -> &str {
        &self.0.ty.name
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Reads a property, loading it first if it is deferred.
    ///
    /// Unknown and unset properties read as null.
    pub fn get(&self, name: &str) -> Result<Value> {
        let aggressive = self
            .0
            .state
            .lock()
            .lazy
            .as_ref()
            .is_some_and(|lazy| lazy.aggressive);

        if aggressive {
            self.load_all()?;
        } else {
            self.load(name)?;
        }

        Ok(self.peek(name))
    }

    /// Reads a property without triggering a load. Deferred properties read
    /// as null.
    pub fn peek(&self, name: &str) -> Value {
        self.0
            .state
            .lock()
            .fields
            .get(name)
            .and_then(Lazy::as_loaded)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.state.lock().fields.contains_key(name)
    }

    /// Writes a property, discarding any pending loader for it.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.0
            .state
            .lock()
            .fields
            .insert(name.to_string(), Lazy::Loaded(value.into()));
    }

    /// Appends to a list property, creating the list on first use.
    pub fn push(&self, name: &str, value: Value) -> Result<()> {
        let mut state = self.0.state.lock();
        let cell = state
            .fields
            .entry(name.to_string())
            .or_insert(Lazy::Loaded(Value::Null));

        match cell {
            Lazy::Loaded(Value::List(items)) => items.push(value),
            Lazy::Loaded(slot @ Value::Null) => *slot = Value::List(vec![value]),
            Lazy::Loaded(other) => {
                return Err(Error::type_conversion(other.clone(), "List"));
            }
            Lazy::Deferred(_) => {
                return Err(Error::invalid_state(format!(
                    "cannot append to deferred property `{name}` of `{}`",
                    self.type_name()
                )));
            }
        }

        Ok(())
    }

    /// Installs a loader for a property. The property reads as null through
    /// [`peek`](Self::peek) until it is loaded.
    pub fn set_deferred(&self, name: &str, loader: Loader, options: &LazyOptions) {
        let mut state = self.0.state.lock();
        state
            .fields
            .insert(name.to_string(), Lazy::Deferred(loader));
        if state.lazy.is_none() {
            state.lazy = Some(options.clone());
        }
    }

    pub fn is_deferred(&self, name: &str) -> bool {
        matches!(self.0.state.lock().fields.get(name), Some(Lazy::Deferred(_)))
    }

    pub fn deferred_properties(&self) -> Vec<String> {
        self.0
            .state
            .lock()
            .fields
            .iter()
            .filter(|(_, cell)| !cell.is_loaded())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Runs the loader of a deferred property and stores the result.
    pub fn load(&self, name: &str) -> Result<()> {
        // Clone the loader out so the lock is not held while it runs; the
        // loader may map rows that point back at this object.
        let loader = match self.0.state.lock().fields.get(name) {
            Some(Lazy::Deferred(loader)) => loader.clone(),
            _ => return Ok(()),
        };

        tracing::trace!(ty = %self.type_name(), property = name, "loading deferred property");
        let value = loader.load()?;

        let mut state = self.0.state.lock();
        if let Some(cell @ Lazy::Deferred(_)) = state.fields.get_mut(name) {
            *cell = Lazy::Loaded(value);
        }

        Ok(())
    }

    pub fn load_all(&self) -> Result<()> {
        for name in self.deferred_properties() {
            self.load(&name)?;
        }
        Ok(())
    }

    /// Notifies the object that a method is being called on it. Trigger
    /// methods load every deferred property.
    pub fn invoke(&self, method: &str) -> Result<()> {
        let trigger = self
            .0
            .state
            .lock()
            .lazy
            .as_ref()
            .is_some_and(|lazy| lazy.is_trigger(method));

        if trigger {
            tracing::trace!(ty = %self.type_name(), method, "trigger method loads deferred properties");
            self.load_all()?;
        }
        Ok(())
    }

    /// Names of the properties that have been written or deferred.
    pub fn property_names(&self) -> Vec<String> {
        self.0.state.lock().fields.keys().cloned().collect()
    }

    /// Loaded property values, in the order they were first written.
    pub fn loaded_values(&self) -> Vec<(String, Value)> {
        self.0
            .state
            .lock()
            .fields
            .iter()
            .filter_map(|(name, cell)| Some((name.clone(), cell.as_loaded()?.clone())))
            .collect()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for ObjectRef {}

impl std::hash::Hash for ObjectRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.type_name(), Arc::as_ptr(&self.0))
    }
}

// Nested objects print through `Display`, so cyclic graphs stay printable.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(state) = self.0.state.try_lock() else {
            return write!(f, "{} {{ <locked> }}", self.type_name());
        };

        let mut s = f.debug_struct(self.type_name());
        for (name, cell) in &state.fields {
            match cell {
                Lazy::Loaded(value) => s.field(name, &format_args!("{value}")),
                Lazy::Deferred(_) => s.field(name, &format_args!("<deferred>")),
            };
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Type;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn blog() -> ObjectRef {
        ObjectRef::new(Arc::new(
            ObjectType::bean("Blog")
                .property("id", Type::I64)
                .property("posts", Type::list(Type::object("Post"))),
        ))
    }

    #[test]
    fn identity_is_by_address() {
        let a = blog();
        let b = blog();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn push_creates_list() {
        let blog = blog();
        blog.push("posts", Value::I64(1)).unwrap();
        blog.push("posts", Value::I64(2)).unwrap();
        assert_eq!(
            blog.peek("posts"),
            Value::List(vec![Value::I64(1), Value::I64(2)])
        );
    }

    #[test]
    fn deferred_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let blog = blog();

        let counter = calls.clone();
        blog.set_deferred(
            "posts",
            Loader::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::List(vec![]))
            }),
            &LazyOptions::default(),
        );

        assert!(blog.peek("posts").is_null());
        assert_eq!(blog.get("posts").unwrap(), Value::List(vec![]));
        assert_eq!(blog.get("posts").unwrap(), Value::List(vec![]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!blog.is_deferred("posts"));
    }

    #[test]
    fn aggressive_loads_everything() {
        let blog = blog();
        let options = LazyOptions {
            aggressive: true,
            ..LazyOptions::default()
        };
        blog.set_deferred("posts", Loader::new(|| Ok(Value::I64(7))), &options);

        blog.get("id").unwrap();
        assert_eq!(blog.peek("posts"), Value::I64(7));
    }

    #[test]
    fn trigger_method_loads_everything() {
        let blog = blog();
        let options = LazyOptions {
            aggressive: false,
            trigger_methods: vec!["toString".to_string()],
        };
        blog.set_deferred("posts", Loader::new(|| Ok(Value::I64(7))), &options);

        blog.invoke("getId").unwrap();
        assert!(blog.is_deferred("posts"));
        blog.invoke("toString").unwrap();
        assert!(!blog.is_deferred("posts"));
    }

    #[test]
    fn loader_may_reenter_object() {
        let blog = blog();
        let inner = blog.clone();
        blog.set_deferred(
            "posts",
            Loader::new(move || {
                inner.set("id", 5_i64);
                Ok(Value::Null)
            }),
            &LazyOptions::default(),
        );

        blog.get("posts").unwrap();
        assert_eq!(blog.peek("id"), Value::I64(5));
    }

    #[test]
    fn debug_is_shallow_for_cycles() {
        let blog = blog();
        blog.set("self", blog.clone());
        let text = format!("{blog:?}");
        assert!(text.starts_with("Blog { self: Blog@"), "{text}");
    }
}
