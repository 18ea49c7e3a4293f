//! Component model: copy-on-extend member-table descriptors
//!
//! Feature controllers and their option tables are composed from member
//! tables rather than a class hierarchy. `Descriptor::extend` captures a
//! snapshot of the parent's members at extension time, so later extensions
//! of a parent can never retroactively alter already-extended children.
//! Static members are copied onto each descriptor, giving every descriptor
//! an independent but populated static namespace.
//!
//! Construction follows the constructor-as-initializer convention: if an
//! `initialize` method is defined, it runs during `construct`, and a value
//! it returns becomes the constructed result instead of the instance.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A method member: mutates the instance, optionally returns a value.
pub type MethodFn = Arc<dyn Fn(&mut Instance, &[Value]) -> Option<Value> + Send + Sync>;

/// One member of a descriptor: plain data or a named method.
#[derive(Clone)]
pub enum Member {
    Data(Value),
    Method(MethodFn),
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Member::Data(v) => write!(f, "Data({})", v),
            Member::Method(_) => write!(f, "Method(..)"),
        }
    }
}

/// Ordered member table.
pub type Members = BTreeMap<String, Member>;

/// Build a member table from a JSON object; non-objects yield an empty table.
pub fn members_from_value(value: &Value) -> Members {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), Member::Data(v.clone())))
            .collect(),
        _ => Members::new(),
    }
}

/// An immutable type descriptor produced by extension.
#[derive(Clone, Debug, Default)]
pub struct Descriptor {
    members: Members,
    statics: Members,
}

impl Descriptor {
    /// The empty root descriptor.
    pub fn base() -> Self {
        Self::default()
    }

    /// Derive a child descriptor.
    ///
    /// The child's instance members are a snapshot of the parent's merged
    /// with `members` (child wins on collision); statics are copied the same
    /// way onto the child's own static table. The parent is not mutated.
    pub fn extend(&self, members: Members, statics: Members) -> Descriptor {
        let mut merged = self.members.clone();
        merged.extend(members);

        let mut merged_statics = self.statics.clone();
        merged_statics.extend(statics);

        Descriptor {
            members: merged,
            statics: merged_statics,
        }
    }

    /// Like [`extend`](Self::extend), with an explicit parent reference.
    /// A missing parent is a malformed extension.
    pub fn extend_from(parent: Option<&Descriptor>, members: Members, statics: Members) -> Result<Descriptor> {
        match parent {
            Some(p) => Ok(p.extend(members, statics)),
            None => Err(Error::InvalidArgument("cannot extend a null descriptor".to_string())),
        }
    }

    /// Look up an instance member.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Look up a static member.
    pub fn static_member(&self, name: &str) -> Option<&Member> {
        self.statics.get(name)
    }

    /// Number of instance members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True iff the descriptor has no instance members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Build an instance and run its `initialize` method, if any.
    ///
    /// If `initialize` returns a value, that value is the constructed
    /// result; otherwise the instance itself is.
    pub fn construct(&self, args: &[Value]) -> Constructed {
        let mut fields = BTreeMap::new();
        let mut methods = BTreeMap::new();

        for (name, member) in &self.members {
            match member {
                Member::Data(v) => {
                    fields.insert(name.clone(), v.clone());
                }
                Member::Method(f) => {
                    methods.insert(name.clone(), Arc::clone(f));
                }
            }
        }

        let initializer = methods.get("initialize").cloned();
        let mut instance = Instance { fields, methods };

        if let Some(init) = initializer {
            if let Some(value) = init(&mut instance, args) {
                return Constructed::Value(value);
            }
        }

        Constructed::Instance(instance)
    }
}

/// A constructed component instance: field values plus callable methods.
pub struct Instance {
    fields: BTreeMap<String, Value>,
    methods: BTreeMap<String, MethodFn>,
}

impl Instance {
    /// Read a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Invoke a method by name; `None` if no such method exists.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Option<Value> {
        let method = self.methods.get(name).cloned()?;
        method(self, args)
    }

    /// Field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("fields", &self.fields)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Result of [`Descriptor::construct`].
pub enum Constructed {
    /// The instance itself
    Instance(Instance),
    /// The value returned by `initialize`
    Value(Value),
}

impl Constructed {
    /// The initializer's returned value, if construction produced one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Constructed::Value(v) => Some(v),
            Constructed::Instance(_) => None,
        }
    }

    /// The instance, if construction produced one.
    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Constructed::Instance(i) => Some(i),
            Constructed::Value(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(v: Value) -> Member {
        Member::Data(v)
    }

    #[test]
    fn extend_merges_and_child_wins() {
        let parent = Descriptor::base().extend(
            Members::from([
                ("volume".to_string(), data(json!(1.0))),
                ("speed".to_string(), data(json!(1.0))),
            ]),
            Members::new(),
        );
        let child = parent.extend(
            Members::from([("speed".to_string(), data(json!(1.5)))]),
            Members::new(),
        );

        assert!(matches!(child.member("volume"), Some(Member::Data(v)) if v == &json!(1.0)));
        assert!(matches!(child.member("speed"), Some(Member::Data(v)) if v == &json!(1.5)));
        assert!(matches!(parent.member("speed"), Some(Member::Data(v)) if v == &json!(1.0)));
    }

    #[test]
    fn extension_snapshots_parent_members() {
        let parent = Descriptor::base().extend(
            Members::from([("a".to_string(), data(json!(1)))]),
            Members::new(),
        );
        let child = parent.extend(Members::new(), Members::new());

        // A sibling derived later does not affect the earlier child.
        let _sibling = parent.extend(
            Members::from([("a".to_string(), data(json!(99)))]),
            Members::new(),
        );
        assert!(matches!(child.member("a"), Some(Member::Data(v)) if v == &json!(1)));
    }

    #[test]
    fn statics_are_copied_not_shared() {
        let parent = Descriptor::base().extend(
            Members::new(),
            Members::from([("kind".to_string(), data(json!("base")))]),
        );
        let child = parent.extend(
            Members::new(),
            Members::from([("extra".to_string(), data(json!(true)))]),
        );

        assert!(matches!(child.static_member("kind"), Some(Member::Data(v)) if v == &json!("base")));
        assert!(matches!(child.static_member("extra"), Some(Member::Data(_))));
        assert!(parent.static_member("extra").is_none());
    }

    #[test]
    fn extend_with_no_members_still_works() {
        let child = Descriptor::base().extend(Members::new(), Members::new());
        assert!(child.is_empty());
        assert!(child.construct(&[]).into_instance().is_some());
    }

    #[test]
    fn null_parent_is_rejected() {
        let err = Descriptor::extend_from(None, Members::new(), Members::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn initializer_return_value_becomes_the_constructed_value() {
        let init: MethodFn = Arc::new(|instance, args| {
            instance.set("configured", json!(true));
            args.first().cloned()
        });
        let descriptor = Descriptor::base().extend(
            Members::from([("initialize".to_string(), Member::Method(init))]),
            Members::new(),
        );

        let constructed = descriptor.construct(&[json!({"shared": "state"})]);
        assert_eq!(constructed.into_value(), Some(json!({"shared": "state"})));

        // Without arguments the initializer returns nothing and construction
        // yields the instance, with the initializer's writes applied.
        let instance = descriptor.construct(&[]).into_instance().unwrap();
        assert_eq!(instance.get("configured"), Some(&json!(true)));
    }
}
