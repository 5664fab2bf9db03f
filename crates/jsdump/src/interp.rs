//! The narrow interface the dump engine is generic over (§6).
//!
//! The interpreter itself — object/primitive model, scope chain, builtins
//! registry — is assumed to exist and is consumed only through these traits.
//! The engine never mutates the live heap.

use std::fmt;

/// Identity of a live object in the interpreter's heap. Two `ObjectId`s
/// compare equal iff they name the same object; the serializer uses this as
/// a map key to detect shared references and cycles.
pub trait ObjectId: Copy + Eq + std::hash::Hash + fmt::Debug {}
impl<T: Copy + Eq + std::hash::Hash + fmt::Debug> ObjectId for T {}

/// A privileged owner identity for property reads, e.g. the `ROOT` owner
/// that bypasses any access-control the host interpreter layers over plain
/// property access.
pub trait OwnerId: Copy + fmt::Debug {}
impl<T: Copy + fmt::Debug> OwnerId for T {}

/// A live value: a primitive or a reference to a live object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<Id> {
    Undefined,
    Null,
    Boolean(bool),
    /// IEEE-754 double. `NaN`/`Infinity`/`-0.0` are all valid and handled
    /// specially by the serializer (§4.4).
    Number(f64),
    Object(Id),
}

/// String values are carried separately from `Value` since they own a
/// buffer; interpreters are free to store `Value::Str` however they like and
/// the trait boundary only ever hands the engine a borrowed `&str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsString(pub String);

/// Either a `Value` or an owned string, since strings are not `Copy`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue<Id> {
    Value(Value<Id>),
    Str(String),
}

/// The internal "class" of an `InterpreterObject` (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectClass {
    PlainObject,
    Array,
    /// `user_defined` distinguishes a guest-script function (whose `source`
    /// is re-emittable verbatim) from a host-native function (always a
    /// `SerializerError`, §4.4 case 4).
    Function { user_defined: bool, source: Option<String> },
    Date { epoch_millis: f64 },
    RegExp { pattern: String, flags: String },
    /// A guest-defined class instance with no further intrinsic data beyond
    /// its prototype and own-properties; constructed the same way as a
    /// plain object (§4.4 case 4).
    UserDefined,
}

/// `{value, owner, writable, enumerable, configurable, readable, inheritedOwnership}` (§3).
///
/// All six boolean/owner attributes are preserved across dump/reload.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor<Id, Owner> {
    pub value: AnyValue<Id>,
    pub owner: Owner,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    pub readable: bool,
    pub inherited_ownership: bool,
}

impl<Id, Owner> PropertyDescriptor<Id, Owner> {
    /// True when every attribute matches the engine's own default
    /// (writable/enumerable/configurable/readable = true, inheritedOwnership
    /// = false) and so needs no `Object.defineProperty` finalization (§4.6).
    #[must_use]
    pub fn is_default_shape(&self) -> bool {
        self.writable && self.enumerable && self.configurable && self.readable && !self.inherited_ownership
    }
}

/// A lexical scope: the global scope, or an enclosing function/block scope.
pub trait Scope<Id> {
    fn get(&self, name: &str) -> Option<AnyValue<Id>>;
    fn has_binding(&self, name: &str) -> bool;
    fn outer_scope(&self) -> Option<&dyn Scope<Id>>;
    /// Variable names in declaration order.
    fn variable_names(&self) -> Vec<String>;
}

/// A live heap object.
pub trait InterpreterObject<Id, Owner> {
    fn id(&self) -> Id;
    fn proto(&self) -> Option<Id>;
    fn class(&self) -> ObjectClass;
    fn get(&self, key: &str, owner: Owner) -> Option<AnyValue<Id>>;
    /// Own-property keys in insertion order.
    fn own_property_keys(&self) -> Vec<String>;
    fn get_own_property_descriptor(&self, key: &str) -> Option<PropertyDescriptor<Id, Owner>>;
}

/// The interpreter collaborator (§6).
pub trait Interpreter<Id, Owner> {
    fn global_scope(&self) -> &dyn Scope<Id>;
    fn root_owner(&self) -> Owner;
    fn object(&self, id: Id) -> &dyn InterpreterObject<Id, Owner>;
    /// A stable string for a built-in object, or `None` for an ordinary one (§4.4 case 3).
    fn builtin_key(&self, id: Id) -> Option<String>;
    /// The default `Object.prototype` discriminant, used by `toExpr` to pick
    /// between `{}` and `Object.create(proto)` (§4.4 case 4).
    fn object_prototype(&self) -> Id;
}
