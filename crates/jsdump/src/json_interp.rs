//! A JSON-backed `Interpreter` (§4.8): the engine's reference collaborator
//! and the CLI's input format. Not part of the dump algorithm itself.
//!
//! Conversion from `serde_json::Value` is done by hand, matching the
//! teacher's own `Object::from_json_value`/`to_json_value` style rather than
//! deriving typed wire structs — the snapshot format is loosely typed JSON
//! (a `$ref`/`$undefined` tagged union for values) that doesn't map cleanly
//! onto a derived enum.

use std::fmt;

use ahash::AHashMap;
use indexmap::IndexMap;
use serde_json::Value as JV;

use crate::interp::{AnyValue, Interpreter, InterpreterObject, ObjectClass, PropertyDescriptor, Scope, Value};

/// Identity of an object within one loaded snapshot: the index at which its
/// `"objects"` key was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JsonObjectId(u32);

/// Identity of an owner string within one loaded snapshot, interned the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JsonOwnerId(u32);

#[derive(Debug)]
pub enum JsonInterpreterError {
    NotAnObject(&'static str),
    MissingField(&'static str),
    WrongType { field: &'static str, expected: &'static str },
    UnknownRef(String),
    UnknownClassKind(String),
    Parse(serde_json::Error),
}

impl fmt::Display for JsonInterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject(where_) => write!(f, "{where_} must be a JSON object"),
            Self::MissingField(name) => write!(f, "missing required field {name:?}"),
            Self::WrongType { field, expected } => write!(f, "field {field:?} must be {expected}"),
            Self::UnknownRef(id) => write!(f, "$ref {id:?} names no entry in \"objects\""),
            Self::UnknownClassKind(kind) => write!(f, "unknown object class kind {kind:?}"),
            Self::Parse(err) => write!(f, "invalid JSON: {err}"),
        }
    }
}

impl std::error::Error for JsonInterpreterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for JsonInterpreterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

struct JsonObject {
    id: JsonObjectId,
    proto: Option<JsonObjectId>,
    class: ObjectClass,
    builtin: Option<String>,
    properties: IndexMap<String, PropertyDescriptor<JsonObjectId, JsonOwnerId>>,
}

struct JsonScope {
    bindings: IndexMap<String, AnyValue<JsonObjectId>>,
}

impl Scope<JsonObjectId> for JsonScope {
    fn get(&self, name: &str) -> Option<AnyValue<JsonObjectId>> {
        self.bindings.get(name).cloned()
    }

    fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn outer_scope(&self) -> Option<&dyn Scope<JsonObjectId>> {
        None
    }

    fn variable_names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

impl InterpreterObject<JsonObjectId, JsonOwnerId> for JsonObject {
    fn id(&self) -> JsonObjectId {
        self.id
    }

    fn proto(&self) -> Option<JsonObjectId> {
        self.proto
    }

    fn class(&self) -> ObjectClass {
        self.class.clone()
    }

    fn get(&self, key: &str, _owner: JsonOwnerId) -> Option<AnyValue<JsonObjectId>> {
        // This reference backend implements no access-control layer, so
        // `owner` never restricts a read the way a real host might.
        self.properties.get(key).map(|d| d.value.clone())
    }

    fn own_property_keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn get_own_property_descriptor(&self, key: &str) -> Option<PropertyDescriptor<JsonObjectId, JsonOwnerId>> {
        self.properties.get(key).cloned()
    }
}

/// A loaded heap snapshot: `{"global": {...}, "objects": {...}, "objectPrototype": "<id>"}`,
/// with an optional top-level `"rootOwner"` (default `"root"`).
pub struct JsonInterpreter {
    global: JsonScope,
    objects: AHashMap<JsonObjectId, JsonObject>,
    object_prototype: JsonObjectId,
    root_owner: JsonOwnerId,
}

impl JsonInterpreter {
    /// Parses and loads a heap snapshot document.
    ///
    /// # Errors
    /// `JsonInterpreterError` if the document is malformed: wrong shape,
    /// missing required fields, or a `$ref`/`proto`/`objectPrototype` naming
    /// an object id absent from `"objects"`.
    pub fn load(json_text: &str) -> Result<Self, JsonInterpreterError> {
        let root: JV = serde_json::from_str(json_text)?;
        let root = root.as_object().ok_or(JsonInterpreterError::NotAnObject("the document root"))?;

        let objects_json =
            root.get("objects").and_then(JV::as_object).ok_or(JsonInterpreterError::MissingField("objects"))?;

        let mut ids = AHashMap::default();
        for (index, key) in objects_json.keys().enumerate() {
            ids.insert(key.clone(), JsonObjectId(u32::try_from(index).expect("snapshot has fewer than u32::MAX objects")));
        }

        let mut owner_ids: AHashMap<String, JsonOwnerId> = AHashMap::default();
        let mut next_owner = 0u32;
        let mut intern_owner = move |name: &str, owner_ids: &mut AHashMap<String, JsonOwnerId>| -> JsonOwnerId {
            if let Some(id) = owner_ids.get(name) {
                return *id;
            }
            let id = JsonOwnerId(next_owner);
            next_owner += 1;
            owner_ids.insert(name.to_owned(), id);
            id
        };

        let root_owner_name = root.get("rootOwner").and_then(JV::as_str).unwrap_or("root");
        let root_owner = intern_owner(root_owner_name, &mut owner_ids);

        let mut objects = AHashMap::default();
        for (key, value) in objects_json {
            let id = ids[key];
            let object = parse_object(id, value, &ids, &mut owner_ids, &mut intern_owner)?;
            objects.insert(id, object);
        }

        let object_prototype_key =
            root.get("objectPrototype").and_then(JV::as_str).ok_or(JsonInterpreterError::MissingField("objectPrototype"))?;
        let object_prototype =
            *ids.get(object_prototype_key).ok_or_else(|| JsonInterpreterError::UnknownRef(object_prototype_key.to_owned()))?;

        let global_json = root.get("global").and_then(JV::as_object).ok_or(JsonInterpreterError::MissingField("global"))?;
        let mut bindings = IndexMap::with_capacity(global_json.len());
        for (name, value) in global_json {
            bindings.insert(name.clone(), parse_any_value(value, &ids)?);
        }

        Ok(Self { global: JsonScope { bindings }, objects, object_prototype, root_owner })
    }
}

impl Interpreter<JsonObjectId, JsonOwnerId> for JsonInterpreter {
    fn global_scope(&self) -> &dyn Scope<JsonObjectId> {
        &self.global
    }

    fn root_owner(&self) -> JsonOwnerId {
        self.root_owner
    }

    fn object(&self, id: JsonObjectId) -> &dyn InterpreterObject<JsonObjectId, JsonOwnerId> {
        // Absence here means the driver asked for an id this snapshot never
        // produced as a `Value::Object`, which can only happen if the engine
        // has a bug: every `Id` the engine holds came from this backend.
        self.objects.get(&id).expect("object id originated from this snapshot")
    }

    fn builtin_key(&self, id: JsonObjectId) -> Option<String> {
        self.objects.get(&id).and_then(|object| object.builtin.clone())
    }

    fn object_prototype(&self) -> JsonObjectId {
        self.object_prototype
    }
}

fn parse_object(
    id: JsonObjectId,
    value: &JV,
    ids: &AHashMap<String, JsonObjectId>,
    owner_ids: &mut AHashMap<String, JsonOwnerId>,
    intern_owner: &mut impl FnMut(&str, &mut AHashMap<String, JsonOwnerId>) -> JsonOwnerId,
) -> Result<JsonObject, JsonInterpreterError> {
    let object = value.as_object().ok_or(JsonInterpreterError::NotAnObject("each entry in \"objects\""))?;

    let proto = match object.get("proto") {
        None | Some(JV::Null) => None,
        Some(JV::String(key)) => {
            Some(*ids.get(key).ok_or_else(|| JsonInterpreterError::UnknownRef(key.clone()))?)
        }
        Some(_) => return Err(JsonInterpreterError::WrongType { field: "proto", expected: "a string or null" }),
    };

    let class_json = object.get("class").ok_or(JsonInterpreterError::MissingField("class"))?;
    let class = parse_class(class_json)?;

    let builtin = match object.get("builtin") {
        None | Some(JV::Null) => None,
        Some(JV::String(key)) => Some(key.clone()),
        Some(_) => return Err(JsonInterpreterError::WrongType { field: "builtin", expected: "a string or null" }),
    };

    let mut properties = IndexMap::new();
    if let Some(props_json) = object.get("properties") {
        let props_json = props_json.as_object().ok_or(JsonInterpreterError::NotAnObject("\"properties\""))?;
        for (key, prop) in props_json {
            properties.insert(key.clone(), parse_property(prop, ids, owner_ids, intern_owner)?);
        }
    }

    Ok(JsonObject { id, proto, class, builtin, properties })
}

fn parse_class(value: &JV) -> Result<ObjectClass, JsonInterpreterError> {
    let object = value.as_object().ok_or(JsonInterpreterError::NotAnObject("\"class\""))?;
    let kind = object.get("kind").and_then(JV::as_str).ok_or(JsonInterpreterError::MissingField("class.kind"))?;
    match kind {
        "plain" => Ok(ObjectClass::PlainObject),
        "array" => Ok(ObjectClass::Array),
        "userDefined" => Ok(ObjectClass::UserDefined),
        "function" => {
            let user_defined = object.get("userDefined").and_then(JV::as_bool).unwrap_or(false);
            let source = object.get("source").and_then(JV::as_str).map(str::to_owned);
            Ok(ObjectClass::Function { user_defined, source })
        }
        "date" => {
            let epoch_millis =
                object.get("epochMillis").and_then(JV::as_f64).ok_or(JsonInterpreterError::MissingField("class.epochMillis"))?;
            Ok(ObjectClass::Date { epoch_millis })
        }
        "regexp" => {
            let pattern = object
                .get("pattern")
                .and_then(JV::as_str)
                .ok_or(JsonInterpreterError::MissingField("class.pattern"))?
                .to_owned();
            let flags = object.get("flags").and_then(JV::as_str).unwrap_or("").to_owned();
            Ok(ObjectClass::RegExp { pattern, flags })
        }
        other => Err(JsonInterpreterError::UnknownClassKind(other.to_owned())),
    }
}

fn parse_property(
    value: &JV,
    ids: &AHashMap<String, JsonObjectId>,
    owner_ids: &mut AHashMap<String, JsonOwnerId>,
    intern_owner: &mut impl FnMut(&str, &mut AHashMap<String, JsonOwnerId>) -> JsonOwnerId,
) -> Result<PropertyDescriptor<JsonObjectId, JsonOwnerId>, JsonInterpreterError> {
    let object = value.as_object().ok_or(JsonInterpreterError::NotAnObject("each property descriptor"))?;
    let raw_value = object.get("value").ok_or(JsonInterpreterError::MissingField("value"))?;
    let value = parse_any_value(raw_value, ids)?;
    let owner_name = object.get("owner").and_then(JV::as_str).unwrap_or("root");
    let owner = intern_owner(owner_name, owner_ids);

    let writable = object.get("writable").and_then(JV::as_bool).unwrap_or(true);
    let enumerable = object.get("enumerable").and_then(JV::as_bool).unwrap_or(true);
    let configurable = object.get("configurable").and_then(JV::as_bool).unwrap_or(true);
    let readable = object.get("readable").and_then(JV::as_bool).unwrap_or(true);
    let inherited_ownership = object.get("inheritedOwnership").and_then(JV::as_bool).unwrap_or(false);

    Ok(PropertyDescriptor { value, owner, writable, enumerable, configurable, readable, inherited_ownership })
}

fn parse_any_value(value: &JV, ids: &AHashMap<String, JsonObjectId>) -> Result<AnyValue<JsonObjectId>, JsonInterpreterError> {
    match value {
        JV::Null => Ok(AnyValue::Value(Value::Null)),
        JV::Bool(b) => Ok(AnyValue::Value(Value::Boolean(*b))),
        JV::Number(n) => {
            let n = n.as_f64().ok_or(JsonInterpreterError::WrongType { field: "value", expected: "a finite number" })?;
            Ok(AnyValue::Value(Value::Number(n)))
        }
        JV::String(s) => Ok(AnyValue::Str(s.clone())),
        JV::Object(object) => {
            if let Some(JV::Bool(true)) = object.get("$undefined") {
                return Ok(AnyValue::Value(Value::Undefined));
            }
            if let Some(JV::String(key)) = object.get("$ref") {
                let id = *ids.get(key).ok_or_else(|| JsonInterpreterError::UnknownRef(key.clone()))?;
                return Ok(AnyValue::Value(Value::Object(id)));
            }
            Err(JsonInterpreterError::WrongType {
                field: "value",
                expected: "null, bool, number, string, {\"$ref\": id}, or {\"$undefined\": true}",
            })
        }
        JV::Array(_) => Err(JsonInterpreterError::WrongType { field: "value", expected: "not an array" }),
    }
}
