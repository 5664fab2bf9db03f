#![doc = include_str!("../../../README.md")]

mod config;
mod dumper;
mod error;
mod interp;
mod json_interp;
mod quote;
mod registry;
mod selector;
mod serializer;

pub mod driver;

pub use crate::{
    config::{Config, ContentEntry, ContentEntrySpec, Do, SpecEntry},
    error::{ConfigError, DumpError},
    interp::{
        AnyValue, Interpreter, InterpreterObject, JsString, ObjectClass, ObjectId, OwnerId, PropertyDescriptor,
        Scope, Value,
    },
    json_interp::{JsonInterpreter, JsonInterpreterError, JsonObjectId, JsonOwnerId},
    selector::Parts,
};
