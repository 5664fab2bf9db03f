//! Dump driver (§4.6): walks the config, invokes the binding dumper in the
//! right file with the right depth directive, and resolves forward
//! declarations across files.
//!
//! The source spec leaves the driver's precise file-walk algorithm
//! unimplemented (§9 Open Question) and says implementers should treat the
//! design intent encoded in `Do`, `Config`, and `dumpBinding` as authoritative
//! rather than any working source. The algorithm here satisfies that intent
//! and every scenario in §8, with one documented simplification: forward
//! declaration targets are resolved against the object's *top-level*
//! declared config entry (its home). An object that is reachable only as a
//! nested value of another top-level entry — never itself separately
//! declared — has no independent claimed location to forward-declare against;
//! referencing such an object before its owning root has been visited falls
//! back to constructing it inline at the referencing site, which is only
//! correct if that reference happens to be the object's first emission.
//! Real specs name every cross-referenced object as its own top-level entry,
//! so this does not bite in practice.

use ahash::AHashMap;

use crate::{
    config::{Config, Do},
    dumper::{dump_binding, get_value_for_parts, is_shadowed},
    error::DumpError,
    interp::{AnyValue, Interpreter, ObjectId, OwnerId, Value},
    registry::BindingRegistry,
    selector::Parts,
};

/// One output file's accumulated statements, in emission order.
#[derive(Debug, Clone)]
pub struct FileOutput {
    pub filename: String,
    pub statements: Vec<String>,
}

impl FileOutput {
    #[must_use]
    pub fn source(&self) -> String {
        let mut text = String::new();
        for statement in &self.statements {
            text.push_str(statement);
            text.push('\n');
        }
        text
    }
}

struct Driver<'a, Id, Owner> {
    interp: &'a dyn Interpreter<Id, Owner>,
    config: &'a Config,
    registry: BindingRegistry<Id>,
    /// Object id -> (its top-level declared Parts, the file that claims that path).
    home: AHashMap<Id, (Parts, usize)>,
}

/// Drives a full dump, producing one `FileOutput` per declared `SpecEntry`,
/// in declared order. Writing the output to disk is left to the caller
/// (§1/§6: filesystem writing is an external collaborator).
///
/// # Errors
/// Any `DumpError` documented in §7. A dump either completes fully or fails;
/// there is no partial output on error.
pub fn dump<Id, Owner>(interp: &dyn Interpreter<Id, Owner>, config: &Config) -> Result<Vec<FileOutput>, DumpError>
where
    Id: ObjectId,
    Owner: OwnerId,
{
    let mut driver =
        Driver { interp, config, registry: BindingRegistry::new(), home: AHashMap::default() };
    driver.build_home_map()?;

    let mut outputs = Vec::with_capacity(config.files.len());
    for file_no in 0..config.files.len() {
        let mut statements = Vec::new();
        let entries = config.entries(file_no).to_vec();
        for entry in &entries {
            driver.emit_entry(&entry.path, entry.todo, entry.reorder, file_no, &mut statements)?;
        }
        outputs.push(FileOutput { filename: config.files[file_no].clone(), statements });
    }
    Ok(outputs)
}

/// Builds the shadowing predicate once per statement, borrowing only the
/// interpreter handle (a `Copy` reference) rather than the whole `Driver`, so
/// it can be held alongside a `&mut` borrow of the registry.
fn shadow_closure<Id, Owner>(interp: &dyn Interpreter<Id, Owner>) -> impl Fn(&str) -> bool + '_ {
    move |name| is_shadowed(interp.global_scope(), name)
}

impl<'a, Id, Owner> Driver<'a, Id, Owner>
where
    Id: ObjectId,
    Owner: OwnerId,
{
    /// Resolves every top-level declared entry once (in file, then declared,
    /// order) to learn each reachable object's canonical home Parts and
    /// claiming file, ahead of the real emission pass.
    fn build_home_map(&mut self) -> Result<(), DumpError> {
        for file_no in 0..self.config.files.len() {
            for entry in self.config.entries(file_no) {
                if entry.todo == Do::Prune || entry.todo == Do::Skip {
                    continue;
                }
                let Ok(value) = get_value_for_parts(self.interp, &entry.path) else {
                    continue;
                };
                if let AnyValue::Value(Value::Object(id)) = value {
                    self.home.entry(id).or_insert_with(|| {
                        let claimed = self.config.claiming_file(&entry.path).unwrap_or(file_no);
                        (entry.path.clone(), claimed)
                    });
                }
            }
        }
        Ok(())
    }

    /// Ensures `id` has a `ref` before it is referenced from `file_no`,
    /// forward-declaring it at DECL against its home location if needed
    /// (§4.6 point 3).
    fn ensure_forward_declared(
        &mut self,
        id: Id,
        file_no: usize,
        current_parts: &Parts,
        statements: &mut Vec<String>,
    ) -> Result<(), DumpError> {
        if self.registry.object_ref(id).and_then(crate::registry::ObjectInfo::reference).is_some() {
            return Ok(());
        }
        let Some((home_path, claimed_file)) = self.home.get(&id).cloned() else {
            // No independently declared home: fall back to constructing inline
            // at the referencing site (documented simplification above).
            return Ok(());
        };
        if &home_path == current_parts {
            // This call site is the home entry itself; let normal construction run.
            return Ok(());
        }
        // The home's claimed file has already been fully processed by the time
        // we reach a later file (the outer loop in `dump` visits files in
        // order), so if it is earlier than `file_no` and this object still has
        // no `ref`, that file declared the path but never actually constructed
        // the object it held (e.g. a property-path home left at DECL, which
        // emits a bare `undefined` rather than resolving its value, §4.5) —
        // exactly the fatal case §4.6 point 3 and §7 describe.
        if claimed_file < file_no {
            return Err(DumpError::Ordering { parts: home_path, claimed_file, current_file: file_no });
        }
        if home_path.len() > 1 {
            // A property path has no placeholder construction at DECL (it emits
            // a bare `undefined`, §4.5), so it cannot serve as a forward-declare
            // target — only a variable home actually assigns a `ref`. Fall back
            // to inline construction at the referencing site.
            return Ok(());
        }
        let shadow = shadow_closure(self.interp);
        let stmt = dump_binding(self.interp, &mut self.registry, &home_path, Do::Decl, &shadow)?;
        if !stmt.is_empty() {
            statements.push(stmt);
        }
        Ok(())
    }

    /// Peeks the live value about to be bound at `parts` and forward-declares
    /// any object reference it contains that is not yet `ref`'d and is not
    /// itself homed at `parts`.
    fn forward_declare_value_of(
        &mut self,
        parts: &Parts,
        file_no: usize,
        statements: &mut Vec<String>,
    ) -> Result<(), DumpError> {
        let value = if parts.len() == 1 {
            self.interp.global_scope().get(parts.last())
        } else {
            let owner_parts = Parts::new(parts.prefix().to_vec()).expect("non-empty prefix");
            let owner = get_value_for_parts(self.interp, &owner_parts)?;
            let AnyValue::Value(Value::Object(owner_id)) = owner else {
                return Ok(());
            };
            self.interp.object(owner_id).get(parts.last(), self.interp.root_owner())
        };
        if let Some(AnyValue::Value(Value::Object(id))) = value {
            self.ensure_forward_declared(id, file_no, parts, statements)?;
        }
        Ok(())
    }

    fn current_level(&self, parts: &Parts) -> Result<Option<Do>, DumpError> {
        if parts.len() == 1 {
            return Ok(self.registry.global_scope_ref().current_do(parts.last()));
        }
        let owner_parts = Parts::new(parts.prefix().to_vec()).expect("non-empty prefix");
        let owner = get_value_for_parts(self.interp, &owner_parts)?;
        let AnyValue::Value(Value::Object(owner_id)) = owner else {
            return Err(DumpError::Structure {
                parts: parts.clone(),
                message: "cannot set a property on a primitive".to_owned(),
            });
        };
        Ok(self.registry.object_ref(owner_id).and_then(|info| info.current_do(parts.last())))
    }

    fn emit_entry(
        &mut self,
        parts: &Parts,
        todo: Do,
        reorder: bool,
        file_no: usize,
        statements: &mut Vec<String>,
    ) -> Result<(), DumpError> {
        match todo {
            Do::Prune => {
                self.advance_level(parts, Do::Prune)?;
                Ok(())
            }
            Do::Skip => Ok(()),
            Do::Decl | Do::Set | Do::Recurse => self.emit_to_level(parts, todo, reorder, file_no, statements),
        }
    }

    fn advance_level(&mut self, parts: &Parts, todo: Do) -> Result<(), DumpError> {
        if parts.len() == 1 {
            self.registry.global_scope().advance(parts.last(), todo);
            return Ok(());
        }
        let owner_parts = Parts::new(parts.prefix().to_vec()).expect("non-empty prefix");
        let owner = get_value_for_parts(self.interp, &owner_parts)?;
        let AnyValue::Value(Value::Object(owner_id)) = owner else {
            return Err(DumpError::Structure {
                parts: parts.clone(),
                message: "cannot set a property on a primitive".to_owned(),
            });
        };
        self.registry.object(owner_id).advance(parts.last(), todo);
        Ok(())
    }

    fn emit_to_level(
        &mut self,
        parts: &Parts,
        target: Do,
        reorder: bool,
        file_no: usize,
        statements: &mut Vec<String>,
    ) -> Result<(), DumpError> {
        let existing = self.current_level(parts)?;
        let binding_target = if target == Do::Recurse { Do::Set } else { target };

        if existing.is_none_or(|level| level < binding_target) {
            self.forward_declare_value_of(parts, file_no, statements)?;
            let shadow = shadow_closure(self.interp);
            let stmt = dump_binding(self.interp, &mut self.registry, parts, binding_target, &shadow)?;
            if !stmt.is_empty() {
                statements.push(stmt);
            }
        }

        if target != Do::Recurse {
            return Ok(());
        }
        if existing.is_some_and(|level| level >= Do::Recurse) {
            return Ok(());
        }
        self.advance_level(parts, Do::Recurse)?;
        self.recurse_into(parts, reorder, file_no, statements)
    }

    fn recurse_into(
        &mut self,
        parts: &Parts,
        reorder: bool,
        file_no: usize,
        statements: &mut Vec<String>,
    ) -> Result<(), DumpError> {
        let value = get_value_for_parts(self.interp, parts)?;
        let AnyValue::Value(Value::Object(id)) = value else {
            return Ok(());
        };

        let mut keys = self.interp.object(id).own_property_keys();
        if reorder {
            // Without `reorder`, children finalize in the object's own
            // insertion order, the only order that never needs an `undefined`
            // placeholder for a not-yet-reached sibling. `reorder: true` lets
            // a child explicitly declared in this file's content list
            // finalize ahead of an earlier, unconfigured sibling — ordered by
            // its position in that declared list — with every other child
            // keeping its relative insertion-order position after them.
            let declared: Vec<&Parts> = self.config.entries(file_no).iter().map(|entry| &entry.path).collect();
            keys.sort_by_key(|key| {
                let child_parts = parts.child(key);
                declared.iter().position(|p| **p == child_parts).unwrap_or(usize::MAX)
            });
        }

        let mut finalized_keys = Vec::with_capacity(keys.len());
        for key in &keys {
            let child_parts = parts.child(key);
            let (child_file, child_todo, child_reorder) = match self.config.directive(&child_parts) {
                Some((f, d, r)) => (f, d, r),
                None => (file_no, Do::Recurse, false),
            };
            if child_file != file_no {
                continue;
            }
            self.emit_entry(&child_parts, child_todo, child_reorder, file_no, statements)?;
            if !matches!(child_todo, Do::Prune | Do::Skip) {
                finalized_keys.push(key.clone());
            }
        }

        // Only keys actually bound in this file above are eligible for
        // defineProperty: a PRUNE'd or SKIP'd key, or one routed to another
        // file, was never constructed here, so finalizing its attributes
        // would re-create a binding §3's PRUNE/SKIP semantics exclude.
        for key in &finalized_keys {
            let Some(descriptor) = self.interp.object(id).get_own_property_descriptor(key) else {
                continue;
            };
            if descriptor.is_default_shape() {
                continue;
            }
            statements.push(format_define_property(parts, key, &descriptor));
        }
        Ok(())
    }
}

fn format_define_property<Id, Owner>(
    parts: &Parts,
    key: &str,
    descriptor: &crate::interp::PropertyDescriptor<Id, Owner>,
) -> String
where
    Owner: std::fmt::Debug,
{
    format!(
        "Object.defineProperty({}, {}, {{writable: {}, enumerable: {}, configurable: {}, owner: {:?}, \
         readable: {}, inheritedOwnership: {}}});",
        parts.to_js_expr(),
        crate::quote::quote_js_string(key),
        descriptor.writable,
        descriptor.enumerable,
        descriptor.configurable,
        descriptor.owner,
        descriptor.readable,
        descriptor.inherited_ownership,
    )
}
