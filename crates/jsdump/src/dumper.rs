//! Binding dumper (`dumpBinding`, §4.5) and the shadowing oracle (§4.6).

use crate::{
    config::Do,
    error::DumpError,
    interp::{AnyValue, Interpreter, ObjectId, OwnerId, Scope},
    registry::BindingRegistry,
    selector::Parts,
    serializer::to_expr,
};

/// `isShadowed(name)`: walks from `scope` outward *until* the enclosing
/// reference scope (the global scope by default), returning true if any
/// intermediate scope binds `name`. The reference scope itself is never
/// checked — it is the scope `undefined`/`NaN`/`Infinity` are read *from*,
/// so a binding there is the thing being read, not something shadowing it.
///
/// `scope` is the current dump cursor; since the driver only ever dumps from
/// the global scope (§4.6), and the JSON backend's global scope has no
/// outer scope of its own, this engine's own call site always stops
/// immediately and returns `false`. The full outward walk is kept so
/// embedders whose `Scope` models nested dump cursors (where `scope` is not
/// itself the reference scope) get correct behavior.
pub fn is_shadowed<Id>(scope: &dyn Scope<Id>, name: &str) -> bool {
    let mut current = Some(scope);
    while let Some(s) = current {
        let outer = s.outer_scope();
        if outer.is_none() {
            // `s` has no further outer scope, so it *is* the reference scope
            // this walk is bounded by — never checked (see doc comment above).
            break;
        }
        if s.has_binding(name) {
            return true;
        }
        current = outer;
    }
    false
}

/// Traverses Parts from the global scope, requiring every non-leaf step to
/// land on an object (§4.5). Returns the object id the value-or-property at
/// `parts` currently holds, or the final component's owning object.
///
/// # Errors
/// `DumpError::Structure` if a non-leaf step does not land on an object.
pub fn get_value_for_parts<Id, Owner>(
    interp: &dyn Interpreter<Id, Owner>,
    parts: &Parts,
) -> Result<AnyValue<Id>, DumpError>
where
    Id: ObjectId,
    Owner: OwnerId,
{
    let mut current = interp
        .global_scope()
        .get(parts.first())
        .ok_or_else(|| DumpError::Structure {
            parts: parts.clone(),
            message: format!("no global binding named {:?}", parts.first()),
        })?;

    for key in &parts.as_slice()[1..] {
        let AnyValue::Value(crate::interp::Value::Object(id)) = current else {
            return Err(DumpError::Structure {
                parts: parts.clone(),
                message: format!("cannot read property {key:?} of a non-object"),
            });
        };
        current = interp.object(id).get(key, interp.root_owner()).ok_or_else(|| DumpError::Structure {
            parts: parts.clone(),
            message: format!("no own property {key:?}"),
        })?;
    }
    Ok(current)
}

/// Emits exactly one statement finalizing one variable or property binding
/// at level >= DECL (§4.5), returning the emitted statement text.
///
/// # Errors
/// `DumpError::Structure` if a property binding's owner (`parts[..-1]`) does
/// not resolve to an object. Propagates `DumpError::Serializer` from `toExpr`.
pub fn dump_binding<Id, Owner>(
    interp: &dyn Interpreter<Id, Owner>,
    registry: &mut BindingRegistry<Id>,
    parts: &Parts,
    todo: Do,
    is_shadowed: &dyn Fn(&str) -> bool,
) -> Result<String, DumpError>
where
    Id: ObjectId,
    Owner: OwnerId,
{
    if parts.len() == 1 {
        let name = parts.last();
        let prior = registry.global_scope_ref().current_do(name);
        registry.global_scope().advance(name, todo);

        // A variable binding always needs a real construction/reference
        // expression the first time it is dumped (even at DECL, §8 scenario
        // 6's `var a = {};`): there is no placeholder slot to declare into
        // the way a property has one. Once that first call has run, the
        // binding's value is already fully constructed (a variable has no
        // DECL/SET distinction the way a property does), so advancing its
        // level further has nothing left to emit — re-running `toExpr` here
        // would just see the object's own `ref` and emit a bogus
        // self-assignment.
        if prior.is_some() {
            return Ok(String::new());
        }

        let value = interp.global_scope().get(name).ok_or_else(|| DumpError::Structure {
            parts: parts.clone(),
            message: format!("no global binding named {name:?}"),
        })?;
        let rhs = to_expr(interp, registry, &value, Some(parts), is_shadowed)?;

        return Ok(format!("var {name} = {rhs};"));
    }

    let owner_parts = Parts::new(parts.prefix().to_vec()).expect("prefix of a multi-part Parts is non-empty");
    let owner_value = get_value_for_parts(interp, &owner_parts)?;
    let AnyValue::Value(crate::interp::Value::Object(owner_id)) = owner_value else {
        return Err(DumpError::Structure {
            parts: parts.clone(),
            message: "cannot set a property on a primitive".to_owned(),
        });
    };

    let property = parts.last();
    registry.object(owner_id).advance(property, todo);

    let rhs = if todo == Do::Decl {
        "undefined".to_owned()
    } else {
        let value = interp.object(owner_id).get(property, interp.root_owner()).ok_or_else(|| DumpError::Structure {
            parts: parts.clone(),
            message: format!("no own property {property:?}"),
        })?;
        to_expr(interp, registry, &value, Some(parts), is_shadowed)?
    };

    Ok(format!("{} = {rhs};", parts.to_js_expr()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatScope {
        names: Vec<String>,
    }

    impl Scope<u32> for FlatScope {
        fn get(&self, _name: &str) -> Option<AnyValue<u32>> {
            None
        }

        fn has_binding(&self, name: &str) -> bool {
            self.names.iter().any(|n| n == name)
        }

        fn outer_scope(&self) -> Option<&dyn Scope<u32>> {
            None
        }

        fn variable_names(&self) -> Vec<String> {
            self.names.clone()
        }
    }

    struct NestedScope<'a> {
        names: Vec<String>,
        outer: &'a dyn Scope<u32>,
    }

    impl Scope<u32> for NestedScope<'_> {
        fn get(&self, _name: &str) -> Option<AnyValue<u32>> {
            None
        }

        fn has_binding(&self, name: &str) -> bool {
            self.names.iter().any(|n| n == name)
        }

        fn outer_scope(&self) -> Option<&dyn Scope<u32>> {
            Some(self.outer)
        }

        fn variable_names(&self) -> Vec<String> {
            self.names.clone()
        }
    }

    #[test]
    fn is_shadowed_false_when_only_the_reference_scope_binds_name() {
        // §4.6: the walk stops *before* the reference scope itself, so a
        // lone scope with no outer scope of its own is never checked.
        let scope = FlatScope { names: vec!["NaN".to_owned()] };
        assert!(!is_shadowed(&scope, "NaN"));
    }

    #[test]
    fn is_shadowed_true_when_an_intermediate_scope_binds_name() {
        let global = FlatScope { names: vec!["NaN".to_owned()] };
        let inner = NestedScope { names: vec!["x".to_owned()], outer: &global };
        assert!(is_shadowed(&inner, "x"));
        assert!(!is_shadowed(&inner, "NaN"));
        assert!(!is_shadowed(&inner, "Infinity"));
    }
}
