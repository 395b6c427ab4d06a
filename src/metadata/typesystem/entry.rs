//! Fixed-up entity entries.
//!
//! These are the per-module "candidate scope entries" the usage scanners walk: types with
//! their base lists, attributes and members, members with their signatures and (for
//! methods) raw IL bodies. The external module loader produces them once at open time;
//! afterwards they are immutable and shared via `Arc` across scanners, cached trees and
//! worker threads.
//!
//! Member kinds are few and fixed, so the model is a set of plain structs plus the
//! [`MemberKind`] tag - no inheritance-style polymorphism.

use std::sync::Arc;

use crate::metadata::{handle::EntityHandle, typesystem::sig::TypeSig};

/// The kind of a program entity a scanner can report.
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum MemberKind {
    /// A type definition
    Type,
    /// A method (including constructors and accessors)
    Method,
    /// A field
    Field,
    /// A property
    Property,
    /// An event
    Event,
}

/// A custom attribute applied to a type or member.
#[derive(Clone, Debug, Default)]
pub struct AttributeEntry {
    /// The attribute's type
    pub attribute_type: TypeSig,
    /// Positional constructor arguments
    pub fixed_args: Vec<AttributeValue>,
    /// Named (property/field) arguments
    pub named_args: Vec<AttributeValue>,
}

/// One attribute argument value, as far as type-usage analysis cares.
///
/// Only `typeof(...)` arguments and (arbitrarily nested) arrays of them can mention a
/// type; every other constant collapses to [`AttributeValue::Other`].
#[derive(Clone, Debug)]
pub enum AttributeValue {
    /// A `typeof(...)` argument
    Type(TypeSig),
    /// An array argument, whose elements may themselves be types or arrays
    Array(Vec<AttributeValue>),
    /// Any non-type constant
    Other,
}

impl AttributeValue {
    /// Returns true if this value mentions `target`, descending into nested arrays.
    #[must_use]
    pub fn mentions(&self, target: EntityHandle) -> bool {
        let mut pending = vec![self];
        while let Some(value) = pending.pop() {
            match value {
                AttributeValue::Type(sig) => {
                    if sig.contains(target) {
                        return true;
                    }
                }
                AttributeValue::Array(elements) => pending.extend(elements.iter()),
                AttributeValue::Other => {}
            }
        }
        false
    }
}

impl AttributeEntry {
    /// Returns true if the attribute's type or any of its arguments mention `target`.
    #[must_use]
    pub fn mentions(&self, target: EntityHandle) -> bool {
        self.attribute_type.contains(target)
            || self.fixed_args.iter().any(|a| a.mentions(target))
            || self.named_args.iter().any(|a| a.mentions(target))
    }
}

/// A method signature: parameter types, return type, generic arguments and constraints.
#[derive(Clone, Debug, Default)]
pub struct MethodSig {
    /// Parameter types, in declaration order
    pub params: Vec<TypeSig>,
    /// Return type
    pub returns: TypeSig,
    /// Generic type arguments (for instantiated views, usually empty on definitions)
    pub generic_args: Vec<TypeSig>,
    /// Generic parameter constraints
    pub constraints: Vec<TypeSig>,
}

impl MethodSig {
    /// Returns true if any part of the signature mentions `target`.
    #[must_use]
    pub fn mentions(&self, target: EntityHandle) -> bool {
        self.returns.contains(target)
            || self.params.iter().any(|p| p.contains(target))
            || self.generic_args.iter().any(|a| a.contains(target))
            || self.constraints.iter().any(|c| c.contains(target))
    }
}

/// A method body: the raw IL stream plus the types of its local-variable signature.
#[derive(Clone, Debug)]
pub struct MethodBody {
    /// Raw IL instruction stream
    pub il: Arc<[u8]>,
    /// Types from the local-variable signature
    pub locals: Vec<TypeSig>,
}

impl MethodBody {
    /// Creates a body from raw IL with no locals
    #[must_use]
    pub fn from_il(il: Vec<u8>) -> Self {
        MethodBody {
            il: il.into(),
            locals: Vec::new(),
        }
    }
}

/// A method definition entry.
#[derive(Clone, Debug)]
pub struct MethodEntry {
    /// Handle of this method
    pub handle: EntityHandle,
    /// Simple name
    pub name: String,
    /// Handle of the declaring type
    pub declaring_type: EntityHandle,
    /// Signature (parameters, return type, generics)
    pub signature: MethodSig,
    /// Custom attributes, including return-type attributes
    pub attributes: Vec<AttributeEntry>,
    /// The body, if the method has one (abstract/extern methods do not)
    pub body: Option<MethodBody>,
    /// The member this method immediately overrides, if any
    pub overridden: Option<EntityHandle>,
}

/// A field definition entry.
#[derive(Clone, Debug)]
pub struct FieldEntry {
    /// Handle of this field
    pub handle: EntityHandle,
    /// Simple name
    pub name: String,
    /// Handle of the declaring type
    pub declaring_type: EntityHandle,
    /// The field's type
    pub field_type: TypeSig,
    /// Custom attributes
    pub attributes: Vec<AttributeEntry>,
}

/// A property definition entry. Bodies live on the accessor methods.
#[derive(Clone, Debug)]
pub struct PropertyEntry {
    /// Handle of this property
    pub handle: EntityHandle,
    /// Simple name
    pub name: String,
    /// Handle of the declaring type
    pub declaring_type: EntityHandle,
    /// The property's type
    pub property_type: TypeSig,
    /// Indexer parameter types, empty for plain properties
    pub params: Vec<TypeSig>,
    /// Getter method handle, if the property can be read
    pub getter: Option<EntityHandle>,
    /// Setter method handle, if the property can be written
    pub setter: Option<EntityHandle>,
    /// Custom attributes
    pub attributes: Vec<AttributeEntry>,
}

impl PropertyEntry {
    /// The accessor method handles this property owns
    pub fn accessors(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.getter.iter().chain(self.setter.iter()).copied()
    }
}

/// An event definition entry. Bodies live on the accessor methods.
#[derive(Clone, Debug)]
pub struct EventEntry {
    /// Handle of this event
    pub handle: EntityHandle,
    /// Simple name
    pub name: String,
    /// Handle of the declaring type
    pub declaring_type: EntityHandle,
    /// The event's delegate type
    pub event_type: TypeSig,
    /// Add accessor handle
    pub add: Option<EntityHandle>,
    /// Remove accessor handle
    pub remove: Option<EntityHandle>,
    /// Raise accessor handle, rarely present
    pub raise: Option<EntityHandle>,
    /// Custom attributes
    pub attributes: Vec<AttributeEntry>,
}

impl EventEntry {
    /// The accessor method handles this event owns
    pub fn accessors(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.add
            .iter()
            .chain(self.remove.iter())
            .chain(self.raise.iter())
            .copied()
    }
}

/// A type entry: one candidate scope entry for the usage scanners.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    /// Handle of this type
    pub handle: EntityHandle,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Handle of the enclosing type for nested types
    pub declaring_type: Option<EntityHandle>,
    /// True for constructed/parameterized types that have no definition root.
    /// Such a type can never be an addressable containing root.
    pub constructed: bool,
    /// Direct base types (base class and implemented interfaces)
    pub base_types: Vec<TypeSig>,
    /// Custom attributes
    pub attributes: Vec<AttributeEntry>,
    /// Method members, including constructors and accessor bodies
    pub methods: Vec<Arc<MethodEntry>>,
    /// Field members
    pub fields: Vec<Arc<FieldEntry>>,
    /// Property members
    pub properties: Vec<Arc<PropertyEntry>>,
    /// Event members
    pub events: Vec<Arc<EventEntry>>,
}

impl TypeEntry {
    /// The namespace-qualified name, `Namespace.Name` (or just `Name` in the
    /// global namespace)
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// True if this type is a root declaration (no enclosing declaring type)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.declaring_type.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{handle::ModuleId, token::Token};

    fn handle(token: u32) -> EntityHandle {
        EntityHandle::new(ModuleId(0), Token::new(token))
    }

    #[test]
    fn attribute_value_nested_array_mentions() {
        let widget = handle(0x02000001);
        let value = AttributeValue::Array(vec![
            AttributeValue::Other,
            AttributeValue::Array(vec![AttributeValue::Type(TypeSig::definition(widget))]),
        ]);
        assert!(value.mentions(widget));
        assert!(!value.mentions(handle(0x02000002)));
    }

    #[test]
    fn method_sig_mentions_all_positions() {
        let widget = handle(0x02000001);

        let in_return = MethodSig {
            returns: TypeSig::definition(widget),
            ..MethodSig::default()
        };
        assert!(in_return.mentions(widget));

        let in_param = MethodSig {
            params: vec![TypeSig::opaque(), TypeSig::definition(widget)],
            ..MethodSig::default()
        };
        assert!(in_param.mentions(widget));

        let in_constraint = MethodSig {
            constraints: vec![TypeSig::definition(widget)],
            ..MethodSig::default()
        };
        assert!(in_constraint.mentions(widget));

        assert!(!MethodSig::default().mentions(widget));
    }

    #[test]
    fn full_name_respects_global_namespace() {
        let ty = TypeEntry {
            handle: handle(0x02000001),
            namespace: String::new(),
            name: "Widget".into(),
            declaring_type: None,
            constructed: false,
            base_types: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
        };
        assert_eq!(ty.full_name(), "Widget");
        assert!(ty.is_root());

        let ns = TypeEntry {
            namespace: "Foo.Bar".into(),
            ..ty
        };
        assert_eq!(ns.full_name(), "Foo.Bar.Widget");
    }

    #[test]
    fn member_kind_display() {
        assert_eq!(MemberKind::Property.to_string(), "Property");
        assert_eq!(MemberKind::Type.to_string(), "Type");
    }
}
