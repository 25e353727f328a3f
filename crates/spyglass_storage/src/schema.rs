//! Declarations for code units and their members.
//!
//! A declaration refers to other units by name; the registry resolves the
//! names when the unit is registered.

use std::sync::Arc;

use spyglass_foundation::{SourceId, UnitKind, Value, Visibility};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a member declaration declares.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeclKind {
    /// Instance or static property.
    Property,
    /// Class constant.
    Constant,
    /// Method.
    Method,
}

/// Declaration of a type, mixin, or interface.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitDecl {
    /// Unit name.
    pub name: Arc<str>,
    /// Unit kind.
    pub kind: UnitKind,
    /// Identity of the code unit the declaration lives in.
    pub source: SourceId,
    /// Parent type, by name.
    pub parent: Option<Arc<str>>,
    /// Implemented interfaces, by name.
    pub interfaces: Vec<Arc<str>>,
    /// Composed mixins, by name, in declaration order.
    pub mixins: Vec<Arc<str>>,
    /// Declared properties.
    pub properties: Vec<PropertyDecl>,
    /// Declared constants.
    pub constants: Vec<ConstantDecl>,
    /// Declared methods.
    pub methods: Vec<MethodDecl>,
    /// The host hides this unit's own properties from reflection.
    pub hides_members: bool,
}

impl UnitDecl {
    fn new(name: impl Into<Arc<str>>, kind: UnitKind, source: SourceId) -> Self {
        Self {
            name: name.into(),
            kind,
            source,
            parent: None,
            interfaces: Vec::new(),
            mixins: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
            methods: Vec::new(),
            hides_members: false,
        }
    }

    /// Declares an instantiable type.
    #[must_use]
    pub fn new_type(name: impl Into<Arc<str>>, source: SourceId) -> Self {
        Self::new(name, UnitKind::Type, source)
    }

    /// Declares a mixin.
    #[must_use]
    pub fn new_mixin(name: impl Into<Arc<str>>, source: SourceId) -> Self {
        Self::new(name, UnitKind::Mixin, source)
    }

    /// Declares an interface.
    #[must_use]
    pub fn new_interface(name: impl Into<Arc<str>>, source: SourceId) -> Self {
        Self::new(name, UnitKind::Interface, source)
    }

    /// Sets the parent type.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<Arc<str>>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<Arc<str>>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Composes a mixin.
    #[must_use]
    pub fn uses(mut self, mixin: impl Into<Arc<str>>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    /// Adds a property declaration.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a constant declaration.
    #[must_use]
    pub fn with_constant(mut self, constant: ConstantDecl) -> Self {
        self.constants.push(constant);
        self
    }

    /// Adds a method declaration.
    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Marks the unit as one whose properties the host hides from reflection.
    #[must_use]
    pub fn hiding_members(mut self) -> Self {
        self.hides_members = true;
        self
    }

    /// Returns true if this declaration itself declares `name` of `kind`.
    #[must_use]
    pub fn declares(&self, name: &str, kind: DeclKind) -> bool {
        match kind {
            DeclKind::Property => self.properties.iter().any(|p| &*p.name == name),
            DeclKind::Constant => self.constants.iter().any(|c| &*c.name == name),
            DeclKind::Method => self.methods.iter().any(|m| &*m.name == name),
        }
    }
}

/// Declaration of a property.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyDecl {
    /// Property name.
    pub name: Arc<str>,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Whether the property belongs to the unit rather than instances.
    pub is_static: bool,
    /// Initial value; `None` leaves the slot uninitialized.
    pub default: Option<Value>,
}

impl PropertyDecl {
    /// Creates a property with the given visibility and no default.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            default: None,
        }
    }

    /// Creates a public property.
    #[must_use]
    pub fn public(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Visibility::Public)
    }

    /// Creates a protected property.
    #[must_use]
    pub fn protected(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Visibility::Protected)
    }

    /// Creates a private property.
    #[must_use]
    pub fn private(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Visibility::Private)
    }

    /// Sets the initial value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Makes the property static.
    #[must_use]
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Declaration of a constant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstantDecl {
    /// Constant name.
    pub name: Arc<str>,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Constant value.
    pub value: Value,
}

impl ConstantDecl {
    /// Creates a public constant.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            value,
        }
    }

    /// Sets the visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Declaration of a method.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodDecl {
    /// Method name.
    pub name: Arc<str>,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Whether the method is static.
    pub is_static: bool,
    /// Parameter names.
    pub params: Vec<Arc<str>>,
    /// Whether the method exposes a debug member.
    pub debug: bool,
}

impl MethodDecl {
    /// Creates a public instance method with no parameters.
    #[must_use]
    pub fn public(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            params: Vec::new(),
            debug: false,
        }
    }

    /// Sets the visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, param: impl Into<Arc<str>>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Makes the method static.
    #[must_use]
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the method as a debug member provider.
    #[must_use]
    pub fn as_debug(mut self) -> Self {
        self.debug = true;
        self
    }
}
