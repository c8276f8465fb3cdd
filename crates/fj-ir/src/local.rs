use crate::{Symbol, Type};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// What a local stands for. Front ends set this when they build the IR, so
/// nothing downstream has to look at the local's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalRole {
    /// The implicit `this` reference.
    Receiver,
    Ordinary,
    /// A value that lived on the operand stack in the source bytecode.
    StackTemp,
    /// A renamed reference to a caught exception that is only meaningful
    /// inside handler code.
    HandlerRef,
}

impl LocalRole {
    /// Role implied by the naming conventions of bytecode-derived Jimple:
    /// `this`, the `$stack` prefix and the `#` version separator.
    pub fn from_name(name: &str) -> Self {
        if name == "this" {
            LocalRole::Receiver
        } else if name.starts_with("$stack") {
            LocalRole::StackTemp
        } else if name.contains('#') {
            LocalRole::HandlerRef
        } else {
            LocalRole::Ordinary
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LocalDef")]
pub struct Local {
    pub name: Symbol,
    pub ty: Type,
    pub role: LocalRole,
}

#[derive(Deserialize)]
struct LocalDef {
    name: Symbol,
    ty: Type,
    #[serde(default)]
    role: Option<LocalRole>,
}

impl From<LocalDef> for Local {
    fn from(def: LocalDef) -> Self {
        let role = def
            .role
            .unwrap_or_else(|| LocalRole::from_name(def.name.as_str()));
        Local {
            name: def.name,
            ty: def.ty,
            role,
        }
    }
}

impl Local {
    /// Creates a local whose role is derived from its name.
    pub fn new(name: impl Into<Symbol>, ty: Type) -> Self {
        let name = name.into();
        let role = LocalRole::from_name(name.as_str());
        Self { name, ty, role }
    }

    pub fn with_role(name: impl Into<Symbol>, ty: Type, role: LocalRole) -> Self {
        Self {
            name: name.into(),
            ty,
            role,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn is_stack_temp(&self) -> bool {
        self.role == LocalRole::StackTemp
    }

    pub fn is_handler_ref(&self) -> bool {
        self.role == LocalRole::HandlerRef
    }
}

impl Display for Local {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_naming_conventions() {
        assert_eq!(LocalRole::from_name("this"), LocalRole::Receiver);
        assert_eq!(LocalRole::from_name("$stack3"), LocalRole::StackTemp);
        assert_eq!(LocalRole::from_name("l2#1"), LocalRole::HandlerRef);
        assert_eq!(LocalRole::from_name("l2"), LocalRole::Ordinary);
    }

    #[test]
    fn missing_role_is_inferred_on_deserialize() {
        let local: Local = serde_json::from_str(r#"{"name":"$stack1","ty":"int"}"#).unwrap();
        assert_eq!(local.role, LocalRole::StackTemp);

        let explicit: Local =
            serde_json::from_str(r#"{"name":"r0","ty":"A","role":"receiver"}"#).unwrap();
        assert_eq!(explicit.role, LocalRole::Receiver);
    }
}
