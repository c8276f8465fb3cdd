use crate::{Body, ClassName, Constant, MethodSignature, Symbol, Type};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Super,
    Synchronized,
    Volatile,
    Transient,
    Native,
    Interface,
    Abstract,
    Strict,
    Synthetic,
    Annotation,
    Enum,
}

pub type Modifiers = BTreeSet<Modifier>;

/// Element value of an annotation, as used for annotation method defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    Constant(Constant),
    Enum { ty: ClassName, name: Symbol },
    Class(Type),
    Array(Vec<AnnotationValue>),
    Annotation(Annotation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub ty: ClassName,
    #[serde(default)]
    pub elements: Vec<AnnotationElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationElement {
    pub name: Symbol,
    pub value: AnnotationValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: Symbol,
    pub ty: Type,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Compile-time constant for `static final` fields.
    #[serde(default)]
    pub constant: Option<Constant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: Symbol,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub params: Vec<Type>,
    pub ret: Type,
    #[serde(default)]
    pub exceptions: Vec<ClassName>,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub annotation_default: Option<AnnotationValue>,
}

impl Method {
    pub fn new(name: impl Into<Symbol>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::new(),
            params,
            ret,
            exceptions: Vec::new(),
            body: None,
            annotation_default: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has(Modifier::Static)
    }

    pub fn is_constructor(&self) -> bool {
        self.name.as_str() == MethodSignature::CONSTRUCTOR
    }

    /// Concrete methods carry a body and are neither abstract nor native.
    pub fn is_concrete(&self) -> bool {
        self.body.is_some() && !self.has(Modifier::Abstract) && !self.has(Modifier::Native)
    }

    pub fn signature(&self, owner: &ClassName) -> MethodSignature {
        MethodSignature::new(
            owner.clone(),
            self.name.clone(),
            self.params.clone(),
            self.ret.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: ClassName,
    #[serde(default)]
    pub super_class: Option<ClassName>,
    #[serde(default)]
    pub interfaces: Vec<ClassName>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl Class {
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            super_class: None,
            interfaces: Vec::new(),
            modifiers: Modifiers::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}
