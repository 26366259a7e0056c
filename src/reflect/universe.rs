//! The class universe: an immutable arena of classes and members, answering
//! the queries the pipeline would otherwise put to a reflection API.

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use crate::core::errors::{OpfError, Result};
use crate::reflect::descriptor::{
    ArgExpr, ClassDescriptor, ClassKind, TypeExpr, TypeParamDescriptor, UniverseDescriptor,
};
use crate::reflect::ids::{ClassId, ConstructorId, FieldId, MethodId, TypeVarId};
use crate::reflect::modifiers::Modifiers;
use crate::types::substitution::Substitution;
use crate::types::ty::{ClassType, PrimitiveKind, Type, TypeArg, TypeVariable, Wildcard};

const CORE_LIBRARY: &str = include_str!("core_library.json");

/// Binary name of the root class.
pub const OBJECT: &str = "java.lang.Object";

// ──────────────────── records ────────────────────

/// How a method came to exist, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberVariant {
    Ordinary,
    /// Compiler bridge (covariant return or visibility bridge).
    Bridge,
    /// Synthetic and not a bridge.
    Synthetic,
    /// Declared in the anonymous body class of an enum constant.
    EnumConstantOverride { bridge: bool },
}

#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub name: String,
    pub body: Option<ClassId>,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub id: ClassId,
    /// Binary name.
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeVariable>,
    pub superclass: Option<ClassType>,
    pub interfaces: Vec<ClassType>,
    pub declaring: Option<ClassId>,
    pub anonymous: bool,
    /// The enum whose constant this class is the body of.
    pub enum_body_of: Option<ClassId>,
    pub annotations: Vec<String>,
    pub constructors: Vec<ConstructorId>,
    pub methods: Vec<MethodId>,
    pub fields: Vec<FieldId>,
    pub member_classes: Vec<ClassId>,
    pub enum_constants: Vec<EnumConstant>,
}

impl ClassInfo {
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Package name, `None` for the unnamed package.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.name.rfind('.').map(|dot| &self.name[..dot])
    }

    /// Name without the package: `Outer$Inner` for a member class.
    #[must_use]
    pub fn binary_simple_name(&self) -> &str {
        self.name.rfind('.').map_or(&self.name, |dot| &self.name[dot + 1..])
    }

    /// Source-level simple name; empty for anonymous classes.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        if self.anonymous {
            return "";
        }
        let binary = self.binary_simple_name();
        if self.declaring.is_some() {
            binary.rfind('$').map_or(binary, |dollar| &binary[dollar + 1..])
        } else {
            binary
        }
    }

    /// Dotted name as written in source.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.name.replace('$', ".")
    }
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub id: MethodId,
    pub declaring: ClassId,
    pub name: String,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeVariable>,
    pub params: Vec<Type>,
    pub returns: Type,
    pub variant: MemberVariant,
    pub annotations: Vec<String>,
}

impl MethodInfo {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[must_use]
    pub fn is_bridge(&self) -> bool {
        matches!(
            self.variant,
            MemberVariant::Bridge | MemberVariant::EnumConstantOverride { bridge: true }
        )
    }

    #[must_use]
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorInfo {
    pub id: ConstructorId,
    pub declaring: ClassId,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeVariable>,
    pub params: Vec<Type>,
    pub synthetic: bool,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub id: FieldId,
    pub declaring: ClassId,
    pub name: String,
    pub modifiers: Modifiers,
    pub ty: Type,
}

impl FieldInfo {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }
}

/// A declared type variable with its upper bounds (empty means `Object`).
#[derive(Debug, Clone)]
pub struct TypeVarInfo {
    pub var: TypeVariable,
    pub bounds: Vec<Type>,
}

// ──────────────────── universe ────────────────────

#[derive(Debug)]
pub struct ClassUniverse {
    classes: Vec<ClassInfo>,
    methods: Vec<MethodInfo>,
    constructors: Vec<ConstructorInfo>,
    fields: Vec<FieldInfo>,
    type_vars: Vec<TypeVarInfo>,
    by_name: BTreeMap<String, ClassId>,
    object: ClassId,
}

impl ClassUniverse {
    #[must_use]
    pub fn builder() -> ClassUniverseBuilder {
        ClassUniverseBuilder::default()
    }

    /// Core library plus the classes of `descriptor`.
    pub fn from_descriptor(descriptor: UniverseDescriptor) -> Result<Arc<Self>> {
        Ok(Arc::new(
            Self::builder()
                .with_core_library()?
                .with_descriptor(descriptor)
                .build()?,
        ))
    }

    /// Only the built-in core library.
    pub fn core() -> Result<Arc<Self>> {
        Self::from_descriptor(UniverseDescriptor::default())
    }

    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.index()]
    }

    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodInfo {
        &self.methods[id.index()]
    }

    #[must_use]
    pub fn constructor(&self, id: ConstructorId) -> &ConstructorInfo {
        &self.constructors[id.index()]
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldInfo {
        &self.fields[id.index()]
    }

    /// Bounds table entry of a declared variable; `None` for capture variables.
    #[must_use]
    pub fn type_var(&self, var: &TypeVariable) -> Option<&TypeVarInfo> {
        match var.id {
            TypeVarId::Declared(n) => self.type_vars.get(n as usize),
            TypeVarId::Capture(_) => None,
        }
    }

    #[must_use]
    pub fn object(&self) -> ClassId {
        self.object
    }

    #[must_use]
    pub fn object_type(&self) -> Type {
        Type::class(self.object)
    }

    /// All classes in id order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Look up by binary name (`pkg.Outer$Inner`), also accepting the dotted
    /// source form (`pkg.Outer.Inner`).
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        lookup_class(&self.by_name, name)
    }

    pub fn class_for_name(&self, name: &str) -> Result<ClassId> {
        self.lookup(name).ok_or_else(|| OpfError::ClassNotFound {
            name: name.to_string(),
        })
    }

    // ──── declared members ────

    #[must_use]
    pub fn declared_methods(&self, class: ClassId) -> &[MethodId] {
        &self.class(class).methods
    }

    #[must_use]
    pub fn declared_constructors(&self, class: ClassId) -> &[ConstructorId] {
        &self.class(class).constructors
    }

    #[must_use]
    pub fn declared_fields(&self, class: ClassId) -> &[FieldId] {
        &self.class(class).fields
    }

    /// Named member classes, excluding anonymous ones.
    #[must_use]
    pub fn declared_classes(&self, class: ClassId) -> &[ClassId] {
        &self.class(class).member_classes
    }

    #[must_use]
    pub fn enum_constants(&self, class: ClassId) -> &[EnumConstant] {
        &self.class(class).enum_constants
    }

    #[must_use]
    pub fn superclass(&self, class: ClassId) -> Option<&ClassType> {
        self.class(class).superclass.as_ref()
    }

    #[must_use]
    pub fn interfaces(&self, class: ClassId) -> &[ClassType] {
        &self.class(class).interfaces
    }

    /// A declared method by name and erased parameter types. Prefers a
    /// non-bridge method when a bridge shares the erasure.
    #[must_use]
    pub fn declared_method(&self, class: ClassId, name: &str, erased: &[Type]) -> Option<MethodId> {
        let mut fallback = None;
        for &id in self.declared_methods(class) {
            let method = self.method(id);
            if method.name != name || self.erase_all(&method.params) != erased {
                continue;
            }
            if !method.is_bridge() {
                return Some(id);
            }
            fallback.get_or_insert(id);
        }
        fallback
    }

    #[must_use]
    pub fn declared_constructor(&self, class: ClassId, erased: &[Type]) -> Option<ConstructorId> {
        self.declared_constructors(class)
            .iter()
            .copied()
            .find(|&id| self.erase_all(&self.constructor(id).params) == erased)
    }

    // ──── inherited members ────

    /// Public methods including inherited ones, most-derived declaration
    /// first; a method overridden (same name and erased signature as seen
    /// from `class`) by a more-derived one is not repeated.
    #[must_use]
    pub fn methods(&self, class: ClassId) -> Vec<MethodId> {
        let mut levels = Vec::new();
        let mut current = Some(self.generic_type(class));
        while let Some(level) = current {
            current = self
                .superclass(level.class)
                .map(|sup| self.view_supertype(&level, sup));
            levels.push(level);
        }
        let mut interface_levels = Vec::new();
        let mut seen_classes: BTreeSet<ClassId> = levels.iter().map(|l| l.class).collect();
        let mut queue: VecDeque<ClassType> = VecDeque::new();
        for level in &levels {
            for iface in self.interfaces(level.class) {
                queue.push_back(self.view_supertype(level, iface));
            }
        }
        while let Some(iface) = queue.pop_front() {
            if !seen_classes.insert(iface.class) {
                continue;
            }
            for sup in self.interfaces(iface.class) {
                queue.push_back(self.view_supertype(&iface, sup));
            }
            interface_levels.push(iface);
        }

        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for level in levels.iter().chain(&interface_levels) {
            let info = self.class(level.class);
            let subst = Substitution::for_class_args(&info.type_params, &level.args);
            for &id in &info.methods {
                let method = self.method(id);
                if !method.modifiers.is_public() {
                    continue;
                }
                if info.is_interface() && method.is_static() && level.class != class {
                    continue;
                }
                let key = (
                    method.name.clone(),
                    method
                        .params
                        .iter()
                        .map(|p| self.erasure(&p.substitute(&subst)))
                        .collect::<Vec<_>>(),
                );
                if seen.insert(key) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Public fields including inherited ones: declared, then
    /// superinterfaces, then the superclass chain.
    #[must_use]
    pub fn fields(&self, class: ClassId) -> Vec<FieldId> {
        let mut out = Vec::new();
        let mut visited = BTreeSet::new();
        self.collect_public_fields(class, &mut visited, &mut out);
        out
    }

    fn collect_public_fields(
        &self,
        class: ClassId,
        visited: &mut BTreeSet<ClassId>,
        out: &mut Vec<FieldId>,
    ) {
        if !visited.insert(class) {
            return;
        }
        let info = self.class(class);
        out.extend(
            info.fields
                .iter()
                .copied()
                .filter(|&f| self.field(f).modifiers.is_public()),
        );
        for iface in &info.interfaces {
            self.collect_public_fields(iface.class, visited, out);
        }
        if let Some(sup) = &info.superclass {
            self.collect_public_fields(sup.class, visited, out);
        }
    }

    /// Methods in proper supertypes of the declaring class that `method`
    /// overrides. Static, private and package-private-elsewhere methods
    /// cannot be overridden.
    #[must_use]
    pub fn overridden_methods(&self, method: MethodId) -> Vec<MethodId> {
        let info = self.method(method);
        if info.is_static() || info.modifiers.is_private() {
            return Vec::new();
        }
        let erased = self.erase_all(&info.params);
        let package = self.class(info.declaring).package();
        let mut out = Vec::new();
        for sup in self.proper_supertypes(&self.generic_type(info.declaring)) {
            let sup_info = self.class(sup.class);
            let subst = Substitution::for_class_args(&sup_info.type_params, &sup.args);
            for &candidate in &sup_info.methods {
                let cand = self.method(candidate);
                if cand.name != info.name || cand.is_static() || cand.modifiers.is_private() {
                    continue;
                }
                if cand.modifiers.is_package_private() && sup_info.package() != package {
                    continue;
                }
                let seen: Vec<Type> = cand
                    .params
                    .iter()
                    .map(|p| self.erasure(&p.substitute(&subst)))
                    .collect();
                if seen == erased {
                    out.push(candidate);
                }
            }
        }
        out
    }

    // ──── type structure ────

    /// The generic declaration `C<T1..Tn>` (plain `C` if not generic).
    #[must_use]
    pub fn generic_type(&self, class: ClassId) -> ClassType {
        let info = self.class(class);
        ClassType::new(
            class,
            info.type_params
                .iter()
                .map(|v| TypeArg::Type(Type::Var(v.clone())))
                .collect(),
        )
    }

    /// `sup` (declared in the context of `sub.class`) as seen from `sub`.
    fn view_supertype(&self, sub: &ClassType, sup: &ClassType) -> ClassType {
        let info = self.class(sub.class);
        if info.is_generic() && sub.args.is_empty() {
            return ClassType::simple(sup.class);
        }
        sup.substitute(&Substitution::for_class_args(&info.type_params, &sub.args))
    }

    /// Superclass then interfaces of `ty`, instantiated as seen from `ty`.
    /// A raw use of a generic class has raw supertypes.
    #[must_use]
    pub fn direct_supertypes(&self, ty: &ClassType) -> Vec<ClassType> {
        let info = self.class(ty.class);
        info.superclass
            .iter()
            .chain(&info.interfaces)
            .map(|sup| self.view_supertype(ty, sup))
            .collect()
    }

    /// Every proper supertype, breadth first, each class once.
    #[must_use]
    pub fn proper_supertypes(&self, ty: &ClassType) -> Vec<ClassType> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::from([ty.class]);
        let mut queue: VecDeque<ClassType> = self.direct_supertypes(ty).into();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.class) {
                continue;
            }
            queue.extend(self.direct_supertypes(&next));
            out.push(next);
        }
        out
    }

    /// `ty` viewed as an instance of `target`, e.g. `ArrayList<String>` as
    /// `Collection<String>`.
    #[must_use]
    pub fn as_super(&self, ty: &ClassType, target: ClassId) -> Option<ClassType> {
        if ty.class == target {
            return Some(ty.clone());
        }
        if target == self.object {
            return Some(ClassType::simple(target));
        }
        self.direct_supertypes(ty)
            .iter()
            .find_map(|sup| self.as_super(sup, target))
    }

    /// Raw subclass relation.
    #[must_use]
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        self.as_super(&ClassType::simple(sub), sup).is_some()
    }

    /// Type erasure. Capture variables erase to `Object`.
    #[must_use]
    pub fn erasure(&self, ty: &Type) -> Type {
        match ty {
            Type::Class(ct) => Type::class(ct.class),
            Type::Array(element) => Type::array_of(self.erasure(element)),
            Type::Var(var) => self
                .type_var(var)
                .and_then(|info| info.bounds.first())
                .map_or_else(|| self.object_type(), |bound| self.erasure(bound)),
            Type::Primitive(_) | Type::Void | Type::Null => ty.clone(),
        }
    }

    #[must_use]
    pub fn erase_all(&self, types: &[Type]) -> Vec<Type> {
        types.iter().map(|t| self.erasure(t)).collect()
    }

    /// Declared upper bounds, `[Object]` when none were written.
    #[must_use]
    pub fn declared_bounds(&self, var: &TypeVariable) -> Vec<Type> {
        match self.type_var(var) {
            Some(info) if !info.bounds.is_empty() => info.bounds.clone(),
            _ => vec![self.object_type()],
        }
    }

    // ──── rendering ────

    /// Source-style rendering with canonical class names.
    #[must_use]
    pub fn display_type(&self, ty: &Type) -> String {
        match ty {
            Type::Primitive(kind) => kind.name().to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "null".to_string(),
            Type::Class(ct) => self.display_class_type(ct),
            Type::Array(element) => format!("{}[]", self.display_type(element)),
            Type::Var(var) => var.name.to_string(),
        }
    }

    #[must_use]
    pub fn display_class_type(&self, ct: &ClassType) -> String {
        let mut out = self.class(ct.class).canonical_name();
        if !ct.args.is_empty() {
            let args: Vec<String> = ct.args.iter().map(|a| self.display_arg(a)).collect();
            out.push('<');
            out.push_str(&args.join(","));
            out.push('>');
        }
        out
    }

    fn display_arg(&self, arg: &TypeArg) -> String {
        match arg {
            TypeArg::Type(ty) => self.display_type(ty),
            TypeArg::Wildcard(Wildcard::Unbounded) => "?".to_string(),
            TypeArg::Wildcard(Wildcard::Extends(b)) => format!("? extends {}", self.display_type(b)),
            TypeArg::Wildcard(Wildcard::Super(b)) => format!("? super {}", self.display_type(b)),
        }
    }

    /// Erased rendering with binary class names, as used in signatures.
    #[must_use]
    pub fn erased_name(&self, ty: &Type) -> String {
        match self.erasure(ty) {
            Type::Class(ct) => self.class(ct.class).name.clone(),
            Type::Array(element) => format!("{}[]", self.erased_name(&element)),
            other => self.display_type(&other),
        }
    }

    /// `public int pkg.A.f(java.lang.String)`
    #[must_use]
    pub fn method_label(&self, id: MethodId) -> String {
        let m = self.method(id);
        let params: Vec<String> = m.params.iter().map(|p| self.erased_name(p)).collect();
        let mods = m.modifiers.masked(Modifiers::METHOD_MASK).to_string();
        let prefix = if mods.is_empty() { String::new() } else { format!("{mods} ") };
        format!(
            "{prefix}{} {}.{}({})",
            self.erased_name(&m.returns),
            self.class(m.declaring).name,
            m.name,
            params.join(",")
        )
    }

    #[must_use]
    pub fn constructor_label(&self, id: ConstructorId) -> String {
        let c = self.constructor(id);
        let params: Vec<String> = c.params.iter().map(|p| self.erased_name(p)).collect();
        let mods = c.modifiers.masked(Modifiers::CONSTRUCTOR_MASK).to_string();
        let prefix = if mods.is_empty() { String::new() } else { format!("{mods} ") };
        format!("{prefix}{}({})", self.class(c.declaring).name, params.join(","))
    }

    #[must_use]
    pub fn field_label(&self, id: FieldId) -> String {
        let f = self.field(id);
        format!(
            "{} {}.{}",
            self.erased_name(&f.ty),
            self.class(f.declaring).name,
            f.name
        )
    }
}

/// Exact binary name, then `java.lang` for unqualified names, then dotted
/// nested-class paths with `.` replaced by `$` from the right.
fn lookup_class(by_name: &BTreeMap<String, ClassId>, name: &str) -> Option<ClassId> {
    if let Some(&id) = by_name.get(name) {
        return Some(id);
    }
    if !name.contains('.') && !name.contains('$') {
        return by_name.get(&format!("java.lang.{name}")).copied();
    }
    let mut candidate = name.to_string();
    while let Some(dot) = candidate.rfind('.') {
        candidate.replace_range(dot..=dot, "$");
        if let Some(&id) = by_name.get(&candidate) {
            return Some(id);
        }
    }
    None
}

// ──────────────────── builder ────────────────────

#[derive(Debug, Default)]
pub struct ClassUniverseBuilder {
    classes: Vec<ClassDescriptor>,
}

impl ClassUniverseBuilder {
    /// Add the built-in `java.lang`/`java.util` subset.
    pub fn with_core_library(self) -> Result<Self> {
        let core = UniverseDescriptor::from_json(CORE_LIBRARY)?;
        Ok(self.with_descriptor(core))
    }

    #[must_use]
    pub fn with_descriptor(mut self, descriptor: UniverseDescriptor) -> Self {
        self.classes.extend(descriptor.classes);
        self
    }

    pub fn build(self) -> Result<ClassUniverse> {
        let mut descs = self.classes;
        descs.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = descs.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(descriptor_error(format!("class {} described twice", pair[0].name)));
        }
        let by_name: BTreeMap<String, ClassId> = descs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), ClassId(index_u32(i))))
            .collect();
        let Some(&object) = by_name.get(OBJECT) else {
            return Err(descriptor_error(format!("universe does not define {OBJECT}")));
        };

        let mut state = BuildState {
            by_name: &by_name,
            arity: Vec::with_capacity(descs.len()),
            type_vars: Vec::new(),
        };

        // Pass 1: class shells and class-level type variables.
        let mut classes = Vec::with_capacity(descs.len());
        for (i, desc) in descs.iter().enumerate() {
            let id = ClassId(index_u32(i));
            let modifiers = Modifiers::from_keywords(&desc.modifiers)
                .map_err(|err| in_class(&desc.name, &err))?;
            let type_params = state.declare_vars(&desc.type_params);
            state.arity.push(type_params.len());
            let declaring = match &desc.enclosing {
                Some(name) => Some(lookup_class(&by_name, name).ok_or_else(|| {
                    descriptor_error(format!("{}: unknown enclosing class {name}", desc.name))
                })?),
                None => desc
                    .name
                    .rfind('$')
                    .and_then(|dollar| by_name.get(&desc.name[..dollar]).copied()),
            };
            let anonymous = desc.anonymous
                || desc.name.rsplit('$').next().is_some_and(|tail| {
                    desc.name.contains('$') && tail.chars().all(|c| c.is_ascii_digit())
                });
            let kind = desc.kind;
            let modifiers = if kind == ClassKind::Interface {
                modifiers | Modifiers::INTERFACE | Modifiers::ABSTRACT
            } else {
                modifiers
            };
            classes.push(ClassInfo {
                id,
                name: desc.name.clone(),
                kind,
                modifiers,
                type_params,
                superclass: None,
                interfaces: Vec::new(),
                declaring,
                anonymous,
                enum_body_of: None,
                annotations: desc.annotations.clone(),
                constructors: Vec::new(),
                methods: Vec::new(),
                fields: Vec::new(),
                member_classes: Vec::new(),
                enum_constants: Vec::new(),
            });
        }

        // Enum constants and their bodies.
        for (i, desc) in descs.iter().enumerate() {
            for constant in &desc.enum_constants {
                let body = match &constant.body {
                    Some(name) => {
                        let body = lookup_class(&by_name, name).ok_or_else(|| {
                            descriptor_error(format!(
                                "{}.{}: unknown body class {name}",
                                desc.name, constant.name
                            ))
                        })?;
                        let info = &mut classes[body.index()];
                        info.enum_body_of = Some(ClassId(index_u32(i)));
                        info.anonymous = true;
                        info.declaring.get_or_insert(ClassId(index_u32(i)));
                        Some(body)
                    }
                    None => None,
                };
                classes[i].enum_constants.push(EnumConstant {
                    name: constant.name.clone(),
                    body,
                });
            }
        }
        for i in 0..classes.len() {
            if let Some(owner) = classes[i].declaring
                && !classes[i].anonymous
            {
                let id = classes[i].id;
                classes[owner.index()].member_classes.push(id);
            }
        }

        // Pass 2: bounds, superclass, interfaces.
        let enum_class = by_name.get("java.lang.Enum").copied();
        for (i, desc) in descs.iter().enumerate() {
            let scope = class_scope(&classes, ClassId(index_u32(i)));
            state.resolve_bounds(&desc.type_params, &classes[i].type_params, &scope, &desc.name)?;
            let superclass = match &desc.superclass {
                Some(text) => Some(state.resolve_class_type(text, &scope, &desc.name)?),
                None if classes[i].is_interface() || classes[i].id == object => None,
                None => Some(match (classes[i].kind, classes[i].enum_body_of, enum_class) {
                    (_, Some(owner), _) => ClassType::simple(owner),
                    (ClassKind::Enum, None, Some(e)) => ClassType::new(
                        e,
                        vec![TypeArg::Type(Type::class(classes[i].id))],
                    ),
                    _ => ClassType::simple(object),
                }),
            };
            let interfaces = desc
                .interfaces
                .iter()
                .map(|text| state.resolve_class_type(text, &scope, &desc.name))
                .collect::<Result<Vec<_>>>()?;
            classes[i].superclass = superclass;
            classes[i].interfaces = interfaces;
        }
        check_acyclic(&classes)?;

        // Pass 3: members, in canonical order.
        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        let mut fields = Vec::new();
        for (i, desc) in descs.iter().enumerate() {
            let class_id = ClassId(index_u32(i));
            let scope = class_scope(&classes, class_id);
            let in_enum_body = classes[i].enum_body_of.is_some();

            let mut ctor_descs: Vec<_> = desc.constructors.iter().collect();
            ctor_descs.sort_by_key(|c| signature_key(&c.params));
            for ctor in ctor_descs {
                let modifiers = Modifiers::from_keywords(&ctor.modifiers)
                    .map_err(|err| in_class(&desc.name, &err))?;
                let type_params = state.declare_vars(&ctor.type_params);
                let member_scope = [type_params.as_slice(), scope.as_slice()].concat();
                state.resolve_bounds(&ctor.type_params, &type_params, &member_scope, &desc.name)?;
                let params = state.resolve_all(&ctor.params, &member_scope, &desc.name)?;
                let id = ConstructorId(index_u32(constructors.len()));
                classes[i].constructors.push(id);
                constructors.push(ConstructorInfo {
                    id,
                    declaring: class_id,
                    modifiers,
                    type_params,
                    params,
                    synthetic: ctor.synthetic,
                });
            }

            let mut method_descs: Vec<_> = desc.methods.iter().collect();
            method_descs.sort_by_key(|m| (m.name.clone(), signature_key(&m.params), m.returns.clone()));
            for method in method_descs {
                let modifiers = Modifiers::from_keywords(&method.modifiers)
                    .map_err(|err| in_class(&desc.name, &err))?;
                let modifiers = if classes[i].is_interface() && !modifiers.is_private() {
                    modifiers | Modifiers::PUBLIC
                } else {
                    modifiers
                };
                let type_params = state.declare_vars(&method.type_params);
                let member_scope = [type_params.as_slice(), scope.as_slice()].concat();
                state.resolve_bounds(&method.type_params, &type_params, &member_scope, &desc.name)?;
                let params = state.resolve_all(&method.params, &member_scope, &desc.name)?;
                let returns = state.resolve(&method.returns, &member_scope, &desc.name)?;
                let variant = match (method.bridge, method.synthetic, in_enum_body) {
                    (bridge, _, true) => MemberVariant::EnumConstantOverride { bridge },
                    (true, _, false) => MemberVariant::Bridge,
                    (false, true, false) => MemberVariant::Synthetic,
                    (false, false, false) => MemberVariant::Ordinary,
                };
                let id = MethodId(index_u32(methods.len()));
                classes[i].methods.push(id);
                methods.push(MethodInfo {
                    id,
                    declaring: class_id,
                    name: method.name.clone(),
                    modifiers,
                    type_params,
                    params,
                    returns,
                    variant,
                    annotations: method.annotations.clone(),
                });
            }

            let mut field_descs: Vec<_> = desc.fields.iter().collect();
            field_descs.sort_by(|a, b| a.name.cmp(&b.name));
            for field in field_descs {
                let mut modifiers = Modifiers::from_keywords(&field.modifiers)
                    .map_err(|err| in_class(&desc.name, &err))?;
                if classes[i].is_interface() {
                    modifiers = modifiers | Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
                }
                let ty = state.resolve(&field.ty, &scope, &desc.name)?;
                let id = FieldId(index_u32(fields.len()));
                classes[i].fields.push(id);
                fields.push(FieldInfo {
                    id,
                    declaring: class_id,
                    name: field.name.clone(),
                    modifiers,
                    ty,
                });
            }
        }

        Ok(ClassUniverse {
            classes,
            methods,
            constructors,
            fields,
            type_vars: state.type_vars,
            by_name,
            object,
        })
    }
}

struct BuildState<'a> {
    by_name: &'a BTreeMap<String, ClassId>,
    arity: Vec<usize>,
    type_vars: Vec<TypeVarInfo>,
}

impl BuildState<'_> {
    fn declare_vars(&mut self, params: &[TypeParamDescriptor]) -> Vec<TypeVariable> {
        params
            .iter()
            .map(|param| {
                let var = TypeVariable {
                    id: TypeVarId::Declared(index_u32(self.type_vars.len())),
                    name: Arc::from(param.name.as_str()),
                };
                self.type_vars.push(TypeVarInfo {
                    var: var.clone(),
                    bounds: Vec::new(),
                });
                var
            })
            .collect()
    }

    fn resolve_bounds(
        &mut self,
        params: &[TypeParamDescriptor],
        vars: &[TypeVariable],
        scope: &[TypeVariable],
        owner: &str,
    ) -> Result<()> {
        for (param, var) in params.iter().zip(vars) {
            let bounds = self.resolve_all(&param.bounds, scope, owner)?;
            if let TypeVarId::Declared(n) = var.id {
                self.type_vars[n as usize].bounds = bounds;
            }
        }
        Ok(())
    }

    fn resolve_all(&self, texts: &[String], scope: &[TypeVariable], owner: &str) -> Result<Vec<Type>> {
        texts.iter().map(|t| self.resolve(t, scope, owner)).collect()
    }

    fn resolve(&self, text: &str, scope: &[TypeVariable], owner: &str) -> Result<Type> {
        let expr = TypeExpr::parse(text).map_err(|err| in_class(owner, &err))?;
        self.resolve_expr(&expr, scope, owner)
    }

    fn resolve_class_type(&self, text: &str, scope: &[TypeVariable], owner: &str) -> Result<ClassType> {
        match self.resolve(text, scope, owner)? {
            Type::Class(ct) => Ok(ct),
            _ => Err(descriptor_error(format!("{owner}: {text} is not a class type"))),
        }
    }

    fn resolve_expr(&self, expr: &TypeExpr, scope: &[TypeVariable], owner: &str) -> Result<Type> {
        let (name, args) = match expr {
            TypeExpr::Array(element) => {
                return Ok(Type::array_of(self.resolve_expr(element, scope, owner)?));
            }
            TypeExpr::Named { name, args } => (name, args),
        };
        if args.is_empty() {
            if let Some(var) = scope.iter().find(|v| *v.name == **name) {
                return Ok(Type::Var(var.clone()));
            }
            if name == "void" {
                return Ok(Type::Void);
            }
            if let Some(kind) = PrimitiveKind::from_name(name) {
                return Ok(Type::Primitive(kind));
            }
        }
        let Some(class) = lookup_class(self.by_name, name) else {
            return Err(descriptor_error(format!("{owner}: unresolved type name {name}")));
        };
        if !args.is_empty() && args.len() != self.arity[class.index()] {
            return Err(descriptor_error(format!(
                "{owner}: {name} takes {} type arguments, {} given",
                self.arity[class.index()],
                args.len()
            )));
        }
        let args = args
            .iter()
            .map(|arg| {
                Ok(match arg {
                    ArgExpr::Type(t) => TypeArg::Type(self.resolve_expr(t, scope, owner)?),
                    ArgExpr::Unbounded => TypeArg::Wildcard(Wildcard::Unbounded),
                    ArgExpr::Extends(t) => TypeArg::Wildcard(Wildcard::Extends(Box::new(
                        self.resolve_expr(t, scope, owner)?,
                    ))),
                    ArgExpr::Super(t) => TypeArg::Wildcard(Wildcard::Super(Box::new(
                        self.resolve_expr(t, scope, owner)?,
                    ))),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Type::Class(ClassType::new(class, args)))
    }
}

/// Type variables visible inside a class body: its own, then those of
/// enclosing classes.
fn class_scope(classes: &[ClassInfo], class: ClassId) -> Vec<TypeVariable> {
    let mut scope = Vec::new();
    let mut current = Some(class);
    while let Some(id) = current {
        scope.extend(classes[id.index()].type_params.iter().cloned());
        current = classes[id.index()].declaring;
    }
    scope
}

fn check_acyclic(classes: &[ClassInfo]) -> Result<()> {
    for class in classes {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<ClassId> = class
            .superclass
            .iter()
            .chain(&class.interfaces)
            .map(|t| t.class)
            .collect();
        while let Some(next) = stack.pop() {
            if next == class.id {
                return Err(descriptor_error(format!("cyclic inheritance through {}", class.name)));
            }
            if seen.insert(next) {
                let info = &classes[next.index()];
                stack.extend(info.superclass.iter().chain(&info.interfaces).map(|t| t.class));
            }
        }
    }
    Ok(())
}

fn signature_key(params: &[String]) -> String {
    params
        .iter()
        .map(|p| p.split_whitespace().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
}

#[allow(clippy::cast_possible_truncation)]
fn index_u32(index: usize) -> u32 {
    index as u32
}

fn descriptor_error(details: String) -> OpfError {
    OpfError::Descriptor { details }
}

fn in_class(class: &str, err: &OpfError) -> OpfError {
    descriptor_error(format!("{class}: {err}"))
}
