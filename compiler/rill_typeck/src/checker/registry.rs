//! The document registry: named types, reactive fields, functions,
//! services, and the structural-name table for anonymous types.
//!
//! One registry per compilation run, owned by the
//! [`Checker`](crate::Checker); append/lookup only, single writer.

use rustc_hash::FxHashMap;

use rill_ir::{ExprId, Name, Span, StringInterner, TypeId};

/// A declared message type.
pub struct MessageInfo {
    pub ty: TypeId,
    /// Default-value expressions per field, for literal upgrade fill.
    pub defaults: FxHashMap<Name, ExprId>,
    pub span: Span,
}

/// A declared enum type.
pub struct EnumInfo {
    pub ty: TypeId,
    pub variants: Vec<Name>,
    pub span: Span,
}

/// A reactive document field.
#[derive(Copy, Clone)]
pub struct FieldInfo {
    pub ty: TypeId,
    pub span: Span,
}

/// A declared function or dispatcher.
#[derive(Copy, Clone)]
pub struct FunctionInfo {
    /// The interned `Func` type.
    pub ty: TypeId,
    pub span: Span,
}

/// A declared remote service.
#[derive(Copy, Clone)]
pub struct ServiceInfo {
    /// The interned service object shape: a nominal message whose
    /// fields are the service's methods.
    pub ty: TypeId,
    pub span: Span,
}

/// Registry of everything resolvable at document scope.
#[derive(Default)]
pub struct DocumentRegistry {
    /// Every top-level name with its declaration span, for duplicate
    /// detection across declaration kinds.
    top_level: FxHashMap<Name, Span>,
    messages: FxHashMap<Name, MessageInfo>,
    enums: FxHashMap<Name, EnumInfo>,
    /// Variant name -> owning enum name.
    variants: FxHashMap<Name, Name>,
    fields: FxHashMap<Name, FieldInfo>,
    viewer_fields: FxHashMap<Name, FieldInfo>,
    functions: FxHashMap<Name, FunctionInfo>,
    services: FxHashMap<Name, ServiceInfo>,
    channels: FxHashMap<Name, Span>,
    web_paths: FxHashMap<Name, Span>,
    cron_names: FxHashMap<Name, Span>,
    rpc_names: FxHashMap<Name, Span>,
    metric_names: FxHashMap<Name, Span>,
    policy_names: FxHashMap<Name, Span>,
    /// Synthesized names for deduplicated anonymous structural types.
    structural_names: FxHashMap<TypeId, Name>,
    anon_counter: u32,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_top_level(&mut self, name: Name, span: Span) -> Result<(), Span> {
        if let Some(&prior) = self.top_level.get(&name) {
            return Err(prior);
        }
        self.top_level.insert(name, span);
        Ok(())
    }

    pub fn declare_message(&mut self, name: Name, info: MessageInfo) -> Result<(), Span> {
        let span = info.span;
        self.claim_top_level(name, span)?;
        self.messages.insert(name, info);
        Ok(())
    }

    /// Declare an enum; its variant names also claim the top-level
    /// namespace so bare variant references resolve unambiguously.
    pub fn declare_enum(&mut self, name: Name, info: EnumInfo) -> Result<(), Span> {
        let span = info.span;
        self.claim_top_level(name, span)?;
        for variant in &info.variants {
            self.claim_top_level(*variant, span)?;
            self.variants.insert(*variant, name);
        }
        self.enums.insert(name, info);
        Ok(())
    }

    pub fn declare_field(&mut self, name: Name, info: FieldInfo) -> Result<(), Span> {
        self.claim_top_level(name, info.span)?;
        self.fields.insert(name, info);
        Ok(())
    }

    pub fn declare_viewer_field(&mut self, name: Name, info: FieldInfo) -> Result<(), Span> {
        // Viewer fields live in their own per-connection table.
        if let Some(prior) = self.viewer_fields.get(&name) {
            return Err(prior.span);
        }
        self.viewer_fields.insert(name, info);
        Ok(())
    }

    pub fn declare_function(&mut self, name: Name, info: FunctionInfo) -> Result<(), Span> {
        self.claim_top_level(name, info.span)?;
        self.functions.insert(name, info);
        Ok(())
    }

    pub fn declare_service(&mut self, name: Name, info: ServiceInfo) -> Result<(), Span> {
        self.claim_top_level(name, info.span)?;
        self.services.insert(name, info);
        Ok(())
    }

    pub fn declare_channel(&mut self, name: Name, span: Span) -> Result<(), Span> {
        match self.channels.get(&name) {
            Some(&prior) => Err(prior),
            None => {
                self.channels.insert(name, span);
                Ok(())
            }
        }
    }

    pub fn declare_web_path(&mut self, path: Name, span: Span) -> Result<(), Span> {
        match self.web_paths.get(&path) {
            Some(&prior) => Err(prior),
            None => {
                self.web_paths.insert(path, span);
                Ok(())
            }
        }
    }

    pub fn declare_cron(&mut self, name: Name, span: Span) -> Result<(), Span> {
        match self.cron_names.get(&name) {
            Some(&prior) => Err(prior),
            None => {
                self.cron_names.insert(name, span);
                Ok(())
            }
        }
    }

    pub fn declare_rpc(&mut self, name: Name, span: Span) -> Result<(), Span> {
        match self.rpc_names.get(&name) {
            Some(&prior) => Err(prior),
            None => {
                self.rpc_names.insert(name, span);
                Ok(())
            }
        }
    }

    pub fn declare_metric(&mut self, name: Name, span: Span) -> Result<(), Span> {
        match self.metric_names.get(&name) {
            Some(&prior) => Err(prior),
            None => {
                self.metric_names.insert(name, span);
                Ok(())
            }
        }
    }

    pub fn declare_policy(&mut self, name: Name, span: Span) -> Result<(), Span> {
        match self.policy_names.get(&name) {
            Some(&prior) => Err(prior),
            None => {
                self.policy_names.insert(name, span);
                Ok(())
            }
        }
    }

    pub fn message(&self, name: Name) -> Option<&MessageInfo> {
        self.messages.get(&name)
    }

    pub fn enum_info(&self, name: Name) -> Option<&EnumInfo> {
        self.enums.get(&name)
    }

    /// The enum owning a bare variant name, if any.
    pub fn variant_owner(&self, variant: Name) -> Option<Name> {
        self.variants.get(&variant).copied()
    }

    pub fn field(&self, name: Name) -> Option<FieldInfo> {
        self.fields.get(&name).copied()
    }

    pub fn viewer_field(&self, name: Name) -> Option<FieldInfo> {
        self.viewer_fields.get(&name).copied()
    }

    pub fn function(&self, name: Name) -> Option<FunctionInfo> {
        self.functions.get(&name).copied()
    }

    pub fn service(&self, name: Name) -> Option<ServiceInfo> {
        self.services.get(&name).copied()
    }

    /// Resolve a declared type name (message or enum).
    pub fn named_type(&self, name: Name) -> Option<TypeId> {
        self.messages
            .get(&name)
            .map(|m| m.ty)
            .or_else(|| self.enums.get(&name).map(|e| e.ty))
    }

    /// The synthesized name of a deduplicated anonymous structural
    /// type, stable within a run; assigned on first request.
    pub fn structural_name(&mut self, ty: TypeId, strings: &StringInterner) -> Name {
        if let Some(&name) = self.structural_names.get(&ty) {
            return name;
        }
        let name = strings.intern(&format!("_AnonMsg{}", self.anon_counter));
        self.anon_counter += 1;
        self.structural_names.insert(ty, name);
        name
    }

    /// All synthesized structural names, for the code generator.
    pub fn structural_names(&self) -> &FxHashMap<TypeId, Name> {
        &self.structural_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_top_level_rejected() {
        let mut registry = DocumentRegistry::new();
        let name = Name::from_raw(1);
        assert!(registry
            .declare_field(name, FieldInfo { ty: TypeId::INT, span: Span::new(0, 5) })
            .is_ok());
        let err = registry.declare_function(
            name,
            FunctionInfo { ty: TypeId::INT, span: Span::new(10, 15) },
        );
        assert_eq!(err, Err(Span::new(0, 5)));
    }

    #[test]
    fn test_structural_name_stable() {
        let mut registry = DocumentRegistry::new();
        let strings = StringInterner::new();
        let ty = TypeId::from_raw(42);
        let a = registry.structural_name(ty, &strings);
        let b = registry.structural_name(ty, &strings);
        assert_eq!(a, b);
        assert_eq!(strings.resolve(a), "_AnonMsg0");
        let other = registry.structural_name(TypeId::from_raw(43), &strings);
        assert_eq!(strings.resolve(other), "_AnonMsg1");
    }

    #[test]
    fn test_variant_owner() {
        let mut registry = DocumentRegistry::new();
        let color = Name::from_raw(1);
        let red = Name::from_raw(2);
        registry
            .declare_enum(
                color,
                EnumInfo {
                    ty: TypeId::from_raw(9),
                    variants: vec![red],
                    span: Span::DUMMY,
                },
            )
            .ok();
        assert_eq!(registry.variant_owner(red), Some(color));
        assert_eq!(registry.variant_owner(color), None);
    }
}
