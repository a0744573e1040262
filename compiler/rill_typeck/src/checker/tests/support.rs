//! Script-building support for checker tests.
//!
//! The checker consumes an already-parsed tree, so tests assemble small
//! documents directly against the arena.

use rill_ir::{
    BinaryOp, CronDef, DefinitionKind, EnumDef, ExprArena, ExprId, ExprKind, FieldDef, FieldInit,
    FunctionDef, FunctionPurity, HandlerDef, MessageDef, MessageField, MetricDef, Name, Param,
    Script, ServiceDef, ServiceMethod, Span, StaticDef, StaticPolicy, StmtId, StmtKind, StmtRange,
    StringInterner, TypeExpr, TypeExprKind, WebGetDef, WebPutDef,
};

use crate::checker::{check_script, output::TypedScript};

/// A script under construction plus its arena and interner.
pub struct Build {
    pub arena: ExprArena,
    pub strings: StringInterner,
    pub script: Script,
    next_span: u32,
}

impl Build {
    pub fn new() -> Self {
        Build {
            arena: ExprArena::new(),
            strings: StringInterner::new(),
            script: Script::new(),
            next_span: 0,
        }
    }

    /// Distinct spans keep diagnostic ordering deterministic in tests.
    fn span(&mut self) -> Span {
        let start = self.next_span;
        self.next_span += 4;
        Span::new(start, start + 3)
    }

    pub fn name(&self, text: &str) -> Name {
        self.strings.intern(text)
    }

    // --- expressions ---

    pub fn int(&mut self, value: i64) -> ExprId {
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Int(value), span)
    }

    pub fn double(&mut self, value: f64) -> ExprId {
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Double(value), span)
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Bool(value), span)
    }

    pub fn string_lit(&mut self, value: &str) -> ExprId {
        let name = self.name(value);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Str(name), span)
    }

    pub fn null(&mut self) -> ExprId {
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Null, span)
    }

    pub fn ident(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Ident(name), span)
    }

    pub fn viewer_ref(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::ViewerRef(name), span)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let span = self.span();
        self.arena
            .alloc_expr(ExprKind::Binary { op, left, right }, span)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        let span = self.span();
        self.arena
            .alloc_expr(ExprKind::Assign { target, value }, span)
    }

    pub fn call(&mut self, callee: ExprId, args: &[ExprId]) -> ExprId {
        let args = self.arena.alloc_expr_list(args);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Call { callee, args }, span)
    }

    pub fn field_access(&mut self, receiver: ExprId, field: &str) -> ExprId {
        let field = self.name(field);
        let span = self.span();
        self.arena
            .alloc_expr(ExprKind::Field { receiver, field }, span)
    }

    pub fn index(&mut self, receiver: ExprId, index: ExprId) -> ExprId {
        let span = self.span();
        self.arena
            .alloc_expr(ExprKind::Index { receiver, index }, span)
    }

    pub fn array(&mut self, elements: &[ExprId]) -> ExprId {
        let elements = self.arena.alloc_expr_list(elements);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Array(elements), span)
    }

    pub fn tuple(&mut self, elements: &[ExprId]) -> ExprId {
        let elements = self.arena.alloc_expr_list(elements);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Tuple(elements), span)
    }

    pub fn object(&mut self, fields: &[(&str, ExprId)]) -> ExprId {
        let inits: Vec<FieldInit> = fields
            .iter()
            .map(|(name, value)| FieldInit {
                name: self.name(name),
                value: Some(*value),
                span: Span::DUMMY,
            })
            .collect();
        let fields = self.arena.alloc_fields(inits);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Object(fields), span)
    }

    pub fn lambda(&mut self, params: &[(&str, Option<&str>)], body: ExprId) -> ExprId {
        let params: Vec<Param> = params
            .iter()
            .map(|(name, ty)| Param {
                name: self.name(name),
                ty: ty.map(|t| self.named_ty(t)),
                span: Span::DUMMY,
            })
            .collect();
        let params = self.arena.alloc_params(params);
        let span = self.span();
        self.arena.alloc_expr(ExprKind::Lambda { params, body }, span)
    }

    // --- type annotations ---

    pub fn named_ty(&self, text: &str) -> TypeExpr {
        TypeExpr::named(self.name(text), Span::DUMMY)
    }

    pub fn maybe_ty(&self, text: &str) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::Maybe(Box::new(self.named_ty(text))),
            span: Span::DUMMY,
        }
    }

    pub fn list_ty(&self, text: &str) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::List(Box::new(self.named_ty(text))),
            span: Span::DUMMY,
        }
    }

    pub fn func_ty(&self, params: &[TypeExpr], ret: TypeExpr) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::Func {
                params: params.to_vec(),
                ret: Box::new(ret),
            },
            span: Span::DUMMY,
        }
    }

    pub fn param(&self, name: &str, ty: TypeExpr) -> Param {
        Param {
            name: self.name(name),
            ty: Some(ty),
            span: Span::DUMMY,
        }
    }

    // --- statements ---

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        let span = self.span();
        self.arena.alloc_stmt(StmtKind::Expr(expr), span)
    }

    pub fn let_stmt(&mut self, name: &str, ty: Option<TypeExpr>, init: ExprId) -> StmtId {
        let name = self.name(name);
        let span = self.span();
        self.arena.alloc_stmt(StmtKind::Let { name, ty, init }, span)
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        let span = self.span();
        self.arena.alloc_stmt(StmtKind::Return { value }, span)
    }

    pub fn abort_stmt(&mut self) -> StmtId {
        let span = self.span();
        self.arena.alloc_stmt(StmtKind::Abort, span)
    }

    pub fn if_stmt(
        &mut self,
        cond: ExprId,
        then_block: StmtRange,
        else_block: Option<StmtRange>,
    ) -> StmtId {
        let span = self.span();
        self.arena.alloc_stmt(
            StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            span,
        )
    }

    pub fn block(&mut self, stmts: &[StmtId]) -> StmtRange {
        self.arena.alloc_block(stmts)
    }

    // --- definitions ---

    pub fn message(&mut self, name: &str, fields: &[(&str, &str, Option<ExprId>)]) {
        let fields = fields
            .iter()
            .map(|(field, ty, default)| MessageField {
                name: self.name(field),
                ty: self.named_ty(ty),
                default: *default,
                span: Span::DUMMY,
            })
            .collect();
        let name = self.name(name);
        let span = self.span();
        self.script
            .push(DefinitionKind::Message(MessageDef { name, fields }), span);
    }

    /// A message whose single field type is given as a full annotation.
    pub fn message_with_ty(&mut self, name: &str, field: &str, ty: TypeExpr) {
        let fields = vec![MessageField {
            name: self.name(field),
            ty,
            default: None,
            span: Span::DUMMY,
        }];
        let name = self.name(name);
        let span = self.span();
        self.script
            .push(DefinitionKind::Message(MessageDef { name, fields }), span);
    }

    pub fn enum_def(&mut self, name: &str, variants: &[&str]) {
        let variants = variants.iter().map(|v| self.name(v)).collect();
        let name = self.name(name);
        let span = self.span();
        self.script
            .push(DefinitionKind::Enum(EnumDef { name, variants }), span);
    }

    pub fn field_def(&mut self, name: &str, ty: Option<&str>, init: Option<ExprId>) {
        let def = FieldDef {
            name: self.name(name),
            ty: ty.map(|t| self.named_ty(t)),
            init,
            viewer: false,
            span: Span::DUMMY,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Field(def), span);
    }

    pub fn viewer_field_def(&mut self, name: &str, ty: Option<&str>, init: Option<ExprId>) {
        let def = FieldDef {
            name: self.name(name),
            ty: ty.map(|t| self.named_ty(t)),
            init,
            viewer: true,
            span: Span::DUMMY,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Field(def), span);
    }

    pub fn function(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
        ret: Option<&str>,
        body: StmtRange,
        purity: FunctionPurity,
        abortable: bool,
    ) {
        let params = params
            .iter()
            .map(|(param, ty)| Param {
                name: self.name(param),
                ty: Some(self.named_ty(ty)),
                span: Span::DUMMY,
            })
            .collect();
        let def = FunctionDef {
            name: self.name(name),
            params,
            ret: ret.map(|t| self.named_ty(t)),
            body,
            purity,
            abortable,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Function(def), span);
    }

    /// A function whose parameters carry full annotations (e.g. func
    /// types).
    pub fn function_typed(
        &mut self,
        name: &str,
        params: Vec<Param>,
        ret: Option<&str>,
        body: StmtRange,
        purity: FunctionPurity,
        abortable: bool,
    ) {
        let def = FunctionDef {
            name: self.name(name),
            params,
            ret: ret.map(|t| self.named_ty(t)),
            body,
            purity,
            abortable,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Function(def), span);
    }

    pub fn handler(&mut self, channel: &str, message: &str, binding: &str, body: StmtRange) {
        let def = HandlerDef {
            channel: self.name(channel),
            message: self.name(message),
            binding: self.name(binding),
            body,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Handler(def), span);
    }

    pub fn constructor(&mut self, body: StmtRange) {
        let span = self.span();
        self.script
            .push(DefinitionKind::Constructor(rill_ir::ConstructorDef { body }), span);
    }

    pub fn cron(&mut self, name: &str, schedule: &str, body: StmtRange) {
        let def = CronDef {
            name: self.name(name),
            schedule: self.name(schedule),
            body,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Cron(def), span);
    }

    pub fn web_get(&mut self, path: &str, body: StmtRange) {
        let def = WebGetDef {
            path: self.name(path),
            body,
        };
        let span = self.span();
        self.script.push(DefinitionKind::WebGet(def), span);
    }

    pub fn web_put(&mut self, path: &str, message: &str, binding: &str, body: StmtRange) {
        let def = WebPutDef {
            path: self.name(path),
            message: self.name(message),
            binding: self.name(binding),
            body,
        };
        let span = self.span();
        self.script.push(DefinitionKind::WebPut(def), span);
    }

    pub fn service(&mut self, name: &str, methods: &[(&str, &str, &str)]) {
        let methods = methods
            .iter()
            .map(|(method, input, output)| ServiceMethod {
                name: self.name(method),
                input: self.name(input),
                output: self.name(output),
                span: Span::DUMMY,
            })
            .collect();
        let def = ServiceDef {
            name: self.name(name),
            methods,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Service(def), span);
    }

    pub fn metric(&mut self, name: &str, value: ExprId) {
        let def = MetricDef {
            name: self.name(name),
            value,
        };
        let span = self.span();
        self.script.push(DefinitionKind::Metric(def), span);
    }

    pub fn static_block(&mut self, policies: &[(&str, ExprId)]) {
        let policies = policies
            .iter()
            .map(|(policy, value)| StaticPolicy {
                name: self.name(policy),
                value: *value,
                span: Span::DUMMY,
            })
            .collect();
        let span = self.span();
        self.script
            .push(DefinitionKind::Static(StaticDef { policies }), span);
    }

    /// Run the checker over the assembled script.
    pub fn check(&self) -> TypedScript {
        check_script(&self.script, &self.arena, &self.strings)
    }
}
