//! Definition registration glue.
//!
//! Each declaration kind exposes one contract: compute its free-name
//! set, register with the scheduler, and — once scheduled — build its
//! scoped environment and type its bodies. Declaration order in source
//! never matters; the scheduler orders execution by dependency.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use rill_diagnostic::{Diagnostic, ErrorCode};
use rill_ir::{
    ConstructorDef, CronDef, Definition, DefinitionKind, DispatcherDef, EnumDef, FieldDef,
    FunctionDef, FunctionPurity, HandlerDef, MessageDef, MetricDef, Name, Param, RpcDef, Script,
    ServiceDef, Span, StaticDef, TypeId, WebGetDef, WebPutDef,
};
use rill_types::{FuncData, FuncKind, MessageFieldTy, TypeData};

use crate::checker::output::{FieldRecord, FunctionRecord, MetricRecord};
use crate::checker::registry::{EnumInfo, FieldInfo, FunctionInfo, MessageInfo, ServiceInfo};
use crate::checker::Checker;
use crate::env::{Environment, Local, ReturnContract};
use crate::free::{free_block, free_expr, free_type_expr, FreeEnvironment, Require};
use crate::infer::stmts::judge_store;
use crate::infer::{infer_expr, type_stmt};
use crate::returns::block_always_returns;
use crate::root::TypeCheckerRoot;
use crate::watch::{DependencyTracker, Watcher, WatcherKind};

/// Register every definition of a script, in source order.
pub fn register_script<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    script: &'a Script,
) {
    for def in &script.defs {
        register_definition(root, ck, def);
    }
}

fn register_definition<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a Definition,
) {
    let span = def.span;
    match &def.kind {
        DefinitionKind::Message(message) => register_message(root, ck, message, span),
        DefinitionKind::Enum(enumeration) => register_enum(root, ck, enumeration, span),
        DefinitionKind::Field(field) => register_field(root, ck, field, span),
        DefinitionKind::Function(function) => register_function(root, ck, function, span),
        DefinitionKind::Dispatcher(dispatcher) => register_dispatcher(root, ck, dispatcher, span),
        DefinitionKind::Constructor(constructor) => {
            register_constructor(root, ck, constructor, span);
        }
        DefinitionKind::Handler(handler) => register_handler(root, ck, handler, span),
        DefinitionKind::Cron(cron) => register_cron(root, ck, cron, span),
        DefinitionKind::WebGet(get) => register_web_get(root, ck, get, span),
        DefinitionKind::WebPut(put) => register_web_put(root, ck, put, span),
        DefinitionKind::Service(service) => register_service(root, ck, service, span),
        DefinitionKind::Rpc(rpc) => register_rpc(root, ck, rpc, span),
        DefinitionKind::Metric(metric) => register_metric(root, ck, metric, span),
        DefinitionKind::Static(static_def) => register_static(root, ck, static_def, span),
    }
}

// --- shared helpers ---

/// Free names of a parameterized body: parameters bind, annotations and
/// the body itself contribute.
fn signature_requires<'a>(
    ck: &Checker<'a>,
    params: &[Param],
    ret: Option<&rill_ir::TypeExpr>,
    body: rill_ir::StmtRange,
) -> Vec<Require> {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    fe.push_scope();
    for param in params {
        fe.bind(param.name);
        if let Some(ty) = &param.ty {
            free_type_expr(strings, &mut fe, ty);
        }
    }
    if let Some(ret) = ret {
        free_type_expr(strings, &mut fe, ret);
    }
    free_block(arena, strings, &mut fe, body);
    fe.pop_scope();
    fe.into_requires()
}

fn emit_duplicate(ck: &mut Checker<'_>, what: &str, name: Name, span: Span, prior: Span) {
    let rendered = ck.context.strings.resolve(name);
    ck.emit(
        Diagnostic::error(ErrorCode::E4001)
            .with_message(format!("duplicate {what} `{rendered}`"))
            .with_label(span, "already declared")
            .with_secondary_label(prior, "previous declaration"),
    );
}

/// Resolve a parameter list; `None` when any annotation fails or is
/// missing (top-level parameters must be annotated).
fn resolve_params(ck: &mut Checker<'_>, params: &[Param]) -> Option<Vec<TypeId>> {
    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        let Some(ty) = &param.ty else {
            ck.emit(
                Diagnostic::error(ErrorCode::E2005)
                    .with_message(format!(
                        "parameter `{}` needs a type annotation",
                        ck.context.strings.resolve(param.name)
                    ))
                    .with_label(param.span, "annotation required"),
            );
            return None;
        };
        resolved.push(ck.resolve_type_expr(ty)?);
    }
    Some(resolved)
}

/// Bind resolved parameters into a body scope.
fn bind_params(ck: &mut Checker<'_>, env: &mut Environment, params: &[Param], types: &[TypeId]) {
    for (param, ty) in params.iter().zip(types) {
        if let Err(prior) = env.define(
            param.name,
            Local {
                ty: *ty,
                mutable: false,
                span: param.span,
            },
        ) {
            emit_duplicate(ck, "parameter", param.name, param.span, prior);
        }
    }
}

// --- message ---

fn register_message<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a MessageDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    for field in &def.fields {
        free_type_expr(strings, &mut fe, &field.ty);
        if let Some(default) = field.default {
            free_expr(arena, strings, &mut fe, default);
        }
    }
    // Publish ::field aliases so shape-dependent registrations order
    // after this message.
    let publishes: Vec<Name> = def
        .fields
        .iter()
        .map(|f| strings.intern(&format!("::{}", strings.resolve(f.name))))
        .collect();
    root.define(ck, def.name, publishes, fe.into_requires(), span, move |ck| {
        type_message(ck, def, span);
    });
}

fn type_message(ck: &mut Checker<'_>, def: &MessageDef, span: Span) {
    let mut fields = Vec::with_capacity(def.fields.len());
    let mut defaults = FxHashMap::default();
    let mut seen: FxHashMap<Name, Span> = FxHashMap::default();
    for field in &def.fields {
        if let Some(&prior) = seen.get(&field.name) {
            emit_duplicate(ck, "field", field.name, field.span, prior);
            continue;
        }
        seen.insert(field.name, field.span);
        let Some(ty) = ck.resolve_type_expr(&field.ty) else {
            continue;
        };
        fields.push(MessageFieldTy {
            name: field.name,
            ty,
        });
        if let Some(default) = field.default {
            defaults.insert(field.name, default);
        }
    }
    let ty = ck.types.message_of(Some(def.name), fields.clone());

    // Default expressions are pure computations against the field type.
    let env = Environment::document_root()
        .scope_as_pure()
        .scope_as_read_only()
        .scope_as_computation();
    for field in &def.fields {
        let Some(default) = field.default else {
            continue;
        };
        let Some(slot) = fields.iter().find(|f| f.name == field.name) else {
            continue;
        };
        if let Some(found) = infer_expr(ck, &env, default, Some(slot.ty)) {
            judge_store(ck, default, slot.ty, found.id, found.span);
        }
    }

    if let Err(prior) = ck
        .registry
        .declare_message(def.name, MessageInfo { ty, defaults, span })
    {
        emit_duplicate(ck, "declaration", def.name, span, prior);
    }
}

// --- enum ---

fn register_enum<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a EnumDef,
    span: Span,
) {
    // Variants publish alongside the enum so bare references resolve.
    let publishes = def.variants.clone();
    root.define(ck, def.name, publishes, Vec::new(), span, move |ck| {
        type_enum(ck, def, span);
    });
}

fn type_enum(ck: &mut Checker<'_>, def: &EnumDef, span: Span) {
    let mut seen: FxHashSet<Name> = FxHashSet::default();
    for variant in &def.variants {
        if !seen.insert(*variant) {
            emit_duplicate(ck, "variant", *variant, span, span);
        }
    }
    let ty = ck.types.intern(TypeData::Enum(def.name));
    if let Err(prior) = ck.registry.declare_enum(
        def.name,
        EnumInfo {
            ty,
            variants: def.variants.clone(),
            span,
        },
    ) {
        emit_duplicate(ck, "declaration", def.name, span, prior);
    }
}

// --- reactive field ---

fn register_field<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a FieldDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    if let Some(ty) = &def.ty {
        free_type_expr(strings, &mut fe, ty);
    }
    if let Some(init) = def.init {
        free_expr(arena, strings, &mut fe, init);
    }
    root.define(ck, def.name, Vec::new(), fe.into_requires(), span, move |ck| {
        type_field(ck, def, span);
    });
}

fn type_field(ck: &mut Checker<'_>, def: &FieldDef, span: Span) {
    let annotation = def.ty.as_ref().and_then(|t| ck.resolve_type_expr(t));

    let watcher = Watcher::new(WatcherKind::FunctionDependencies);
    let viewer_tracker = Rc::new(RefCell::new(DependencyTracker::new()));
    let mut env = Environment::document_root()
        .scope_as_computation()
        .scope_as_read_only()
        .watching(watcher.clone());
    if def.viewer {
        env = env.scope_with_viewer(viewer_tracker.clone());
    }

    let init_ty = def.init.and_then(|init| {
        let found = infer_expr(ck, &env, init, annotation);
        if let (Some(expected), Some(found)) = (annotation, found) {
            judge_store(ck, init, expected, found.id, found.span);
        }
        found
    });

    let Some(ty) = annotation.or(init_ty.map(|t| t.id)) else {
        ck.emit(
            Diagnostic::error(ErrorCode::E2005)
                .with_message(format!(
                    "cannot infer a type for field `{}`",
                    ck.context.strings.resolve(def.name)
                ))
                .with_label(span, "type annotation needed"),
        );
        return;
    };

    let declare = if def.viewer {
        ck.registry
            .declare_viewer_field(def.name, FieldInfo { ty, span })
    } else {
        ck.registry.declare_field(def.name, FieldInfo { ty, span })
    };
    if let Err(prior) = declare {
        emit_duplicate(ck, "field", def.name, span, prior);
        return;
    }

    let viewer_fields: Vec<Name> = viewer_tracker
        .borrow()
        .items()
        .iter()
        .map(|(name, _)| *name)
        .collect();
    ck.output.fields.push(FieldRecord {
        name: def.name,
        ty,
        viewer: def.viewer,
        dependencies: watcher.handle().borrow().to_vec(),
        viewer_fields,
    });
}

// --- function / procedure ---

fn register_function<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a FunctionDef,
    span: Span,
) {
    let requires = signature_requires(ck, &def.params, def.ret.as_ref(), def.body);
    root.define(ck, def.name, Vec::new(), requires, span, move |ck| {
        type_function(ck, def, span);
    });
}

fn type_function(ck: &mut Checker<'_>, def: &FunctionDef, span: Span) {
    let Some(params) = resolve_params(ck, &def.params) else {
        return;
    };
    let ret = match &def.ret {
        Some(ty) => match ck.resolve_type_expr(ty) {
            Some(ret) => ret,
            None => return,
        },
        None => TypeId::VOID,
    };
    let kind = match def.purity {
        FunctionPurity::Pure => FuncKind::Pure,
        FunctionPurity::Procedure => FuncKind::Procedure,
    };
    let func_ty = ck.types.intern(TypeData::Func(FuncData {
        params: params.clone(),
        ret,
        kind,
        abortable: def.abortable,
    }));
    if let Err(prior) = ck
        .registry
        .declare_function(def.name, FunctionInfo { ty: func_ty, span })
    {
        emit_duplicate(ck, "declaration", def.name, span, prior);
        return;
    }

    let contract = if ret == TypeId::VOID {
        ReturnContract::Void
    } else {
        ReturnContract::Type(ret)
    };
    let watcher = Watcher::new(WatcherKind::FunctionDependencies);
    let mut env = Environment::document_root()
        .watching(watcher.clone())
        .scope_with_return(contract);
    if kind == FuncKind::Pure {
        env = env.scope_as_pure().scope_as_read_only();
    }
    if def.abortable {
        env = env.scope_as_abortable();
    }

    let mut body_env = env.scoped();
    bind_params(ck, &mut body_env, &def.params, &params);
    for stmt in ck.context.arena.get_block(def.body) {
        type_stmt(ck, &mut body_env, *stmt);
    }

    if ret != TypeId::VOID && !block_always_returns(ck.context.arena, def.body) {
        ck.emit(
            Diagnostic::error(ErrorCode::E5001)
                .with_message(format!(
                    "`{}` can fall through without returning a `{}`",
                    ck.context.strings.resolve(def.name),
                    ck.render_type(ret)
                ))
                .with_label(span, "not all paths return a value"),
        );
    }

    ck.output.functions.push(FunctionRecord {
        name: def.name,
        params,
        ret,
        kind,
        abortable: def.abortable,
        dependencies: watcher.handle().borrow().to_vec(),
        viewer_fields: Vec::new(),
    });
}

// --- dispatcher ---

fn register_dispatcher<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a DispatcherDef,
    span: Span,
) {
    let mut requires = signature_requires(ck, &def.params, def.ret.as_ref(), def.body);
    requires.insert(
        0,
        Require {
            name: def.enum_name,
            ordering_hint: false,
        },
    );
    root.define(ck, def.name, Vec::new(), requires, span, move |ck| {
        type_dispatcher(ck, def, span);
    });
}

fn type_dispatcher(ck: &mut Checker<'_>, def: &DispatcherDef, span: Span) {
    let Some(enum_ty) = ck.registry.enum_info(def.enum_name).map(|e| e.ty) else {
        ck.emit(
            Diagnostic::error(ErrorCode::E2002)
                .with_message(format!(
                    "`{}` is not an enum",
                    ck.context.strings.resolve(def.enum_name)
                ))
                .with_label(span, "dispatcher requires an enum"),
        );
        return;
    };
    let Some(params) = resolve_params(ck, &def.params) else {
        return;
    };
    let ret = match &def.ret {
        Some(ty) => match ck.resolve_type_expr(ty) {
            Some(ret) => ret,
            None => return,
        },
        None => TypeId::VOID,
    };

    let mut func_params = Vec::with_capacity(params.len() + 1);
    func_params.push(enum_ty);
    func_params.extend(params.iter().copied());
    let func_ty = ck.types.intern(TypeData::Func(FuncData {
        params: func_params.clone(),
        ret,
        kind: FuncKind::Pure,
        abortable: false,
    }));
    if let Err(prior) = ck
        .registry
        .declare_function(def.name, FunctionInfo { ty: func_ty, span })
    {
        emit_duplicate(ck, "declaration", def.name, span, prior);
        return;
    }

    let contract = if ret == TypeId::VOID {
        ReturnContract::Void
    } else {
        ReturnContract::Type(ret)
    };
    let watcher = Watcher::new(WatcherKind::FunctionDependencies);
    let env = Environment::document_root()
        .watching(watcher.clone())
        .scope_as_pure()
        .scope_as_read_only()
        .scope_with_return(contract);

    let mut body_env = env.scoped();
    let self_name = ck.context.strings.intern("self");
    let _ = body_env.define(
        self_name,
        Local {
            ty: enum_ty,
            mutable: false,
            span,
        },
    );
    bind_params(ck, &mut body_env, &def.params, &params);
    for stmt in ck.context.arena.get_block(def.body) {
        type_stmt(ck, &mut body_env, *stmt);
    }

    // Dispatch must produce a value on every path.
    if ret != TypeId::VOID && !block_always_returns(ck.context.arena, def.body) {
        ck.emit(
            Diagnostic::error(ErrorCode::E5001)
                .with_message(format!(
                    "dispatcher `{}` can fall through without returning",
                    ck.context.strings.resolve(def.name)
                ))
                .with_label(span, "not all paths return a value"),
        );
    }

    ck.output.functions.push(FunctionRecord {
        name: def.name,
        params: func_params,
        ret,
        kind: FuncKind::Pure,
        abortable: false,
        dependencies: watcher.handle().borrow().to_vec(),
        viewer_fields: Vec::new(),
    });
}

// --- constructor ---

fn register_constructor<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a ConstructorDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    free_block(arena, strings, &mut fe, def.body);
    root.register(fe.into_requires(), span, move |ck| {
        let env = Environment::document_root();
        crate::infer::type_block(ck, &env, def.body);
    });
}

// --- message handler ---

fn register_handler<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a HandlerDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    fe.require(def.message);
    fe.push_scope();
    fe.bind(def.binding);
    free_block(arena, strings, &mut fe, def.body);
    fe.pop_scope();
    root.register(fe.into_requires(), span, move |ck| {
        type_handler(ck, def, span);
    });
}

fn type_handler(ck: &mut Checker<'_>, def: &HandlerDef, span: Span) {
    if let Err(prior) = ck.registry.declare_channel(def.channel, span) {
        emit_duplicate(ck, "channel", def.channel, span, prior);
        return;
    }
    let Some(message_ty) = ck.registry.message(def.message).map(|m| m.ty) else {
        ck.emit(
            Diagnostic::error(ErrorCode::E2002)
                .with_message(format!(
                    "channel `{}` requires a message type, `{}` is not one",
                    ck.context.strings.resolve(def.channel),
                    ck.context.strings.resolve(def.message)
                ))
                .with_label(span, "not a message type"),
        );
        return;
    };

    let env = Environment::document_root()
        .scope_as_message_handler()
        .scope_as_abortable()
        .scope_with_cache();
    let mut body_env = env.scoped();
    let _ = body_env.define(
        def.binding,
        Local {
            ty: message_ty,
            mutable: false,
            span,
        },
    );
    for stmt in ck.context.arena.get_block(def.body) {
        type_stmt(ck, &mut body_env, *stmt);
    }
}

// --- cron task ---

fn register_cron<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a CronDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    free_block(arena, strings, &mut fe, def.body);
    root.register(fe.into_requires(), span, move |ck| {
        if let Err(prior) = ck.registry.declare_cron(def.name, span) {
            emit_duplicate(ck, "scheduled task", def.name, span, prior);
            return;
        }
        let env = Environment::document_root().scope_with_cache();
        crate::infer::type_block(ck, &env, def.body);
    });
}

// --- web endpoints ---

fn register_web_get<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a WebGetDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    free_block(arena, strings, &mut fe, def.body);
    root.register(fe.into_requires(), span, move |ck| {
        if let Err(prior) = ck.registry.declare_web_path(def.path, span) {
            emit_duplicate(ck, "web path", def.path, span, prior);
            return;
        }
        // Read-only, yet service calls are permitted: a `get` endpoint
        // is idempotent by construction.
        let env = Environment::document_root()
            .scope_as_web_get()
            .scope_as_read_only()
            .scope_with_return(ReturnContract::AnyMessage);
        crate::infer::type_block(ck, &env, def.body);
        if !block_always_returns(ck.context.arena, def.body) {
            ck.emit(
                Diagnostic::error(ErrorCode::E5001)
                    .with_message("web handler can fall through without a response")
                    .with_label(span, "not all paths return a response"),
            );
        }
    });
}

fn register_web_put<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a WebPutDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    fe.require(def.message);
    fe.push_scope();
    fe.bind(def.binding);
    free_block(arena, strings, &mut fe, def.body);
    fe.pop_scope();
    root.register(fe.into_requires(), span, move |ck| {
        type_web_put(ck, def, span);
    });
}

fn type_web_put(ck: &mut Checker<'_>, def: &WebPutDef, span: Span) {
    if let Err(prior) = ck.registry.declare_web_path(def.path, span) {
        emit_duplicate(ck, "web path", def.path, span, prior);
        return;
    }
    let Some(message_ty) = ck.registry.message(def.message).map(|m| m.ty) else {
        ck.emit(
            Diagnostic::error(ErrorCode::E2002)
                .with_message(format!(
                    "web put requires a message type, `{}` is not one",
                    ck.context.strings.resolve(def.message)
                ))
                .with_label(span, "not a message type"),
        );
        return;
    };
    let env = Environment::document_root()
        .scope_as_web_put()
        .scope_with_cache()
        .scope_with_return(ReturnContract::AnyMessage);
    let mut body_env = env.scoped();
    let _ = body_env.define(
        def.binding,
        Local {
            ty: message_ty,
            mutable: false,
            span,
        },
    );
    for stmt in ck.context.arena.get_block(def.body) {
        type_stmt(ck, &mut body_env, *stmt);
    }
    if !block_always_returns(ck.context.arena, def.body) {
        ck.emit(
            Diagnostic::error(ErrorCode::E5001)
                .with_message("web handler can fall through without a response")
                .with_label(span, "not all paths return a response"),
        );
    }
}

// --- remote service ---

fn register_service<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a ServiceDef,
    span: Span,
) {
    let mut fe = FreeEnvironment::new();
    for method in &def.methods {
        fe.require(method.input);
        fe.require(method.output);
    }
    root.define(ck, def.name, Vec::new(), fe.into_requires(), span, move |ck| {
        type_service(ck, def, span);
    });
}

fn type_service(ck: &mut Checker<'_>, def: &ServiceDef, span: Span) {
    let mut methods = Vec::with_capacity(def.methods.len());
    let mut seen: FxHashMap<Name, Span> = FxHashMap::default();
    for method in &def.methods {
        if let Some(&prior) = seen.get(&method.name) {
            emit_duplicate(ck, "service method", method.name, method.span, prior);
            continue;
        }
        seen.insert(method.name, method.span);
        let input = require_message_type(ck, method.input, method.span);
        let output = require_message_type(ck, method.output, method.span);
        let (Some(input), Some(output)) = (input, output) else {
            continue;
        };
        let method_ty = ck.types.intern(TypeData::Func(FuncData {
            params: vec![input],
            ret: output,
            kind: FuncKind::ServiceMethod,
            abortable: false,
        }));
        methods.push(MessageFieldTy {
            name: method.name,
            ty: method_ty,
        });
    }
    // The service resolves to a nominal object whose fields are its
    // methods; field access plus calling does the rest.
    let ty = ck.types.message_of(Some(def.name), methods);
    if let Err(prior) = ck.registry.declare_service(def.name, ServiceInfo { ty, span }) {
        emit_duplicate(ck, "declaration", def.name, span, prior);
    }
}

fn require_message_type(ck: &mut Checker<'_>, name: Name, span: Span) -> Option<TypeId> {
    match ck.registry.message(name) {
        Some(message) => Some(message.ty),
        None => {
            ck.emit(
                Diagnostic::error(ErrorCode::E2002)
                    .with_message(format!(
                        "`{}` is not a message type",
                        ck.context.strings.resolve(name)
                    ))
                    .with_label(span, "message type required"),
            );
            None
        }
    }
}

// --- rpc ---

fn register_rpc<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a RpcDef,
    span: Span,
) {
    let requires = signature_requires(ck, &def.params, None, def.body);
    root.register(requires, span, move |ck| {
        type_rpc(ck, def, span);
    });
}

fn type_rpc(ck: &mut Checker<'_>, def: &RpcDef, span: Span) {
    if let Err(prior) = ck.registry.declare_rpc(def.name, span) {
        emit_duplicate(ck, "rpc", def.name, span, prior);
        return;
    }
    let Some(params) = resolve_params(ck, &def.params) else {
        return;
    };
    let env = Environment::document_root()
        .scope_as_abortable()
        .scope_with_cache();
    let mut body_env = env.scoped();
    bind_params(ck, &mut body_env, &def.params, &params);
    for stmt in ck.context.arena.get_block(def.body) {
        type_stmt(ck, &mut body_env, *stmt);
    }
}

// --- metric ---

fn register_metric<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a MetricDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    free_expr(arena, strings, &mut fe, def.value);
    root.register(fe.into_requires(), span, move |ck| {
        type_metric(ck, def, span);
    });
}

fn type_metric(ck: &mut Checker<'_>, def: &MetricDef, span: Span) {
    if let Err(prior) = ck.registry.declare_metric(def.name, span) {
        emit_duplicate(ck, "metric", def.name, span, prior);
        return;
    }
    let watcher = Watcher::new(WatcherKind::FunctionDependencies);
    let env = Environment::document_root()
        .scope_as_pure()
        .scope_as_read_only()
        .scope_as_computation()
        .watching(watcher.clone());
    let Some(found) = infer_expr(ck, &env, def.value, None) else {
        return;
    };
    if !ck.types.lookup(found.id).is_numeric() {
        ck.emit(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "metric `{}` must be numeric, found `{}`",
                    ck.context.strings.resolve(def.name),
                    ck.render_type(found.id)
                ))
                .with_label(found.span, "not numeric"),
        );
        return;
    }
    ck.output.metrics.push(MetricRecord {
        name: def.name,
        ty: found.id,
        dependencies: watcher.handle().borrow().to_vec(),
    });
}

// --- static policies ---

fn register_static<'a>(
    root: &mut TypeCheckerRoot<'a>,
    ck: &mut Checker<'a>,
    def: &'a StaticDef,
    span: Span,
) {
    let arena = ck.context.arena;
    let strings = ck.context.strings;
    let mut fe = FreeEnvironment::new();
    for policy in &def.policies {
        free_expr(arena, strings, &mut fe, policy.value);
    }
    root.register(fe.into_requires(), span, move |ck| {
        type_static(ck, def);
    });
}

fn type_static(ck: &mut Checker<'_>, def: &StaticDef) {
    let env = Environment::document_root()
        .scope_as_static_policy()
        .scope_as_read_only()
        .scope_as_computation();
    for policy in &def.policies {
        if let Err(prior) = ck.registry.declare_policy(policy.name, policy.span) {
            emit_duplicate(ck, "policy", policy.name, policy.span, prior);
            continue;
        }
        let Some(found) = infer_expr(ck, &env, policy.value, Some(TypeId::BOOL)) else {
            continue;
        };
        if found.id != TypeId::BOOL {
            ck.emit(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!(
                        "policy `{}` must be `bool`, found `{}`",
                        ck.context.strings.resolve(policy.name),
                        ck.render_type(found.id)
                    ))
                    .with_label(found.span, "expected `bool`"),
            );
        }
    }
}
