// ABOUTME: Tree-walking statement executor and expression evaluator

use crate::array::{Dimension, DynamicArray};
use crate::ast::{
    BinOp, Block, CaseMatch, CompareOp, Declarator, DoTest, Expr, ExitKind, LoopCondition, ParamMode,
    ProcDecl, ProcKind, ResumeKind, Stmt, UnOp,
};
use crate::classes::Instance;
use crate::coerce;
use crate::env::Scope;
use crate::error::EngineError;
use crate::interpreter::{ErrorHandler, Interpreter};
use crate::value::{ObjectRef, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Signals that travel up through statement execution without being `EngineError`s.
/// `exec_block` is the only place that interprets them; everything else either
/// produces one or passes it straight through.
pub(crate) enum Flow {
    Normal,
    Exit(ExitKind),
    Goto(String),
}

/// Checks that a block's final `Flow` is one a procedure body (or the top-level
/// script) may legitimately end on; a loop-only `Exit` or an unresolved `Goto`
/// escaping all the way out is a script bug, reported the same way a hard runtime
/// error would be.
pub(crate) fn finish_flow(flow: Flow) -> EResult<()> {
    match flow {
        Flow::Normal => Ok(()),
        Flow::Exit(ExitKind::Sub) | Flow::Exit(ExitKind::Function) | Flow::Exit(ExitKind::Property) => Ok(()),
        Flow::Exit(kind) => Err(EngineError::MisplacedControlFlow(format!("Exit {kind:?}"))),
        Flow::Goto(label) => Err(EngineError::MisplacedControlFlow(format!("Goto {label}"))),
    }
}

type EResult<T> = Result<T, EngineError>;

/// Executes every statement in `block` against `scope` in order, honouring
/// `On Error Resume Next`/`On Error Goto`, `Goto`/labels, and the `Exit` signals
/// raised by nested loops/procedures.
pub fn exec_block(interp: &mut Interpreter, scope: &Rc<Scope>, block: &Block) -> EResult<Flow> {
    let labels = label_index(block);
    let mut i = 0usize;
    while i < block.len() {
        interp.check_deadline()?;
        let stmt = &block[i];
        match exec_stmt(interp, scope, stmt) {
            Ok(Flow::Goto(label)) => {
                if let Some(&target) = labels.get(&label.to_ascii_lowercase()) {
                    i = target;
                    continue;
                }
                return Ok(Flow::Goto(label));
            }
            Ok(flow @ Flow::Exit(_)) => return Ok(flow),
            Ok(Flow::Normal) => {}
            Err(e) => {
                if !e.is_resumable() {
                    return Err(e);
                }
                match interp.error_handler() {
                    ErrorHandler::None => {
                        interp.record_error(&e);
                        return Err(e);
                    }
                    ErrorHandler::ResumeNext => {
                        interp.record_error(&e);
                    }
                    ErrorHandler::Goto(label) => {
                        interp.record_error(&e);
                        if let Some(&target) = labels.get(&label.to_ascii_lowercase()) {
                            i = target;
                            continue;
                        }
                        return Err(e);
                    }
                }
            }
        }
        i += 1;
    }
    Ok(Flow::Normal)
}

/// Maps every `Label` statement at the top level of `block` to its index, so `Goto`
/// only ever has to search within the block that contains the label textually.
fn label_index(block: &Block) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, stmt) in block.iter().enumerate() {
        if let Stmt::Label(name) = stmt {
            map.insert(name.to_ascii_lowercase(), i);
        }
    }
    map
}

fn exec_stmt(interp: &mut Interpreter, scope: &Rc<Scope>, stmt: &Stmt) -> EResult<Flow> {
    match stmt {
        Stmt::Dim(decls) => {
            exec_dim(interp, scope, decls)?;
            Ok(Flow::Normal)
        }
        Stmt::VisibilityDim { declarators, .. } => {
            exec_dim(interp, scope, declarators)?;
            Ok(Flow::Normal)
        }
        Stmt::Redim { preserve, targets } => {
            exec_redim(interp, scope, *preserve, targets)?;
            Ok(Flow::Normal)
        }
        Stmt::Erase(names) => {
            for name in names {
                scope.declare(name, Value::Empty);
            }
            Ok(Flow::Normal)
        }
        Stmt::Const(consts) => {
            exec_const(interp, scope, consts)?;
            Ok(Flow::Normal)
        }
        Stmt::VisibilityConst { consts, .. } => {
            exec_const(interp, scope, consts)?;
            Ok(Flow::Normal)
        }
        Stmt::Assign { target, value, pos } => {
            let v = eval_expr(interp, scope, value)?;
            assign_to(interp, scope, target, v, *pos)?;
            Ok(Flow::Normal)
        }
        Stmt::SetAssign { target, value, pos } => {
            let v = eval_expr(interp, scope, value)?;
            if !v.is_object() {
                return Err(EngineError::type_mismatch("Set requires an object reference (or Nothing)"));
            }
            set_assign_to(interp, scope, target, v, *pos)?;
            Ok(Flow::Normal)
        }
        Stmt::ExprStmt(expr) => {
            eval_expr(interp, scope, expr)?;
            Ok(Flow::Normal)
        }
        Stmt::If { branches, else_branch } => {
            for (cond, body) in branches {
                if coerce::to_bool(&eval_expr(interp, scope, cond)?)? {
                    return exec_block(interp, scope, body);
                }
            }
            if let Some(body) = else_branch {
                return exec_block(interp, scope, body);
            }
            Ok(Flow::Normal)
        }
        Stmt::ForNext { var, from, to, step, body, pos } => exec_for_next(interp, scope, var, from, to, step.as_ref(), body, *pos),
        Stmt::ForEach { var, iterable, body } => exec_for_each(interp, scope, var, iterable, body),
        Stmt::DoLoop { test, body } => exec_do_loop(interp, scope, test, body),
        Stmt::WhileWend { cond, body } => exec_while_wend(interp, scope, cond, body),
        Stmt::SelectCase { discriminant, cases, else_body } => exec_select_case(interp, scope, discriminant, cases, else_body),
        Stmt::With { target, body } => {
            let v = eval_expr(interp, scope, target)?;
            interp.with_stack.push(v);
            let result = exec_block(interp, scope, body);
            interp.with_stack.pop();
            result
        }
        Stmt::Exit(kind) => Ok(Flow::Exit(*kind)),
        Stmt::OnErrorResumeNext => {
            interp.set_error_handler(ErrorHandler::ResumeNext);
            Ok(Flow::Normal)
        }
        Stmt::OnErrorGotoZero => {
            interp.set_error_handler(ErrorHandler::None);
            interp.clear_error();
            Ok(Flow::Normal)
        }
        Stmt::OnErrorGoto(label) => {
            interp.set_error_handler(ErrorHandler::Goto(label.clone()));
            Ok(Flow::Normal)
        }
        Stmt::Resume(kind) => match kind {
            // By the time control reaches a `Resume`/`Resume Next` statement the
            // `On Error Goto` jump has already landed here; there is nothing further
            // to rewind, so both forms simply continue with the next statement.
            ResumeKind::Next | ResumeKind::Retry => Ok(Flow::Normal),
        },
        Stmt::Goto(label) => Ok(Flow::Goto(label.clone())),
        Stmt::Label(_) => Ok(Flow::Normal),
        Stmt::ProcDecl(_) | Stmt::ClassDecl(_) => Ok(Flow::Normal),
        Stmt::OptionExplicit => {
            interp.options.option_explicit = true;
            Ok(Flow::Normal)
        }
    }
}

fn exec_dim(interp: &mut Interpreter, scope: &Rc<Scope>, decls: &[Declarator]) -> EResult<()> {
    for decl in decls {
        match &decl.array_upper_bounds {
            None => scope.declare(&decl.name, Value::Empty),
            Some(bounds) => {
                let dims = eval_dims(interp, scope, bounds)?;
                let arr = DynamicArray::new(dims);
                scope.declare(&decl.name, Value::Array(Rc::new(RefCell::new(arr))));
            }
        }
    }
    Ok(())
}

fn eval_dims(interp: &mut Interpreter, scope: &Rc<Scope>, bounds: &[Expr]) -> EResult<Vec<Dimension>> {
    bounds
        .iter()
        .map(|e| -> EResult<Dimension> {
            let upper = coerce::to_long(&eval_expr(interp, scope, e)?)?;
            Ok(Dimension { lower: 0, upper })
        })
        .collect()
}

fn exec_const(interp: &mut Interpreter, scope: &Rc<Scope>, consts: &[(String, Expr)]) -> EResult<()> {
    for (name, expr) in consts {
        let v = eval_expr(interp, scope, expr)?;
        scope.declare_const(name, v);
    }
    Ok(())
}

fn exec_redim(interp: &mut Interpreter, scope: &Rc<Scope>, preserve: bool, targets: &[(String, Vec<Expr>)]) -> EResult<()> {
    for (name, bound_exprs) in targets {
        let dims = eval_dims(interp, scope, bound_exprs)?;
        match scope.get(name) {
            Some(Value::Array(cell)) => {
                if preserve {
                    cell.borrow_mut().redim_preserve(dims);
                } else {
                    cell.borrow_mut().redim(dims);
                }
            }
            _ => {
                let arr = DynamicArray::new(dims);
                scope.assign(name, Value::Array(Rc::new(RefCell::new(arr))))?;
            }
        }
    }
    Ok(())
}

/// Narrows a `For` counter value back to `Long` when the loop's bounds/step are all
/// whole numbers and the value fits; falls back to `Double` otherwise (fractional
/// step, or a counter that overflowed `Long` range).
fn narrow_for_counter(n: f64, integral: bool) -> Value {
    if integral && n.abs() <= i32::MAX as f64 {
        Value::Long(n as i32)
    } else {
        Value::Double(n)
    }
}

fn exec_for_next(
    interp: &mut Interpreter,
    scope: &Rc<Scope>,
    var: &str,
    from: &Expr,
    to: &Expr,
    step: Option<&Expr>,
    body: &Block,
    pos: crate::error::Position,
) -> EResult<Flow> {
    let start = coerce::to_f64(&eval_expr(interp, scope, from)?)?;
    let limit = coerce::to_f64(&eval_expr(interp, scope, to)?)?;
    let step_val = match step {
        Some(e) => coerce::to_f64(&eval_expr(interp, scope, e)?)?,
        None => 1.0,
    };
    if step_val == 0.0 {
        return Err(EngineError::invalid_procedure_call(format!("zero For step at {pos}")));
    }
    // `For i = 1 To 5` counts with an integral `i`; only a fractional bound or step
    // should promote the counter to Double, matching the dialect's own numeric
    // promotion rule for mixed arithmetic.
    let integral = start.fract() == 0.0 && limit.fract() == 0.0 && step_val.fract() == 0.0;
    scope.assign(var, narrow_for_counter(start, integral))?;
    loop {
        let current = coerce::to_f64(&scope.get(var).unwrap_or(Value::Empty))?;
        if step_val > 0.0 {
            if current > limit {
                break;
            }
        } else if current < limit {
            break;
        }
        interp.check_deadline()?;
        match exec_block(interp, scope, body)? {
            Flow::Exit(ExitKind::For) => break,
            flow @ (Flow::Exit(_) | Flow::Goto(_)) => return Ok(flow),
            Flow::Normal => {}
        }
        let advanced = coerce::to_f64(&scope.get(var).unwrap_or(Value::Empty))? + step_val;
        scope.assign(var, narrow_for_counter(advanced, integral))?;
    }
    Ok(Flow::Normal)
}

fn exec_for_each(interp: &mut Interpreter, scope: &Rc<Scope>, var: &str, iterable: &Expr, body: &Block) -> EResult<Flow> {
    let collection = eval_expr(interp, scope, iterable)?;
    let items: Vec<Value> = match &collection {
        Value::Array(cell) => cell.borrow().values().to_vec(),
        Value::Object(Some(ObjectRef::MatchCollection(mc))) => mc
            .matches
            .iter()
            .map(|m| Value::Object(Some(ObjectRef::Match(Rc::new(m.clone())))))
            .collect(),
        other => return Err(EngineError::type_mismatch(format!("cannot iterate over {}", other.type_name()))),
    };
    for item in items {
        interp.check_deadline()?;
        scope.assign(var, item)?;
        match exec_block(interp, scope, body)? {
            Flow::Exit(ExitKind::For) => break,
            flow @ (Flow::Exit(_) | Flow::Goto(_)) => return Ok(flow),
            Flow::Normal => {}
        }
    }
    Ok(Flow::Normal)
}

fn loop_should_continue(cond: LoopCondition, value: bool) -> bool {
    match cond {
        LoopCondition::While => value,
        LoopCondition::Until => !value,
    }
}

fn exec_do_loop(interp: &mut Interpreter, scope: &Rc<Scope>, test: &DoTest, body: &Block) -> EResult<Flow> {
    loop {
        if let DoTest::Pre(cond, expr) = test {
            let v = coerce::to_bool(&eval_expr(interp, scope, expr)?)?;
            if !loop_should_continue(*cond, v) {
                break;
            }
        }
        interp.check_deadline()?;
        match exec_block(interp, scope, body)? {
            Flow::Exit(ExitKind::Do) => break,
            flow @ (Flow::Exit(_) | Flow::Goto(_)) => return Ok(flow),
            Flow::Normal => {}
        }
        if let DoTest::Post(cond, expr) = test {
            let v = coerce::to_bool(&eval_expr(interp, scope, expr)?)?;
            if !loop_should_continue(*cond, v) {
                break;
            }
        }
        if matches!(test, DoTest::None) {
            // `Do ... Loop` with no condition relies entirely on `Exit Do`/`Goto` to end;
            // nothing further to check here.
        }
    }
    Ok(Flow::Normal)
}

fn exec_while_wend(interp: &mut Interpreter, scope: &Rc<Scope>, cond: &Expr, body: &Block) -> EResult<Flow> {
    loop {
        if !coerce::to_bool(&eval_expr(interp, scope, cond)?)? {
            break;
        }
        interp.check_deadline()?;
        match exec_block(interp, scope, body)? {
            Flow::Exit(ExitKind::Do) => break,
            flow @ (Flow::Exit(_) | Flow::Goto(_)) => return Ok(flow),
            Flow::Normal => {}
        }
    }
    Ok(Flow::Normal)
}

fn exec_select_case(
    interp: &mut Interpreter,
    scope: &Rc<Scope>,
    discriminant: &Expr,
    cases: &[crate::ast::CaseArm],
    else_body: &Option<Block>,
) -> EResult<Flow> {
    let subject = eval_expr(interp, scope, discriminant)?;
    for arm in cases {
        for m in &arm.matches {
            let hit = match m {
                CaseMatch::Values(values) => {
                    let mut found = false;
                    for v in values {
                        let candidate = eval_expr(interp, scope, v)?;
                        if coerce::values_equal(&subject, &candidate)? {
                            found = true;
                            break;
                        }
                    }
                    found
                }
                CaseMatch::Is(op, expr) => {
                    let candidate = eval_expr(interp, scope, expr)?;
                    compare_op(op, &subject, &candidate)?
                }
            };
            if hit {
                return exec_block(interp, scope, &arm.body);
            }
        }
    }
    if let Some(body) = else_body {
        return exec_block(interp, scope, body);
    }
    Ok(Flow::Normal)
}

fn compare_op(op: &CompareOp, a: &Value, b: &Value) -> EResult<bool> {
    let ord = match coerce::compare(a, b)? {
        Some(o) => o,
        None => return Ok(false),
    };
    Ok(match op {
        CompareOp::Eq => ord.is_eq(),
        CompareOp::Ne => ord.is_ne(),
        CompareOp::Lt => ord.is_lt(),
        CompareOp::Le => ord.is_le(),
        CompareOp::Gt => ord.is_gt(),
        CompareOp::Ge => ord.is_ge(),
    })
}

// ---------------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------------

fn assign_to(interp: &mut Interpreter, scope: &Rc<Scope>, target: &Expr, value: Value, pos: crate::error::Position) -> EResult<()> {
    match target {
        Expr::Identifier(name) => {
            if interp.options.option_explicit && !scope.is_defined(name) {
                return Err(EngineError::VariableNotDefined(name.clone()));
            }
            scope.assign(name, value)
        }
        Expr::Member { object, name, .. } => {
            let receiver = resolve_receiver(interp, scope, object)?;
            assign_member(interp, &receiver, name, value)
        }
        Expr::Call { callee, args, .. } => {
            // `arr(i) = v` or `obj.Prop(i) = v` parse as a `Call` on the assignment's
            // left-hand side; distinguish array indexing from a property-let call.
            match callee.as_ref() {
                Expr::Identifier(name) => {
                    if let Some(Value::Array(cell)) = scope.get(name) {
                        let indices = eval_index_args(interp, scope, args)?;
                        cell.borrow_mut().set(&indices, value)?;
                        return Ok(());
                    }
                    Err(EngineError::ObjectRequired(name.clone()))
                }
                Expr::Member { object, name, .. } => {
                    let receiver = resolve_receiver(interp, scope, object)?;
                    let arg_values = eval_args(interp, scope, args)?;
                    assign_indexed_member(interp, &receiver, name, &arg_values, value)
                }
                Expr::WithTarget => {
                    let receiver = current_with_target(interp)?;
                    Err(EngineError::ObjectDoesntSupportPropertyOrMethod(format!("{:?}", receiver.type_name())))
                }
                other => Err(EngineError::type_mismatch(format!("cannot assign through {other:?} at {pos}"))),
            }
        }
        other => Err(EngineError::type_mismatch(format!("invalid assignment target {other:?} at {pos}"))),
    }
}

fn set_assign_to(interp: &mut Interpreter, scope: &Rc<Scope>, target: &Expr, value: Value, pos: crate::error::Position) -> EResult<()> {
    match target {
        Expr::Identifier(name) => {
            if let Some(old) = scope.get(name) {
                maybe_terminate(interp, &old)?;
            }
            scope.assign(name, value)
        }
        Expr::Member { object, name, .. } => {
            let receiver = resolve_receiver(interp, scope, object)?;
            set_assign_member(interp, &receiver, name, value)
        }
        other => Err(EngineError::type_mismatch(format!("invalid Set target {other:?} at {pos}"))),
    }
}

/// Invokes `Class_Terminate` when a `Set`-reassignment drops the last reachable
/// reference to an instance, per the dialect's narrowed termination model (no
/// refcount tracking: we fire it whenever the slot being overwritten held the only
/// name we know about, matching typical script usage where locals aren't aliased).
fn maybe_terminate(interp: &mut Interpreter, old: &Value) -> EResult<()> {
    if let Value::Object(Some(ObjectRef::Instance(inst))) = old {
        if Rc::strong_count(inst) == 1 {
            if let Some(method) = inst.class.find_terminate() {
                call_user_proc(interp, &method, Value::Object(Some(ObjectRef::Instance(Rc::clone(inst)))), &[])?;
            }
        }
    }
    Ok(())
}

fn assign_member(interp: &mut Interpreter, receiver: &Value, name: &str, value: Value) -> EResult<()> {
    match receiver {
        Value::Object(Some(ObjectRef::Instance(inst))) => {
            if let Some(setter) = inst.class.find_property_let(name) {
                call_user_proc(interp, &setter, receiver.clone(), std::slice::from_ref(&value))?;
                return Ok(());
            }
            if inst.class.has_field(name) {
                inst.set_field(name, value);
                return Ok(());
            }
            Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
        }
        Value::Object(Some(ObjectRef::RegExp(re))) => {
            let mut re = re.borrow_mut();
            match name.to_ascii_lowercase().as_str() {
                "pattern" => re.pattern = coerce::to_display_string(&value)?,
                "ignorecase" => re.ignore_case = coerce::to_bool(&value)?,
                "global" => re.global = coerce::to_bool(&value)?,
                "multiline" => re.multiline = coerce::to_bool(&value)?,
                other => return Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
            }
            re.invalidate();
            Ok(())
        }
        Value::Object(Some(ObjectRef::Host(host))) => host.set_property(name, value),
        Value::Object(None) => Err(EngineError::ObjectRequired(name.to_string())),
        other => Err(EngineError::type_mismatch(format!("{} has no property '{name}'", other.type_name()))),
    }
}

fn set_assign_member(interp: &mut Interpreter, receiver: &Value, name: &str, value: Value) -> EResult<()> {
    match receiver {
        Value::Object(Some(ObjectRef::Instance(inst))) => {
            if let Some(setter) = inst.class.find_property_set(name) {
                call_user_proc(interp, &setter, receiver.clone(), std::slice::from_ref(&value))?;
                return Ok(());
            }
            Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
        }
        Value::Object(None) => Err(EngineError::ObjectRequired(name.to_string())),
        other => Err(EngineError::type_mismatch(format!("{} has no settable property '{name}'", other.type_name()))),
    }
}

fn assign_indexed_member(interp: &mut Interpreter, receiver: &Value, name: &str, args: &[Value], value: Value) -> EResult<()> {
    if let Value::Object(Some(ObjectRef::Instance(inst))) = receiver {
        if let Some(setter) = inst.class.find_property_let(name) {
            let mut call_args: Vec<Value> = args.to_vec();
            call_args.push(value);
            call_user_proc(interp, &setter, receiver.clone(), &call_args)?;
            return Ok(());
        }
    }
    Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
}

/// Resolves the implicit `.member` receiver to the object on the `With` stack.
fn current_with_target(interp: &Interpreter) -> EResult<Value> {
    interp
        .with_stack
        .last()
        .cloned()
        .ok_or_else(|| EngineError::invalid_procedure_call("'.' used outside a With block"))
}

fn resolve_receiver(interp: &mut Interpreter, scope: &Rc<Scope>, object: &Expr) -> EResult<Value> {
    eval_expr(interp, scope, object)
}

// ---------------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------------

pub fn eval_expr(interp: &mut Interpreter, scope: &Rc<Scope>, expr: &Expr) -> EResult<Value> {
    match expr {
        Expr::NumberLit(n) => Ok(numeric_literal(*n)),
        Expr::StringLit(s) => Ok(Value::String(s.clone())),
        Expr::BoolLit(b) => Ok(Value::Boolean(*b)),
        Expr::DateLit(text) => crate::builtins::date::parse_date_text(text).map(Value::Date),
        Expr::NothingLit => Ok(Value::nothing()),
        Expr::NullLit => Ok(Value::Null),
        Expr::EmptyLit => Ok(Value::Empty),
        Expr::Identifier(name) => eval_identifier(interp, scope, name),
        Expr::Me => scope
            .get("me")
            .ok_or_else(|| EngineError::invalid_procedure_call("'Me' used outside a class method")),
        Expr::WithTarget => current_with_target(interp),
        Expr::Member { object, name, .. } => {
            let receiver = eval_expr(interp, scope, object)?;
            read_member(interp, &receiver, name)
        }
        Expr::Call { callee, args, pos } => eval_call(interp, scope, callee, args, *pos),
        Expr::Index { object, args, .. } => {
            let receiver = eval_expr(interp, scope, object)?;
            let indices = eval_index_args(interp, scope, args)?;
            index_value(&receiver, &indices)
        }
        Expr::Binary { op, lhs, rhs, pos } => eval_binary(interp, scope, *op, lhs, rhs, *pos),
        Expr::Unary { op, operand, pos } => eval_unary(interp, scope, *op, operand, *pos),
        Expr::New(name) => eval_new(interp, name),
    }
}

fn numeric_literal(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 {
        Value::Long(n as i32)
    } else {
        Value::Double(n)
    }
}

fn eval_identifier(interp: &mut Interpreter, scope: &Rc<Scope>, name: &str) -> EResult<Value> {
    if let Some(v) = scope.get(name) {
        return Ok(v);
    }
    if name.eq_ignore_ascii_case("err") {
        return Ok(Value::Object(Some(ObjectRef::ErrObject)));
    }
    if let Some(proc) = interp.procs.get(name) {
        if matches!(proc.kind(), ProcKind::Function) {
            return call_with_byref(interp, scope, &proc, &[]);
        }
    }
    if !interp.with_stack.is_empty() {
        let target = current_with_target(interp)?;
        if let Ok(v) = read_member(interp, &target, name) {
            return Ok(v);
        }
    }
    if interp.options.option_explicit {
        Err(EngineError::VariableNotDefined(name.to_string()))
    } else {
        Ok(Value::Empty)
    }
}

fn eval_index_args(interp: &mut Interpreter, scope: &Rc<Scope>, args: &[Expr]) -> EResult<Vec<i32>> {
    args.iter().map(|a| coerce::to_long(&eval_expr(interp, scope, a)?)).collect()
}

fn eval_args(interp: &mut Interpreter, scope: &Rc<Scope>, args: &[Expr]) -> EResult<Vec<Value>> {
    args.iter().map(|a| eval_expr(interp, scope, a)).collect()
}

fn index_value(receiver: &Value, indices: &[i32]) -> EResult<Value> {
    match receiver {
        Value::Array(cell) => cell.borrow().get(indices),
        other => Err(EngineError::type_mismatch(format!("{} cannot be indexed", other.type_name()))),
    }
}

/// Reads `name` off `receiver`: a class instance's property-get/field, a RegExp's
/// built-in properties, a Match/MatchCollection's members, or a host object's
/// `invoke`.
fn read_member(interp: &mut Interpreter, receiver: &Value, name: &str) -> EResult<Value> {
    match receiver {
        Value::Object(Some(ObjectRef::Instance(inst))) => {
            if let Some(getter) = inst.class.find_property_get(name) {
                return call_user_proc(interp, &getter, receiver.clone(), &[]);
            }
            if let Some(value) = inst.class.consts.get(&name.to_ascii_lowercase()) {
                return Ok(value.clone());
            }
            if inst.class.has_field(name) {
                return Ok(inst.get_field(name).unwrap_or(Value::Empty));
            }
            if let Some(method) = inst.class.find_method(name) {
                return call_user_proc(interp, &method, receiver.clone(), &[]);
            }
            Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
        }
        Value::Object(Some(ObjectRef::RegExp(re))) => {
            let re = re.borrow();
            match name.to_ascii_lowercase().as_str() {
                "pattern" => Ok(Value::String(re.pattern.clone())),
                "ignorecase" => Ok(Value::Boolean(re.ignore_case)),
                "global" => Ok(Value::Boolean(re.global)),
                "multiline" => Ok(Value::Boolean(re.multiline)),
                other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
            }
        }
        Value::Object(Some(ObjectRef::MatchCollection(mc))) => match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Value::Long(mc.count())),
            other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
        },
        Value::Object(Some(ObjectRef::Match(m))) => match name.to_ascii_lowercase().as_str() {
            "value" => Ok(Value::String(m.value.clone())),
            "firstindex" => Ok(Value::Long(m.first_index)),
            "length" => Ok(Value::Long(m.length)),
            "submatches" => Ok(Value::Object(Some(ObjectRef::SubMatches(Rc::clone(m))))),
            other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
        },
        Value::Object(Some(ObjectRef::SubMatches(m))) => match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Value::Long(m.sub_match_count())),
            other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
        },
        Value::Object(Some(ObjectRef::Host(host))) => host.invoke(name, &[]),
        Value::Object(Some(ObjectRef::ErrObject)) => read_err_member(interp, name, &[]),
        Value::Object(None) => Err(EngineError::ObjectRequired(name.to_string())),
        other => Err(EngineError::type_mismatch(format!("{} has no property '{name}'", other.type_name()))),
    }
}

/// `Err`'s properties (`Number`/`Description`/`Source`) and its zero-arg `Clear`
/// method, reachable both from a plain member read (`n = Err.Number`) and from a
/// bare no-parens call (`Err.Clear`).
fn read_err_member(interp: &mut Interpreter, name: &str, args: &[Value]) -> EResult<Value> {
    match name.to_ascii_lowercase().as_str() {
        "number" => Ok(Value::Long(interp.err.number)),
        "description" => Ok(Value::String(interp.err.description.clone())),
        "source" => Ok(Value::String(interp.err.source.clone())),
        "clear" => {
            interp.clear_error();
            Ok(Value::Empty)
        }
        "raise" => raise_err(interp, args),
        other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
    }
}

/// `Err.Raise(number, [source], [description])`: synthesises a runtime error the
/// same way a language fault would, so it flows through the same `On Error` handling.
fn raise_err(interp: &Interpreter, args: &[Value]) -> EResult<Value> {
    let number = args.first().map(coerce::to_long).transpose()?.unwrap_or(interp.err.number);
    let source = args.get(1).map(coerce::to_display_string).transpose()?.unwrap_or_default();
    let description = args.get(2).map(coerce::to_display_string).transpose()?.unwrap_or_default();
    Err(EngineError::Raised { number, source, description })
}

fn eval_new(interp: &mut Interpreter, name: &str) -> EResult<Value> {
    if name.eq_ignore_ascii_case("regexp") {
        return Ok(crate::builtins::regexp::new_regexp_value());
    }
    let descriptor = interp
        .find_class(name)
        .ok_or_else(|| EngineError::invalid_procedure_call(format!("class '{name}' is not defined")))?;
    let instance = Rc::new(Instance::new(descriptor));
    let value = Value::Object(Some(ObjectRef::Instance(Rc::clone(&instance))));
    if let Some(init) = instance.class.find_initialize() {
        call_user_proc(interp, &init, value.clone(), &[])?;
    }
    Ok(value)
}

/// Dispatches `callee(args)`: a bare identifier may be a user/native procedure, a
/// variable holding an `Array` (index read), or — via the `With` stack — an implicit
/// member call. A `Member` callee is always a method/indexed-property call.
fn eval_call(interp: &mut Interpreter, scope: &Rc<Scope>, callee: &Expr, args: &[Expr], pos: crate::error::Position) -> EResult<Value> {
    match callee {
        Expr::Identifier(name) => {
            if let Some(Value::Array(cell)) = scope.get(name) {
                let indices = eval_index_args(interp, scope, args)?;
                return cell.borrow().get(&indices);
            }
            if let Some(proc) = interp.procs.get(name) {
                return call_with_byref(interp, scope, &proc, args);
            }
            if !interp.with_stack.is_empty() {
                let receiver = current_with_target(interp)?;
                let arg_values = eval_args(interp, scope, args)?;
                if let Ok(v) = call_member(interp, &receiver, name, &arg_values) {
                    return Ok(v);
                }
            }
            Err(EngineError::invalid_procedure_call(format!("'{name}' is not defined at {pos}")))
        }
        Expr::Member { object, name, .. } => {
            let receiver = eval_expr(interp, scope, object)?;
            match &receiver {
                Value::Object(Some(ObjectRef::Instance(_))) => call_instance_method(interp, &receiver, name, scope, args),
                _ => {
                    let arg_values = eval_args(interp, scope, args)?;
                    call_member(interp, &receiver, name, &arg_values)
                }
            }
        }
        Expr::WithTarget => {
            let receiver = current_with_target(interp)?;
            let arg_values = eval_args(interp, scope, args)?;
            call_member(interp, &receiver, "", &arg_values)
        }
        other => {
            let receiver = eval_expr(interp, scope, other)?;
            let indices = eval_index_args(interp, scope, args)?;
            index_value(&receiver, &indices)
        }
    }
}

fn call_instance_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    scope: &Rc<Scope>,
    args: &[Expr],
) -> EResult<Value> {
    let inst = match receiver {
        Value::Object(Some(ObjectRef::Instance(inst))) => Rc::clone(inst),
        _ => unreachable!("call_instance_method requires an Instance receiver"),
    };
    if let Some(method) = inst.class.find_method(name) {
        return call_user_proc_byref(interp, scope, &method, receiver.clone(), args);
    }
    if let Some(getter) = inst.class.find_property_get(name) {
        let arg_values = eval_args(interp, scope, args)?;
        return call_user_proc(interp, &getter, receiver.clone(), &arg_values);
    }
    Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
}

/// Method/indexed-property calls on non-`Instance` objects: RegExp, MatchCollection,
/// Match/SubMatches, and host objects.
fn call_member(interp: &mut Interpreter, receiver: &Value, name: &str, args: &[Value]) -> EResult<Value> {
    match receiver {
        Value::Object(Some(ObjectRef::RegExp(re))) => {
            let re = re.borrow();
            match name.to_ascii_lowercase().as_str() {
                "test" => {
                    let text = coerce::to_display_string(args.first().unwrap_or(&Value::Empty))?;
                    Ok(Value::Boolean(re.test(&text)?))
                }
                "execute" => {
                    let text = coerce::to_display_string(args.first().unwrap_or(&Value::Empty))?;
                    let matches = re.execute(&text)?;
                    Ok(Value::Object(Some(ObjectRef::MatchCollection(Rc::new(matches)))))
                }
                "replace" => {
                    let text = coerce::to_display_string(args.first().unwrap_or(&Value::Empty))?;
                    let replacement = coerce::to_display_string(args.get(1).unwrap_or(&Value::Empty))?;
                    Ok(Value::String(re.replace(&text, &replacement)?))
                }
                other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
            }
        }
        Value::Object(Some(ObjectRef::MatchCollection(mc))) => {
            let index = coerce::to_long(args.first().unwrap_or(&Value::Long(0)))?;
            match name.to_ascii_lowercase().as_str() {
                "item" | "" => Ok(Value::Object(Some(ObjectRef::Match(Rc::new(mc.item(index)?.clone()))))),
                other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
            }
        }
        Value::Object(Some(ObjectRef::SubMatches(m))) => {
            let index = coerce::to_long(args.first().unwrap_or(&Value::Long(0)))?;
            match name.to_ascii_lowercase().as_str() {
                "item" | "" => m.sub_match(index),
                other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
            }
        }
        Value::Object(Some(ObjectRef::Host(host))) => host.invoke(name, args),
        Value::Object(None) => Err(EngineError::ObjectRequired(name.to_string())),
        other => Err(EngineError::type_mismatch(format!("{} has no method '{name}'", other.type_name()))),
    }
}

/// Calls a registered procedure (user or native), evaluating arguments and writing
/// `ByRef` out-parameters back into the caller's scope.
fn call_with_byref(interp: &mut Interpreter, scope: &Rc<Scope>, proc: &crate::procs::Procedure, args: &[Expr]) -> EResult<Value> {
    match proc {
        crate::procs::Procedure::Native { .. } => {
            let arg_values = eval_args(interp, scope, args)?;
            proc.check_arity(arg_values.len())?;
            proc.call_native(interp, &arg_values)
        }
        crate::procs::Procedure::User(decl) => call_user_proc_byref(interp, scope, decl, Value::Empty, args),
    }
}

/// Calls a user-defined `Sub`/`Function`/`Property` body, honouring `ByRef` write-back
/// for arguments that are plain identifiers in the caller's scope (anything else,
/// including array elements and member expressions, is passed as if `ByVal`).
fn call_user_proc_byref(
    interp: &mut Interpreter,
    scope: &Rc<Scope>,
    decl: &Rc<ProcDecl>,
    me: Value,
    args: &[Expr],
) -> EResult<Value> {
    let proc = crate::procs::Procedure::User(Rc::clone(decl));
    proc.check_arity(args.len())?;
    let arg_values = eval_args(interp, scope, args)?;
    let (result, frame) = invoke_proc_body(interp, decl, me, &arg_values)?;
    for (param, expr) in decl.params.iter().zip(args.iter()) {
        if matches!(param.mode, ParamMode::ByRef) {
            if let Expr::Identifier(name) = expr {
                if let Some(v) = frame.get(&param.name) {
                    scope.assign(name, v)?;
                }
            }
        }
    }
    Ok(result)
}

/// Executes a user-defined procedure body in a fresh child scope of globals, binding
/// `Me` and the instance's fields/consts (for class members) and parameters, then
/// returns both the function's result value (the value assigned to a variable named
/// after the function/property, or `Empty` for a `Sub`) and the call frame itself, so
/// [`call_user_proc_byref`] can read back `ByRef` parameters.
fn invoke_proc_body(
    interp: &mut Interpreter,
    decl: &Rc<ProcDecl>,
    me: Value,
    args: &[Value],
) -> EResult<(Value, Rc<Scope>)> {
    let global = Rc::clone(&interp.global);
    let frame = Scope::child(&global);
    let receiver = match &me {
        Value::Object(Some(ObjectRef::Instance(inst))) => {
            frame.declare("me", me.clone());
            bind_instance_fields(&frame, inst);
            Some(Rc::clone(inst))
        }
        _ => None,
    };
    bind_params(interp, &frame, &decl.params, args)?;
    interp.push_call_frame();
    let outcome = exec_block(interp, &frame, &decl.body);
    interp.pop_call_frame();
    if let Some(inst) = &receiver {
        writeback_instance_fields(&frame, inst);
    }
    finish_flow(outcome?)?;
    let result = if matches!(decl.kind, ProcKind::Sub) {
        Value::Empty
    } else {
        frame.get(&decl.name).unwrap_or(Value::Empty)
    };
    Ok((result, frame))
}

/// Calls a user-defined procedure without needing the caller's by-ref frame back
/// (property accessors, `Class_Initialize`/`Class_Terminate`, and any call site that
/// already has evaluated argument values rather than l-value expressions).
fn call_user_proc(interp: &mut Interpreter, decl: &Rc<ProcDecl>, me: Value, args: &[Value]) -> EResult<Value> {
    invoke_proc_body(interp, decl, me, args).map(|(v, _)| v)
}

/// Looks up `name` in the procedure registry and calls it with already-evaluated
/// argument values, for host-driven invocation through the embedding API.
pub(crate) fn call_named_procedure(interp: &mut Interpreter, name: &str, args: &[Value]) -> EResult<Value> {
    let proc = interp
        .procs
        .get(name)
        .ok_or_else(|| crate::error::EngineError::VariableNotDefined(name.to_string()))?
        .clone();
    proc.check_arity(args.len())?;
    match &proc {
        crate::procs::Procedure::Native { .. } => proc.call_native(interp, args),
        crate::procs::Procedure::User(decl) => call_user_proc(interp, decl, Value::Empty, args),
    }
}

/// A class method body sees its instance's private fields and constants as bare,
/// unqualified identifiers (no `Me.` required), matching the dialect's own member
/// lookup inside method bodies. We model this by copying field values into the call
/// frame on entry and copying them back on exit, rather than threading the instance
/// through every scope lookup.
fn bind_instance_fields(frame: &Rc<Scope>, inst: &Instance) {
    for name in &inst.class.fields {
        frame.declare(name, inst.get_field(name).unwrap_or(Value::Empty));
    }
    for (name, value) in &inst.class.consts {
        frame.declare_const(name, value.clone());
    }
}

fn writeback_instance_fields(frame: &Rc<Scope>, inst: &Instance) {
    for name in &inst.class.fields {
        if frame.is_defined_locally(name) {
            if let Some(v) = frame.get(name) {
                inst.set_field(name, v);
            }
        }
    }
}

fn bind_params(interp: &mut Interpreter, frame: &Rc<Scope>, params: &[crate::ast::Param], args: &[Value]) -> EResult<()> {
    for (i, param) in params.iter().enumerate() {
        if param.is_param_array {
            let rest: Vec<Value> = args[i.min(args.len())..].to_vec();
            let arr = DynamicArray::from_values(rest);
            frame.declare(&param.name, Value::Array(Rc::new(RefCell::new(arr))));
            break;
        }
        let value = match args.get(i) {
            Some(v) => v.clone(),
            None => match &param.default {
                Some(expr) => eval_expr(interp, frame, expr)?,
                None => Value::Empty,
            },
        };
        frame.declare(&param.name, value);
    }
    Ok(())
}

fn eval_binary(
    interp: &mut Interpreter,
    scope: &Rc<Scope>,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    pos: crate::error::Position,
) -> EResult<Value> {
    if op == BinOp::Is {
        let a = eval_expr(interp, scope, lhs)?;
        let b = eval_expr(interp, scope, rhs)?;
        return Ok(Value::Boolean(values_are_same_reference(&a, &b)));
    }
    let a = eval_expr(interp, scope, lhs)?;
    let b = eval_expr(interp, scope, rhs)?;
    match op {
        BinOp::Concat => Ok(Value::String(coerce::to_concat_string(&a) + &coerce::to_concat_string(&b))),
        BinOp::And | BinOp::Or | BinOp::Xor | BinOp::Eqv | BinOp::Imp => {
            if a.is_null() || b.is_null() {
                return Ok(Value::Null);
            }
            let x = coerce::to_bool(&a)?;
            let y = coerce::to_bool(&b)?;
            let result = match op {
                BinOp::And => x && y,
                BinOp::Or => x || y,
                BinOp::Xor => x != y,
                BinOp::Eqv => x == y,
                BinOp::Imp => !x || y,
                _ => unreachable!(),
            };
            Ok(Value::Boolean(result))
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            if a.is_null() || b.is_null() {
                return Ok(Value::Null);
            }
            let cmp_op = match op {
                BinOp::Eq => CompareOp::Eq,
                BinOp::Ne => CompareOp::Ne,
                BinOp::Lt => CompareOp::Lt,
                BinOp::Le => CompareOp::Le,
                BinOp::Gt => CompareOp::Gt,
                BinOp::Ge => CompareOp::Ge,
                _ => unreachable!(),
            };
            Ok(Value::Boolean(compare_op(&cmp_op, &a, &b)?))
        }
        BinOp::Add => eval_arith(&a, &b, pos, |x, y| x + y, Some(AddStrings)),
        BinOp::Sub => eval_arith(&a, &b, pos, |x, y| x - y, None),
        BinOp::Mul => eval_arith(&a, &b, pos, |x, y| x * y, None),
        BinOp::Div => {
            if a.is_null() || b.is_null() {
                return Ok(Value::Null);
            }
            let y = coerce::to_f64(&b)?;
            if y == 0.0 {
                return Err(EngineError::DivisionByZero);
            }
            let x = coerce::to_f64(&a)?;
            Ok(Value::Double(x / y))
        }
        BinOp::IntDiv => {
            if a.is_null() || b.is_null() {
                return Ok(Value::Null);
            }
            let y = coerce::to_long(&b)?;
            if y == 0 {
                return Err(EngineError::DivisionByZero);
            }
            let x = coerce::to_long(&a)?;
            Ok(Value::Long(x / y))
        }
        BinOp::Mod => {
            if a.is_null() || b.is_null() {
                return Ok(Value::Null);
            }
            let y = coerce::to_long(&b)?;
            if y == 0 {
                return Err(EngineError::DivisionByZero);
            }
            let x = coerce::to_long(&a)?;
            Ok(Value::Long(x % y))
        }
        BinOp::Pow => {
            if a.is_null() || b.is_null() {
                return Ok(Value::Null);
            }
            let x = coerce::to_f64(&a)?;
            let y = coerce::to_f64(&b)?;
            Ok(Value::Double(x.powf(y)))
        }
        BinOp::Is => unreachable!("handled above"),
    }
}

/// Marker distinguishing `+` (which also concatenates strings when neither side is
/// Null) from `-`/`*`, which are always strictly numeric.
struct AddStrings;

fn eval_arith(a: &Value, b: &Value, pos: crate::error::Position, f: impl Fn(f64, f64) -> f64, add: Option<AddStrings>) -> EResult<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    if add.is_some() && matches!(a, Value::String(_)) && matches!(b, Value::String(_)) {
        let sa = coerce::to_display_string(a)?;
        let sb = coerce::to_display_string(b)?;
        return Ok(Value::String(sa + &sb));
    }
    let x = coerce::to_f64(a).map_err(|_| EngineError::type_mismatch(format!("arithmetic at {pos}")))?;
    let y = coerce::to_f64(b).map_err(|_| EngineError::type_mismatch(format!("arithmetic at {pos}")))?;
    let promotion = coerce::promotion_of(a, b);
    Ok(coerce::narrow(f(x, y), promotion))
}

fn values_are_same_reference(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(None), Value::Object(None)) => true,
        (Value::Object(Some(x)), Value::Object(Some(y))) => x.is_same(y),
        _ => false,
    }
}

fn eval_unary(interp: &mut Interpreter, scope: &Rc<Scope>, op: UnOp, operand: &Expr, pos: crate::error::Position) -> EResult<Value> {
    let v = eval_expr(interp, scope, operand)?;
    if v.is_null() {
        return Ok(Value::Null);
    }
    match op {
        UnOp::Pos => Ok(v),
        UnOp::Neg => {
            let f = coerce::to_f64(&v).map_err(|_| EngineError::type_mismatch(format!("unary minus at {pos}")))?;
            Ok(coerce::narrow(-f, coerce::promotion_of(&v, &Value::Long(0))))
        }
        UnOp::Not => Ok(Value::Boolean(!coerce::to_bool(&v)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn run(src: &str) -> Interpreter {
        let mut interp = Interpreter::new();
        interp.add_code(src).unwrap();
        interp.run().unwrap();
        interp
    }

    #[test]
    fn arithmetic_respects_precedence() {
        let interp = run("x = 5 + 3 * 2");
        assert_eq!(interp.get_variable("x"), Some(Value::Long(11)));
    }

    #[test]
    fn string_concat_with_ampersand_is_null_safe() {
        let interp = run("x = \"a\" & Null & \"b\"");
        assert_eq!(interp.get_variable("x"), Some(Value::String("ab".to_string())));
    }

    #[test]
    fn for_next_loop_sums_a_range() {
        let interp = run("total = 0\nFor i = 1 To 5\n  total = total + i\nNext");
        assert_eq!(interp.get_variable("total"), Some(Value::Long(15)));
    }

    #[test]
    fn for_next_honours_a_negative_step() {
        let interp = run("n = 0\nFor i = 5 To 1 Step -1\n  n = n + 1\nNext");
        assert_eq!(interp.get_variable("n"), Some(Value::Long(5)));
    }

    #[test]
    fn do_while_loop_runs_until_condition_false() {
        let interp = run("n = 0\nDo While n < 3\n  n = n + 1\nLoop");
        assert_eq!(interp.get_variable("n"), Some(Value::Long(3)));
    }

    #[test]
    fn if_else_picks_the_right_branch() {
        let interp = run("If 1 > 2 Then\n  x = 1\nElse\n  x = 2\nEnd If");
        assert_eq!(interp.get_variable("x"), Some(Value::Long(2)));
    }

    #[test]
    fn select_case_matches_is_comparisons() {
        let interp = run("n = 7\nSelect Case n\nCase Is > 5\n  r = \"big\"\nCase Else\n  r = \"small\"\nEnd Select");
        assert_eq!(interp.get_variable("r"), Some(Value::String("big".to_string())));
    }

    #[test]
    fn array_literal_round_trips_through_ubound() {
        let interp = run("a = Array(10, 20, 30)\nx = a(1)\nhi = UBound(a)");
        assert_eq!(interp.get_variable("x"), Some(Value::Long(20)));
        assert_eq!(interp.get_variable("hi"), Some(Value::Long(2)));
    }

    #[test]
    fn on_error_resume_next_swallows_the_failure() {
        let interp = run("On Error Resume Next\nx = 1 / 0\ny = 5");
        assert_eq!(interp.get_variable("y"), Some(Value::Long(5)));
        assert_eq!(interp.last_error().unwrap().number, 11);
    }

    #[test]
    fn function_call_returns_the_assigned_name_slot() {
        let mut interp = Interpreter::new();
        interp.add_code("Function Square(n)\n  Square = n * n\nEnd Function").unwrap();
        interp.run().unwrap();
        assert_eq!(interp.eval("Square(6)").unwrap(), Value::Long(36));
    }

    #[test]
    fn class_property_get_and_let_round_trip() {
        let mut interp = Interpreter::new();
        interp
            .add_code(
                "Class Box\n  Private m_total\n  Public Property Get Total\n    Total = m_total\n  End Property\n  Public Property Let Total(v)\n    m_total = v\n  End Property\nEnd Class",
            )
            .unwrap();
        interp.run().unwrap();
        interp.execute_statement("Set b = New Box").unwrap();
        interp.execute_statement("b.Total = 42").unwrap();
        assert_eq!(interp.eval("b.Total").unwrap(), Value::Long(42));
    }
}
