//! Lowering Integration Tests
//!
//! Builds small resolved modules by hand and checks the lowered tree through
//! its dump and tree queries.
//! Run with: cargo test -p kiln-compiler --test lowering_tests

use kiln_ast::ast::*;
use kiln_ast::{
    AstBuilder, BindingContext, ClassKind, FunctionSignature, PropertySignature, Receiver,
    ResolvedCall, SymbolId, SymbolTable, ValueParameter,
};
use kiln_compiler::{
    CompileError, CompileResult, Compiler, CompilerOptions, IrKind, LoweredModule,
};
use kiln_types::{TypeContext, TypeId};

/// Symbols, resolution tables and syntax for one test module
struct Fixture {
    types: TypeContext,
    symbols: SymbolTable,
    bindings: BindingContext,
    ast: AstBuilder,
}

impl Fixture {
    fn new() -> Self {
        let mut types = TypeContext::new();
        let symbols = SymbolTable::new(&mut types);
        Self {
            types,
            symbols,
            bindings: BindingContext::new(),
            ast: AstBuilder::new(),
        }
    }

    fn int(&self) -> TypeId {
        self.types.int_type()
    }

    fn function(&mut self, name: &str, params: &[(&str, TypeId)], ret: TypeId) -> SymbolId {
        let params = params
            .iter()
            .map(|(name, ty)| ValueParameter::new(*name, *ty))
            .collect();
        self.symbols.add_function(name, FunctionSignature::new(params, ret))
    }

    fn member(&mut self, name: &str, receiver: TypeId, params: &[(&str, TypeId)], ret: TypeId) -> SymbolId {
        let params = params
            .iter()
            .map(|(name, ty)| ValueParameter::new(*name, *ty))
            .collect();
        self.symbols.add_function(
            name,
            FunctionSignature::new(params, ret).with_dispatch_receiver(receiver),
        )
    }

    /// `name(args...)` with arguments in source order, each bound to a parameter index
    fn call(&mut self, callee: SymbolId, name: &str, args: Vec<(u32, Expr)>) -> Expr {
        let mut resolved = ResolvedCall::new(callee);
        let mut arguments = Vec::new();
        for (index, value) in args {
            resolved = resolved.with_argument(index, value.id);
            arguments.push(AstBuilder::arg(value));
        }
        let expr = self.ast.call(name, arguments);
        self.bindings.record_call(expr.id, resolved);
        expr
    }

    fn read(&mut self, name: &str, symbol: SymbolId) -> Expr {
        let expr = self.ast.name(name);
        self.bindings.record_call(expr.id, ResolvedCall::new(symbol));
        expr
    }

    fn local(&mut self, name: &str, symbol: SymbolId, mutable: bool, initializer: Expr) -> Statement {
        let decl = self.ast.variable(name, mutable, Some(initializer));
        self.bindings.record_declaration(decl.id, symbol);
        Statement::Variable(decl)
    }

    fn module(&mut self, declarations: Vec<Declaration>) -> Module {
        let file = self.ast.file("main.kl", declarations);
        AstBuilder::module("main", vec![file])
    }

    /// `fun main() { statements }`
    fn main(&mut self, statements: Vec<Statement>) -> Module {
        let unit = self.types.unit_type();
        let main = self.function("main", &[], unit);
        let body = self.ast.block(statements);
        let decl = self.ast.function("main", vec![], Some(FunctionBody::Block(body)));
        self.bindings.record_declaration(decl.id, main);
        self.module(vec![Declaration::Function(decl)])
    }

    fn compile(&mut self, module: &Module) -> CompileResult<LoweredModule> {
        Compiler::new(&mut self.types, &self.symbols, &self.bindings).compile(module)
    }

    fn compile_with(&mut self, module: &Module, options: CompilerOptions) -> CompileResult<LoweredModule> {
        Compiler::with_options(&mut self.types, &self.symbols, &self.bindings, options).compile(module)
    }

    fn dump(&self, lowered: &LoweredModule) -> String {
        lowered.dump(&self.symbols, &self.types)
    }
}

const MAIN_HEADER: &str = "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'main'
      body: BLOCK type=Unit
";

fn with_header(statements: &str) -> String {
    format!("{}{}", MAIN_HEADER, statements)
}

// =============================================================================
// ARGUMENT ORDER
// =============================================================================

mod argument_order {
    use super::*;

    /// `fun g(x: Int): Int` and `fun f(a: Int, b: Int): Int`
    fn declare_f_and_g(fx: &mut Fixture) -> (SymbolId, SymbolId) {
        let int = fx.int();
        let g = fx.function("g", &[("x", int)], int);
        let f = fx.function("f", &[("a", int), ("b", int)], int);
        (f, g)
    }

    #[test]
    fn test_named_arguments_out_of_order_use_temporaries() {
        let mut fx = Fixture::new();
        let (f, g) = declare_f_and_g(&mut fx);

        // f(b = g(2), a = g(1))
        let two = fx.ast.int(2);
        let g2 = fx.call(g, "g", vec![(0, two)]);
        let one = fx.ast.int(1);
        let g1 = fx.call(g, "g", vec![(0, one)]);
        let call = fx.call(f, "f", vec![(1, g2), (0, g1)]);
        let module = fx.main(vec![Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        assert!(lowered.is_complete());
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=Int origin=SYNTHETIC_BLOCK
          statement[0]: VAR 'tmp0_b'
            init: CALL 'g' type=Int
              x: CONST Int type=Int value=2
          statement[1]: VAR 'tmp1_a'
            init: CALL 'g' type=Int
              x: CONST Int type=Int value=1
          statement[2]: CALL 'f' type=Int
            a: GET_VAR 'tmp1_a' type=Int
            b: GET_VAR 'tmp0_b' type=Int
"
            )
        );
    }

    #[test]
    fn test_constant_arguments_are_not_rematerialized() {
        let mut fx = Fixture::new();
        let (f, _) = declare_f_and_g(&mut fx);

        // f(b = 2, a = 1)
        let two = fx.ast.int(2);
        let one = fx.ast.int(1);
        let call = fx.call(f, "f", vec![(1, two), (0, one)]);
        let module = fx.main(vec![Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=Int origin=SYNTHETIC_BLOCK
          statement[0]: VAR 'tmp0_b'
            init: CONST Int type=Int value=2
          statement[1]: VAR 'tmp1_a'
            init: CONST Int type=Int value=1
          statement[2]: CALL 'f' type=Int
            a: GET_VAR 'tmp1_a' type=Int
            b: GET_VAR 'tmp0_b' type=Int
"
            )
        );
    }

    #[test]
    fn test_positional_arguments_stay_in_place() {
        let mut fx = Fixture::new();
        let (f, g) = declare_f_and_g(&mut fx);

        // f(g(1), g(2))
        let one = fx.ast.int(1);
        let g1 = fx.call(g, "g", vec![(0, one)]);
        let two = fx.ast.int(2);
        let g2 = fx.call(g, "g", vec![(0, two)]);
        let call = fx.call(f, "f", vec![(0, g1), (1, g2)]);
        let module = fx.main(vec![Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        let text = fx.dump(&lowered);
        assert_eq!(
            text,
            with_header(
                "        statement[0]: CALL 'f' type=Int
          a: CALL 'g' type=Int
            x: CONST Int type=Int value=1
          b: CALL 'g' type=Int
            x: CONST Int type=Int value=2
"
            )
        );
        assert!(!text.contains("tmp"));
    }

    #[test]
    fn test_immutable_local_is_read_in_place() {
        let mut fx = Fixture::new();
        let (f, g) = declare_f_and_g(&mut fx);
        let int = fx.int();
        let v = fx.symbols.add_variable("v", int, false);

        // val v = 1; f(b = v, a = g(1))
        let init = fx.ast.int(1);
        let decl = fx.local("v", v, false, init);
        let read_v = fx.read("v", v);
        let one = fx.ast.int(1);
        let g1 = fx.call(g, "g", vec![(0, one)]);
        let call = fx.call(f, "f", vec![(1, read_v), (0, g1)]);
        let module = fx.main(vec![decl, Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: VAR 'v'
          init: CONST Int type=Int value=1
        statement[1]: BLOCK type=Int origin=SYNTHETIC_BLOCK
          statement[0]: VAR 'tmp0_a'
            init: CALL 'g' type=Int
              x: CONST Int type=Int value=1
          statement[1]: CALL 'f' type=Int
            a: GET_VAR 'tmp0_a' type=Int
            b: GET_VAR 'v' type=Int
"
            )
        );
    }

    #[test]
    fn test_default_argument_leaves_slot_empty() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let h = fx.symbols.add_function(
            "h",
            FunctionSignature::new(
                vec![
                    ValueParameter::new("a", int),
                    ValueParameter::new("b", int).with_default(),
                ],
                int,
            ),
        );

        let one = fx.ast.int(1);
        let one_id = one.id;
        let call = fx.ast.call("h", vec![AstBuilder::arg(one)]);
        fx.bindings.record_call(
            call.id,
            ResolvedCall::new(h).with_argument(0, one_id).with_default(1),
        );
        let module = fx.main(vec![Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        let call_node = lowered
            .tree
            .descendants(lowered.root)
            .into_iter()
            .find(|n| matches!(lowered.tree.kind(*n), IrKind::Call { .. }))
            .unwrap();
        match lowered.tree.kind(call_node) {
            IrKind::Call { arguments, .. } => {
                assert_eq!(arguments.len(), 2);
                assert!(arguments[0].is_some());
                assert!(arguments[1].is_none());
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_parameter_index_is_rejected() {
        let mut fx = Fixture::new();
        let (f, _) = declare_f_and_g(&mut fx);

        let one = fx.ast.int(1);
        let two = fx.ast.int(2);
        let call = fx.call(f, "f", vec![(0, one), (0, two)]);
        let module = fx.main(vec![Statement::Expression(call)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateParameterIndex { callee, index: 0 } if callee == f
        ));
    }

    #[test]
    fn test_argument_bound_past_last_parameter() {
        let mut fx = Fixture::new();
        let (f, _) = declare_f_and_g(&mut fx);

        let one = fx.ast.int(1);
        let call = fx.call(f, "f", vec![(5, one)]);
        let module = fx.main(vec![Statement::Expression(call)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::NoSuchParameter { callee, index: 5, arity: 2 } if callee == f
        ));
    }

    /// `f(b = g(2), a = g(1))`
    fn reordered_call(fx: &mut Fixture, f: SymbolId, g: SymbolId) -> Expr {
        let two = fx.ast.int(2);
        let g2 = fx.call(g, "g", vec![(0, two)]);
        let one = fx.ast.int(1);
        let g1 = fx.call(g, "g", vec![(0, one)]);
        fx.call(f, "f", vec![(1, g2), (0, g1)])
    }

    #[test]
    fn test_reordering_block_yields_value_only_when_used() {
        let mut fx = Fixture::new();
        let (f, g) = declare_f_and_g(&mut fx);
        let int = fx.int();
        let v = fx.symbols.add_variable("v", int, false);

        // f(b = g(2), a = g(1)); val v = f(b = g(2), a = g(1))
        let statement = reordered_call(&mut fx, f, g);
        let initializer = reordered_call(&mut fx, f, g);
        fx.bindings.record_used_as_expression(initializer.id);
        let decl = fx.local("v", v, false, initializer);
        let module = fx.main(vec![Statement::Expression(statement), decl]);

        let lowered = fx.compile(&module).unwrap();
        let tree = &lowered.tree;
        let has_result: Vec<bool> = tree
            .descendants(lowered.root)
            .into_iter()
            .filter(|n| matches!(tree.kind(*n), IrKind::Call { callee, .. } if *callee == f))
            .map(|call| match tree.parent(call).map(|block| tree.kind(block)) {
                Some(IrKind::Block { has_result, .. }) => *has_result,
                other => panic!("expected reordering block, got {:?}", other),
            })
            .collect();
        assert_eq!(has_result, vec![false, true]);
    }
}

// =============================================================================
// RESOLUTION DEFECTS
// =============================================================================

mod resolution_defects {
    use super::*;

    #[test]
    fn test_missing_resolved_call() {
        let mut fx = Fixture::new();
        let call = fx.ast.call("nowhere", vec![]);
        let id = call.id;
        let module = fx.main(vec![Statement::Expression(call)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingResolution { what: "resolved call", node } if node == id
        ));
    }

    #[test]
    fn test_unknown_receiver_abandons_module() {
        let mut fx = Fixture::new();
        let unit = fx.types.unit_type();
        let any = fx.types.any_type();
        let run = fx.member("run", any, &[], unit);

        let call = fx.ast.call("run", vec![]);
        fx.bindings.record_call(
            call.id,
            ResolvedCall::new(run).with_dispatch_receiver(Receiver::Unknown {
                description: "script receiver".to_string(),
            }),
        );
        let module = fx.main(vec![Statement::Expression(call)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedReceiver { ref description } if description == "script receiver"
        ));
    }

    #[test]
    fn test_break_outside_loop() {
        let mut fx = Fixture::new();
        let jump = fx.ast.expr(ExprKind::Break(None));
        let id = jump.id;
        let module = fx.main(vec![Statement::Expression(jump)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(err, CompileError::UnknownLoop { node } if node == id));
    }
}

// =============================================================================
// SAFE CALLS AND DESTRUCTURING
// =============================================================================

mod synthetic_blocks {
    use super::*;

    #[test]
    fn test_safe_call_evaluates_receiver_once() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let string = fx.types.string_type();
        let nullable_string = fx.types.make_nullable(string);
        let get = fx.function("get", &[], nullable_string);
        let len = fx.member("len", string, &[], int);

        // get()?.len()
        let receiver = fx.call(get, "get", vec![]);
        let receiver_id = receiver.id;
        let selector = fx.ast.call("len", vec![]);
        let safe = fx.ast.safe_qualified(receiver, selector);
        fx.bindings.record_call(
            safe.id,
            ResolvedCall::new(len).with_dispatch_receiver(Receiver::Expression {
                expression: receiver_id,
                ty: nullable_string,
            }),
        );
        let module = fx.main(vec![Statement::Expression(safe)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=Int? origin=SAFE_CALL
          statement[0]: VAR 'tmp0_safe_receiver'
            init: CALL 'get' type=String?
          statement[1]: WHEN type=Int? origin=SAFE_CALL
            branch[0]: BRANCH
              condition: CALL 'EQEQ' type=Boolean origin=EQEQ
                arg0: GET_VAR 'tmp0_safe_receiver' type=String?
                arg1: CONST Null type=Nothing? value=null
              result: CONST Null type=Nothing? value=null
            else: CALL 'len' type=Int
              $this: GET_VAR 'tmp0_safe_receiver' type=String?
"
            )
        );
    }

    #[test]
    fn test_safe_call_on_immutable_local_uses_temporary() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let string = fx.types.string_type();
        let nullable_string = fx.types.make_nullable(string);
        let a = fx.symbols.add_variable("a", nullable_string, false);
        let len = fx.member("len", string, &[], int);

        // val a: String? = null; a?.len()
        let init = fx.ast.null();
        let decl = fx.local("a", a, false, init);
        let receiver = fx.read("a", a);
        let receiver_id = receiver.id;
        let selector = fx.ast.call("len", vec![]);
        let safe = fx.ast.safe_qualified(receiver, selector);
        fx.bindings.record_call(
            safe.id,
            ResolvedCall::new(len).with_dispatch_receiver(Receiver::Expression {
                expression: receiver_id,
                ty: nullable_string,
            }),
        );
        let module = fx.main(vec![decl, Statement::Expression(safe)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: VAR 'a'
          init: CONST Null type=Nothing? value=null
        statement[1]: BLOCK type=Int? origin=SAFE_CALL
          statement[0]: VAR 'tmp0_safe_receiver'
            init: GET_VAR 'a' type=String?
          statement[1]: WHEN type=Int? origin=SAFE_CALL
            branch[0]: BRANCH
              condition: CALL 'EQEQ' type=Boolean origin=EQEQ
                arg0: GET_VAR 'tmp0_safe_receiver' type=String?
                arg1: CONST Null type=Nothing? value=null
              result: CONST Null type=Nothing? value=null
            else: CALL 'len' type=Int
              $this: GET_VAR 'tmp0_safe_receiver' type=String?
"
            )
        );
    }

    #[test]
    fn test_elvis_on_immutable_local_uses_temporary() {
        let mut fx = Fixture::new();
        let string = fx.types.string_type();
        let nullable_string = fx.types.make_nullable(string);
        let a = fx.symbols.add_variable("a", nullable_string, false);

        // a ?: "none"
        let left = fx.read("a", a);
        let right = fx.ast.string("none");
        let elvis = fx.ast.binary(BinaryOp::Elvis, left, right);
        let module = fx.main(vec![Statement::Expression(elvis)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=String origin=ELVIS
          statement[0]: VAR 'tmp0_elvis_lhs'
            init: GET_VAR 'a' type=String?
          statement[1]: WHEN type=String origin=ELVIS
            branch[0]: BRANCH
              condition: CALL 'EQEQ' type=Boolean origin=EQEQ
                arg0: GET_VAR 'tmp0_elvis_lhs' type=String?
                arg1: CONST Null type=Nothing? value=null
              result: CONST String type=String value=\"none\"
            else: GET_VAR 'tmp0_elvis_lhs' type=String?
"
            )
        );
    }

    #[test]
    fn test_destructuring_skips_underscore() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let triple_ty = fx.types.class_type("Triple", vec![]);
        let triple = fx.function("triple", &[], triple_ty);
        let component1 = fx.member("component1", triple_ty, &[], int);
        let component3 = fx.member("component3", triple_ty, &[], int);
        let a = fx.symbols.add_variable("a", int, false);
        let c = fx.symbols.add_variable("c", int, false);

        // val (a, _, c) = triple()
        let init = fx.call(triple, "triple", vec![]);
        let init_id = init.id;
        let decl = fx.ast.destructuring(&["a", "_", "c"], init);
        let receiver = Receiver::Expression {
            expression: init_id,
            ty: triple_ty,
        };
        fx.bindings.record_declaration(decl.entries[0].id, a);
        fx.bindings.record_declaration(decl.entries[2].id, c);
        fx.bindings.record_component_call(
            decl.entries[0].id,
            ResolvedCall::new(component1).with_dispatch_receiver(receiver.clone()),
        );
        fx.bindings.record_component_call(
            decl.entries[2].id,
            ResolvedCall::new(component3).with_dispatch_receiver(receiver),
        );
        let module = fx.main(vec![Statement::Destructuring(decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=Unit origin=DESTRUCTURING_DECLARATION
          statement[0]: VAR 'tmp0_container'
            init: CALL 'triple' type=Triple
          statement[1]: VAR 'a'
            init: CALL 'component1' type=Int origin=COMPONENT_1
              $this: GET_VAR 'tmp0_container' type=Triple
          statement[2]: VAR 'c'
            init: CALL 'component3' type=Int origin=COMPONENT_3
              $this: GET_VAR 'tmp0_container' type=Triple
"
            )
        );
    }

    #[test]
    fn test_destructuring_without_component_call() {
        let mut fx = Fixture::new();
        let triple_ty = fx.types.class_type("Triple", vec![]);
        let triple = fx.function("triple", &[], triple_ty);

        let init = fx.call(triple, "triple", vec![]);
        let decl = fx.ast.destructuring(&["a"], init);
        let entry = decl.entries[0].id;
        let module = fx.main(vec![Statement::Destructuring(decl)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingResolution { what: "component call", node } if node == entry
        ));
    }

    #[test]
    fn test_when_subject_is_evaluated_once() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let g = fx.function("g", &[("x", int)], int);

        // when (g(0)) { 1 -> 10; else -> 20 }
        let zero = fx.ast.int(0);
        let subject = fx.call(g, "g", vec![(0, zero)]);
        let entry = WhenEntry {
            id: fx.ast.id(),
            span: fx.ast.span(),
            conditions: vec![fx.ast.int(1)],
            body: fx.ast.int(10),
        };
        let otherwise = fx.ast.int(20);
        let when = fx.ast.expr(ExprKind::When(WhenExpr {
            subject: Some(Box::new(subject)),
            entries: vec![entry],
            else_branch: Some(Box::new(otherwise)),
        }));
        let module = fx.main(vec![Statement::Expression(when)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=Unit origin=WHEN
          statement[0]: VAR 'tmp0_subject'
            init: CALL 'g' type=Int
              x: CONST Int type=Int value=0
          statement[1]: WHEN type=Unit origin=WHEN
            branch[0]: BRANCH
              condition: CALL 'EQEQ' type=Boolean origin=EQEQ
                arg0: GET_VAR 'tmp0_subject' type=Int
                arg1: CONST Int type=Int value=1
              result: CONST Int type=Int value=10
            else: CONST Int type=Int value=20
"
            )
        );
    }

    #[test]
    fn test_not_equal_negates_equality() {
        let mut fx = Fixture::new();
        let equals = fx.symbols.builtins().equals;

        // 1 != 2
        let one = fx.ast.int(1);
        let two = fx.ast.int(2);
        let (one_id, two_id) = (one.id, two.id);
        let compare = fx.ast.binary(BinaryOp::NotEqual, one, two);
        fx.bindings.record_call(
            compare.id,
            ResolvedCall::new(equals).with_argument(0, one_id).with_argument(1, two_id),
        );
        let module = fx.main(vec![Statement::Expression(compare)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: CALL 'not' type=Boolean origin=EXCLEQ
          $this: CALL 'EQEQ' type=Boolean origin=EXCLEQ
            arg0: CONST Int type=Int value=1
            arg1: CONST Int type=Int value=2
"
            )
        );
    }
}

// =============================================================================
// ASSIGNMENTS
// =============================================================================

mod assignments {
    use super::*;

    #[test]
    fn test_compound_assignment_as_reassignment() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let x = fx.symbols.add_variable("x", int, true);
        let plus = fx.member("plus", int, &[("other", int)], int);

        // var x = 1; x += 2
        let init = fx.ast.int(1);
        let decl = fx.local("x", x, true, init);
        let target = fx.read("x", x);
        let target_id = target.id;
        let two = fx.ast.int(2);
        let two_id = two.id;
        let assign = fx.ast.assign(AssignOp::AddAssign, target, two);
        fx.bindings.record_reassignment(assign.id, true);
        fx.bindings.record_call(
            assign.id,
            ResolvedCall::new(plus)
                .with_dispatch_receiver(Receiver::Expression {
                    expression: target_id,
                    ty: int,
                })
                .with_argument(0, two_id),
        );
        let module = fx.main(vec![decl, Statement::Expression(assign)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: VAR 'x'
          init: CONST Int type=Int value=1
        statement[1]: SET_VAR 'x' type=Unit origin=PLUSEQ
          value: CALL 'plus' type=Int origin=PLUSEQ
            $this: GET_VAR 'x' type=Int origin=PLUSEQ
            other: CONST Int type=Int value=2
"
            )
        );
    }

    #[test]
    fn test_compound_assignment_through_operator() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let unit = fx.types.unit_type();
        let list_ty = fx.types.class_type("List", vec![]);
        let xs = fx.symbols.add_variable("xs", list_ty, false);
        let plus_assign = fx.member("plusAssign", list_ty, &[("element", int)], unit);

        // xs += 3
        let target = fx.read("xs", xs);
        let target_id = target.id;
        let three = fx.ast.int(3);
        let three_id = three.id;
        let assign = fx.ast.assign(AssignOp::AddAssign, target, three);
        fx.bindings.record_reassignment(assign.id, false);
        fx.bindings.record_call(
            assign.id,
            ResolvedCall::new(plus_assign)
                .with_dispatch_receiver(Receiver::Expression {
                    expression: target_id,
                    ty: list_ty,
                })
                .with_argument(0, three_id),
        );
        let module = fx.main(vec![Statement::Expression(assign)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: CALL 'plusAssign' type=Unit origin=PLUSEQ
          $this: GET_VAR 'xs' type=List origin=PLUSEQ
          element: CONST Int type=Int value=3
"
            )
        );
    }

    #[test]
    fn test_compound_assignment_needs_reassignment_flag() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let x = fx.symbols.add_variable("x", int, true);
        let plus = fx.member("plus", int, &[("other", int)], int);

        let target = fx.read("x", x);
        let two = fx.ast.int(2);
        let assign = fx.ast.assign(AssignOp::AddAssign, target, two);
        let id = assign.id;
        fx.bindings.record_call(assign.id, ResolvedCall::new(plus));
        let module = fx.main(vec![Statement::Expression(assign)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingResolution { what: "reassignment flag", node } if node == id
        ));
    }

    #[test]
    fn test_compound_assignment_to_property_evaluates_receiver_once() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let counter_ty = fx.types.class_type("Counter", vec![]);
        let obj = fx.function("obj", &[], counter_ty);
        let plus = fx.member("plus", int, &[("other", int)], int);
        let count = fx.symbols.add_property(
            "count",
            PropertySignature {
                ty: int,
                mutable: true,
                dispatch_receiver: Some(counter_ty),
                extension_receiver: None,
            },
        );

        // obj().count += 1
        let receiver = fx.call(obj, "obj", vec![]);
        let receiver_id = receiver.id;
        let selector = fx.ast.name("count");
        let target = fx.ast.qualified(receiver, selector);
        let target_id = target.id;
        fx.bindings.record_call(
            target.id,
            ResolvedCall::new(count).with_dispatch_receiver(Receiver::Expression {
                expression: receiver_id,
                ty: counter_ty,
            }),
        );
        let one = fx.ast.int(1);
        let one_id = one.id;
        let assign = fx.ast.assign(AssignOp::AddAssign, target, one);
        fx.bindings.record_reassignment(assign.id, true);
        fx.bindings.record_call(
            assign.id,
            ResolvedCall::new(plus)
                .with_dispatch_receiver(Receiver::Expression {
                    expression: target_id,
                    ty: int,
                })
                .with_argument(0, one_id),
        );
        let module = fx.main(vec![Statement::Expression(assign)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: BLOCK type=Unit origin=PLUSEQ
          statement[0]: VAR 'tmp0_this'
            init: CALL 'obj' type=Counter
          statement[1]: SET_PROPERTY 'count' type=Unit origin=PLUSEQ
            $this: GET_VAR 'tmp0_this' type=Counter
            value: CALL 'plus' type=Int origin=PLUSEQ
              $this: GET_PROPERTY 'count' type=Int origin=PLUSEQ
                $this: GET_VAR 'tmp0_this' type=Counter
              other: CONST Int type=Int value=1
"
            )
        );
    }

    fn increment(op: UnaryOp) -> String {
        let mut fx = Fixture::new();
        let int = fx.int();
        let x = fx.symbols.add_variable("x", int, true);
        let inc = fx.member("inc", int, &[], int);

        let init = fx.ast.int(0);
        let decl = fx.local("x", x, true, init);
        let operand = fx.read("x", x);
        let operand_id = operand.id;
        let expr = fx.ast.unary(op, operand);
        fx.bindings.record_call(
            expr.id,
            ResolvedCall::new(inc).with_dispatch_receiver(Receiver::Expression {
                expression: operand_id,
                ty: int,
            }),
        );
        let module = fx.main(vec![decl, Statement::Expression(expr)]);

        let lowered = fx.compile(&module).unwrap();
        fx.dump(&lowered)
    }

    #[test]
    fn test_prefix_increment() {
        assert_eq!(
            increment(UnaryOp::PrefixIncrement),
            with_header(
                "        statement[0]: VAR 'x'
          init: CONST Int type=Int value=0
        statement[1]: BLOCK type=Int origin=PREFIX_INCR
          statement[0]: VAR 'tmp0_prefix'
            init: CALL 'inc' type=Int origin=PREFIX_INCR
              $this: GET_VAR 'x' type=Int origin=PREFIX_INCR
          statement[1]: SET_VAR 'x' type=Unit origin=PREFIX_INCR
            value: GET_VAR 'tmp0_prefix' type=Int
          statement[2]: GET_VAR 'tmp0_prefix' type=Int
"
            )
        );
    }

    #[test]
    fn test_postfix_increment() {
        assert_eq!(
            increment(UnaryOp::PostfixIncrement),
            with_header(
                "        statement[0]: VAR 'x'
          init: CONST Int type=Int value=0
        statement[1]: BLOCK type=Int origin=POSTFIX_INCR
          statement[0]: VAR 'tmp0_postfix'
            init: GET_VAR 'x' type=Int origin=POSTFIX_INCR
          statement[1]: SET_VAR 'x' type=Unit origin=POSTFIX_INCR
            value: CALL 'inc' type=Int origin=POSTFIX_INCR
              $this: GET_VAR 'tmp0_postfix' type=Int
          statement[2]: GET_VAR 'tmp0_postfix' type=Int
"
            )
        );
    }
}

// =============================================================================
// LOOPS AND RETURNS
// =============================================================================

mod jumps {
    use super::*;

    #[test]
    fn test_jumps_target_their_loops() {
        let mut fx = Fixture::new();

        // outer@ while (true) { while (false) { continue; break@outer } }
        let cont = fx.ast.expr(ExprKind::Continue(None));
        let brk = fx.ast.expr(ExprKind::Break(Some("outer".to_string())));
        let brk_id = brk.id;
        let inner_body = fx
            .ast
            .block_expr(vec![Statement::Expression(cont), Statement::Expression(brk)]);
        let inner_cond = fx.ast.boolean(false);
        let inner = fx.ast.while_loop(None, inner_cond, inner_body);
        let outer_body = fx.ast.block_expr(vec![Statement::Expression(inner)]);
        let outer_cond = fx.ast.boolean(true);
        let outer = fx.ast.while_loop(Some("outer"), outer_cond, outer_body);
        fx.bindings.record_label_target(brk_id, outer.id);
        let module = fx.main(vec![Statement::Expression(outer)]);

        let lowered = fx.compile(&module).unwrap();
        let tree = &lowered.tree;
        let nodes = tree.descendants(lowered.root);
        let loops: Vec<_> = nodes
            .iter()
            .copied()
            .filter(|n| matches!(tree.kind(*n), IrKind::Loop { .. }))
            .collect();
        assert_eq!(loops.len(), 2);
        let (outer_node, inner_node) = (loops[0], loops[1]);

        let mut jumps = 0;
        for node in nodes {
            match tree.kind(node) {
                IrKind::Break { loop_node, label } => {
                    assert_eq!(*loop_node, outer_node);
                    assert_eq!(label.as_deref(), Some("outer"));
                    jumps += 1;
                }
                IrKind::Continue { loop_node, label } => {
                    assert_eq!(*loop_node, inner_node);
                    assert_eq!(*label, None);
                    jumps += 1;
                }
                _ => {}
            }
        }
        assert_eq!(jumps, 2);
        assert!(fx.dump(&lowered).contains("WHILE label=outer type=Unit"));
    }

    #[test]
    fn test_labeled_return_targets_label_owner() {
        let mut fx = Fixture::new();
        let unit = fx.types.unit_type();
        let outer = fx.function("outer", &[], unit);
        let inner = fx.function("inner", &[], unit);

        // fun outer() { fun inner() { return@outer } }
        let ret = fx.ast.ret(Some("outer"), None);
        let ret_id = ret.id;
        let inner_body = fx.ast.block(vec![Statement::Expression(ret)]);
        let inner_decl = fx.ast.function("inner", vec![], Some(FunctionBody::Block(inner_body)));
        fx.bindings.record_declaration(inner_decl.id, inner);
        let outer_body = fx
            .ast
            .block(vec![Statement::Declaration(Declaration::Function(inner_decl))]);
        let outer_decl = fx.ast.function("outer", vec![], Some(FunctionBody::Block(outer_body)));
        fx.bindings.record_declaration(outer_decl.id, outer);
        fx.bindings.record_label_target(ret_id, outer_decl.id);
        let module = fx.module(vec![Declaration::Function(outer_decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'outer'
      body: BLOCK type=Unit
        statement[0]: FUN 'inner'
          body: BLOCK type=Unit
            statement[0]: RETURN 'outer' type=Nothing
"
        );
    }

    #[test]
    fn test_expression_body_returns_its_value() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let answer = fx.function("answer", &[], int);

        let value = fx.ast.int(42);
        let decl = fx.ast.function("answer", vec![], Some(FunctionBody::Expression(value)));
        fx.bindings.record_declaration(decl.id, answer);
        let module = fx.module(vec![Declaration::Function(decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'answer'
      body: BLOCK type=Unit
        statement[0]: RETURN 'answer' type=Nothing
          value: CONST Int type=Int value=42
"
        );
    }
}

// =============================================================================
// IMPLICIT COERCIONS
// =============================================================================

mod coercions {
    use super::*;
    use kiln_compiler::insert_implicit_casts;
    use kiln_types::BuiltinType;

    /// `fun name(): ret = value`
    fn expression_function(fx: &mut Fixture, name: &str, ret: TypeId, value: Expr) -> Module {
        let symbol = fx.function(name, &[], ret);
        let decl = fx.ast.function(name, vec![], Some(FunctionBody::Expression(value)));
        fx.bindings.record_declaration(decl.id, symbol);
        fx.module(vec![Declaration::Function(decl)])
    }

    #[test]
    fn test_widening_return_gets_cast() {
        let mut fx = Fixture::new();
        let long = fx.types.builtin(BuiltinType::Long);
        let value = fx.ast.int(42);
        let module = expression_function(&mut fx, "wide", long, value);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'wide'
      body: BLOCK type=Unit
        statement[0]: RETURN 'wide' type=Nothing
          value: TYPE_OP IMPLICIT_CAST type=Long typeOperand=Long
            operand: CONST Int type=Int value=42
"
        );
    }

    #[test]
    fn test_platform_return_gets_not_null() {
        let mut fx = Fixture::new();
        let string = fx.types.string_type();
        let platform = fx.types.flexible_type(string);
        let source = fx.function("platformName", &[], platform);
        let value = fx.call(source, "platformName", vec![]);
        let module = expression_function(&mut fx, "name", string, value);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'name'
      body: BLOCK type=Unit
        statement[0]: RETURN 'name' type=Nothing
          value: TYPE_OP IMPLICIT_NOTNULL type=String typeOperand=String
            operand: CALL 'platformName' type=String!
"
        );
    }

    #[test]
    fn test_disabled_pass_leaves_tree_alone() {
        let mut fx = Fixture::new();
        let long = fx.types.builtin(BuiltinType::Long);
        let value = fx.ast.int(42);
        let module = expression_function(&mut fx, "wide", long, value);

        let options = CompilerOptions::new().with_implicit_casts(false);
        let lowered = fx.compile_with(&module, options).unwrap();
        assert!(!fx.dump(&lowered).contains("TYPE_OP"));
    }

    #[test]
    fn test_pass_is_idempotent_on_lowered_module() {
        let mut fx = Fixture::new();
        let long = fx.types.builtin(BuiltinType::Long);
        let value = fx.ast.int(42);
        let module = expression_function(&mut fx, "wide", long, value);

        let options = CompilerOptions::new().with_implicit_casts(false);
        let mut lowered = fx.compile_with(&module, options).unwrap();
        let root = lowered.root;
        assert_eq!(insert_implicit_casts(&mut lowered.tree, &fx.symbols, &fx.types, root).unwrap(), 1);
        assert_eq!(insert_implicit_casts(&mut lowered.tree, &fx.symbols, &fx.types, root).unwrap(), 0);
        lowered.tree.verify(root).unwrap();
    }
}

// =============================================================================
// RECEIVERS
// =============================================================================

mod receivers {
    use super::*;
    use kiln_ast::{ClassInfo, Symbol, SymbolKind};

    /// `class C { fun run(): Int }`
    fn declare_class(fx: &mut Fixture) -> (SymbolId, TypeId, SymbolId) {
        let int = fx.int();
        let c_ty = fx.types.class_type("C", vec![]);
        let c = fx.symbols.add_class("C", ClassKind::Class, c_ty);
        let run = fx.member("run", c_ty, &[], int);
        (c, c_ty, run)
    }

    const RUN_ON_THIS: &str = "        statement[0]: CALL 'run' type=Int
          $this: GET_THIS 'C' type=C
";

    #[test]
    fn test_implicit_this_receiver() {
        let mut fx = Fixture::new();
        let (class, ty, run) = declare_class(&mut fx);

        // run()
        let call = fx.ast.call("run", vec![]);
        fx.bindings.record_call(
            call.id,
            ResolvedCall::new(run).with_dispatch_receiver(Receiver::ImplicitThis { class, ty }),
        );
        let module = fx.main(vec![Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(fx.dump(&lowered), with_header(RUN_ON_THIS));
    }

    #[test]
    fn test_qualified_this_receiver() {
        let mut fx = Fixture::new();
        let (class, ty, run) = declare_class(&mut fx);

        // this.run()
        let this = fx.ast.this();
        let this_id = this.id;
        let selector = fx.ast.call("run", vec![]);
        let call = fx.ast.qualified(this, selector);
        fx.bindings.record_call(
            call.id,
            ResolvedCall::new(run).with_dispatch_receiver(Receiver::QualifiedThis {
                class,
                ty,
                expression: this_id,
            }),
        );
        let module = fx.main(vec![Statement::Expression(call)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(fx.dump(&lowered), with_header(RUN_ON_THIS));
    }

    #[test]
    fn test_singleton_receivers() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let registry_ty = fx.types.class_type("Registry", vec![]);
        let registry = fx.symbols.add_class("Registry", ClassKind::Object, registry_ty);
        let size = fx.member("size", registry_ty, &[], int);
        let color_ty = fx.types.class_type("Color", vec![]);
        let red = fx.symbols.add(Symbol::new(
            "RED",
            SymbolKind::EnumEntry(ClassInfo {
                kind: ClassKind::EnumClass,
                ty: color_ty,
            }),
        ));
        let rgb = fx.member("rgb", color_ty, &[], int);

        // Registry.size(); rgb() inside the RED entry
        let name = fx.ast.name("Registry");
        let name_id = name.id;
        let selector = fx.ast.call("size", vec![]);
        let on_object = fx.ast.qualified(name, selector);
        fx.bindings.record_call(
            on_object.id,
            ResolvedCall::new(size).with_dispatch_receiver(Receiver::Singleton {
                class: registry,
                ty: registry_ty,
                expression: Some(name_id),
            }),
        );
        let on_entry = fx.ast.call("rgb", vec![]);
        fx.bindings.record_call(
            on_entry.id,
            ResolvedCall::new(rgb).with_dispatch_receiver(Receiver::Singleton {
                class: red,
                ty: color_ty,
                expression: None,
            }),
        );
        // Registry; RED
        let object_name = fx.read("Registry", registry);
        let entry_name = fx.read("RED", red);
        let module = fx.main(vec![
            Statement::Expression(on_object),
            Statement::Expression(on_entry),
            Statement::Expression(object_name),
            Statement::Expression(entry_name),
        ]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: CALL 'size' type=Int
          $this: GET_OBJECT 'Registry' type=Registry
        statement[1]: CALL 'rgb' type=Int
          $this: GET_ENUM 'RED' type=Color
        statement[2]: GET_OBJECT 'Registry' type=Registry
        statement[3]: GET_ENUM 'RED' type=Color
"
            )
        );
    }

    #[test]
    fn test_extension_receiver() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let string = fx.types.string_type();
        let shout = fx.symbols.add_function(
            "shout",
            FunctionSignature::new(vec![], int).with_extension_receiver(string),
        );
        let len = fx.member("len", string, &[], int);

        // fun String.shout(): Int = len()
        let call = fx.ast.call("len", vec![]);
        fx.bindings.record_call(
            call.id,
            ResolvedCall::new(len).with_dispatch_receiver(Receiver::ExtensionReceiver {
                callable: shout,
                ty: string,
            }),
        );
        let decl = fx.ast.function("shout", vec![], Some(FunctionBody::Expression(call)));
        fx.bindings.record_declaration(decl.id, shout);
        let module = fx.module(vec![Declaration::Function(decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'shout'
      body: BLOCK type=Unit
        statement[0]: RETURN 'shout' type=Nothing
          value: CALL 'len' type=Int
            $this: GET_EXTENSION_RECEIVER 'shout' type=String
"
        );
    }

    #[test]
    fn test_this_expressions() {
        let mut fx = Fixture::new();
        let (class, _, _) = declare_class(&mut fx);
        let int = fx.int();
        let string = fx.types.string_type();
        let shout = fx.symbols.add_function(
            "shout",
            FunctionSignature::new(vec![], int).with_extension_receiver(string),
        );

        // this; this@shout
        let this = fx.ast.this();
        fx.bindings.record_this_target(this.id, class);
        let labeled = fx.ast.expr(ExprKind::This(Some("shout".to_string())));
        fx.bindings.record_this_target(labeled.id, shout);
        let module = fx.main(vec![Statement::Expression(this), Statement::Expression(labeled)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: GET_THIS 'C' type=C
        statement[1]: GET_EXTENSION_RECEIVER 'shout' type=String
"
            )
        );
    }

    #[test]
    fn test_this_without_target() {
        let mut fx = Fixture::new();
        let this = fx.ast.this();
        let id = this.id;
        let module = fx.main(vec![Statement::Expression(this)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingResolution { what: "this target", node } if node == id
        ));
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

mod expressions {
    use super::*;
    use kiln_compiler::Slot;

    fn text(fx: &mut Fixture, value: &str) -> TemplateEntry {
        TemplateEntry::Text {
            span: fx.ast.span(),
            value: value.to_string(),
        }
    }

    fn type_ref(fx: &mut Fixture, name: &str, ty: TypeId) -> TypeRef {
        let target = TypeRef {
            id: fx.ast.id(),
            span: fx.ast.span(),
            name: name.to_string(),
        };
        fx.bindings.record_type_reference(target.id, ty);
        target
    }

    #[test]
    fn test_string_templates() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let x = fx.symbols.add_variable("x", int, false);

        // ""; "abc"; "a${x}b"; "$x"
        let empty = fx.ast.expr(ExprKind::StringTemplate(vec![]));
        let abc = text(&mut fx, "abc");
        let single = fx.ast.expr(ExprKind::StringTemplate(vec![abc]));
        let a = text(&mut fx, "a");
        let read_x = fx.read("x", x);
        let b = text(&mut fx, "b");
        let mixed = fx.ast.expr(ExprKind::StringTemplate(vec![
            a,
            TemplateEntry::Expression(read_x),
            b,
        ]));
        let read_x = fx.read("x", x);
        let interpolated = fx
            .ast
            .expr(ExprKind::StringTemplate(vec![TemplateEntry::Expression(read_x)]));
        let module = fx.main(vec![
            Statement::Expression(empty),
            Statement::Expression(single),
            Statement::Expression(mixed),
            Statement::Expression(interpolated),
        ]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: CONST String type=String value=\"\"
        statement[1]: CONST String type=String value=\"abc\"
        statement[2]: STRING_CONCATENATION type=String
          arg[0]: CONST String type=String value=\"a\"
          arg[1]: GET_VAR 'x' type=Int
          arg[2]: CONST String type=String value=\"b\"
        statement[3]: STRING_CONCATENATION type=String
          arg[0]: GET_VAR 'x' type=Int
"
            )
        );
    }

    #[test]
    fn test_type_operators() {
        let mut fx = Fixture::new();
        let any = fx.types.any_type();
        let string = fx.types.string_type();
        let nullable_string = fx.types.make_nullable(string);
        let x = fx.symbols.add_variable("x", any, false);
        let y = fx.symbols.add_variable("y", nullable_string, false);

        // x is String; x !is String; x as String; x as? String; y!!
        let mut statements = Vec::new();
        for negated in [false, true] {
            let operand = fx.read("x", x);
            let target = type_ref(&mut fx, "String", string);
            statements.push(fx.ast.expr(ExprKind::TypeCheck(TypeCheckExpr {
                expr: Box::new(operand),
                target,
                negated,
            })));
        }
        for safe in [false, true] {
            let operand = fx.read("x", x);
            let target = type_ref(&mut fx, "String", string);
            statements.push(fx.ast.expr(ExprKind::Cast(CastExpr {
                expr: Box::new(operand),
                target,
                safe,
            })));
        }
        let operand = fx.read("y", y);
        statements.push(fx.ast.unary(UnaryOp::NotNullAssert, operand));
        let module = fx.main(statements.into_iter().map(Statement::Expression).collect());

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: TYPE_OP INSTANCEOF type=Boolean typeOperand=String
          operand: GET_VAR 'x' type=Any
        statement[1]: TYPE_OP NOT_INSTANCEOF type=Boolean typeOperand=String
          operand: GET_VAR 'x' type=Any
        statement[2]: TYPE_OP CAST type=String typeOperand=String
          operand: GET_VAR 'x' type=Any
        statement[3]: TYPE_OP SAFE_CAST type=String? typeOperand=String
          operand: GET_VAR 'x' type=Any
        statement[4]: TYPE_OP NOT_NULL type=String typeOperand=String
          operand: GET_VAR 'y' type=String?
"
            )
        );
    }

    #[test]
    fn test_cast_without_type_reference() {
        let mut fx = Fixture::new();
        let any = fx.types.any_type();
        let x = fx.symbols.add_variable("x", any, false);

        let operand = fx.read("x", x);
        let target = TypeRef {
            id: fx.ast.id(),
            span: fx.ast.span(),
            name: "String".to_string(),
        };
        let target_id = target.id;
        let cast = fx.ast.expr(ExprKind::Cast(CastExpr {
            expr: Box::new(operand),
            target,
            safe: false,
        }));
        let module = fx.main(vec![Statement::Expression(cast)]);

        let err = fx.compile(&module).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingResolution { what: "type reference", node } if node == target_id
        ));
    }

    #[test]
    fn test_throwing_expression_body_has_no_return() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let throwable = fx.types.throwable_type();
        let fail = fx.function("fail", &[], throwable);
        let boom = fx.function("boom", &[], int);

        // fun boom(): Int = throw fail()
        let value = fx.call(fail, "fail", vec![]);
        let throw = fx.ast.expr(ExprKind::Throw(Box::new(value)));
        let decl = fx.ast.function("boom", vec![], Some(FunctionBody::Expression(throw)));
        fx.bindings.record_declaration(decl.id, boom);
        let module = fx.module(vec![Declaration::Function(decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: FUN 'boom'
      body: BLOCK type=Unit
        statement[0]: THROW type=Nothing
          value: CALL 'fail' type=Throwable
"
        );
    }

    #[test]
    fn test_try_catch_finally() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let throwable = fx.types.throwable_type();
        let g = fx.function("g", &[("x", int)], int);
        let e = fx.symbols.add_parameter("e", throwable);

        // try { g(1) } catch (e: Throwable) { g(2) } finally { g(3) }
        let mut calls = Vec::new();
        for value in 1..=3 {
            let argument = fx.ast.int(value);
            calls.push(fx.call(g, "g", vec![(0, argument)]));
        }
        let mut calls = calls.into_iter().map(Statement::Expression);
        let body = fx.ast.block(calls.next().into_iter().collect());
        let parameter = fx.ast.parameter("e", None);
        fx.bindings.record_declaration(parameter.id, e);
        let clause = CatchClause {
            id: fx.ast.id(),
            span: fx.ast.span(),
            parameter,
            body: fx.ast.block(calls.next().into_iter().collect()),
        };
        let finally = fx.ast.block(calls.next().into_iter().collect());
        let try_expr = fx.ast.expr(ExprKind::Try(TryExpr {
            body,
            catches: vec![clause],
            finally: Some(finally),
        }));
        let module = fx.main(vec![Statement::Expression(try_expr)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: TRY type=Unit
          try: BLOCK type=Unit
            statement[0]: CALL 'g' type=Int
              x: CONST Int type=Int value=1
          catch[0]: CATCH 'e'
            result: BLOCK type=Unit
              statement[0]: CALL 'g' type=Int
                x: CONST Int type=Int value=2
          finally: BLOCK type=Unit
            statement[0]: CALL 'g' type=Int
              x: CONST Int type=Int value=3
"
            )
        );
    }

    #[test]
    fn test_do_while_body_precedes_condition() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let g = fx.function("g", &[("x", int)], int);

        // do { g(1) } while (false)
        let one = fx.ast.int(1);
        let call = fx.call(g, "g", vec![(0, one)]);
        let body = fx.ast.block_expr(vec![Statement::Expression(call)]);
        let condition = fx.ast.boolean(false);
        let do_while = fx.ast.do_while_loop(None, condition, body);
        let module = fx.main(vec![Statement::Expression(do_while)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            with_header(
                "        statement[0]: DO_WHILE type=Unit
          body: BLOCK type=Unit
            statement[0]: CALL 'g' type=Int
              x: CONST Int type=Int value=1
          condition: CONST Boolean type=Boolean value=false
"
            )
        );

        // the body is lowered before the condition
        let tree = &lowered.tree;
        let loop_node = tree
            .descendants(lowered.root)
            .into_iter()
            .find(|n| matches!(tree.kind(*n), IrKind::Loop { .. }))
            .unwrap();
        let body = tree.child(loop_node, Slot::Body).unwrap();
        let condition = tree.child(loop_node, Slot::Condition).unwrap();
        assert!(body.0 < condition.0);
    }
}

// =============================================================================
// CLASSES
// =============================================================================

mod classes {
    use super::*;
    use kiln_ast::{ClassInfo, Symbol, SymbolKind};

    #[test]
    fn test_constructor_parameter_properties() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let point_ty = fx.types.class_type("P", vec![]);
        let point = fx.symbols.add_class("P", ClassKind::Class, point_ty);
        let ctor = fx.symbols.add_constructor(
            "P",
            FunctionSignature::new(vec![ValueParameter::new("x", int)], point_ty),
        );
        let param = fx.symbols.add_parameter("x", int);
        let property = fx.symbols.add_property(
            "x",
            PropertySignature {
                ty: int,
                mutable: false,
                dispatch_receiver: Some(point_ty),
                extension_receiver: None,
            },
        );

        // class P(val x: Int)
        let parameter = fx.ast.parameter("x", None);
        let property_node = fx.ast.id();
        fx.bindings.record_declaration(parameter.id, param);
        fx.bindings.record_declaration(property_node, property);
        let primary = PrimaryConstructor {
            id: fx.ast.id(),
            span: fx.ast.span(),
            parameters: vec![ConstructorParameter {
                parameter,
                property: Some(property_node),
            }],
        };
        fx.bindings.record_declaration(primary.id, ctor);
        let mut class = fx.ast.class("P", vec![]);
        class.primary_constructor = Some(primary);
        fx.bindings.record_declaration(class.id, point);
        let module = fx.module(vec![Declaration::Class(class)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: CLASS 'P'
      member[0]: CONSTRUCTOR 'P'
        body: BLOCK type=Unit
          statement[0]: SET_FIELD 'x' type=Unit origin=INITIALIZE_PROPERTY_FROM_PARAMETER
            $this: GET_THIS 'P' type=P
            value: GET_VAR 'x' type=Int origin=INITIALIZE_PROPERTY_FROM_PARAMETER
      member[1]: PROPERTY 'x'
        init: GET_VAR 'x' type=Int origin=INITIALIZE_PROPERTY_FROM_PARAMETER
"
        );
    }

    #[test]
    fn test_delegated_property() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let lazy_ty = fx.types.class_type("Lazy", vec![]);
        let lazy = fx.function("lazyValue", &[], lazy_ty);
        let p = fx.symbols.add_property(
            "p",
            PropertySignature {
                ty: int,
                mutable: false,
                dispatch_receiver: None,
                extension_receiver: None,
            },
        );

        // val p by lazyValue()
        let delegate = fx.call(lazy, "lazyValue", vec![]);
        let mut decl = fx.ast.property("p", None);
        decl.delegate = Some(delegate);
        fx.bindings.record_declaration(decl.id, p);
        let module = fx.module(vec![Declaration::Property(decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: PROPERTY 'p'
      delegate: CALL 'lazyValue' type=Lazy
"
        );
    }

    #[test]
    fn test_accessors_follow_their_property() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let unit = fx.types.unit_type();
        let p = fx.symbols.add_property(
            "p",
            PropertySignature {
                ty: int,
                mutable: true,
                dispatch_receiver: None,
                extension_receiver: None,
            },
        );
        let get = fx.function("<get-p>", &[], int);
        let set = fx.function("<set-p>", &[("value", int)], unit);

        // var p = 0; get() = 42; set(value) {}
        let init = fx.ast.int(0);
        let mut decl = fx.ast.property("p", Some(init));
        let value = fx.ast.int(42);
        let getter = Accessor {
            id: fx.ast.id(),
            span: fx.ast.span(),
            body: FunctionBody::Expression(value),
        };
        let setter_body = fx.ast.block(vec![]);
        let setter = Accessor {
            id: fx.ast.id(),
            span: fx.ast.span(),
            body: FunctionBody::Block(setter_body),
        };
        fx.bindings.record_declaration(decl.id, p);
        fx.bindings.record_declaration(getter.id, get);
        fx.bindings.record_declaration(setter.id, set);
        decl.getter = Some(getter);
        decl.setter = Some(setter);
        let module = fx.module(vec![Declaration::Property(decl)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: PROPERTY 'p'
      init: CONST Int type=Int value=0
    declaration[1]: GETTER '<get-p>'
      body: BLOCK type=Unit
        statement[0]: RETURN '<get-p>' type=Nothing
          value: CONST Int type=Int value=42
    declaration[2]: SETTER '<set-p>'
      body: BLOCK type=Unit
"
        );
    }

    #[test]
    fn test_enum_entries() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let color_ty = fx.types.class_type("Color", vec![]);
        let color = fx.symbols.add_class("Color", ClassKind::EnumClass, color_ty);
        let ctor = fx.symbols.add_constructor(
            "Color",
            FunctionSignature::new(vec![ValueParameter::new("rgb", int)], color_ty),
        );
        let entry_symbol = |fx: &mut Fixture, name: &str| {
            fx.symbols.add(Symbol::new(
                name,
                SymbolKind::EnumEntry(ClassInfo {
                    kind: ClassKind::EnumClass,
                    ty: color_ty,
                }),
            ))
        };
        let red = entry_symbol(&mut fx, "RED");
        let plain = entry_symbol(&mut fx, "PLAIN");

        // enum class Color { RED(1), PLAIN }
        let one = fx.ast.int(1);
        let one_id = one.id;
        let red_entry = EnumEntryDecl {
            id: fx.ast.id(),
            span: fx.ast.span(),
            name: "RED".to_string(),
            arguments: vec![AstBuilder::arg(one)],
        };
        fx.bindings.record_declaration(red_entry.id, red);
        fx.bindings
            .record_call(red_entry.id, ResolvedCall::new(ctor).with_argument(0, one_id));
        let plain_entry = EnumEntryDecl {
            id: fx.ast.id(),
            span: fx.ast.span(),
            name: "PLAIN".to_string(),
            arguments: vec![],
        };
        fx.bindings.record_declaration(plain_entry.id, plain);
        let mut class = fx.ast.class("Color", vec![]);
        class.enum_entries = vec![red_entry, plain_entry];
        fx.bindings.record_declaration(class.id, color);
        let module = fx.module(vec![Declaration::Class(class)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: CLASS 'Color'
      member[0]: ENUM_ENTRY 'RED'
        init: CALL 'Color' type=Color origin=ENUM_CONSTRUCTOR_CALL
          rgb: CONST Int type=Int value=1
      member[1]: ENUM_ENTRY 'PLAIN'
"
        );
    }

    #[test]
    fn test_initializers_run_in_each_secondary_constructor() {
        let mut fx = Fixture::new();
        let int = fx.int();
        let g = fx.function("g", &[("x", int)], int);
        let base_ty = fx.types.class_type("Base", vec![]);
        let base_ctor = fx
            .symbols
            .add_constructor("Base", FunctionSignature::new(vec![], base_ty));
        let s_ty = fx.types.class_type("S", vec![base_ty]);
        let s = fx.symbols.add_class("S", ClassKind::Class, s_ty);
        let first = fx
            .symbols
            .add_constructor("S", FunctionSignature::new(vec![], s_ty));
        let second = fx.symbols.add_constructor(
            "S",
            FunctionSignature::new(vec![ValueParameter::new("n", int)], s_ty),
        );

        let g_call = |fx: &mut Fixture, value: i64| {
            let argument = fx.ast.int(value);
            Statement::Expression(fx.call(g, "g", vec![(0, argument)]))
        };

        // class S : Base {
        //     init { g(1) }
        //     constructor() : super() { g(2) }
        //     constructor(n: Int) { g(3) }
        // }
        let init_statement = g_call(&mut fx, 1);
        let init = fx.ast.block(vec![init_statement]);
        let delegation = SuperCall {
            id: fx.ast.id(),
            span: fx.ast.span(),
            arguments: vec![],
        };
        fx.bindings
            .record_call(delegation.id, ResolvedCall::new(base_ctor));
        let first_statement = g_call(&mut fx, 2);
        let first_ctor = SecondaryConstructor {
            id: fx.ast.id(),
            span: fx.ast.span(),
            parameters: vec![],
            delegation: Some(delegation),
            body: Some(fx.ast.block(vec![first_statement])),
        };
        fx.bindings.record_declaration(first_ctor.id, first);
        let n = fx.ast.parameter("n", None);
        let second_statement = g_call(&mut fx, 3);
        let second_ctor = SecondaryConstructor {
            id: fx.ast.id(),
            span: fx.ast.span(),
            parameters: vec![n],
            delegation: None,
            body: Some(fx.ast.block(vec![second_statement])),
        };
        fx.bindings.record_declaration(second_ctor.id, second);
        let class = fx.ast.class(
            "S",
            vec![
                ClassMember::Initializer(init),
                ClassMember::SecondaryConstructor(first_ctor),
                ClassMember::SecondaryConstructor(second_ctor),
            ],
        );
        fx.bindings.record_declaration(class.id, s);
        let module = fx.module(vec![Declaration::Class(class)]);

        let lowered = fx.compile(&module).unwrap();
        assert_eq!(
            fx.dump(&lowered),
            "\
MODULE main
  file[0]: FILE main.kl
    declaration[0]: CLASS 'S'
      member[0]: CONSTRUCTOR 'S'
        body: BLOCK type=Unit
          statement[0]: CALL 'Base' type=Base origin=DELEGATING_CONSTRUCTOR_CALL
          statement[1]: CALL 'g' type=Int
            x: CONST Int type=Int value=1
          statement[2]: CALL 'g' type=Int
            x: CONST Int type=Int value=2
      member[1]: CONSTRUCTOR 'S'
        body: BLOCK type=Unit
          statement[0]: CALL 'g' type=Int
            x: CONST Int type=Int value=1
          statement[1]: CALL 'g' type=Int
            x: CONST Int type=Int value=3
"
        );
    }
}

// =============================================================================
// PLACEHOLDERS AND OPTIONS
// =============================================================================

mod placeholders {
    use super::*;

    #[test]
    fn test_unsupported_constructs_are_recorded() {
        let mut fx = Fixture::new();
        let lambda_body = fx.ast.block(vec![]);
        let lambda = fx.ast.expr(ExprKind::Lambda(lambda_body));
        let module = {
            let unit = fx.types.unit_type();
            let main = fx.function("main", &[], unit);
            let body = fx.ast.block(vec![Statement::Expression(lambda)]);
            let decl = fx.ast.function("main", vec![], Some(FunctionBody::Block(body)));
            fx.bindings.record_declaration(decl.id, main);
            let alias = TypeAliasDecl {
                id: fx.ast.id(),
                span: fx.ast.span(),
                name: "Alias".to_string(),
            };
            fx.module(vec![Declaration::Function(decl), Declaration::TypeAlias(alias)])
        };

        let lowered = fx.compile(&module).unwrap();
        assert!(!lowered.is_complete());
        assert_eq!(lowered.unsupported.len(), 2);
        assert_eq!(lowered.unsupported[0].description, "lambda expression");
        assert_eq!(lowered.unsupported[1].description, "type alias 'Alias'");

        let text = fx.dump(&lowered);
        assert!(text.contains("statement[0]: ERROR_EXPR \"lambda expression\""));
        assert!(text.contains("declaration[1]: ERROR_DECL \"type alias 'Alias'\""));

        let err = lowered.into_complete().unwrap_err();
        assert!(matches!(err, CompileError::Incomplete { count: 2 }));
    }

    #[test]
    fn test_module_name_override() {
        let mut fx = Fixture::new();
        let module = fx.main(vec![]);
        let options = CompilerOptions::new().with_module_name("renamed");

        let lowered = fx.compile_with(&module, options).unwrap().into_complete().unwrap();
        assert!(fx.dump(&lowered).starts_with("MODULE renamed\n"));
    }
}
