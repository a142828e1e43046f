//! Human-readable tree dump
//!
//! One line per node, children indented by two spaces under their parent and
//! prefixed with the slot they occupy:
//!
//! ```text
//! FUN 'f'
//!   body: BLOCK type=Unit
//!     statement[0]: CALL 'g' type=Int
//!       x: CONST Int type=Int value=1
//! ```

use std::fmt::Write;

use kiln_ast::{SymbolId, SymbolTable};
use kiln_types::{TypeContext, TypeId};

use super::node::{FunctionKind, IrKind, LoopKind, SingletonKind, ValueRef};
use super::visitor::{Dispatcher, DispatcherBuilder, TreeView};
use super::{IrNodeId, IrTree, NodeKind, Slot};

struct Dumper<'a> {
    tree: &'a IrTree,
    symbols: &'a SymbolTable,
    types: &'a TypeContext,
    out: String,
    depth: usize,
    /// Label of the node about to be printed, set by its parent
    label: Option<String>,
}

impl TreeView for Dumper<'_> {
    fn tree(&self) -> &IrTree {
        self.tree
    }
}

pub fn dump(tree: &IrTree, symbols: &SymbolTable, types: &TypeContext, root: IrNodeId) -> String {
    let dispatcher = DispatcherBuilder::new(dump_element)
        .on(NodeKind::Call, dump_call)
        .build();
    let mut dumper = Dumper {
        tree,
        symbols,
        types,
        out: String::new(),
        depth: 0,
        label: None,
    };
    dispatcher.visit(&mut dumper, root);
    dumper.out
}

fn dump_element<'a>(d: &Dispatcher<Dumper<'a>, ()>, v: &mut Dumper<'a>, node: IrNodeId) {
    write_line(v, node);
    dump_children(d, v, node, |slot| slot.to_string());
}

/// Arguments are labelled with the callee's parameter names
fn dump_call<'a>(d: &Dispatcher<Dumper<'a>, ()>, v: &mut Dumper<'a>, node: IrNodeId) {
    write_line(v, node);
    let params: Vec<String> = match v.tree.kind(node) {
        IrKind::Call { callee, .. } => v
            .symbols
            .get(*callee)
            .and_then(|symbol| symbol.as_callable())
            .map(|sig| sig.parameters.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    dump_children(d, v, node, |slot| match slot {
        Slot::Argument(i) => params
            .get(i as usize)
            .cloned()
            .unwrap_or_else(|| slot.to_string()),
        _ => slot.to_string(),
    });
}

fn dump_children<'a>(
    d: &Dispatcher<Dumper<'a>, ()>,
    v: &mut Dumper<'a>,
    node: IrNodeId,
    label: impl Fn(Slot) -> String,
) {
    v.depth += 1;
    for (slot, child) in v.tree.children(node) {
        v.label = Some(label(slot));
        d.visit(v, child);
    }
    v.depth -= 1;
}

fn write_line(v: &mut Dumper<'_>, node: IrNodeId) {
    let rendered = render(v, node);
    let indent = "  ".repeat(v.depth);
    match v.label.take() {
        Some(label) => {
            let _ = writeln!(v.out, "{}{}: {}", indent, label, rendered);
        }
        None => {
            let _ = writeln!(v.out, "{}{}", indent, rendered);
        }
    }
}

fn render(v: &Dumper<'_>, node: IrNodeId) -> String {
    let name = |symbol: SymbolId| v.symbols.name(symbol).to_string();
    let variable = |variable: &ValueRef| match variable {
        ValueRef::Symbol(symbol) => name(*symbol),
        ValueRef::Temporary(temp) => v
            .tree
            .temporary(*temp)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "<temporary>".to_string()),
    };

    let mut line = match v.tree.kind(node) {
        IrKind::Module { name, .. } => format!("MODULE {}", name),
        IrKind::File { name, .. } => format!("FILE {}", name),
        IrKind::Class { symbol, .. } => format!("CLASS '{}'", name(*symbol)),
        IrKind::Function { symbol, kind, .. } => {
            let keyword = match kind {
                FunctionKind::Function => "FUN",
                FunctionKind::Constructor => "CONSTRUCTOR",
                FunctionKind::Getter => "GETTER",
                FunctionKind::Setter => "SETTER",
            };
            format!("{} '{}'", keyword, name(*symbol))
        }
        IrKind::Property { symbol, .. } => format!("PROPERTY '{}'", name(*symbol)),
        IrKind::EnumEntry { symbol, .. } => format!("ENUM_ENTRY '{}'", name(*symbol)),
        IrKind::LocalVariable { variable: var, .. } => format!("VAR '{}'", variable(var)),
        IrKind::ErrorDeclaration { description } => format!("ERROR_DECL {:?}", description),
        IrKind::Block { .. } => "BLOCK".to_string(),
        IrKind::Call {
            callee,
            super_qualifier,
            ..
        } => match super_qualifier {
            Some(class) => format!("CALL '{}' superQualifier='{}'", name(*callee), name(*class)),
            None => format!("CALL '{}'", name(*callee)),
        },
        IrKind::GetProperty { property, .. } => format!("GET_PROPERTY '{}'", name(*property)),
        IrKind::SetProperty { property, .. } => format!("SET_PROPERTY '{}'", name(*property)),
        IrKind::SetField { property, .. } => format!("SET_FIELD '{}'", name(*property)),
        IrKind::GetVariable { variable: var, .. } => format!("GET_VAR '{}'", variable(var)),
        IrKind::SetVariable { variable: var, .. } => format!("SET_VAR '{}'", variable(var)),
        IrKind::Const(value) => format!("CONST {}", value.kind_name()),
        IrKind::StringConcatenation { .. } => "STRING_CONCATENATION".to_string(),
        IrKind::ThisReference { class } => format!("GET_THIS '{}'", name(*class)),
        IrKind::SingletonReference { symbol, kind } => match kind {
            SingletonKind::Object => format!("GET_OBJECT '{}'", name(*symbol)),
            SingletonKind::EnumEntry => format!("GET_ENUM '{}'", name(*symbol)),
        },
        IrKind::ExtensionReceiverReference { callable } => {
            format!("GET_EXTENSION_RECEIVER '{}'", name(*callable))
        }
        IrKind::When { .. } => "WHEN".to_string(),
        IrKind::Branch { .. } => "BRANCH".to_string(),
        IrKind::Loop { kind, label, .. } => {
            let keyword = match kind {
                LoopKind::While => "WHILE",
                LoopKind::DoWhile => "DO_WHILE",
            };
            match label {
                Some(label) => format!("{} label={}", keyword, label),
                None => keyword.to_string(),
            }
        }
        IrKind::Break { loop_node, label } => jump("BREAK", *loop_node, label.as_deref()),
        IrKind::Continue { loop_node, label } => jump("CONTINUE", *loop_node, label.as_deref()),
        IrKind::Return { target, .. } => format!("RETURN '{}'", name(*target)),
        IrKind::Throw { .. } => "THROW".to_string(),
        IrKind::TryCatch { .. } => "TRY".to_string(),
        IrKind::Catch { parameter, .. } => format!("CATCH '{}'", name(*parameter)),
        IrKind::TypeOperator { operator, .. } => format!("TYPE_OP {}", operator),
        IrKind::Error { description } => format!("ERROR_EXPR {:?}", description),
    };

    if let Some(ty) = v.tree.ty(node) {
        let _ = write!(line, " type={}", display_type(v.types, ty));
    }
    match v.tree.kind(node) {
        IrKind::Const(value) => {
            let _ = write!(line, " value={}", value);
        }
        IrKind::TypeOperator { type_operand, .. } => {
            let _ = write!(line, " typeOperand={}", display_type(v.types, *type_operand));
        }
        _ => {}
    }
    if let Some(origin) = origin(v.tree.kind(node)) {
        let _ = write!(line, " origin={}", origin);
    }
    line
}

fn jump(keyword: &str, loop_node: IrNodeId, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{} label={} loop={}", keyword, label, loop_node),
        None => format!("{} loop={}", keyword, loop_node),
    }
}

fn display_type(types: &TypeContext, ty: TypeId) -> String {
    types.display(ty)
}

fn origin(kind: &IrKind) -> Option<super::IrOrigin> {
    match kind {
        IrKind::Block { origin, .. }
        | IrKind::Call { origin, .. }
        | IrKind::GetProperty { origin, .. }
        | IrKind::SetProperty { origin, .. }
        | IrKind::SetField { origin, .. }
        | IrKind::GetVariable { origin, .. }
        | IrKind::SetVariable { origin, .. }
        | IrKind::When { origin, .. } => *origin,
        _ => None,
    }
}
