//! Kiln Compiler Middle-End
//!
//! Turns a resolved syntax tree into the Kiln IR:
//! - **IR**: arena tree, node kinds, slots and dispatch-table visitors (`ir` module)
//! - **Lowering**: declarations, bodies, expressions and calls, preserving
//!   the source evaluation order of arguments (`lower` module)
//! - **Coercion**: implicit not-null and cast insertion (`coerce` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use kiln_compiler::{Compiler, CompilerOptions};
//!
//! let mut compiler = Compiler::new(&mut types, &symbols, &bindings);
//! let lowered = compiler.compile(&module)?.into_complete()?;
//! println!("{}", lowered.dump(&symbols, &types));
//! ```

#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Implicit coercion pass
pub mod coerce;

/// Compile errors and tree invariant violations
pub mod error;

/// IR tree, node kinds, visitors and dump
pub mod ir;

/// AST to IR lowering
mod lower;

/// Compiler configuration
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use coerce::insert_implicit_casts;
pub use error::{CompileError, CompileResult, TreeError};
pub use ir::{dump, IrKind, IrNode, IrNodeId, IrTree, NodeKind, Slot};
pub use lower::Unsupported;
pub use options::CompilerOptions;

use kiln_ast::ast::Module;
use kiln_ast::{AstIndex, BindingContext, SymbolTable};
use kiln_types::TypeContext;
use log::debug;

use lower::Lowerer;

/// Output of compiling one module
#[derive(Debug, Clone)]
pub struct LoweredModule {
    pub tree: IrTree,
    /// The `Module` node
    pub root: IrNodeId,
    /// Constructs lowered to placeholders, in lowering order
    pub unsupported: Vec<Unsupported>,
}

impl LoweredModule {
    /// True when no construct was replaced by a placeholder
    pub fn is_complete(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// Reject a module that still contains placeholders
    pub fn into_complete(self) -> CompileResult<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(CompileError::Incomplete {
                count: self.unsupported.len(),
            })
        }
    }

    pub fn dump(&self, symbols: &SymbolTable, types: &TypeContext) -> String {
        ir::dump(&self.tree, symbols, types, self.root)
    }
}

/// Lowering driver over one resolved module
pub struct Compiler<'a> {
    types: &'a mut TypeContext,
    symbols: &'a SymbolTable,
    bindings: &'a BindingContext,
    options: CompilerOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(types: &'a mut TypeContext, symbols: &'a SymbolTable, bindings: &'a BindingContext) -> Self {
        Self::with_options(types, symbols, bindings, CompilerOptions::default())
    }

    pub fn with_options(
        types: &'a mut TypeContext,
        symbols: &'a SymbolTable,
        bindings: &'a BindingContext,
        options: CompilerOptions,
    ) -> Self {
        Self {
            types,
            symbols,
            bindings,
            options,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Lower `module`, then run the passes enabled in the options
    ///
    /// Fatal defects abandon the whole module; unsupported constructs do not
    /// and are reported through [`LoweredModule::unsupported`].
    pub fn compile(&mut self, module: &Module) -> CompileResult<LoweredModule> {
        debug!("compiling module {}", module.name);
        let index = AstIndex::build(module);
        let mut tree = IrTree::new();

        let mut lowerer = Lowerer::new(&index, self.bindings, self.symbols, self.types, &mut tree);
        let root = lowerer.lower_module(module, self.options.module_name.as_deref())?;
        let unsupported = lowerer.into_unsupported();

        if self.options.insert_implicit_casts {
            coerce::insert_implicit_casts(&mut tree, self.symbols, self.types, root)?;
        }
        if self.options.verify_tree {
            tree.verify(root)?;
        }

        debug!(
            "module {} lowered to {} node(s), {} unsupported",
            module.name,
            tree.len(),
            unsupported.len()
        );
        Ok(LoweredModule {
            tree,
            root,
            unsupported,
        })
    }
}
