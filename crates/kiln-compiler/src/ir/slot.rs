//! Child attachment points

use std::fmt;

/// Named or indexed position of a child under its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    File(u32),
    Declaration(u32),
    Member(u32),
    DefaultValue(u32),
    Body,
    Initializer,
    Delegate,
    Statement(u32),
    DispatchReceiver,
    ExtensionReceiver,
    Argument(u32),
    Value,
    Branch(u32),
    Condition,
    Result,
    Else,
    Try,
    Catch(u32),
    Finally,
    Operand,
}

impl Slot {
    /// Position within a list slot
    pub fn index(&self) -> Option<u32> {
        match self {
            Slot::File(i)
            | Slot::Declaration(i)
            | Slot::Member(i)
            | Slot::DefaultValue(i)
            | Slot::Statement(i)
            | Slot::Argument(i)
            | Slot::Branch(i)
            | Slot::Catch(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::File(i) => write!(f, "file[{}]", i),
            Slot::Declaration(i) => write!(f, "declaration[{}]", i),
            Slot::Member(i) => write!(f, "member[{}]", i),
            Slot::DefaultValue(i) => write!(f, "default[{}]", i),
            Slot::Body => write!(f, "body"),
            Slot::Initializer => write!(f, "init"),
            Slot::Delegate => write!(f, "delegate"),
            Slot::Statement(i) => write!(f, "statement[{}]", i),
            Slot::DispatchReceiver => write!(f, "$this"),
            Slot::ExtensionReceiver => write!(f, "$receiver"),
            Slot::Argument(i) => write!(f, "arg[{}]", i),
            Slot::Value => write!(f, "value"),
            Slot::Branch(i) => write!(f, "branch[{}]", i),
            Slot::Condition => write!(f, "condition"),
            Slot::Result => write!(f, "result"),
            Slot::Else => write!(f, "else"),
            Slot::Try => write!(f, "try"),
            Slot::Catch(i) => write!(f, "catch[{}]", i),
            Slot::Finally => write!(f, "finally"),
            Slot::Operand => write!(f, "operand"),
        }
    }
}
