//! Reserved variable names and operator tables of the intermediate representation

/// Input stream of the program
pub const VAR_IN: &str = "$in";
/// Output stream of the program
pub const VAR_OUT: &str = "$out";
/// Return value of a function
pub const VAR_RET: &str = "$ret";
/// Branch condition, read after a block's assignments ran
pub const VAR_COND: &str = "$cond";
/// Loop break flag
pub const VAR_BREAK: &str = "$break";
/// Loop continue flag
pub const VAR_CONTINUE: &str = "$continue";

/// Printed form of an undefined runtime value
pub const UNDEFINED: &str = "<undef>";

/// Entry function used when no other is configured
pub const DEFAULT_ENTRY_FUNCTION: &str = "main";

/// Conditional expression `ite(cond, then, else)`
pub const OP_ITE: &str = "ite";
/// String concatenation
pub const OP_STR_APPEND: &str = "StrAppend";
/// printf-style formatting
pub const OP_STR_FORMAT: &str = "StrFormat";
/// Call of a program function or math builtin
pub const OP_FUNC_CALL: &str = "FuncCall";
/// Array of the given length, filled with undefined values
pub const OP_ARRAY_CREATE: &str = "ArrayCreate";
/// Copy of an array with one element replaced
pub const OP_ARRAY_ASSIGN: &str = "ArrayAssign";
/// Array element read
pub const OP_ARRAY_INDEX: &str = "ArrayIndex";
/// First token of the input stream, converted to a type
pub const OP_LIST_HEAD: &str = "ListHead";
/// Input stream without its first token
pub const OP_LIST_TAIL: &str = "ListTail";
/// Type conversion
pub const OP_CAST: &str = "cast";

pub const COMP_OPS: &[&str] = &["<=", "<", ">", ">=", "==", "!="];
pub const ARITH_OPS: &[&str] = &["+", "-", "*", "/", "%"];

/// Math functions callable through `FuncCall` without a program definition
pub const MATH_FUNCS: &[&str] = &[
    "floor", "ceil", "pow", "abs", "sqrt", "log2", "log10", "log", "exp", "min", "max",
];

/// Whether `name` is one of the interpreter's reserved `$` variables
pub fn is_reserved(name: &str) -> bool {
    matches!(
        name.trim_end_matches('\''),
        VAR_IN | VAR_OUT | VAR_RET | VAR_COND | VAR_BREAK | VAR_CONTINUE
    )
}

/// Operators spelled with symbols only (`+`, `==`, `!`) print infix or prefix
pub fn is_symbolic(op: &str) -> bool {
    !op.is_empty() && !op.chars().any(|c| c.is_alphanumeric() || c == '_')
}
