// ABOUTME: Abstract syntax tree produced by the parser and walked by the evaluator

use crate::error::Position;

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    /// `Some(dims)` for `Dim a(5, 2)`-style array declarations; each entry is the
    /// declared upper bound expression (lower bound is always 0 at the script level).
    pub array_upper_bounds: Option<Vec<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Sub,
    Function,
    Property,
    Do,
    For,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    Next,
    /// Bare `Resume` — retry the statement that failed.
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseMatch {
    Values(Vec<Expr>),
    Is(CompareOp, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub matches: Vec<CaseMatch>,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCondition {
    While,
    Until,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DoTest {
    /// `Do [While|Until] cond ... Loop`
    Pre(LoopCondition, Expr),
    /// `Do ... Loop [While|Until] cond`
    Post(LoopCondition, Expr),
    /// `Do ... Loop` with no condition at all.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    ByRef,
    ByVal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub mode: ParamMode,
    pub is_param_array: bool,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcKind {
    Sub,
    Function,
    PropertyGet,
    PropertyLet,
    PropertySet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcDecl {
    pub name: String,
    pub kind: ProcKind,
    pub visibility: Visibility,
    pub params: Vec<Param>,
    pub body: Block,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub consts: Vec<(String, Expr)>,
    pub members: Vec<ProcDecl>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Dim(Vec<Declarator>),
    Redim { preserve: bool, targets: Vec<(String, Vec<Expr>)> },
    Erase(Vec<String>),
    Const(Vec<(String, Expr)>),
    VisibilityDim { visibility: Visibility, declarators: Vec<Declarator> },
    VisibilityConst { visibility: Visibility, consts: Vec<(String, Expr)> },

    Assign { target: Expr, value: Expr, pos: Position },
    SetAssign { target: Expr, value: Expr, pos: Position },
    /// Bare call or `Call expr(...)`: the expression is evaluated and its value discarded.
    ExprStmt(Expr),

    If { branches: Vec<(Expr, Block)>, else_branch: Option<Block> },
    ForNext { var: String, from: Expr, to: Expr, step: Option<Expr>, body: Block, pos: Position },
    ForEach { var: String, iterable: Expr, body: Block },
    DoLoop { test: DoTest, body: Block },
    WhileWend { cond: Expr, body: Block },
    SelectCase { discriminant: Expr, cases: Vec<CaseArm>, else_body: Option<Block> },
    With { target: Expr, body: Block },

    Exit(ExitKind),
    OnErrorResumeNext,
    OnErrorGotoZero,
    OnErrorGoto(String),
    Resume(ResumeKind),
    Goto(String),
    Label(String),

    ProcDecl(ProcDecl),
    ClassDecl(ClassDecl),
    OptionExplicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Concat,
    Or,
    And,
    Xor,
    Eqv,
    Imp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    /// Raw, unparsed text between `#` delimiters; resolved by the date builtins at eval time.
    DateLit(String),
    NothingLit,
    NullLit,
    EmptyLit,

    Identifier(String),
    Me,
    /// The implicit receiver inside a `With` block (a leading-`.` member access).
    WithTarget,

    Member { object: Box<Expr>, name: String, pos: Position },
    Call { callee: Box<Expr>, args: Vec<Expr>, pos: Position },
    Index { object: Box<Expr>, args: Vec<Expr>, pos: Position },

    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr>, pos: Position },
    Unary { op: UnOp, operand: Box<Expr>, pos: Position },

    New(String),
}
