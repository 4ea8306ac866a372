// ABOUTME: The fixed reserved-word table shared by the lexer's identifier path

use super::TokenKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Maps the lower-cased spelling of every reserved word to its keyword token kind.
/// Built once; the lexer looks up every identifier here before falling back to
/// `TokenKind::Identifier`.
pub static RESERVED_WORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("dim", Dim),
        ("redim", Redim),
        ("preserve", Preserve),
        ("erase", Erase),
        ("const", Const),
        ("public", Public),
        ("private", Private),
        ("sub", Sub),
        ("function", Function),
        ("property", Property),
        ("get", Get),
        ("let", Let),
        ("set", Set),
        ("end", End),
        ("class", Class),
        ("new", New),
        ("me", Me),
        ("if", If),
        ("then", Then),
        ("elseif", ElseIf),
        ("else", Else),
        ("for", For),
        ("each", Each),
        ("in", In),
        ("to", To),
        ("step", Step),
        ("next", Next),
        ("do", Do),
        ("loop", Loop),
        ("while", While),
        ("wend", Wend),
        ("until", Until),
        ("select", Select),
        ("case", Case),
        ("with", With),
        ("exit", Exit),
        ("on", On),
        ("error", Error),
        ("resume", Resume),
        ("goto", Goto),
        ("call", Call),
        ("option", Option_),
        ("explicit", Explicit),
        ("true", True),
        ("false", False),
        ("nothing", NothingLit),
        ("null", NullLit),
        ("empty", EmptyLit),
        ("is", Is),
        ("and", And),
        ("or", Or),
        ("not", Not),
        ("xor", Xor),
        ("eqv", Eqv),
        ("imp", Imp),
        ("mod", Mod),
        ("byval", ByVal),
        ("byref", ByRef),
        ("rem", Rem),
        ("paramarray", ParamArray),
        ("default", Default_),
    ])
});
