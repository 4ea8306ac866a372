// ABOUTME: Recursive-descent parser turning a token stream into the statement/expression AST

use crate::ast::*;
use crate::error::{Position, SyntaxError};
use crate::lexer::{tokenize, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, SyntaxError>;

/// Parse a complete compilation unit (a whole script) into a statement block.
pub fn parse_program(source: &str) -> PResult<Block> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.skip_separators();
    let block = parser.parse_block(&|k| matches!(k, TokenKind::Eof))?;
    parser.expect(&TokenKind::Eof)?;
    Ok(block)
}

/// Parse a single statement, used by the embedding surface's `execute_statement`.
pub fn parse_statement_text(source: &str) -> PResult<Stmt> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.skip_separators();
    let stmt = parser.parse_statement()?;
    parser.skip_separators();
    parser.expect(&TokenKind::Eof)?;
    Ok(stmt)
}

/// Parse a single expression, used by the embedding surface's `eval`.
pub fn parse_expression_text(source: &str) -> PResult<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    parser.expect(&TokenKind::Eof)?;
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_pos(&self) -> Position {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span.start
    }

    fn checkpoint(&self) -> usize {
        self.pos
    }

    fn restore(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }

    fn advance(&mut self) -> TokenKind {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].kind.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<()> {
        if self.eat(kind) {
            Ok(())
        } else if matches!(self.peek(), TokenKind::Eof) {
            Err(SyntaxError::UnexpectedEof { expected: kind.describe() })
        } else {
            Err(SyntaxError::UnexpectedToken {
                found: self.peek().describe(),
                expected: kind.describe(),
                pos: self.peek_pos(),
            })
        }
    }

    fn expect_identifier(&mut self) -> PResult<String> {
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(SyntaxError::UnexpectedToken {
                found: self.peek().describe(),
                expected: "identifier".to_string(),
                pos: self.peek_pos(),
            }),
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), TokenKind::Newline | TokenKind::Colon) {
            self.advance();
        }
    }

    /// Consumes at least one statement separator (Newline or Colon), or accepts
    /// being immediately at a block terminator / Eof.
    fn end_statement(&mut self, stop: &dyn Fn(&TokenKind) -> bool) -> PResult<()> {
        if matches!(self.peek(), TokenKind::Newline | TokenKind::Colon) {
            self.skip_separators();
            return Ok(());
        }
        if stop(self.peek()) || matches!(self.peek(), TokenKind::Eof) {
            return Ok(());
        }
        Err(SyntaxError::UnexpectedToken {
            found: self.peek().describe(),
            expected: "end of statement".to_string(),
            pos: self.peek_pos(),
        })
    }

    fn parse_block(&mut self, stop: &dyn Fn(&TokenKind) -> bool) -> PResult<Block> {
        let mut block = Vec::new();
        self.skip_separators();
        while !stop(self.peek()) && !matches!(self.peek(), TokenKind::Eof) {
            let stmt = self.parse_statement()?;
            block.push(stmt);
            self.end_statement(stop)?;
        }
        Ok(block)
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.peek().clone() {
            TokenKind::Dim => {
                self.advance();
                Ok(Stmt::Dim(self.parse_declarators()?))
            }
            TokenKind::Redim => {
                self.advance();
                let preserve = self.eat(&TokenKind::Preserve);
                let targets = self.parse_redim_targets()?;
                Ok(Stmt::Redim { preserve, targets })
            }
            TokenKind::Erase => {
                self.advance();
                let mut names = vec![self.expect_identifier()?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.expect_identifier()?);
                }
                Ok(Stmt::Erase(names))
            }
            TokenKind::Const => {
                self.advance();
                Ok(Stmt::Const(self.parse_const_declarators()?))
            }
            TokenKind::Public | TokenKind::Private => self.parse_visibility_statement(),
            TokenKind::Sub | TokenKind::Function => {
                self.parse_proc_decl(Visibility::Public).map(Stmt::ProcDecl)
            }
            TokenKind::Property => self.parse_proc_decl(Visibility::Public).map(Stmt::ProcDecl),
            TokenKind::Class => self.parse_class_decl().map(Stmt::ClassDecl),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Do => self.parse_do_loop(),
            TokenKind::While => self.parse_while_wend(),
            TokenKind::Select => self.parse_select_case(),
            TokenKind::With => self.parse_with(),
            TokenKind::Exit => self.parse_exit(),
            TokenKind::On => self.parse_on_error(),
            TokenKind::Resume => self.parse_resume(),
            TokenKind::Goto => {
                self.advance();
                Ok(Stmt::Goto(self.expect_identifier()?))
            }
            TokenKind::Call => {
                self.advance();
                let pos = self.peek_pos();
                let expr = self.parse_call_target_expr()?;
                let _ = pos;
                Ok(Stmt::ExprStmt(expr))
            }
            TokenKind::Set => {
                self.advance();
                let pos = self.peek_pos();
                let target = self.parse_expr()?;
                self.expect(&TokenKind::Eq)?;
                let value = self.parse_expr()?;
                Ok(Stmt::SetAssign { target, value, pos })
            }
            TokenKind::Option_ => {
                self.advance();
                self.expect(&TokenKind::Explicit)?;
                Ok(Stmt::OptionExplicit)
            }
            TokenKind::Identifier(name) => self.parse_identifier_leading_statement(name),
            _ => Err(SyntaxError::UnexpectedToken {
                found: self.peek().describe(),
                expected: "statement".to_string(),
                pos: self.peek_pos(),
            }),
        }
    }

    /// Disambiguates: label definitions (`name:`), assignment, and bare calls
    /// (`name args`) that all start with a leading identifier.
    fn parse_identifier_leading_statement(&mut self, name: String) -> PResult<Stmt> {
        let save = self.checkpoint();
        self.advance(); // consume the identifier
        if self.check(&TokenKind::Colon) {
            // `name:` is a label only when nothing else follows on the line.
            let after_colon = self.pos + 1;
            if matches!(self.tokens[after_colon].kind, TokenKind::Newline | TokenKind::Eof) {
                self.advance();
                return Ok(Stmt::Label(name));
            }
        }
        self.restore(save);
        let pos = self.peek_pos();
        let expr = self.parse_postfix_from_identifier()?;
        if self.eat(&TokenKind::Eq) {
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign { target: expr, value, pos });
        }
        Ok(Stmt::ExprStmt(expr))
    }

    /// Parses an identifier-rooted postfix expression, treating a following bare
    /// argument list (no parentheses) as a call — `foo 1, 2` — same as `Call foo(1, 2)`.
    fn parse_postfix_from_identifier(&mut self) -> PResult<Expr> {
        let base = self.parse_postfix()?;
        if matches!(base, Expr::Call { .. }) {
            return Ok(base);
        }
        if self.starts_bare_arg_list() {
            let pos = self.peek_pos();
            let mut args = vec![self.parse_expr()?];
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_expr()?);
            }
            return Ok(Expr::Call { callee: Box::new(base), args, pos });
        }
        Ok(base)
    }

    fn starts_bare_arg_list(&self) -> bool {
        !matches!(
            self.peek(),
            TokenKind::Newline
                | TokenKind::Colon
                | TokenKind::Eof
                | TokenKind::Eq
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::Dot
        )
    }

    fn parse_call_target_expr(&mut self) -> PResult<Expr> {
        self.parse_expr()
    }

    fn parse_declarators(&mut self) -> PResult<Vec<Declarator>> {
        let mut decls = vec![self.parse_one_declarator()?];
        while self.eat(&TokenKind::Comma) {
            decls.push(self.parse_one_declarator()?);
        }
        Ok(decls)
    }

    fn parse_one_declarator(&mut self) -> PResult<Declarator> {
        let name = self.expect_identifier()?;
        let array_upper_bounds = if self.eat(&TokenKind::LParen) {
            let mut bounds = Vec::new();
            if !self.check(&TokenKind::RParen) {
                bounds.push(self.parse_expr()?);
                while self.eat(&TokenKind::Comma) {
                    bounds.push(self.parse_expr()?);
                }
            }
            self.expect(&TokenKind::RParen)?;
            Some(bounds)
        } else {
            None
        };
        Ok(Declarator { name, array_upper_bounds })
    }

    fn parse_const_declarators(&mut self) -> PResult<Vec<(String, Expr)>> {
        let mut out = vec![self.parse_one_const()?];
        while self.eat(&TokenKind::Comma) {
            out.push(self.parse_one_const()?);
        }
        Ok(out)
    }

    fn parse_one_const(&mut self) -> PResult<(String, Expr)> {
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        Ok((name, value))
    }

    fn parse_redim_targets(&mut self) -> PResult<Vec<(String, Vec<Expr>)>> {
        let mut out = vec![self.parse_one_redim_target()?];
        while self.eat(&TokenKind::Comma) {
            out.push(self.parse_one_redim_target()?);
        }
        Ok(out)
    }

    fn parse_one_redim_target(&mut self) -> PResult<(String, Vec<Expr>)> {
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let mut bounds = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            bounds.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok((name, bounds))
    }

    fn parse_visibility_statement(&mut self) -> PResult<Stmt> {
        let visibility = if self.eat(&TokenKind::Public) { Visibility::Public } else {
            self.expect(&TokenKind::Private)?;
            Visibility::Private
        };
        match self.peek().clone() {
            TokenKind::Sub | TokenKind::Function | TokenKind::Property => {
                self.parse_proc_decl(visibility).map(Stmt::ProcDecl)
            }
            TokenKind::Const => {
                self.advance();
                Ok(Stmt::VisibilityConst { visibility, consts: self.parse_const_declarators()? })
            }
            TokenKind::Dim => {
                self.advance();
                Ok(Stmt::VisibilityDim { visibility, declarators: self.parse_declarators()? })
            }
            _ => Ok(Stmt::VisibilityDim { visibility, declarators: self.parse_declarators()? }),
        }
    }

    fn parse_proc_decl(&mut self, visibility: Visibility) -> PResult<ProcDecl> {
        let pos = self.peek_pos();
        let kind = match self.advance() {
            TokenKind::Sub => ProcKind::Sub,
            TokenKind::Function => ProcKind::Function,
            TokenKind::Property => match self.advance() {
                TokenKind::Get => ProcKind::PropertyGet,
                TokenKind::Let => ProcKind::PropertyLet,
                TokenKind::Set => ProcKind::PropertySet,
                other => {
                    return Err(SyntaxError::UnexpectedToken {
                        found: other.describe(),
                        expected: "Get, Let, or Set".to_string(),
                        pos,
                    })
                }
            },
            other => {
                return Err(SyntaxError::UnexpectedToken {
                    found: other.describe(),
                    expected: "Sub, Function, or Property".to_string(),
                    pos,
                })
            }
        };
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_param()?);
            while self.eat(&TokenKind::Comma) {
                params.push(self.parse_param()?);
            }
        }
        self.expect(&TokenKind::RParen)?;
        let end_kind = match kind {
            ProcKind::Sub => TokenKind::Sub,
            ProcKind::Function => TokenKind::Function,
            _ => TokenKind::Property,
        };
        let body = self.parse_block(&|k| matches!(k, TokenKind::End))?;
        self.expect(&TokenKind::End)?;
        self.expect(&end_kind)?;
        Ok(ProcDecl { name, kind, visibility, params, body, pos })
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let mode = if self.eat(&TokenKind::ByVal) {
            ParamMode::ByVal
        } else {
            self.eat(&TokenKind::ByRef);
            ParamMode::ByRef
        };
        let is_param_array = self.eat(&TokenKind::ParamArray);
        let name = self.expect_identifier()?;
        let default = if self.eat(&TokenKind::Eq) { Some(self.parse_expr()?) } else { None };
        Ok(Param { name, mode, is_param_array, default })
    }

    fn parse_class_decl(&mut self) -> PResult<ClassDecl> {
        let pos = self.peek_pos();
        self.expect(&TokenKind::Class)?;
        let name = self.expect_identifier()?;
        let mut fields = Vec::new();
        let mut consts = Vec::new();
        let mut members = Vec::new();
        self.skip_separators();
        loop {
            match self.peek().clone() {
                TokenKind::End => break,
                TokenKind::Public | TokenKind::Private => {
                    let visibility = if self.eat(&TokenKind::Public) { Visibility::Public } else {
                        self.expect(&TokenKind::Private)?;
                        Visibility::Private
                    };
                    match self.peek().clone() {
                        TokenKind::Sub | TokenKind::Function | TokenKind::Property => {
                            members.push(self.parse_proc_decl(visibility)?);
                        }
                        TokenKind::Const => {
                            self.advance();
                            for (n, v) in self.parse_const_declarators()? {
                                consts.push((n, v));
                            }
                        }
                        _ => {
                            for decl in self.parse_declarators()? {
                                fields.push(FieldDecl { name: decl.name, visibility });
                            }
                        }
                    }
                }
                TokenKind::Dim => {
                    self.advance();
                    for decl in self.parse_declarators()? {
                        fields.push(FieldDecl { name: decl.name, visibility: Visibility::Public });
                    }
                }
                TokenKind::Const => {
                    self.advance();
                    for (n, v) in self.parse_const_declarators()? {
                        consts.push((n, v));
                    }
                }
                TokenKind::Sub | TokenKind::Function | TokenKind::Property => {
                    members.push(self.parse_proc_decl(Visibility::Public)?);
                }
                TokenKind::Eof => {
                    return Err(SyntaxError::UnexpectedEof { expected: "End Class".to_string() })
                }
                other => {
                    return Err(SyntaxError::StatementNotAllowedInClass(
                        other.describe(),
                        self.peek_pos(),
                    ))
                }
            }
            self.skip_separators();
        }
        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::Class)?;
        Ok(ClassDecl { name, fields, consts, members, pos })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Then)?;

        // Inline form: no newline right after Then.
        if !matches!(self.peek(), TokenKind::Newline) {
            let mut then_body = vec![self.parse_statement()?];
            while self.eat(&TokenKind::Colon) {
                if matches!(self.peek(), TokenKind::Else | TokenKind::Newline | TokenKind::Eof) {
                    break;
                }
                then_body.push(self.parse_statement()?);
            }
            let else_branch = if self.eat(&TokenKind::Else) {
                let mut body = vec![self.parse_statement()?];
                while self.eat(&TokenKind::Colon) {
                    if matches!(self.peek(), TokenKind::Newline | TokenKind::Eof) {
                        break;
                    }
                    body.push(self.parse_statement()?);
                }
                Some(body)
            } else {
                None
            };
            return Ok(Stmt::If { branches: vec![(cond, then_body)], else_branch });
        }

        let is_block_stop = |k: &TokenKind| matches!(k, TokenKind::ElseIf | TokenKind::Else | TokenKind::End);
        let then_body = self.parse_block(&is_block_stop)?;
        let mut branches = vec![(cond, then_body)];
        while self.check(&TokenKind::ElseIf) {
            self.advance();
            let c = self.parse_expr()?;
            self.expect(&TokenKind::Then)?;
            let body = self.parse_block(&is_block_stop)?;
            branches.push((c, body));
        }
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(self.parse_block(&|k| matches!(k, TokenKind::End))?)
        } else {
            None
        };
        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::If)?;
        Ok(Stmt::If { branches, else_branch })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let pos = self.peek_pos();
        self.expect(&TokenKind::For)?;
        if self.eat(&TokenKind::Each) {
            let var = self.expect_identifier()?;
            self.expect(&TokenKind::In)?;
            let iterable = self.parse_expr()?;
            let body = self.parse_block(&|k| matches!(k, TokenKind::Next))?;
            self.expect(&TokenKind::Next)?;
            let _ = self.eat_trailing_identifier();
            return Ok(Stmt::ForEach { var, iterable, body });
        }
        let var = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let from = self.parse_expr()?;
        self.expect(&TokenKind::To)?;
        let to = self.parse_expr()?;
        let step = if self.eat(&TokenKind::Step) { Some(self.parse_expr()?) } else { None };
        let body = self.parse_block(&|k| matches!(k, TokenKind::Next))?;
        self.expect(&TokenKind::Next)?;
        let _ = self.eat_trailing_identifier();
        Ok(Stmt::ForNext { var, from, to, step, body, pos })
    }

    /// `Next i` and `End Sub FooName`-style trailing name echoes are optional and
    /// purely cosmetic in the dialect; swallow a bare identifier if present.
    fn eat_trailing_identifier(&mut self) -> bool {
        if matches!(self.peek(), TokenKind::Identifier(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_do_loop(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::Do)?;
        let pre_test = self.parse_optional_loop_condition()?;
        let body = self.parse_block(&|k| matches!(k, TokenKind::Loop))?;
        self.expect(&TokenKind::Loop)?;
        let test = if let Some((cond, expr)) = pre_test {
            DoTest::Pre(cond, expr)
        } else if let Some((cond, expr)) = self.parse_optional_loop_condition()? {
            DoTest::Post(cond, expr)
        } else {
            DoTest::None
        };
        Ok(Stmt::DoLoop { test, body })
    }

    fn parse_optional_loop_condition(&mut self) -> PResult<Option<(LoopCondition, Expr)>> {
        if self.eat(&TokenKind::While) {
            Ok(Some((LoopCondition::While, self.parse_expr()?)))
        } else if self.eat(&TokenKind::Until) {
            Ok(Some((LoopCondition::Until, self.parse_expr()?)))
        } else {
            Ok(None)
        }
    }

    fn parse_while_wend(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::While)?;
        let cond = self.parse_expr()?;
        let body = self.parse_block(&|k| matches!(k, TokenKind::Wend))?;
        self.expect(&TokenKind::Wend)?;
        Ok(Stmt::WhileWend { cond, body })
    }

    fn parse_select_case(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::Select)?;
        self.expect(&TokenKind::Case)?;
        let discriminant = self.parse_expr()?;
        self.skip_separators();
        let mut cases = Vec::new();
        let mut else_body = None;
        while self.check(&TokenKind::Case) {
            self.advance();
            if self.eat(&TokenKind::Else) {
                else_body = Some(self.parse_block(&|k| matches!(k, TokenKind::End))?);
                break;
            }
            let mut matches = vec![self.parse_case_match()?];
            while self.eat(&TokenKind::Comma) {
                matches.push(self.parse_case_match()?);
            }
            let body = self.parse_block(&|k| matches!(k, TokenKind::Case | TokenKind::End))?;
            cases.push(CaseArm { matches, body });
        }
        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::Select)?;
        Ok(Stmt::SelectCase { discriminant, cases, else_body })
    }

    fn parse_case_match(&mut self) -> PResult<CaseMatch> {
        if self.eat(&TokenKind::Is) {
            let op = self.parse_compare_op()?;
            let expr = self.parse_expr()?;
            return Ok(CaseMatch::Is(op, expr));
        }
        Ok(CaseMatch::Values(vec![self.parse_expr()?]))
    }

    fn parse_compare_op(&mut self) -> PResult<CompareOp> {
        match self.advance() {
            TokenKind::Eq => Ok(CompareOp::Eq),
            TokenKind::Ne => Ok(CompareOp::Ne),
            TokenKind::Lt => Ok(CompareOp::Lt),
            TokenKind::Le => Ok(CompareOp::Le),
            TokenKind::Gt => Ok(CompareOp::Gt),
            TokenKind::Ge => Ok(CompareOp::Ge),
            other => Err(SyntaxError::UnexpectedToken {
                found: other.describe(),
                expected: "comparison operator".to_string(),
                pos: self.peek_pos(),
            }),
        }
    }

    fn parse_with(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::With)?;
        let target = self.parse_expr()?;
        let body = self.parse_block(&|k| matches!(k, TokenKind::End))?;
        self.expect(&TokenKind::End)?;
        self.expect(&TokenKind::With)?;
        Ok(Stmt::With { target, body })
    }

    fn parse_exit(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::Exit)?;
        let kind = match self.advance() {
            TokenKind::Sub => ExitKind::Sub,
            TokenKind::Function => ExitKind::Function,
            TokenKind::Property => ExitKind::Property,
            TokenKind::Do => ExitKind::Do,
            TokenKind::For => ExitKind::For,
            other => {
                return Err(SyntaxError::UnexpectedToken {
                    found: other.describe(),
                    expected: "Sub, Function, Property, Do, or For".to_string(),
                    pos: self.peek_pos(),
                })
            }
        };
        Ok(Stmt::Exit(kind))
    }

    fn parse_on_error(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::On)?;
        self.expect(&TokenKind::Error)?;
        if self.eat(&TokenKind::Resume) {
            self.expect(&TokenKind::Next)?;
            return Ok(Stmt::OnErrorResumeNext);
        }
        self.expect(&TokenKind::Goto)?;
        if let TokenKind::Number(n) = self.peek().clone() {
            if n == "0" {
                self.advance();
                return Ok(Stmt::OnErrorGotoZero);
            }
        }
        Ok(Stmt::OnErrorGoto(self.expect_identifier()?))
    }

    fn parse_resume(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::Resume)?;
        if self.eat(&TokenKind::Next) {
            Ok(Stmt::Resume(ResumeKind::Next))
        } else {
            Ok(Stmt::Resume(ResumeKind::Retry))
        }
    }

    // ===== Expressions =====
    // Precedence low -> high: & , Or , And , Not , comparisons (incl. Is) , + - , * / , \ , Mod , ^

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_concat()
    }

    fn parse_concat(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_or()?;
        while self.check(&TokenKind::Ampersand) {
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_or()?;
            lhs = Expr::Binary { op: BinOp::Concat, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        loop {
            let (op, matched) = match self.peek() {
                TokenKind::Or => (BinOp::Or, true),
                TokenKind::Xor => (BinOp::Xor, true),
                TokenKind::Eqv => (BinOp::Eqv, true),
                TokenKind::Imp => (BinOp::Imp, true),
                _ => (BinOp::Or, false),
            };
            if !matched {
                break;
            }
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_not()?;
        while self.check(&TokenKind::And) {
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Expr::Binary { op: BinOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> PResult<Expr> {
        if self.check(&TokenKind::Not) {
            let pos = self.peek_pos();
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::Unary { op: UnOp::Not, operand: Box::new(operand), pos });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                TokenKind::Is => BinOp::Is,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_int_divide()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_int_divide()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_int_divide(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_mod()?;
        while self.check(&TokenKind::Backslash) {
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_mod()?;
            lhs = Expr::Binary { op: BinOp::IntDiv, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_mod(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.check(&TokenKind::Mod) {
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op: BinOp::Mod, lhs: Box::new(lhs), rhs: Box::new(rhs), pos };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let pos = self.peek_pos();
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand), pos })
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary { op: UnOp::Pos, operand: Box::new(operand), pos })
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> PResult<Expr> {
        let lhs = self.parse_postfix()?;
        if self.check(&TokenKind::Caret) {
            let pos = self.peek_pos();
            self.advance();
            let rhs = self.parse_unary()?; // right-associative
            return Ok(Expr::Binary { op: BinOp::Pow, lhs: Box::new(lhs), rhs: Box::new(rhs), pos });
        }
        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot | TokenKind::Bang => {
                    let pos = self.peek_pos();
                    self.advance();
                    let name = self.expect_identifier()?;
                    expr = Expr::Member { object: Box::new(expr), name, pos };
                }
                TokenKind::LParen => {
                    let pos = self.peek_pos();
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.eat(&TokenKind::Comma) {
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, pos };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let pos = self.peek_pos();
        match self.advance() {
            TokenKind::Number(text) => {
                let n: f64 = text.parse().map_err(|_| SyntaxError::InvalidNumber { text: text.clone(), pos })?;
                Ok(Expr::NumberLit(n))
            }
            TokenKind::StringLiteral(s) => Ok(Expr::StringLit(s)),
            TokenKind::DateLiteral(s) => Ok(Expr::DateLit(s)),
            TokenKind::True => Ok(Expr::BoolLit(true)),
            TokenKind::False => Ok(Expr::BoolLit(false)),
            TokenKind::NothingLit => Ok(Expr::NothingLit),
            TokenKind::NullLit => Ok(Expr::NullLit),
            TokenKind::EmptyLit => Ok(Expr::EmptyLit),
            TokenKind::Me => Ok(Expr::Me),
            TokenKind::Dot => {
                let name = self.expect_identifier()?;
                Ok(Expr::Member { object: Box::new(Expr::WithTarget), name, pos })
            }
            TokenKind::New => {
                let name = self.expect_identifier()?;
                Ok(Expr::New(name))
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Identifier(name) => Ok(Expr::Identifier(name)),
            other => Err(SyntaxError::UnexpectedToken {
                found: other.describe(),
                expected: "expression".to_string(),
                pos,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_parses_as_stmt_assign() {
        let block = parse_program("x = 5 + 3 * 2").unwrap();
        assert_eq!(block.len(), 1);
        assert!(matches!(&block[0], Stmt::Assign { .. }));
    }

    #[test]
    fn precedence_multiplies_before_adding() {
        let expr = parse_expression_text("5 + 3 * 2").unwrap();
        match expr {
            Expr::Binary { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
            }
            _ => panic!("expected an Add at the top"),
        }
    }

    #[test]
    fn set_assignment_is_distinct_from_value_assignment() {
        let block = parse_program("Set o = Nothing").unwrap();
        assert!(matches!(&block[0], Stmt::SetAssign { .. }));
    }

    #[test]
    fn inline_if_without_end_if() {
        let block = parse_program("If x > 0 Then y = 1").unwrap();
        match &block[0] {
            Stmt::If { branches, else_branch } => {
                assert_eq!(branches.len(), 1);
                assert!(else_branch.is_none());
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn block_if_with_elseif_and_else() {
        let src = "If x = 1 Then\n  y = 1\nElseIf x = 2 Then\n  y = 2\nElse\n  y = 3\nEnd If";
        let block = parse_program(src).unwrap();
        match &block[0] {
            Stmt::If { branches, else_branch } => {
                assert_eq!(branches.len(), 2);
                assert!(else_branch.is_some());
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn for_next_loop_parses_with_optional_step() {
        let block = parse_program("For i = 2 To 10 Step 2\n  s = s + i\nNext").unwrap();
        assert!(matches!(&block[0], Stmt::ForNext { .. }));
    }

    #[test]
    fn function_declaration_with_params_and_body() {
        let block = parse_program("Function F(a, b)\n  F = a + b\nEnd Function").unwrap();
        match &block[0] {
            Stmt::ProcDecl(p) => {
                assert_eq!(p.kind, ProcKind::Function);
                assert_eq!(p.params.len(), 2);
            }
            _ => panic!("expected ProcDecl"),
        }
    }

    #[test]
    fn class_declaration_with_field_and_method() {
        let src = "Class C\n  Public v\n  Public Function Double()\n    Double = v * 2\n  End Function\nEnd Class";
        let block = parse_program(src).unwrap();
        match &block[0] {
            Stmt::ClassDecl(c) => {
                assert_eq!(c.fields.len(), 1);
                assert_eq!(c.members.len(), 1);
            }
            _ => panic!("expected ClassDecl"),
        }
    }

    #[test]
    fn select_case_with_is_and_else() {
        let src = "Select Case x\nCase Is > 10\n  y = 1\nCase 1, 2\n  y = 2\nCase Else\n  y = 3\nEnd Select";
        let block = parse_program(src).unwrap();
        match &block[0] {
            Stmt::SelectCase { cases, else_body, .. } => {
                assert_eq!(cases.len(), 2);
                assert!(else_body.is_some());
                assert!(matches!(cases[0].matches[0], CaseMatch::Is(CompareOp::Gt, _)));
            }
            _ => panic!("expected SelectCase"),
        }
    }

    #[test]
    fn on_error_resume_next_and_goto_zero() {
        assert!(matches!(parse_program("On Error Resume Next").unwrap()[0], Stmt::OnErrorResumeNext));
        assert!(matches!(parse_program("On Error Goto 0").unwrap()[0], Stmt::OnErrorGotoZero));
    }

    #[test]
    fn bare_call_without_parens_collects_args() {
        let block = parse_program("foo 1, 2").unwrap();
        match &block[0] {
            Stmt::ExprStmt(Expr::Call { args, .. }) => assert_eq!(args.len(), 2),
            _ => panic!("expected bare call"),
        }
    }

    #[test]
    fn member_access_chains_left_to_right() {
        let expr = parse_expression_text("a.b.c").unwrap();
        match expr {
            Expr::Member { object, name, .. } => {
                assert_eq!(name, "c");
                assert!(matches!(*object, Expr::Member { .. }));
            }
            _ => panic!("expected member chain"),
        }
    }

    #[test]
    fn with_block_leading_dot_targets_with_stack() {
        let src = "With obj\n  .X = 1\nEnd With";
        let block = parse_program(src).unwrap();
        match &block[0] {
            Stmt::With { body, .. } => match &body[0] {
                Stmt::Assign { target: Expr::Member { object, .. }, .. } => {
                    assert!(matches!(**object, Expr::WithTarget));
                }
                _ => panic!("expected assign with leading-dot member"),
            },
            _ => panic!("expected With"),
        }
    }
}
