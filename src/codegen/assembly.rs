//! General assembly definitions, shared by every target. The way a target writes down its
//! sections, directives and comments is described by its [`Isa`].

use std::{
    fmt::{self, Display, Formatter},
    marker::PhantomData,
};

pub type Str = &'static str;

/// An instruction set architecture, together with the assembler dialect used to write it.
pub trait Isa {
    type Op: Display;
    type Operand: Display;

    /// The token that starts a comment.
    const COMMENT: Str;

    /// The header opening a section, such as `.text`.
    fn section(name: Str) -> String;
    fn directive(directive: &Directive) -> String;
    fn declaration(decl: &Decl) -> String;
}

/// A complete assembly file, containing declarations and sections.
pub struct Assembly<A: Isa> {
    declarations: Vec<Decl>,
    pub data: Data<A>,
    pub text: Text<A>,
}
impl<A: Isa> Assembly<A> {
    pub fn new(main: Procedure<A>) -> Self {
        Self {
            declarations: vec![],
            data: Data::new(),
            text: Text::new(main),
        }
    }

    pub fn push_decl(&mut self, decl: Decl) -> &mut Self {
        self.declarations.push(decl);
        self
    }
}
impl<A: Isa> Display for Assembly<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for decl in &self.declarations {
            writeln!(f, "{}", A::declaration(decl))?;
        }
        writeln!(f)?;

        writeln!(f, "{}", self.data)?;
        write!(f, "{}", self.text)
    }
}

/// A declaration, used to provide hints to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Bits(usize),
    Default(Str),
    Extern(Str),
    Global(Str),
}

/// A `.data` section, reserving storage.
pub struct Data<A: Isa> {
    lines: Vec<Line<Directive>>,
    _isa: PhantomData<A>,
}
impl<A: Isa> Data<A> {
    pub fn new() -> Self {
        Self {
            lines: vec![],
            _isa: PhantomData,
        }
    }

    pub fn push(&mut self, directive: Directive) -> &mut Self {
        self.lines.push(Line::new(directive));
        self
    }

    pub fn push_cmt<S: Display>(&mut self, directive: Directive, comment: S) -> &mut Self {
        self.lines
            .push(Line::new_cmt(directive, format!("{} {}", A::COMMENT, comment)));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(Line::new_blank());
        self
    }
}
impl<A: Isa> Default for Data<A> {
    fn default() -> Self {
        Self::new()
    }
}
impl<A: Isa> Display for Data<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "{}", A::section("data"))?;
        for line in &self.lines {
            let rendered = line.map(|directive| format!("    {}", A::directive(directive)));
            writeln!(f, "{}", rendered)?;
        }
        Ok(())
    }
}

/// A storage directive in the `.data` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// A single word, initialised to zero.
    Word(String),
    /// A number of consecutive words, initialised to zero.
    Words(String, usize),
    /// A string literal, written in the syntax of the target.
    String(String, Str),
}

/// A `.text` section. Contains a single main procedure, and may contain any number of
/// additional procedures.
pub struct Text<A: Isa> {
    pub main: Procedure<A>,
    pub procedures: Vec<Procedure<A>>,
}
impl<A: Isa> Text<A> {
    pub fn new(main: Procedure<A>) -> Self {
        Self {
            main,
            procedures: vec![],
        }
    }
}
impl<A: Isa> Display for Text<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "{}", A::section("text"))?;
        writeln!(f, "{}", self.main)?;

        for proc in &self.procedures {
            writeln!(f, "{}", proc)?;
        }

        Ok(())
    }
}

/// An assembly procedure, marked by a label and surrounded by a prologue and epilogue.
pub struct Procedure<A: Isa> {
    pub name: String,
    pub prologue: Block<A>,
    pub body: Block<A>,
    pub epilogue: Block<A>,
}
impl<A: Isa> Procedure<A> {
    pub fn new<S: Into<String>>(name: S, prologue: Block<A>, epilogue: Block<A>) -> Self {
        Self {
            name: name.into(),
            prologue,
            body: Block::new(),
            epilogue,
        }
    }
}
impl<A: Isa> Display for Procedure<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        write!(f, "{}", self.prologue)?;
        write!(f, "{}", self.body)?;
        write!(f, "{}", self.epilogue)
    }
}

/// A block of assembly code.
pub struct Block<A: Isa> {
    lines: Vec<Line<Code<A>>>,
}
impl<A: Isa> Block<A> {
    pub fn new() -> Self {
        Self { lines: vec![] }
    }

    pub fn push(&mut self, op: A::Op, operands: Vec<A::Operand>) -> &mut Self {
        self.lines
            .push(Line::new(Code::Instr(Instr::new(op, operands))));
        self
    }

    pub fn push_cmt<S: Display>(
        &mut self,
        op: A::Op,
        operands: Vec<A::Operand>,
        comment: S,
    ) -> &mut Self {
        self.lines.push(Line::new_cmt(
            Code::Instr(Instr::new(op, operands)),
            format!("{} {}", A::COMMENT, comment),
        ));
        self
    }

    pub fn label<S: Into<String>>(&mut self, label: S) -> &mut Self {
        self.lines.push(Line::new(Code::Label(label.into())));
        self
    }

    /// Emit a line holding only a comment.
    pub fn comment<S: Display>(&mut self, comment: S) -> &mut Self {
        self.lines
            .push(Line::comment_only(format!("{} {}", A::COMMENT, comment)));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(Line::new_blank());
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
impl<A: Isa> Default for Block<A> {
    fn default() -> Self {
        Self::new()
    }
}
impl<A: Isa> Display for Block<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A line of code in a block: an instruction or a label.
pub enum Code<A: Isa> {
    Instr(Instr<A>),
    Label(String),
}
impl<A: Isa> Display for Code<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Code::Instr(instr) => instr.fmt(f),
            Code::Label(label) => write!(f, "{}:", label),
        }
    }
}

/// A line of assembly, consisting of an optional instruction and optional comment.
/// When both are [`None`], an empty line is emitted.
pub struct Line<T> {
    line: Option<T>,
    comment: Option<String>,
}
impl<T> Line<T> {
    /// Construct a new line without comment.
    pub fn new(dir: T) -> Self {
        Self {
            line: Some(dir),
            comment: None,
        }
    }

    /// Construct a new line with a comment.
    pub fn new_cmt(dir: T, comment: String) -> Self {
        Self {
            line: Some(dir),
            comment: Some(comment),
        }
    }

    pub fn comment_only(comment: String) -> Self {
        Self {
            line: None,
            comment: Some(comment),
        }
    }

    /// Construct an empty line.
    pub fn new_blank() -> Self {
        Self {
            line: None,
            comment: None,
        }
    }

    /// Render the content of this line, keeping its comment.
    pub fn map<F: Fn(&T) -> String>(&self, render: F) -> Line<String> {
        Line {
            line: self.line.as_ref().map(render),
            comment: self.comment.clone(),
        }
    }
}
impl<T: Display> Display for Line<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match (&self.line, self.comment.as_ref()) {
            (None, None) => Ok(()),
            (None, Some(cmt)) => write!(f, "    {}", cmt),
            (Some(dir), None) => write!(f, "{}", dir),
            (Some(dir), Some(cmt)) => write!(f, "{:40}{}", dir.to_string(), cmt),
        }
    }
}

/// A single instruction, consisting of an operator and zero or more operands.
pub struct Instr<A: Isa> {
    operator: A::Op,
    operands: Vec<A::Operand>,
}
impl<A: Isa> Instr<A> {
    pub fn new(operator: A::Op, operands: Vec<A::Operand>) -> Self {
        Self { operator, operands }
    }
}
impl<A: Isa> Display for Instr<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let operator = self.operator.to_string();
        if self.operands.is_empty() {
            return write!(f, "    {}", operator);
        }

        write!(f, "    {:7} ", operator)?;
        let operands = self
            .operands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&operands)
    }
}
