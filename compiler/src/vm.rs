//! VM instruction definitions and serialization.
//!
//! This module defines the stack-machine instruction set the compiler
//! targets. [`Command`]'s `Display` impl is the exact line syntax the
//! downstream VM translator reads, and its `FromStr` impl parses that same
//! grammar back.
//!
//! Text format (.vm), one command per line:
//!   push <segment> <index>     pop <segment> <index>
//!   label <name>   goto <name>   if-goto <name>
//!   call <name> <nArgs>   function <name> <nLocals>   return
//!   add sub neg eq gt lt and or not

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Named memory regions of the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    /// `pointer 0` is the object base, `pointer 1` the array base.
    Pointer,
    Temp,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

/// Arithmetic and logical commands. Each is a single mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Neg => "neg",
            ArithOp::Eq => "eq",
            ArithOp::Gt => "gt",
            ArithOp::Lt => "lt",
            ArithOp::And => "and",
            ArithOp::Or => "or",
            ArithOp::Not => "not",
        }
    }
}

/// One VM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push(Segment, usize),
    Pop(Segment, usize),
    Arithmetic(ArithOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Call { name: String, n_args: usize },
    Function { name: String, n_locals: usize },
    Return,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push(seg, idx) => write!(f, "push {} {}", seg, idx),
            Command::Pop(seg, idx) => write!(f, "pop {} {}", seg, idx),
            Command::Arithmetic(op) => write!(f, "{}", op),
            Command::Label(name) => write!(f, "label {}", name),
            Command::Goto(name) => write!(f, "goto {}", name),
            Command::IfGoto(name) => write!(f, "if-goto {}", name),
            Command::Call { name, n_args } => write!(f, "call {} {}", name, n_args),
            Command::Function { name, n_locals } => write!(f, "function {} {}", name, n_locals),
            Command::Return => write!(f, "return"),
        }
    }
}

// ── Parsing ──────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown segment '{0}'")]
    UnknownSegment(String),
    #[error("'{command}' expects {expected} operand(s), found {found}")]
    WrongOperandCount {
        command: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

impl FromStr for Segment {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Segment::Constant),
            "argument" => Ok(Segment::Argument),
            "local" => Ok(Segment::Local),
            "static" => Ok(Segment::Static),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "pointer" => Ok(Segment::Pointer),
            "temp" => Ok(Segment::Temp),
            other => Err(ParseCommandError::UnknownSegment(other.to_string())),
        }
    }
}

impl FromStr for ArithOp {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ArithOp::Add),
            "sub" => Ok(ArithOp::Sub),
            "neg" => Ok(ArithOp::Neg),
            "eq" => Ok(ArithOp::Eq),
            "gt" => Ok(ArithOp::Gt),
            "lt" => Ok(ArithOp::Lt),
            "and" => Ok(ArithOp::And),
            "or" => Ok(ArithOp::Or),
            "not" => Ok(ArithOp::Not),
            other => Err(ParseCommandError::UnknownCommand(other.to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parse one line. Trailing `//` comments and surrounding whitespace are
    /// ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let code = line.split("//").next().unwrap_or("");
        let words: Vec<&str> = code.split_whitespace().collect();
        let (&head, operands) = words.split_first().ok_or(ParseCommandError::Empty)?;

        let arity = |expected: usize| {
            if operands.len() == expected {
                Ok(())
            } else {
                Err(ParseCommandError::WrongOperandCount {
                    command: head.to_string(),
                    expected,
                    found: operands.len(),
                })
            }
        };
        let number = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| ParseCommandError::InvalidNumber(s.to_string()))
        };

        match head {
            "push" | "pop" => {
                arity(2)?;
                let seg = operands[0].parse::<Segment>()?;
                let idx = number(operands[1])?;
                Ok(if head == "push" {
                    Command::Push(seg, idx)
                } else {
                    Command::Pop(seg, idx)
                })
            }
            "label" | "goto" | "if-goto" => {
                arity(1)?;
                let name = operands[0].to_string();
                Ok(match head {
                    "label" => Command::Label(name),
                    "goto" => Command::Goto(name),
                    _ => Command::IfGoto(name),
                })
            }
            "call" => {
                arity(2)?;
                Ok(Command::Call {
                    name: operands[0].to_string(),
                    n_args: number(operands[1])?,
                })
            }
            "function" => {
                arity(2)?;
                Ok(Command::Function {
                    name: operands[0].to_string(),
                    n_locals: number(operands[1])?,
                })
            }
            "return" => {
                arity(0)?;
                Ok(Command::Return)
            }
            other => {
                let op = other.parse::<ArithOp>()?;
                arity(0)?;
                Ok(Command::Arithmetic(op))
            }
        }
    }
}

/// Parse a whole .vm listing, skipping blank and comment-only lines.
/// Errors carry the 1-based line number.
pub fn parse_program(text: &str) -> Result<Vec<Command>, (usize, ParseCommandError)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let code = line.split("//").next().unwrap_or("");
            !code.trim().is_empty()
        })
        .map(|(i, line)| line.parse::<Command>().map_err(|e| (i + 1, e)))
        .collect()
}

// ── Writer ───────────────────────────────────────────────────────────

/// Append-only command sink. Performs no validation of operands.
#[derive(Debug, Default)]
pub struct VmWriter {
    commands: Vec<Command>,
}

impl VmWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment, index: usize) {
        self.commands.push(Command::Push(segment, index));
    }

    pub fn pop(&mut self, segment: Segment, index: usize) {
        self.commands.push(Command::Pop(segment, index));
    }

    pub fn arithmetic(&mut self, op: ArithOp) {
        self.commands.push(Command::Arithmetic(op));
    }

    pub fn label(&mut self, name: &str) {
        self.commands.push(Command::Label(name.to_string()));
    }

    pub fn goto(&mut self, name: &str) {
        self.commands.push(Command::Goto(name.to_string()));
    }

    pub fn if_goto(&mut self, name: &str) {
        self.commands.push(Command::IfGoto(name.to_string()));
    }

    pub fn call(&mut self, name: &str, n_args: usize) {
        self.commands.push(Command::Call {
            name: name.to_string(),
            n_args,
        });
    }

    pub fn function(&mut self, name: &str, n_locals: usize) {
        self.commands.push(Command::Function {
            name: name.to_string(),
            n_locals,
        });
    }

    pub fn ret(&mut self) {
        self.commands.push(Command::Return);
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

/// Render commands as .vm text, one per line with a trailing newline.
pub fn render(commands: &[Command]) -> String {
    let mut out = String::new();
    for command in commands {
        out.push_str(&command.to_string());
        out.push('\n');
    }
    out
}

/// Write rendered VM text to a .vm file.
pub fn write_vm(path: &Path, text: &str) -> io::Result<()> {
    fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_line_syntax() {
        let mut writer = VmWriter::new();
        writer.function("Main.main", 2);
        writer.push(Segment::Constant, 7);
        writer.pop(Segment::Pointer, 1);
        writer.arithmetic(ArithOp::Not);
        writer.if_goto("IF1");
        writer.goto("ENDIF2");
        writer.label("IF1");
        writer.call("Math.multiply", 2);
        writer.ret();
        assert_eq!(
            render(&writer.into_commands()),
            "function Main.main 2\n\
             push constant 7\n\
             pop pointer 1\n\
             not\n\
             if-goto IF1\n\
             goto ENDIF2\n\
             label IF1\n\
             call Math.multiply 2\n\
             return\n"
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "push that 5".parse::<Command>(),
            Ok(Command::Push(Segment::That, 5))
        );
        assert_eq!(
            "  call Output.printInt 1 // print".parse::<Command>(),
            Ok(Command::Call {
                name: "Output.printInt".into(),
                n_args: 1
            })
        );
        assert_eq!("eq".parse::<Command>(), Ok(Command::Arithmetic(ArithOp::Eq)));
        assert_eq!("if-goto L".parse::<Command>(), Ok(Command::IfGoto("L".into())));
    }

    #[test]
    fn test_parse_rejects_malformed_commands() {
        assert_eq!(
            "push heap 1".parse::<Command>(),
            Err(ParseCommandError::UnknownSegment("heap".into()))
        );
        assert_eq!(
            "mul".parse::<Command>(),
            Err(ParseCommandError::UnknownCommand("mul".into()))
        );
        assert_eq!(
            "pop local x".parse::<Command>(),
            Err(ParseCommandError::InvalidNumber("x".into()))
        );
        assert!(matches!(
            "return 0".parse::<Command>(),
            Err(ParseCommandError::WrongOperandCount { expected: 0, found: 1, .. })
        ));
        assert_eq!("// only".parse::<Command>(), Err(ParseCommandError::Empty));
    }

    #[test]
    fn test_parse_program_reports_line_numbers() {
        let text = "// header\nfunction A.b 0\n\npush constant 0\nbogus\n";
        let err = parse_program(text).unwrap_err();
        assert_eq!(err.0, 5);

        let ok = parse_program("push constant 1\nreturn\n").unwrap();
        assert_eq!(ok, vec![Command::Push(Segment::Constant, 1), Command::Return]);
    }
}
