use crate::platform::{HostArch, HostOs};
use crate::RenderConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    Op(CompareOp),
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Undefined,
}

impl Value {
    fn truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Str(value) => !value.is_empty(),
            Self::Undefined => false,
        }
    }
}

/// Evaluates the expression inside a `# [...]` selector.
///
/// Supports `and`/`or`/`not`, parentheses, integer and string comparisons,
/// and the platform/version names conda recipes select on (`linux`, `win`,
/// `py3k`, `py>=35`, `np<111`, ...). Names the host does not define are false.
pub fn evaluate_selector(expression: &str, config: &RenderConfig) -> Result<bool, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty selector".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        config,
    };
    let value = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(format!("unexpected token {token:?}"));
    }
    Ok(value.truthy())
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars = input.chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        if ch == '(' {
            tokens.push(Token::LParen);
            i += 1;
            continue;
        }
        if ch == ')' {
            tokens.push(Token::RParen);
            i += 1;
            continue;
        }
        if ch.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let raw = chars[start..i].iter().collect::<String>();
            let value = raw
                .parse()
                .map_err(|_| format!("integer out of range: {raw}"))?;
            tokens.push(Token::Int(value));
            continue;
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if ch == '\'' || ch == '"' {
            let quote = ch;
            let start = i + 1;
            i += 1;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err("unterminated string literal".to_string());
            }
            tokens.push(Token::Str(chars[start..i].iter().collect()));
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (op, width) = match (ch, next) {
            ('=', Some('=')) => (CompareOp::Eq, 2),
            ('!', Some('=')) => (CompareOp::Ne, 2),
            ('<', Some('=')) => (CompareOp::Le, 2),
            ('>', Some('=')) => (CompareOp::Ge, 2),
            ('<', _) => (CompareOp::Lt, 1),
            ('>', _) => (CompareOp::Gt, 1),
            _ => return Err(format!("unexpected character '{ch}'")),
        };
        tokens.push(Token::Op(op));
        i += width;
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    config: &'a RenderConfig,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == keyword) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn parse_or(&mut self) -> Result<Value, String> {
        let mut value = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            value = Value::Bool(value.truthy() || rhs.truthy());
        }
        Ok(value)
    }

    fn parse_and(&mut self) -> Result<Value, String> {
        let mut value = self.parse_not()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_not()?;
            value = Value::Bool(value.truthy() && rhs.truthy());
        }
        Ok(value)
    }

    fn parse_not(&mut self) -> Result<Value, String> {
        if self.eat_keyword("not") {
            let value = self.parse_not()?;
            return Ok(Value::Bool(!value.truthy()));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Value, String> {
        let lhs = self.parse_primary()?;
        let Some(Token::Op(op)) = self.peek().cloned() else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.parse_primary()?;
        Ok(Value::Bool(compare(&lhs, op, &rhs)))
    }

    fn parse_primary(&mut self) -> Result<Value, String> {
        match self.next() {
            Some(Token::LParen) => {
                let value = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(Token::Int(value)) => Ok(Value::Int(value)),
            Some(Token::Str(value)) => Ok(Value::Str(value)),
            Some(Token::Ident(name)) => Ok(lookup(&name, self.config)),
            Some(token) => Err(format!("unexpected token {token:?}")),
            None => Err("unexpected end of selector".to_string()),
        }
    }
}

fn compare(lhs: &Value, op: CompareOp, rhs: &Value) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => return false,
    };
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    }
}

fn lookup(name: &str, config: &RenderConfig) -> Value {
    let os = config.platform.os;
    let arch = config.platform.arch;
    let is_64 = matches!(arch, HostArch::X86_64 | HostArch::Aarch64);
    let value = match name {
        "True" | "true" => true,
        "False" | "false" => false,
        "linux" => os == HostOs::Linux,
        "osx" => os == HostOs::MacOs,
        "win" => os == HostOs::Windows,
        "unix" => os.is_unix(),
        "linux32" => os == HostOs::Linux && !is_64,
        "linux64" => os == HostOs::Linux && is_64,
        "win32" => os == HostOs::Windows && !is_64,
        "win64" => os == HostOs::Windows && is_64,
        "osx64" => os == HostOs::MacOs && arch == HostArch::X86_64,
        "x86" => matches!(arch, HostArch::X86 | HostArch::X86_64),
        "x86_64" => arch == HostArch::X86_64,
        "aarch64" => os == HostOs::Linux && arch == HostArch::Aarch64,
        "arm64" => os == HostOs::MacOs && arch == HostArch::Aarch64,
        "py" => return int_or_undefined(config.python_tag()),
        "np" => return int_or_undefined(config.numpy_tag()),
        "py2k" => config.python_tag().is_some_and(|tag| (20..30).contains(&tag)),
        "py3k" => config.python_tag().is_some_and(|tag| tag >= 30),
        _ => return version_flag(name, config),
    };
    Value::Bool(value)
}

/// `py27`, `py35`, `np111` style flags.
fn version_flag(name: &str, config: &RenderConfig) -> Value {
    let (tag, digits) = if let Some(digits) = name.strip_prefix("py") {
        (config.python_tag(), digits)
    } else if let Some(digits) = name.strip_prefix("np") {
        (config.numpy_tag(), digits)
    } else {
        return Value::Undefined;
    };
    match digits.parse::<i64>() {
        Ok(expected) if digits.chars().all(|ch| ch.is_ascii_digit()) => {
            Value::Bool(tag == Some(expected))
        }
        _ => Value::Undefined,
    }
}

fn int_or_undefined(value: Option<i64>) -> Value {
    value.map(Value::Int).unwrap_or(Value::Undefined)
}
