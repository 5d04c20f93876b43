//! XML token listing, the format produced by the token-analyzer stage.
//!
//! [`token_element`] is shared with the parse-tree listing in
//! [`crate::analyzer`].
//!
//! ```text
//! <tokens>
//! <keyword> class </keyword>
//! <identifier> Main </identifier>
//! <symbol> { </symbol>
//! ...
//! </tokens>
//! ```

use crate::token::{Token, TokenKind};

pub fn tokens_to_xml(tokens: &[Token]) -> String {
    let mut out = String::from("<tokens>\n");
    for token in tokens {
        if let Some(element) = token_element(&token.kind) {
            out.push_str(&element);
            out.push('\n');
        }
    }
    out.push_str("</tokens>\n");
    out
}

/// One token as `<tag> text </tag>`; `None` for `Eof`.
pub(crate) fn token_element(kind: &TokenKind) -> Option<String> {
    let (tag, text) = match kind {
        TokenKind::Keyword(kw) => ("keyword", kw.as_str().to_string()),
        TokenKind::Identifier(name) => ("identifier", name.clone()),
        TokenKind::IntConst(n) => ("integerConstant", n.to_string()),
        TokenKind::StrConst(s) => ("stringConstant", s.clone()),
        TokenKind::Symbol(c) => ("symbol", c.to_string()),
        TokenKind::Eof => return None,
    };
    Some(format!("<{tag}> {} </{tag}>", escape(&text)))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
