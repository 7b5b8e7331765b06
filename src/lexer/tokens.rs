/// A token that represents a single unit of Rook code.
#[derive(Clone)]
pub struct Token {
  /// The token's line number
  pub line_num: usize,
  /// The token's type
  pub kind: TokenKind,
  /// The token's lexeme
  pub lexeme: String,
}

impl Token {
  /// Composes a token that did not originate in the source text. The compiler
  /// uses these for internal bindings like "super" and "ego".
  pub fn synthetic(lexeme: &str) -> Token {
    Token {
      line_num: 0,
      kind: TokenKind::IDENTIFIER,
      lexeme: String::from(lexeme),
    }
  }
}

/// The types of tokens in a Rook program.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenKind {
  // Single-character tokens
  COMMA,
  DOT,
  L_CURLY,
  L_PAREN,
  MINUS,
  PLUS,
  R_CURLY,
  R_PAREN,
  SEMICOLON,
  SLASH,
  STAR,

  // One- or two-character tokens
  EQUALS,
  GREATER_THAN,
  GREATER_THAN_EQ,
  LESS_THAN,
  LESS_THAN_EQ,
  LOGIC_EQ,
  LOGIC_NOT,
  LOGIC_NOT_EQ,

  // Literals
  IDENTIFIER,
  NUMBER,
  STRING,

  // Keywords
  AND_KW,
  CLASS_KW,
  ELSE_KW,
  FALSE,
  FOR_KW,
  FUN_KW,
  IF_KW,
  NIL,
  OR_KW,
  PRINT_KW,
  RETURN_KW,
  SUPER_KW,
  THIS_KW,
  TRUE,
  VAR_KW,
  WHILE_KW,

  ERROR,
  EOF,

  // This one is only used to initialize the compiler
  __INIT_COMPILER__,
}

/// Maps a keyword string to a token kind.
///
/// # Parameters
/// - `id`: The identifier's string name.
///
/// # Returns
/// `TokenKind`: The kind of token matched for the given identifier name.
pub fn make_identifier_kind(id: &str) -> TokenKind {
  match id {
    "and" => TokenKind::AND_KW,
    "class" => TokenKind::CLASS_KW,
    "else" => TokenKind::ELSE_KW,
    "false" => TokenKind::FALSE,
    "for" => TokenKind::FOR_KW,
    "fun" => TokenKind::FUN_KW,
    "if" => TokenKind::IF_KW,
    "nil" => TokenKind::NIL,
    "or" => TokenKind::OR_KW,
    "print" => TokenKind::PRINT_KW,
    "return" => TokenKind::RETURN_KW,
    "super" => TokenKind::SUPER_KW,
    "this" => TokenKind::THIS_KW,
    "true" => TokenKind::TRUE,
    "var" => TokenKind::VAR_KW,
    "while" => TokenKind::WHILE_KW,
    _ => TokenKind::IDENTIFIER,
  }
}
