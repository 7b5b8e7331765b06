use crate::lexer::tokens::{make_identifier_kind, Token, TokenKind};

// Submodules
pub mod tokens;

/// Struct that represents the scanner.
pub struct Lexer {
  /// A flat list of characters from the source file.
  source: Vec<char>,
  /// The index of the current character.
  current: usize,
  /// The current line number.
  line_num: usize,
  /// The position of the first character for the current
  /// token in the flat source vector.
  token_start: usize,
}

impl Lexer {
  /// An initialized instance of the lexer.
  ///
  /// # Parameters
  /// - `src`: the source text
  pub fn new(src: &str) -> Lexer {
    Self {
      source: src.chars().collect(),
      current: 0,
      line_num: 1,
      token_start: 0,
    }
  }

  /// Scans the next token out of the source text. Once the source is
  /// exhausted, every subsequent call produces an EOF token.
  pub fn next_token(&mut self) -> Token {
    self.skip_whitespace();
    self.token_start = self.current;

    if self.is_at_end() {
      return self.make_token(TokenKind::EOF);
    }

    let c = self.advance();

    if c.is_ascii_digit() {
      return self.make_number_token();
    }

    if c.is_alphabetic() || c == '_' {
      return self.make_identifier_token();
    }

    match c {
      '(' => self.make_token(TokenKind::L_PAREN),
      ')' => self.make_token(TokenKind::R_PAREN),
      '{' => self.make_token(TokenKind::L_CURLY),
      '}' => self.make_token(TokenKind::R_CURLY),
      ';' => self.make_token(TokenKind::SEMICOLON),
      ',' => self.make_token(TokenKind::COMMA),
      '.' => self.make_token(TokenKind::DOT),
      '-' => self.make_token(TokenKind::MINUS),
      '+' => self.make_token(TokenKind::PLUS),
      '/' => self.make_token(TokenKind::SLASH),
      '*' => self.make_token(TokenKind::STAR),
      '!' => {
        if self.matches('=') {
          self.make_token(TokenKind::LOGIC_NOT_EQ)
        } else {
          self.make_token(TokenKind::LOGIC_NOT)
        }
      }
      '=' => {
        if self.matches('=') {
          self.make_token(TokenKind::LOGIC_EQ)
        } else {
          self.make_token(TokenKind::EQUALS)
        }
      }
      '<' => {
        if self.matches('=') {
          self.make_token(TokenKind::LESS_THAN_EQ)
        } else {
          self.make_token(TokenKind::LESS_THAN)
        }
      }
      '>' => {
        if self.matches('=') {
          self.make_token(TokenKind::GREATER_THAN_EQ)
        } else {
          self.make_token(TokenKind::GREATER_THAN)
        }
      }
      '"' => self.make_string_token(),
      _ => self.make_error_token("Unexpected character."),
    }
  }

  /// Gets the current character without consuming it.
  fn get_current(&self) -> char {
    if self.is_at_end() {
      return '\0';
    }

    self.source[self.current]
  }

  /// Returns the next character without consuming it.
  fn get_next(&self) -> char {
    if self.current + 1 >= self.source.len() {
      return '\0';
    }

    self.source[self.current + 1]
  }

  /// Checks if the scanner is at the end of the source.
  fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  /// Matches the current character against a provided character.
  ///
  /// # Returns
  /// - `bool`: True if the current character matched the provided character, false otherwise.
  fn matches(&mut self, expected: char) -> bool {
    if self.is_at_end() || self.get_current() != expected {
      return false;
    }
    self.current += 1;
    true
  }

  /// Advances to the next char and returns the consumed char.
  fn advance(&mut self) -> char {
    let current = self.get_current();
    self.current += 1;
    current
  }

  /// Skips whitespace-like characters and comments from the source code.
  fn skip_whitespace(&mut self) {
    loop {
      if self.is_at_end() {
        break;
      }

      let c = self.get_current();

      if c == ' ' || c == '\r' || c == '\t' {
        self.advance();
      } else if c == '\n' {
        self.line_num += 1;
        self.advance();
      } else if c == '/' && self.get_next() == '/' {
        while !self.is_at_end() && self.get_current() != '\n' {
          self.advance();
        }
      } else {
        break;
      }
    }
  }

  /// Generates a number token with the current state of the scanner.
  fn make_number_token(&mut self) -> Token {
    while self.get_current().is_ascii_digit() {
      self.advance();
    }

    // Look for a fractional part.
    if self.get_current() == '.' && self.get_next().is_ascii_digit() {
      self.advance();

      while self.get_current().is_ascii_digit() {
        self.advance();
      }
    }

    self.make_token(TokenKind::NUMBER)
  }

  /// Generates an identifier or keyword token with the current state of the scanner.
  fn make_identifier_token(&mut self) -> Token {
    while !self.is_at_end() {
      let c = self.get_current();

      if c.is_alphabetic() || c.is_ascii_digit() || c == '_' {
        self.advance();
      } else {
        break;
      }
    }

    let id: String = self.source[(self.token_start)..(self.current)].iter().collect();
    self.make_token(make_identifier_kind(id.as_str()))
  }

  /// Generates a string token with the current state of the scanner.
  /// The token's lexeme holds the string's contents without the quotes.
  fn make_string_token(&mut self) -> Token {
    while !self.is_at_end() && self.get_current() != '"' {
      if self.get_current() == '\n' {
        self.line_num += 1;
      }
      self.advance();
    }

    if self.is_at_end() {
      return self.make_error_token("Unterminated string.");
    }

    // The closing quote.
    self.advance();

    Token {
      line_num: self.line_num,
      kind: TokenKind::STRING,
      lexeme: self.source[(self.token_start + 1)..(self.current - 1)].iter().collect(),
    }
  }

  /// Generates a token with the current state of the scanner.
  fn make_token(&self, kind: TokenKind) -> Token {
    let lexeme = match kind {
      TokenKind::EOF => String::from("\0"),
      _ => self.source[(self.token_start)..(self.current)].iter().collect(),
    };

    Token {
      line_num: self.line_num,
      kind,
      lexeme,
    }
  }

  /// Generates an error token with the provided message as its lexeme.
  ///
  /// # Parameters
  /// - `message`: A message for the error token. This will be used as the token's lexeme.
  fn make_error_token(&self, message: &str) -> Token {
    Token {
      line_num: self.line_num,
      kind: TokenKind::ERROR,
      lexeme: String::from(message),
    }
  }
}
