// Copyright 2025 Streamsel Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Query lexer (tokenizer)
//!
//! Turns a SELECT statement into a token stream. Keywords are matched
//! case-insensitively and emitted upper-cased; string and backtick
//! literals are emitted unquoted with doubled-quote escapes collapsed.

use super::token::{
    is_keyword, is_operator, is_operator_char, is_punctuator, Position, Token, TokenType,
};

/// Query lexer for tokenizing input
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input (points to current char)
    position: usize,
    /// Current reading position in input (after current char)
    read_position: usize,
    /// Current character under examination
    ch: char,
    /// Current position tracking
    pos: Position,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut lexer = Self {
            input: chars,
            position: 0,
            read_position: 0,
            ch: '\0',
            pos: Position::new(0, 1, 1),
        };
        lexer.read_char();
        lexer
    }

    /// Read the next character
    fn read_char(&mut self) {
        if self.ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else if self.ch != '\0' {
            self.pos.column += 1;
        }

        if self.read_position >= self.input.len() {
            self.ch = '\0';
        } else {
            self.ch = self.input[self.read_position];
            self.position = self.read_position;
            self.read_position += 1;
        }

        self.pos.offset = self.position;
    }

    /// Peek at the next character without advancing
    fn peek_char(&self) -> char {
        if self.read_position >= self.input.len() {
            '\0'
        } else {
            self.input[self.read_position]
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let pos = self.pos;

        match self.ch {
            '\0' => Token::eof(pos),

            // String literal (single quotes)
            '\'' => match self.read_quoted('\'') {
                Ok(literal) => Token::new(TokenType::String, literal, pos),
                Err(partial) => Token::error("unterminated string literal", partial, pos),
            },

            // Backtick literal; the parser decides timestamp versus string
            '`' => match self.read_quoted('`') {
                Ok(literal) => Token::new(TokenType::Backtick, literal, pos),
                Err(partial) => Token::error("unterminated backtick literal", partial, pos),
            },

            // Number literal; unary minus is handled by the parser
            c if c.is_ascii_digit() => {
                let (literal, is_float) = self.read_number();
                if is_float {
                    Token::new(TokenType::Float, literal, pos)
                } else {
                    Token::new(TokenType::Integer, literal, pos)
                }
            }

            // Star doubles as SELECT * / count(*) and multiplication
            '*' => {
                self.read_char();
                Token::new(TokenType::Operator, "*", pos)
            }

            c if is_punctuator(c) => {
                self.read_char();
                Token::new(TokenType::Punctuator, c.to_string(), pos)
            }

            c if is_operator_char(c) => {
                let literal = self.read_operator();
                if is_operator(&literal) {
                    Token::new(TokenType::Operator, literal, pos)
                } else {
                    Token::error(format!("unrecognized operator: {}", literal), literal, pos)
                }
            }

            c if c.is_alphabetic() || c == '_' => {
                let literal = self.read_identifier();
                if is_keyword(&literal) {
                    Token::new(TokenType::Keyword, literal.to_uppercase(), pos)
                } else {
                    Token::new(TokenType::Identifier, literal, pos)
                }
            }

            c => {
                self.read_char();
                Token::error(
                    format!("unrecognized character: {:?}", c),
                    c.to_string(),
                    pos,
                )
            }
        }
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while self.ch.is_whitespace() {
            self.read_char();
        }
    }

    /// Read an identifier
    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        result.push(self.ch);
        self.read_char();

        while self.ch.is_alphanumeric() || self.ch == '_' {
            result.push(self.ch);
            self.read_char();
        }

        result
    }

    /// Read a number, returning (literal, is_float)
    fn read_number(&mut self) -> (String, bool) {
        let mut result = String::new();
        let mut is_float = false;
        result.push(self.ch);
        self.read_char();

        while self.ch.is_ascii_digit() {
            result.push(self.ch);
            self.read_char();
        }

        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            is_float = true;
            result.push(self.ch);
            self.read_char();
            while self.ch.is_ascii_digit() {
                result.push(self.ch);
                self.read_char();
            }
        }

        if (self.ch == 'e' || self.ch == 'E')
            && (self.peek_char().is_ascii_digit()
                || self.peek_char() == '+'
                || self.peek_char() == '-')
        {
            is_float = true;
            result.push(self.ch);
            self.read_char();
            if self.ch == '+' || self.ch == '-' {
                result.push(self.ch);
                self.read_char();
            }
            while self.ch.is_ascii_digit() {
                result.push(self.ch);
                self.read_char();
            }
        }

        (result, is_float)
    }

    /// Read a quoted literal, collapsing doubled quotes
    ///
    /// Returns the unquoted content, or Err with the partial content when
    /// the closing quote is missing.
    fn read_quoted(&mut self, quote: char) -> Result<String, String> {
        let mut result = String::new();
        self.read_char(); // consume opening quote

        loop {
            if self.ch == '\0' {
                return Err(result);
            }
            if self.ch == quote {
                if self.peek_char() == quote {
                    result.push(quote);
                    self.read_char();
                    self.read_char();
                } else {
                    self.read_char(); // consume closing quote
                    return Ok(result);
                }
            } else {
                result.push(self.ch);
                self.read_char();
            }
        }
    }

    /// Read an operator with maximal munch
    fn read_operator(&mut self) -> String {
        let mut result = String::new();
        let first_char = self.ch;
        result.push(first_char);
        self.read_char();

        if self.ch != '\0' {
            let two_chars: String = [first_char, self.ch].iter().collect();
            if is_operator(&two_chars) {
                result.push(self.ch);
                self.read_char();
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_simple_select() {
        let tokens = all_tokens("select * from stdin");
        assert_eq!(tokens[0].token_type, TokenType::Keyword);
        assert_eq!(tokens[0].literal, "SELECT");
        assert!(tokens[1].is_operator("*"));
        assert!(tokens[2].is_keyword("FROM"));
        assert_eq!(tokens[3].token_type, TokenType::Identifier);
        assert_eq!(tokens[3].literal, "stdin");
        assert!(tokens[4].is_eof());
    }

    #[test]
    fn test_positional_columns() {
        let tokens = all_tokens("_1, _23");
        assert_eq!(tokens[0].token_type, TokenType::Identifier);
        assert_eq!(tokens[0].literal, "_1");
        assert!(tokens[1].is_punctuator(","));
        assert_eq!(tokens[2].literal, "_23");
    }

    #[test]
    fn test_numbers() {
        let tokens = all_tokens("123 45.67 3.14e10 1.5E-3");
        assert_eq!(tokens[0].token_type, TokenType::Integer);
        assert_eq!(tokens[1].token_type, TokenType::Float);
        assert_eq!(tokens[2].token_type, TokenType::Float);
        assert_eq!(tokens[3].token_type, TokenType::Float);
        assert_eq!(tokens[3].literal, "1.5E-3");
    }

    #[test]
    fn test_string_literal_unquoted_with_escape() {
        let tokens = all_tokens("'hello' 'it''s'");
        assert_eq!(tokens[0].token_type, TokenType::String);
        assert_eq!(tokens[0].literal, "hello");
        assert_eq!(tokens[1].literal, "it's");
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = all_tokens("'oops");
        assert!(tokens[0].is_error());
    }

    #[test]
    fn test_backtick_literal() {
        let tokens = all_tokens("`2023-01-02T03:04:05Z`");
        assert_eq!(tokens[0].token_type, TokenType::Backtick);
        assert_eq!(tokens[0].literal, "2023-01-02T03:04:05Z");
    }

    #[test]
    fn test_operators() {
        let tokens = all_tokens("= == <> >= <= != + - * / % ^");
        let expected = [
            "=", "==", "<>", ">=", "<=", "!=", "+", "-", "*", "/", "%", "^",
        ];
        for (token, exp) in tokens.iter().zip(expected) {
            assert_eq!(token.token_type, TokenType::Operator);
            assert_eq!(token.literal, exp);
        }
    }

    #[test]
    fn test_from_path_punctuation() {
        let tokens = all_tokens("s3object[*].phones");
        assert_eq!(tokens[0].literal, "s3object");
        assert!(tokens[1].is_punctuator("["));
        assert!(tokens[2].is_operator("*"));
        assert!(tokens[3].is_punctuator("]"));
        assert!(tokens[4].is_punctuator("."));
        assert_eq!(tokens[5].literal, "phones");
    }

    #[test]
    fn test_keywords_case_insensitive() {
        for input in ["between", "BETWEEN", "Between"] {
            let tokens = all_tokens(input);
            assert_eq!(tokens[0].token_type, TokenType::Keyword);
            assert_eq!(tokens[0].literal, "BETWEEN");
        }
    }

    #[test]
    fn test_position_tracking() {
        let tokens = all_tokens("select\n_1");
        assert_eq!(tokens[0].position.line, 1);
        assert_eq!(tokens[0].position.column, 1);
        assert_eq!(tokens[1].position.line, 2);
        assert_eq!(tokens[1].position.column, 1);
    }

    #[test]
    fn test_unrecognized_character() {
        let tokens = all_tokens("select @");
        assert!(tokens[1].is_error());
    }
}
