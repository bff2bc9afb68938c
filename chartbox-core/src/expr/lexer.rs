use super::ExprError;

/// A single lexed unit of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Bang,
    Percent,
    OpenParen,
    CloseParen,
    Comma,
}

impl Token {
    /// A short human readable description, used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(value) => format!("number {}", value),
            Token::Ident(name) => format!("'{}'", name),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::OpenParen => "'('".to_string(),
            Token::CloseParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

/// Turns raw input into tokens, rejecting anything outside the grammar.
pub fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < chars.len() {
        let current = chars[position];

        match current {
            c if c.is_whitespace() => position += 1,
            '+' => {
                tokens.push(Token::Plus);
                position += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                position += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                position += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                position += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                position += 1;
            }
            '!' => {
                tokens.push(Token::Bang);
                position += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                position += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen);
                position += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen);
                position += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                position += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = position;

                while position < chars.len()
                    && (chars[position].is_ascii_digit() || chars[position] == '.')
                {
                    position += 1;
                }

                let text: String = chars[start..position].iter().collect();
                let value: f64 = text
                    .parse()
                    .map_err(|_| ExprError::MalformedNumber(start))?;

                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = position;

                while position < chars.len()
                    && (chars[position].is_ascii_alphanumeric() || chars[position] == '_')
                {
                    position += 1;
                }

                tokens.push(Token::Ident(chars[start..position].iter().collect()));
            }
            other => return Err(ExprError::UnexpectedChar(other, position)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lexes_operators_and_numbers() {
        let tokens = lex("1.5 + x2 * (3 - .5)").unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Number(1.5),
                Token::Plus,
                Token::Ident("x2".to_string()),
                Token::Star,
                Token::OpenParen,
                Token::Number(3.),
                Token::Minus,
                Token::Number(0.5),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn test_rejects_unknown_characters() {
        assert_eq!(lex("1 # 2"), Err(ExprError::UnexpectedChar('#', 2)));
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        assert_eq!(lex("1.2.3"), Err(ExprError::MalformedNumber(0)));
    }
}
