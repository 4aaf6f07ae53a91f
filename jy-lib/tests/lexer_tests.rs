use jy_lib::lexer::{Keyword, LexError, Lexer, Operator, Token};

/// Drains the lexer into a token list, excluding the trailing EOF.
fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(src)?;
    let mut tokens = vec![];
    while lexer.token() != &Token::Eof {
        tokens.push(lexer.token().clone());
        lexer.next()?;
    }
    Ok(tokens)
}

#[test]
fn integers_and_operators() {
    let tokens = tokenize("12 + 345 * 0").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Integer(12),
            Token::Operator(Operator::Addition),
            Token::Integer(345),
            Token::Operator(Operator::Multiplication),
            Token::Integer(0),
        ]
    );
}

#[test]
fn max_u64_still_lexes() {
    let tokens = tokenize("18446744073709551615").unwrap();
    assert_eq!(tokens, vec![Token::Integer(u64::MAX)]);
}

#[test]
fn overflowing_literal_reports_the_partial_value() {
    let err = tokenize("18446744073709551616").unwrap_err();
    assert_eq!(
        err,
        LexError::IntegerOverflow {
            line: 1,
            partial: 1844674407370955161,
        }
    );
}

#[test]
fn reassignment_is_a_single_token() {
    let tokens = tokenize("a := b").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Identifier("a".into()),
            Token::Operator(Operator::Reassignment),
            Token::Identifier("b".into()),
        ]
    );
    // also without whitespace
    assert_eq!(tokenize("a:=b").unwrap(), tokens);
}

#[test]
fn longest_match_rewinds_to_the_longest_known_prefix() {
    // `=:` is not an operator, `=` is; the `:` alone then fails
    let mut lexer = Lexer::new("=:").unwrap();
    assert_eq!(lexer.token(), &Token::Operator(Operator::Assignment));
    let err = lexer.next().unwrap_err();
    assert_eq!(
        err,
        LexError::UndefinedOperator {
            line: 1,
            text: ":".into(),
        }
    );
}

#[test]
fn keywords_are_not_identifiers() {
    let tokens = tokenize("print printx if_ while").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Keyword(Keyword::Print),
            Token::Identifier("printx".into()),
            Token::Identifier("if_".into()),
            Token::Keyword(Keyword::While),
        ]
    );
}

#[test]
fn invalid_characters_are_rejected() {
    let err = tokenize("1 @ 2").unwrap_err();
    assert_eq!(err, LexError::InvalidCharacter { line: 1, ch: '@' });
}

#[test]
fn line_numbers_track_newlines() {
    let mut lexer = Lexer::new("1\n2\n\n3").unwrap();
    assert_eq!((lexer.token().clone(), lexer.line()), (Token::Integer(1), 1));
    lexer.next().unwrap();
    assert_eq!((lexer.token().clone(), lexer.line()), (Token::Integer(2), 2));
    lexer.next().unwrap();
    assert_eq!((lexer.token().clone(), lexer.line()), (Token::Integer(3), 4));
}

#[test]
fn errors_carry_their_line() {
    let err = tokenize("1 + 2\n$").unwrap_err();
    assert_eq!(err.line(), 2);
}
