//! Filter compiler
//!
//! Builds a `Predicate` from raw filter arguments against a record schema.
//! Compilation never fails; bad input degrades the filter instead:
//!
//! - unknown field or unparseable literal: that comparison is dropped,
//!   together with the connective that introduced it
//! - unsupported operator: the enclosing group is ignored, or the whole
//!   argument when it occurs outside parentheses
//!
//! Connectives have no precedence and fold left to right. A missing
//! connective means AND; `not` negates the next operand.

use tracing::debug;

use super::ast::{CompareOp, Predicate};
use super::tokenizer::{tokenize, Token};
use crate::observability::Event;
use crate::schema::{resolve, Schema, Value};

/// Result of compiling a set of filter arguments
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    /// Combined predicate; `None` when nothing survived
    pub predicate: Option<Predicate>,
    /// Comparisons dropped for unknown fields or bad literals
    pub dropped_clauses: usize,
    /// Parenthesized groups ignored for unsupported operators
    pub ignored_groups: usize,
    /// Whole arguments ignored for unsupported operators
    pub ignored_arguments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joiner {
    And,
    Or,
}

#[derive(Debug, Default)]
struct Pending {
    joiner: Option<Joiner>,
    negate: bool,
}

/// Unsupported operator encountered
struct Unsupported;

/// A parsed operand sequence
struct Sequence {
    leading: Option<Joiner>,
    predicate: Option<Predicate>,
}

struct ArgumentParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    schema: &'static Schema,
    stats: &'a mut CompiledFilter,
}

/// Compiles every argument and combines them.
///
/// An argument starting with `and`/`or` is joined to the ones before it
/// with that connective; otherwise with AND.
pub fn compile(schema: &'static Schema, arguments: &[String]) -> CompiledFilter {
    let mut compiled = CompiledFilter::default();
    let mut combined: Option<Predicate> = None;

    for argument in arguments.iter().filter(|a| !a.trim().is_empty()) {
        let tokens = tokenize(argument);
        let mut parser = ArgumentParser {
            tokens: &tokens,
            pos: 0,
            schema,
            stats: &mut compiled,
        };

        let sequence = match parser.parse_sequence(false) {
            Ok(sequence) => sequence,
            Err(Unsupported) => {
                compiled.ignored_arguments += 1;
                debug!(
                    event = %Event::FilterArgumentIgnored,
                    schema = schema.name(),
                    argument = argument.as_str()
                );
                continue;
            }
        };

        let Some(predicate) = sequence.predicate else {
            continue;
        };

        combined = Some(match (combined, sequence.leading) {
            (None, _) => predicate,
            (Some(left), Some(Joiner::Or)) => left.or(predicate),
            (Some(left), _) => left.and(predicate),
        });
    }

    if let Some(predicate) = &combined {
        debug!(
            event = %Event::FilterCompiled,
            schema = schema.name(),
            tree = %predicate
        );
    }

    compiled.predicate = combined;
    compiled
}

fn connective(token: &Token) -> Option<Connective> {
    let Token::Word(word) = token else {
        return None;
    };
    match word.to_ascii_lowercase().as_str() {
        "and" => Some(Connective::And),
        "or" => Some(Connective::Or),
        "not" => Some(Connective::Not),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
    Not,
}

fn fold(acc: Option<Predicate>, pending: &mut Pending, operand: Option<Predicate>) -> Option<Predicate> {
    let Pending { joiner, negate } = std::mem::take(pending);
    let Some(operand) = operand else {
        return acc;
    };
    let operand = if negate { operand.negate() } else { operand };

    Some(match (acc, joiner) {
        (None, _) => operand,
        (Some(left), Some(Joiner::Or)) => left.or(operand),
        (Some(left), _) => left.and(operand),
    })
}

impl ArgumentParser<'_> {
    fn parse_sequence(&mut self, nested: bool) -> Result<Sequence, Unsupported> {
        let mut acc: Option<Predicate> = None;
        let mut pending = Pending::default();
        let mut leading: Option<Joiner> = None;
        let mut seen_operand = false;
        let tokens = self.tokens;

        while let Some(token) = tokens.get(self.pos) {
            if let Some(connective) = connective(token) {
                self.pos += 1;
                let joiner = match connective {
                    Connective::And => Some(Joiner::And),
                    Connective::Or => Some(Joiner::Or),
                    Connective::Not => {
                        pending.negate = true;
                        None
                    }
                };
                if let Some(joiner) = joiner {
                    pending.joiner = Some(joiner);
                    if !seen_operand && leading.is_none() {
                        leading = Some(joiner);
                    }
                }
                continue;
            }

            match token {
                Token::Close => {
                    self.pos += 1;
                    if nested {
                        break;
                    }
                }
                Token::Open => {
                    self.pos += 1;
                    seen_operand = true;
                    let operand = match self.parse_sequence(true) {
                        Ok(inner) => inner.predicate,
                        Err(Unsupported) => {
                            self.skip_group();
                            self.stats.ignored_groups += 1;
                            debug!(event = %Event::FilterGroupIgnored, schema = self.schema.name());
                            None
                        }
                    };
                    acc = fold(acc, &mut pending, operand);
                }
                Token::Word(_) | Token::Quoted(_) => {
                    seen_operand = true;
                    let operand = self.comparison()?;
                    acc = fold(acc, &mut pending, operand);
                }
            }
        }

        Ok(Sequence {
            leading,
            predicate: acc,
        })
    }

    /// Parses `field op value` at the cursor.
    ///
    /// Returns `Ok(None)` for a dropped comparison and `Err` for an
    /// unsupported operator.
    fn comparison(&mut self) -> Result<Option<Predicate>, Unsupported> {
        let tokens = self.tokens;
        if self.pos + 2 >= tokens.len() {
            self.drop_clause(tokens[self.pos].text().unwrap_or_default(), "incomplete");
            self.pos = tokens.len();
            return Ok(None);
        }

        let field = tokens[self.pos].text().unwrap_or_default();
        let op = match &tokens[self.pos + 1] {
            Token::Word(word) => CompareOp::parse(word),
            _ => None,
        };
        let Some(op) = op else {
            return Err(Unsupported);
        };

        let literal = &tokens[self.pos + 2];
        if matches!(literal, Token::Open | Token::Close) {
            self.pos += 2;
            self.drop_clause(field, "missing literal");
            return Ok(None);
        }
        self.pos += 3;

        let Some(path) = resolve(self.schema, field) else {
            self.drop_clause(field, "unknown field");
            return Ok(None);
        };
        let Some(scalar) = path.scalar_type() else {
            self.drop_clause(field, "not a scalar field");
            return Ok(None);
        };

        let value = match literal {
            Token::Word(word)
                if word.eq_ignore_ascii_case("null") && path.leaf().field.kind().is_nullable() =>
            {
                Some(Value::Null)
            }
            Token::Word(text) | Token::Quoted(text) => scalar.coerce(text),
            Token::Open | Token::Close => None,
        };
        let Some(value) = value else {
            self.drop_clause(field, "literal does not convert");
            return Ok(None);
        };

        Ok(Some(Predicate::compare(path, op, value)))
    }

    /// Consumes tokens up to and including the close of the current group
    fn skip_group(&mut self) {
        let tokens = self.tokens;
        let mut depth = 0usize;
        while let Some(token) = tokens.get(self.pos) {
            self.pos += 1;
            match token {
                Token::Open => depth += 1,
                Token::Close if depth == 0 => return,
                Token::Close => depth -= 1,
                _ => {}
            }
        }
    }

    fn drop_clause(&mut self, field: &str, reason: &'static str) {
        self.stats.dropped_clauses += 1;
        debug!(
            event = %Event::FilterClauseDropped,
            schema = self.schema.name(),
            field,
            reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldValue, Fields, ScalarType};
    use std::sync::OnceLock;

    #[derive(Clone)]
    struct Item {
        id: i64,
        name: String,
        score: Option<i64>,
    }

    fn item_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("tests::Item")
                .field("id", FieldKind::Scalar(ScalarType::Int))
                .field("name", FieldKind::Scalar(ScalarType::Text))
                .field("score", FieldKind::Nullable(ScalarType::Int))
                .build()
        })
    }

    impl Fields for Item {
        fn schema(&self) -> &'static Schema {
            item_schema()
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            let value = match name {
                "id" => Value::Int(self.id),
                "name" => Value::Text(self.name.clone()),
                "score" => self.score.into(),
                _ => return None,
            };
            Some(FieldValue::Scalar(value))
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: 1, name: "A".into(), score: Some(10) },
            Item { id: 2, name: "B".into(), score: None },
            Item { id: 3, name: "A".into(), score: Some(30) },
            Item { id: 4, name: "C".into(), score: Some(40) },
        ]
    }

    fn matching(filter: &[&str]) -> Vec<i64> {
        let args: Vec<String> = filter.iter().map(|s| s.to_string()).collect();
        let compiled = compile(item_schema(), &args);
        items()
            .into_iter()
            .filter(|i| compiled.predicate.as_ref().map_or(true, |p| p.evaluate(i)))
            .map(|i| i.id)
            .collect()
    }

    #[test]
    fn test_equality_and_inequality() {
        assert_eq!(matching(&["name eq 'A'"]), vec![1, 3]);
        assert_eq!(matching(&["Name NE 'A'"]), vec![2, 4]);
    }

    #[test]
    fn test_left_to_right_folding() {
        // (name == A OR id == 4) AND score > 15
        assert_eq!(matching(&["name eq 'A' or id eq 4 and score gt 15"]), vec![3, 4]);
    }

    #[test]
    fn test_not_connective() {
        assert_eq!(matching(&["id gt 1 and not name eq 'A'"]), vec![2, 4]);
        assert_eq!(matching(&["not name eq 'A'"]), vec![2, 4]);
    }

    #[test]
    fn test_parenthesized_groups() {
        assert_eq!(matching(&["id eq 2 or (name eq 'A' and score ge 30)"]), vec![2, 3]);
    }

    #[test]
    fn test_null_literal_on_nullable_field() {
        assert_eq!(matching(&["score eq null"]), vec![2]);
        assert_eq!(matching(&["score ne null"]), vec![1, 3, 4]);
        assert_eq!(matching(&["score lt 100"]), vec![1, 3, 4]);
    }

    #[test]
    fn test_unknown_field_dropped_with_connective() {
        let compiled = compile(item_schema(), &["bogus eq 1 or name eq 'B'".to_string()]);
        assert_eq!(compiled.dropped_clauses, 1);
        assert_eq!(matching(&["bogus eq 1 or name eq 'B'"]), vec![2]);
        assert_eq!(matching(&["name eq 'B' or bogus eq 1"]), vec![2]);
    }

    #[test]
    fn test_bad_literal_dropped() {
        let compiled = compile(item_schema(), &["id eq abc".to_string()]);
        assert!(compiled.predicate.is_none());
        assert_eq!(compiled.dropped_clauses, 1);
    }

    #[test]
    fn test_unsupported_operator_ignores_argument() {
        let compiled = compile(item_schema(), &["name like 'A'".to_string()]);
        assert!(compiled.predicate.is_none());
        assert_eq!(compiled.ignored_arguments, 1);
        assert_eq!(matching(&["name like 'A'"]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unsupported_operator_ignores_group_only() {
        let args = vec!["id gt 1 and (name like 'A' or id eq 9)".to_string()];
        let compiled = compile(item_schema(), &args);
        assert_eq!(compiled.ignored_groups, 1);
        assert_eq!(matching(&["id gt 1 and (name like 'A' or id eq 9)"]), vec![2, 3, 4]);
    }

    #[test]
    fn test_multiple_arguments() {
        assert_eq!(matching(&["name eq 'A'", "id gt 1"]), vec![3]);
        assert_eq!(matching(&["name eq 'A'", "or id eq 4"]), vec![1, 3, 4]);
    }

    #[test]
    fn test_incomplete_clause_dropped() {
        assert_eq!(matching(&["name eq 'A' and id"]), vec![1, 3]);
    }

    #[test]
    fn test_rendering() {
        let compiled = compile(item_schema(), &["name eq 'A' and not id gt 2".to_string()]);
        assert_eq!(
            compiled.predicate.unwrap().to_string(),
            "(name == A AND NOT id > 2)"
        );
    }
}
