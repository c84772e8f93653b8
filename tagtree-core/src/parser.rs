//! # Tag Expression Parser
//!
//! Compiles a tag expression into a [`Condition`] tree.
//!
//! ## Grammar
//!
//! ```text
//! <expr>          := <term> | <operator-call>
//! <operator-call> := <operator-name> "(" <term> (("," | ";") <term>)* ")"
//! <term>          := <tag> | <operator-call>
//! <operator-name> := "and" | "or" | "not"     (case-insensitive)
//! <tag>           := any run of characters except "(", ")", "," and ";"
//! ```
//!
//! Whitespace around operator names and tags is ignored. There is no escaping,
//! so a tag can never contain one of the four delimiters.
//!
//! ## Examples
//!
//! ```text
//! smoke                          # tests tagged "smoke"
//! and(api, not(slow))            # "api" tests that are not "slow"
//! or(unit; integration)          # ";" works as a separator too
//! AND(or(a, b), c)               # operator names are case-insensitive
//! ```
//!
//! The parser is a single left-to-right scan. Each open operator call lives on
//! a stack of frames collecting its operands in textual order. A closing
//! parenthesis reduces the top frame to a composite condition which becomes an
//! operand of the frame below it.
use tracing::*;

use crate::{
    condition::{Condition, Operator},
    Error, Result,
};

/// Parse a tag expression.
///
/// An empty (or whitespace-only) expression yields [`Condition::always`].
///
/// ```rust
/// use tagtree_core::{parse, tag_set};
///
/// let condition = parse("and(api, not(slow))").unwrap();
/// assert!(condition.should_run(&tag_set(["api"])));
/// assert!(!condition.should_run(&tag_set(["api", "slow"])));
/// ```
pub fn parse(expression: &str) -> Result<Condition> {
    if expression.trim().is_empty() {
        trace!("empty tag expression, every test will run");
        return Ok(Condition::always());
    }

    let mut parser = Parser::new(expression);
    for (index, c) in expression.chars().enumerate() {
        let column = index + 1;
        match c {
            '(' => parser.open(column)?,
            ',' | ';' => parser.separate(column)?,
            ')' => parser.close(column)?,
            _ => parser.word.push(c),
        }
    }
    let condition = parser.finish()?;

    debug!("parsed tag expression {expression:?} into {condition}");
    Ok(condition)
}

/// An operator call whose closing parenthesis hasn't been seen yet.
struct Frame {
    operator: Operator,
    column: usize,
    children: Vec<Condition>,
}

struct Parser<'a> {
    expression: &'a str,
    word: String,
    frames: Vec<Frame>,
    /// Conditions completed outside of any operator call.
    results: Vec<Condition>,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Parser<'a> {
        Parser {
            expression,
            word: String::new(),
            frames: Vec::new(),
            results: Vec::new(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::Malformed {
            expression: self.expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Turn the accumulated word into a tag leaf, if it isn't blank.
    fn take_tag(&mut self) -> Option<Condition> {
        let word = std::mem::take(&mut self.word);
        let tag = word.trim();
        (!tag.is_empty()).then(|| Condition::contains(tag))
    }

    fn open(&mut self, column: usize) -> Result<()> {
        let word = std::mem::take(&mut self.word);
        let name = word.trim();
        if name.is_empty() {
            return Err(Error::OperatorExpected {
                expression: self.expression.to_string(),
                column,
            });
        }

        let operator = Operator::from_name(name)?;
        trace!("{operator} opened at column {column}");
        self.frames.push(Frame {
            operator,
            column,
            children: Vec::new(),
        });
        Ok(())
    }

    fn separate(&mut self, column: usize) -> Result<()> {
        let tag = self.take_tag();
        if self.frames.is_empty() {
            return Err(self.malformed(format!(
                "separator at column {column} is outside of an operator call"
            )));
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.children.extend(tag);
        }
        Ok(())
    }

    fn close(&mut self, column: usize) -> Result<()> {
        let tag = self.take_tag();
        let Some(mut frame) = self.frames.pop() else {
            return Err(self.malformed(format!("unmatched \")\" at column {column}")));
        };
        frame.children.extend(tag);

        // "not()" is left to the operator so that it reports the arity error.
        if frame.children.is_empty() && frame.operator != Operator::Not {
            return Err(self.malformed(format!(
                "\"{}\" at column {} has no operands",
                frame.operator, frame.column
            )));
        }

        trace!(
            "{} closed at column {column} with {} operand(s)",
            frame.operator,
            frame.children.len()
        );
        let condition = frame.operator.build(frame.children)?;
        match self.frames.last_mut() {
            Some(parent) => parent.children.push(condition),
            None => self.results.push(condition),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Condition> {
        if let Some(frame) = self.frames.last() {
            return Err(self.malformed(format!(
                "\"{}\" at column {} is never closed",
                frame.operator, frame.column
            )));
        }

        let tag = self.take_tag();
        self.results.extend(tag);
        if self.results.len() != 1 {
            return Err(self.malformed(format!(
                "expected a single condition but found {}",
                self.results.len()
            )));
        }

        self.results
            .pop()
            .ok_or_else(|| self.malformed("no condition found"))
    }
}
