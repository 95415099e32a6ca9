use crate::error::{Span, YailError};
use crate::evaluator::Evaluator;
use crate::object::Object;
use crate::parser::parse;

/// Runs a whole source file, printing diagnostics to stderr.
///
/// Returns `false` when the source has syntax errors or evaluates to an error.
pub fn run(source: &str, filename: Option<&str>) -> bool {
    let (program, errors) = parse(source);
    if !errors.is_empty() {
        for error in &errors {
            error.report(source, filename);
        }
        return false;
    }

    let mut evaluator = Evaluator::new();
    let result = evaluator.eval_program(&program);
    match result.as_ref() {
        Object::Error(message) => {
            // Runtime errors carry no position, so the label covers the whole file
            let error = YailError::runtime(Span::new(0, source.len()), message.as_str());
            error.report(source, filename);
            false
        }
        Object::Null => true,
        _ => {
            println!("{}", result.display());
            true
        }
    }
}
