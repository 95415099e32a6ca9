use crate::error::YailError;
use crate::evaluator::Evaluator;
use crate::object::Object;
use crate::parser::parse;
use std::io::{self, BufRead, Write};

const PROMPT: &str = ">> ";

/// Interactive session on stdin/stdout.
pub fn start() {
    println!("YAIL Interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or 'q' to quit");
    println!();

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(error) = run(stdin.lock(), stdout.lock()) {
        eprintln!("Error in interactive session: {}", error);
    }
}

/// Reads one line at a time and evaluates it against a single persistent
/// scope, so bindings survive from one line to the next.
pub fn run<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<()> {
    let mut evaluator = Evaluator::new();
    tracing::info!("repl session started");

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF reached (Ctrl+D or piped input ended)
            writeln!(output)?;
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "q" {
            break;
        }

        let (program, errors) = parse(line);
        if !errors.is_empty() {
            print_parse_errors(&mut output, &errors)?;
            continue;
        }

        let result = evaluator.eval_program(&program);
        if !matches!(result.as_ref(), Object::Null) {
            writeln!(output, "{}", result.display())?;
        }
    }

    tracing::info!("repl session ended");
    Ok(())
}

fn print_parse_errors<W: Write>(output: &mut W, errors: &[YailError]) -> io::Result<()> {
    writeln!(
        output,
        "Failed to execute the given source code for following reasons."
    )?;
    for error in errors {
        writeln!(output, "\t[ERROR] {}", error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn session(input: &str) -> String {
        let mut output = Vec::new();
        run(Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn state_persists_between_lines() {
        let output = session("var a = 5;\na = a * 2;\na\n");
        assert_eq!(output, ">> >> >> 10\n>> \n");
    }

    #[test]
    fn parse_errors_are_listed_instead_of_evaluating() {
        let output = session("val = 5;\nq\n1\n");
        assert_eq!(
            output,
            ">> Failed to execute the given source code for following reasons.\n\
             \t[ERROR] missing token: IDENTIFIER\n>> "
        );
    }

    #[test]
    fn runtime_errors_and_values_are_displayed() {
        let output = session("foo\n[1, \"two\"]\nnull\nexit\n");
        assert_eq!(
            output,
            ">> [ERROR] identifier not found: foo\n>> [1, two]\n>> >> "
        );
    }
}
