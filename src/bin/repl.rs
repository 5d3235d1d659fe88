use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

use lispy::evaluator::special_form_identifiers;
use lispy::lexer::tokenize;
use lispy::{Environment, TokenKind, run};

const HISTORY_FILE: &str = "lispy_history.txt";

/// Completes symbol prefixes from the live environment plus the special-form
/// names, which are not environment bindings.
struct IdentifierCompleter {
    env: Rc<RefCell<Environment>>,
}

impl rustyline::completion::Completer for IdentifierCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let candidates = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last().map(|t| t.kind.clone()) {
                Some(TokenKind::Symbol(prefix)) => {
                    let mut identifiers = self.env.borrow().identifiers();
                    identifiers.extend(special_form_identifiers());
                    let mut completions: Vec<String> = identifiers
                        .iter()
                        .filter_map(|id| {
                            id.strip_prefix(&prefix).map(|suffix| suffix.to_string())
                        })
                        .collect();
                    completions.sort();
                    completions
                }
                _ => vec![],
            },
            Err(_) => vec![],
        };
        Ok((pos, candidates))
    }
}

/// Holds the line open while parentheses are unbalanced, so multi-line forms
/// can be typed naturally. A stray ')' is rejected right away.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth: usize = 0;
        let mut in_comment = false;

        for (i, c) in ctx.input().chars().enumerate() {
            if in_comment {
                if c == '\n' {
                    in_comment = false;
                }
                continue;
            }
            match c {
                ';' => in_comment = true,
                '(' => depth += 1,
                ')' => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched ')' at position {}",
                            i
                        ))));
                    }
                },
                _ => {}
            }
        }

        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Completer)]
    completer: IdentifierCompleter,
}

fn main() -> rustyline::Result<()> {
    println!("lispy repl");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Environment::new_global_populated();
    let helper = ReplHelper {
        validator: ParenValidator,
        completer: IdentifierCompleter {
            env: global_env.clone(),
        },
    };

    let config = rustyline::config::Config::builder().build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("lispy> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }
                rl.add_history_entry(input)?;

                // Errors abort the current form only; the loop decides the
                // resumption policy, which here is "keep going".
                match run(input, &global_env) {
                    Ok(value) => println!("{}", value),
                    Err(e) => e.pretty_print(input),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}
