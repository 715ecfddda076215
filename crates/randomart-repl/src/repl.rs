use colored::*;
use itertools::Itertools;
use miette::IntoDiagnostic;
use randomart_lang::Engine;
use rustyline::{
    At, Cmd, CompletionType, Config, Context, EditMode, Editor, Helper, KeyCode, KeyEvent,
    Modifiers, Movement, Word,
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::{CmdKind, Highlighter, MatchingBracketHighlighter},
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
};
use std::{borrow::Cow, cell::RefCell, fs, path::PathBuf, rc::Rc};

use crate::command_context::{CommandContext, CommandOutput};

const PROMPT: &str = "> ";

pub struct RandomartLineHelper {
    command_context: Rc<RefCell<CommandContext>>,
    matching_bracket_highlighter: MatchingBracketHighlighter,
}

impl RandomartLineHelper {
    pub fn new(command_context: Rc<RefCell<CommandContext>>) -> Self {
        Self {
            command_context,
            matching_bracket_highlighter: MatchingBracketHighlighter::default(),
        }
    }
}

impl Hinter for RandomartLineHelper {
    type Hint = String;
}

impl Highlighter for RandomartLineHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        prompt.cyan().to_string().into()
    }

    fn highlight_char(&self, line: &str, pos: usize, kind: CmdKind) -> bool {
        self.matching_bracket_highlighter
            .highlight_char(line, pos, kind)
    }
}

impl Validator for RandomartLineHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, ReadlineError> {
        if has_open_paren(ctx.input()) {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }

    fn validate_while_typing(&self) -> bool {
        false
    }
}

/// More `(` than `)` so far, so the expression continues on the next line.
fn has_open_paren(input: &str) -> bool {
    let depth = input.chars().fold(0i64, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    });
    depth > 0
}

impl Completer for RandomartLineHelper {
    type Candidate = Pair;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let completions = self
            .command_context
            .borrow()
            .completions(line, pos)
            .iter()
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{}{}", cmd, &line[pos..]),
            })
            .collect_vec();

        Ok((0, completions))
    }
}

impl Helper for RandomartLineHelper {}

pub struct Repl {
    command_context: Rc<RefCell<CommandContext>>,
}

impl Repl {
    pub fn new(engine: Engine, output: impl Into<PathBuf>, size: u32) -> Self {
        Self {
            command_context: Rc::new(RefCell::new(CommandContext::new(engine, output, size))),
        }
    }

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("RANDOMART_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("randomart")))
    }

    pub fn run(&self) -> miette::Result<()> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .color_mode(rustyline::ColorMode::Enabled)
            .build();
        let mut editor = Editor::with_config(config).into_diagnostic()?;
        let helper = RandomartLineHelper::new(Rc::clone(&self.command_context));

        editor.set_helper(Some(helper));
        editor.bind_sequence(
            KeyEvent(KeyCode::Left, Modifiers::CTRL),
            Cmd::Move(Movement::BackwardWord(1, Word::Big)),
        );
        editor.bind_sequence(
            KeyEvent(KeyCode::Right, Modifiers::CTRL),
            Cmd::Move(Movement::ForwardWord(1, At::AfterEnd, Word::Big)),
        );

        let history = Self::config_dir().map(|config_dir| {
            fs::create_dir_all(&config_dir).ok();
            config_dir.join("history.txt")
        });

        if let Some(history) = &history
            && editor.load_history(history).is_err()
        {
            println!("No previous history.");
        }

        println!(
            "Welcome to randomart ({} mode). Press enter to generate a tree, type help for commands",
            self.command_context.borrow().mode()
        );

        loop {
            let prompt = format!("{}", PROMPT.cyan());
            let readline = editor.readline(&prompt);

            match readline {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(&line).into_diagnostic()?;
                    }

                    match self.command_context.borrow_mut().execute(&line) {
                        Ok(CommandOutput::String(s)) => println!("{}", s.join("\n")),
                        Ok(CommandOutput::Quit) => break,
                        Err(e) => {
                            eprintln!("{:?}", e)
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }

            if let Some(history) = &history
                && let Err(e) = editor.save_history(history)
            {
                log::warn!("Failed to save history to {}: {e}", history.display());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scopeguard::defer;

    #[rstest]
    #[case::empty("", false)]
    #[case::closed("E(x, y, add(x, y))", false)]
    #[case::open("E(x, y, add(x,", true)]
    #[case::over_closed("E(x))", false)]
    fn test_has_open_paren(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(has_open_paren(input), expected);
    }

    #[test]
    fn test_config_dir_from_env() {
        let previous = std::env::var_os("RANDOMART_CONFIG_DIR");
        defer! {
            match &previous {
                Some(value) => unsafe { std::env::set_var("RANDOMART_CONFIG_DIR", value) },
                None => unsafe { std::env::remove_var("RANDOMART_CONFIG_DIR") },
            }
        }

        unsafe { std::env::set_var("RANDOMART_CONFIG_DIR", "/tmp/randomart-test") };
        assert_eq!(
            Repl::config_dir(),
            Some(PathBuf::from("/tmp/randomart-test"))
        );
    }

    #[test]
    fn test_completer_replaces_prefix() {
        let context = Rc::new(RefCell::new(CommandContext::new(
            Engine::default(),
            "out.png",
            8,
        )));
        let completions = context.borrow().completions("gra", 3);

        assert_eq!(completions, vec!["grammar".to_string()]);
    }
}
