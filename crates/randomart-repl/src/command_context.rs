use std::{fmt, path::PathBuf};

use miette::miette;
use randomart_lang::{Engine, NodeId};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    String(Vec<String>),
    Quit,
}

/// What runs after a tree is generated or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Test,
    #[default]
    Render,
}

#[derive(Debug, Clone, PartialEq, strum::EnumIter)]
pub enum Command {
    Depth(u32),
    Generate,
    Grammar,
    Help,
    Quit,
    Render,
    Seed(u64),
    Test,
    Expr(String),
    Invalid(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Depth(_) => write!(f, "depth"),
            Command::Generate => write!(f, "<empty line>"),
            Command::Grammar => write!(f, "grammar"),
            Command::Help => write!(f, "help"),
            Command::Quit => write!(f, "quit"),
            Command::Render => write!(f, "render"),
            Command::Seed(_) => write!(f, "seed"),
            Command::Test => write!(f, "test"),
            Command::Expr(_) => write!(f, "<expr>"),
            Command::Invalid(_) => write!(f, "<invalid>"),
        }
    }
}

impl Command {
    pub fn help(&self) -> String {
        match self {
            Command::Depth(_) => format!("{:<14}{}", "depth N", "Set the generation depth"),
            Command::Generate => format!(
                "{:<14}{}",
                "<empty line>", "Generate a new random tree and run the current mode"
            ),
            Command::Grammar => format!("{:<14}{}", "grammar", "Print the active grammar"),
            Command::Help => format!("{:<14}{}", "help", "Print command help"),
            Command::Quit => format!("{:<14}{}", "quit", "Quit and exit"),
            Command::Render => format!(
                "{:<14}{}",
                "render", "Switch to render mode and render the current tree"
            ),
            Command::Seed(_) => format!("{:<14}{}", "seed N", "Pin the seed of the next tree"),
            Command::Test => format!(
                "{:<14}{}",
                "test", "Switch to test mode and sample the current tree"
            ),
            Command::Expr(_) => format!(
                "{:<14}{}",
                "<expr>", "Parse an expression and run the current mode"
            ),
            Command::Invalid(_) => String::new(),
        }
    }

    /// Command names offered for completion.
    pub fn names() -> impl Iterator<Item = String> {
        Command::iter().filter_map(|c| match c {
            Command::Generate | Command::Expr(_) | Command::Invalid(_) => None,
            c => Some(c.to_string()),
        })
    }
}

impl From<String> for Command {
    fn from(s: String) -> Self {
        match s
            .as_str()
            .split_whitespace()
            .collect::<Vec<&str>>()
            .as_slice()
        {
            [] => Command::Generate,
            ["quit"] => Command::Quit,
            ["test"] => Command::Test,
            ["render"] => Command::Render,
            ["grammar"] => Command::Grammar,
            ["help"] => Command::Help,
            ["depth", n] => n.parse().map(Command::Depth).unwrap_or(Command::Invalid(s)),
            ["seed", n] => n.parse().map(Command::Seed).unwrap_or(Command::Invalid(s)),
            ["depth" | "seed", ..] => Command::Invalid(s),
            _ => Command::Expr(s.trim().to_string()),
        }
    }
}

pub struct CommandContext {
    pub(crate) engine: Engine,
    pub(crate) mode: Mode,
    pub(crate) output: PathBuf,
    pub(crate) size: u32,
}

impl CommandContext {
    pub fn new(engine: Engine, output: impl Into<PathBuf>, size: u32) -> Self {
        Self {
            engine,
            mode: Mode::default(),
            output: output.into(),
            size,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn completions(&self, line: &str, pos: usize) -> Vec<String> {
        let src = &line[..pos];

        Command::names()
            .filter(|name| !src.is_empty() && name.starts_with(src))
            .collect()
    }

    pub fn execute(&mut self, to_run: &str) -> miette::Result<CommandOutput> {
        match to_run.to_string().into() {
            Command::Quit => Ok(CommandOutput::Quit),
            Command::Help => Ok(CommandOutput::String(
                Command::iter()
                    .filter(|c| !matches!(c, Command::Invalid(_)))
                    .map(|c| c.help())
                    .collect(),
            )),
            Command::Depth(depth) => {
                let depth = self.engine.set_depth(depth);
                Ok(CommandOutput::String(vec![format!("depth: {depth}")]))
            }
            Command::Seed(seed) => {
                self.engine.set_seed(seed);
                Ok(CommandOutput::String(vec![format!("seed: {seed}")]))
            }
            Command::Grammar => Ok(CommandOutput::String(
                self.engine
                    .grammar()
                    .to_string()
                    .lines()
                    .map(str::to_string)
                    .collect(),
            )),
            Command::Test => {
                self.mode = Mode::Test;
                self.run_mode().map(CommandOutput::String)
            }
            Command::Render => {
                self.mode = Mode::Render;
                self.run_mode().map(CommandOutput::String)
            }
            Command::Generate => {
                let generated = self.engine.generate();
                let mut lines = vec![
                    self.engine.display(generated.root).to_string(),
                    format!("seed: {}", generated.seed),
                ];
                lines.extend(self.run_mode()?);
                Ok(CommandOutput::String(lines))
            }
            Command::Expr(code) => {
                let root = self.engine.parse(&code)?;
                let mut lines = vec![self.engine.display(root).to_string()];
                lines.extend(self.run_mode()?);
                Ok(CommandOutput::String(lines))
            }
            Command::Invalid(s) => Err(miette!(
                help = "Try `help` for the list of commands",
                "Invalid command: {s}"
            )),
        }
    }

    fn run_mode(&mut self) -> miette::Result<Vec<String>> {
        if self.root().is_none() {
            return Err(miette!(
                help = "Press enter to generate a tree or type an expression",
                "There is no tree yet"
            ));
        }

        match self.mode {
            Mode::Test => {
                let sample = self.engine.sample()?;
                Ok(vec![format!(
                    "({}, {}) -> {}",
                    sample.x,
                    sample.y,
                    self.engine.display(sample.result)
                )])
            }
            Mode::Render => {
                let image = randomart_render::render(self.engine.program(), self.size)?;
                randomart_render::write_png(&image, &self.output)?;
                Ok(vec![format!("wrote {}", self.output.display())])
            }
        }
    }

    fn root(&self) -> Option<NodeId> {
        self.engine.root()
    }
}
