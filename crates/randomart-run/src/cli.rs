use clap::{Parser, Subcommand};
use randomart_lang::{Engine, Grammar, Options};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "randomart")]
#[command(version)]
#[command(after_help = "Examples:\n\n\
    To render a random tree at depth 8:\n\
    $ randomart -d 8 -o art.png\n\n\
    To render a fixed expression:\n\
    $ randomart 'E(x, y, mult(x, y))'\n\n\
    To sample a tree once instead of rendering:\n\
    $ randomart -t -s 42\n\n\
    To start a REPL session:\n\
    $ randomart repl")]
#[command(
    about = "randomart draws images from random expression trees.",
    long_about = None
)]
pub struct Cli {
    #[clap(flatten)]
    generate: GenerateArgs,

    #[clap(flatten)]
    output: OutputArgs,

    #[clap(subcommand)]
    commands: Option<Commands>,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Expression to draw instead of a generated tree
    expr: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GrammarKind {
    /// `E`, `A` and `C` with `add` and `mult` only
    Paper,
    /// A single rule over `x`, `y` and numbers
    Simple,
    #[default]
    /// Every operator, including `if` and `geq`
    Full,
}

impl From<GrammarKind> for Grammar {
    fn from(kind: GrammarKind) -> Self {
        match kind {
            GrammarKind::Paper => Grammar::paper(),
            GrammarKind::Simple => Grammar::simple(),
            GrammarKind::Full => Grammar::full(),
        }
    }
}

#[derive(Clone, Debug, clap::Args)]
struct GenerateArgs {
    /// Depth of the generated tree, clamped to 16
    #[arg(short, long, default_value_t = 1)]
    depth: u32,

    /// Seed of the generated tree. The wall clock is used when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grammar to generate from
    #[arg(short, long, value_enum, default_value_t)]
    grammar: GrammarKind,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            depth: 1,
            seed: None,
            grammar: GrammarKind::default(),
        }
    }
}

#[derive(Clone, Debug, clap::Args)]
struct OutputArgs {
    /// Sample the tree once at a random point instead of rendering
    #[arg(short, long)]
    test: bool,

    /// Image to write
    #[arg(short, long, value_name = "FILE", default_value = "randomart.png")]
    output: PathBuf,

    /// Width and height of the image in pixels
    #[arg(long, value_name = "PX", default_value_t = randomart_render::DEFAULT_SIZE)]
    size: u32,
}

impl Default for OutputArgs {
    fn default() -> Self {
        Self {
            test: false,
            output: PathBuf::from("randomart.png"),
            size: randomart_render::DEFAULT_SIZE,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a REPL session
    Repl,
    /// Print the active grammar
    Grammar,
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        let engine = self.create_engine();

        match &self.commands {
            Some(Commands::Repl) => {
                randomart_repl::Repl::new(engine, self.output.output.clone(), self.output.size)
                    .run()
            }
            Some(Commands::Grammar) => {
                print!("{}", engine.grammar());
                Ok(())
            }
            None => self.draw(engine),
        }
    }

    fn create_engine(&self) -> Engine {
        Engine::new(
            self.generate.grammar.into(),
            Options {
                depth: self.generate.depth,
                seed: self.generate.seed,
                ..Options::default()
            },
        )
    }

    fn draw(&self, mut engine: Engine) -> miette::Result<()> {
        match &self.expr {
            Some(expr) => {
                let root = engine.parse(expr)?;
                println!("{}", engine.display(root));
            }
            None => {
                let generated = engine.generate();
                println!("{}", engine.display(generated.root));
                println!("seed: {}", generated.seed);
            }
        }

        if self.output.test {
            let sample = engine.sample()?;
            println!(
                "({}, {}) -> {}",
                sample.x,
                sample.y,
                engine.display(sample.result)
            );
        } else {
            let image = randomart_render::render(engine.program(), self.output.size)?;
            randomart_render::write_png(&image, &self.output.output)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cli(expr: Option<&str>, generate: GenerateArgs, output: OutputArgs) -> Cli {
        Cli {
            generate,
            output,
            commands: None,
            verbose: clap_verbosity_flag::Verbosity::new(0, 0),
            expr: expr.map(str::to_string),
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["randomart"]).unwrap();

        assert_eq!(cli.generate.depth, 1);
        assert_eq!(cli.generate.seed, None);
        assert_eq!(cli.generate.grammar, GrammarKind::Full);
        assert_eq!(cli.output.output, PathBuf::from("randomart.png"));
        assert_eq!(cli.output.size, 256);
        assert!(!cli.output.test);
        assert!(cli.commands.is_none());
    }

    #[rstest]
    #[case::depth(&["randomart", "-d", "deep"])]
    #[case::grammar(&["randomart", "-g", "tiny"])]
    #[case::seed(&["randomart", "-s", "-1"])]
    fn test_cli_rejects_bad_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case::paper(GrammarKind::Paper, "E")]
    #[case::simple(GrammarKind::Simple, "A")]
    #[case::full(GrammarKind::Full, "R")]
    fn test_grammar_kind(#[case] kind: GrammarKind, #[case] entry: &str) {
        let grammar = Grammar::from(kind);
        assert_eq!(grammar.rule(grammar.entry()).name, entry);
    }

    #[test]
    fn test_cli_depth_is_clamped() {
        let cli = Cli::try_parse_from(["randomart", "-d", "40"]).unwrap();
        assert_eq!(cli.create_engine().depth(), randomart_lang::MAX_DEPTH);
    }

    #[test]
    fn test_cli_test_mode() {
        let cli = cli(
            None,
            GenerateArgs {
                depth: 3,
                seed: Some(42),
                grammar: GrammarKind::Paper,
            },
            OutputArgs {
                test: true,
                ..OutputArgs::default()
            },
        );

        assert!(cli.run().is_ok());
    }

    #[test]
    fn test_cli_render_expr() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let cli = cli(
            Some("E(x, y, mult(x, y))"),
            GenerateArgs::default(),
            OutputArgs {
                output: output.clone(),
                size: 8,
                ..OutputArgs::default()
            },
        );

        assert!(cli.run().is_ok());
        assert!(output.exists());
    }

    #[test]
    fn test_cli_invalid_expr() {
        let cli = cli(
            Some("E(x, y)"),
            GenerateArgs::default(),
            OutputArgs {
                test: true,
                ..OutputArgs::default()
            },
        );

        assert!(cli.run().is_err());
    }
}
