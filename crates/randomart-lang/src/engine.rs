use crate::{
    Error,
    error::InnerError,
    eval,
    generate::{Generator, MAX_DEPTH},
    grammar::Grammar,
    node::NodeId,
    rng::RngStream,
    store::{DEFAULT_CAPACITY, DEFAULT_MARGIN, NodeStore, TreeDisplay},
};

#[derive(Debug, Clone)]
pub struct Options {
    pub depth: u32,
    /// Seed for the next generation only. The wall clock is used when unset.
    pub seed: Option<u64>,
    pub initial_capacity: usize,
    pub margin: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            depth: 1,
            seed: None,
            initial_capacity: DEFAULT_CAPACITY,
            margin: DEFAULT_MARGIN,
        }
    }
}

/// A freshly generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generated {
    pub root: NodeId,
    pub seed: u64,
}

/// One evaluation at a random point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub result: NodeId,
}

/// Owns one program and everything needed to build and evaluate it.
#[derive(Debug, Clone)]
pub struct Engine {
    store: NodeStore,
    grammar: Grammar,
    options: Options,
    rng: RngStream,
    source_code: String,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Grammar::default(), Options::default())
    }
}

impl Engine {
    pub fn new(grammar: Grammar, options: Options) -> Self {
        Self {
            store: NodeStore::new(options.initial_capacity),
            grammar,
            rng: RngStream::new(RngStream::clock_seed()),
            options: Options {
                depth: options.depth.min(MAX_DEPTH),
                ..options
            },
            source_code: String::new(),
        }
    }

    /// Sets the generation depth, clamped to [`MAX_DEPTH`], and returns the
    /// depth actually used.
    pub fn set_depth(&mut self, depth: u32) -> u32 {
        self.options.depth = depth.min(MAX_DEPTH);
        self.options.depth
    }

    pub fn depth(&self) -> u32 {
        self.options.depth
    }

    /// Pins the seed of the next generation.
    pub fn set_seed(&mut self, seed: u64) {
        self.options.seed = Some(seed);
    }

    pub fn set_grammar(&mut self, grammar: Grammar) {
        self.grammar = grammar;
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Replaces the program with a random tree drawn from the grammar.
    pub fn generate(&mut self) -> Generated {
        let seed = self
            .options
            .seed
            .take()
            .unwrap_or_else(RngStream::clock_seed);
        log::info!("Generating with seed {seed} at depth {}", self.options.depth);

        self.store.clear();
        self.source_code.clear();

        let mut generator = Generator::new(&self.grammar, RngStream::new(seed));
        let root = generator.generate_entry(&mut self.store, self.options.depth);
        self.rng = generator.into_rng();
        self.store.seal(self.options.margin);

        Generated { root, seed }
    }

    /// Replaces the program with the one written in `code`.
    #[allow(clippy::result_large_err)]
    pub fn parse(&mut self, code: &str) -> Result<NodeId, Error> {
        if let Some(seed) = self.options.seed.take() {
            self.rng = RngStream::new(seed);
        }

        self.store.clear();
        self.source_code = code.to_string();

        let root = crate::parse(code, &mut self.store)?;
        self.store.seal(self.options.margin);
        Ok(root)
    }

    /// Evaluates the program at `(x, y)`.
    #[allow(clippy::result_large_err)]
    pub fn eval(&mut self, x: f32, y: f32) -> Result<NodeId, Error> {
        eval::eval(&mut self.store, x, y)
            .map_err(|e| Error::from_error(self.source_code.as_str(), InnerError::Eval(e)))
    }

    /// Evaluates the program at a uniformly random point of `[-1, 1]²`.
    #[allow(clippy::result_large_err)]
    pub fn sample(&mut self) -> Result<Sample, Error> {
        let x = self.rng.uniform_range(-1.0, 1.0) as f32;
        let y = self.rng.uniform_range(-1.0, 1.0) as f32;
        let result = self.eval(x, y)?;

        Ok(Sample { x, y, result })
    }

    /// The current program, sealed. Clone it to evaluate on another thread.
    pub fn program(&self) -> &NodeStore {
        &self.store
    }

    pub fn root(&self) -> Option<NodeId> {
        self.store.root()
    }

    pub fn display(&self, id: NodeId) -> TreeDisplay<'_> {
        self.store.display(id)
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
