#![no_main]

use arbitrary::Arbitrary;
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Channel {
    X,
    Y,
    Number(f32),
    Unary(String, Box<Channel>),
    Binary(String, Box<Channel>, Box<Channel>),
    Raw(String),
}

impl Channel {
    fn to_code(&self) -> String {
        match self {
            Channel::X => "x".to_string(),
            Channel::Y => "y".to_string(),
            Channel::Number(n) => n.to_string(),
            Channel::Unary(name, arg) => format!("{}({})", name, arg.to_code()),
            Channel::Binary(name, l, r) => format!("{}({}, {})", name, l.to_code(), r.to_code()),
            Channel::Raw(code) => code.clone(),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Root {
    Triple(Vec<Channel>),
    If(Channel, Vec<Channel>, Vec<Channel>),
}

impl Root {
    fn to_code(&self) -> String {
        let triple = |channels: &Vec<Channel>| {
            format!("E({})", channels.iter().map(Channel::to_code).join(", "))
        };

        match self {
            Root::Triple(channels) => triple(channels),
            Root::If(cond, then, otherwise) => format!(
                "if({}) {} else {}",
                cond.to_code(),
                triple(then),
                triple(otherwise)
            ),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct Context {
    raw_code: Option<String>,
    generated: Option<Root>,
    point: (f32, f32),
}

fuzz_target!(|context: Context| {
    let code = match (&context.raw_code, &context.generated) {
        (Some(raw), _) => raw.clone(),
        (_, Some(generated)) => generated.to_code(),
        _ => "".to_string(),
    };

    let mut engine = randomart_lang::Engine::default();
    if engine.parse(&code).is_ok() {
        let (x, y) = context.point;
        let _ = engine.eval(x, y);
    }
});
