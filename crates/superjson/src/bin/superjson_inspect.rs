//! `superjson-inspect`: decode a superjson envelope (stdin) and print it.
//!
//! Usage:
//!   superjson-inspect [--plain | --encode [--dedupe] [--allow-error-prop NAME]...]
//!
//! Default output is the inspected value. `--plain` prints what
//! `JSON.stringify` would make of it; `--encode` re-encodes it with the
//! given options.

use std::io::{self, Read, Write};

use superjson::{SuperJson, SuperJsonOptions};

enum Mode {
    Inspect,
    Plain,
    Encode,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut mode = Mode::Inspect;
    let mut options = SuperJsonOptions::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--plain" => mode = Mode::Plain,
            "--encode" => mode = Mode::Encode,
            "--dedupe" => options.dedupe = true,
            "--allow-error-prop" => {
                i += 1;
                match args.get(i) {
                    Some(name) => options.allowed_error_props.push(name.clone()),
                    None => fail("--allow-error-prop needs a property name"),
                }
            }
            other => fail(format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        fail(e);
    }

    let codec = SuperJson::with_options(options);
    let doc = codec.parse(&input).unwrap_or_else(|e| fail(e));
    let output = match mode {
        Mode::Inspect => doc.inspect(),
        Mode::Plain => match doc.to_plain_json() {
            Ok(Some(json)) => superjson::to_js_string(&json).unwrap_or_else(|e| fail(e)),
            Ok(None) => String::new(),
            Err(e) => fail(e),
        },
        Mode::Encode => codec.stringify(&doc).unwrap_or_else(|e| fail(e)),
    };

    let mut stdout = io::stdout();
    if let Err(e) = writeln!(stdout, "{output}") {
        fail(e);
    }
}
