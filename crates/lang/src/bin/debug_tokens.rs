use agentspec_lang::lexer::lexer;
use chumsky::Parser;
use std::env;
use std::fs;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.ias> [target_line]", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let source = fs::read_to_string(filename).expect("failed to read file");

    let target_line: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    let result = lexer().parse(&source);
    match result.into_output() {
        Some(tokens) => {
            for (tok, span) in &tokens {
                let line = source[..span.start].matches('\n').count() + 1;

                if target_line == 0 || (line >= target_line.saturating_sub(5) && line <= target_line + 5)
                {
                    println!("Line {line:4}: {tok:?} @ {span:?}");
                }
            }
        }
        None => eprintln!("lex error: invalid token stream"),
    }
}
