// cfront: tokenizer, parser, and semantic checker for a C subset

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use cfront::analyze;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("cfront");

    let mut file = None;
    let mut show_tokens = false;
    let mut as_json = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--tokens" => show_tokens = true,
            "--json" => as_json = true,
            other if other.starts_with("--") => {
                eprintln!("Error: Unknown option '{}'", other);
                print_usage(program_name);
                return ExitCode::FAILURE;
            }
            other => file = Some(other.to_string()),
        }
    }

    let Some(file) = file else {
        eprintln!("Error: No input file provided");
        eprintln!();
        print_usage(program_name);
        return ExitCode::FAILURE;
    };

    if !Path::new(&file).exists() {
        eprintln!("Error: File '{}' not found", file);
        return ExitCode::FAILURE;
    }

    let source = match fs::read_to_string(&file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Could not read '{}': {}", file, e);
            return ExitCode::FAILURE;
        }
    };

    let result = analyze(&source);

    if as_json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: Could not serialize result: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return if result.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    if show_tokens {
        for token in &result.tokens {
            println!("{}", token);
        }
        println!();
    }

    for diagnostic in result.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    if result.is_clean() {
        let items = result.ast.as_ref().map_or(0, |p| p.items.len());
        println!("{}: no problems found ({} top-level items)", file, items);
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{}: {} problem(s) found",
            file,
            result.diagnostics().count()
        );
        ExitCode::FAILURE
    }
}

fn print_usage(program_name: &str) {
    eprintln!("Usage: {} <file.c> [--tokens] [--json]", program_name);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --tokens   Print the token stream before the diagnostics");
    eprintln!("  --json     Print the full analysis result as JSON");
}
