use std::process::ExitCode;

use lispy::{Environment, run};

fn usage() -> ExitCode {
    eprintln!("usage: lispy <file> | lispy -e '<program>'");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let source = match args.as_slice() {
        [flag, program] if flag == "-e" => program.clone(),
        [path] => match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("lispy: cannot read '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        _ => return usage(),
    };

    let env = Environment::new_global_populated();
    match run(&source, &env) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            e.pretty_print(&source);
            ExitCode::FAILURE
        }
    }
}
