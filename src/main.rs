use clap::{App, Arg, ArgMatches};
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;
use wordmaze::interpreter::{Interpreter, Stdout};
use wordmaze::lexer::tokenize;
use wordmaze::parser::parse;
use wordmaze::printer::AstPrinter;
use wordmaze::Error;

// https://www.freebsd.org/cgi/man.cgi?query=sysexits
const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;
const EX_IOERR: i32 = 74;

fn main() {
    let matches = App::new("wordmaze")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs WordMaze programs")
        .arg(
            Arg::with_name("script")
                .help("Program file to run; starts a prompt when omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("eval")
                .short("e")
                .long("eval")
                .takes_value(true)
                .value_name("SOURCE")
                .conflicts_with("script")
                .help("Runs SOURCE instead of a file"),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("Prints the token stream and exits"),
        )
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .conflicts_with("tokens")
                .help("Prints the parsed program and exits"),
        )
        .arg(
            Arg::with_name("trace")
                .long("trace")
                .help("Writes each statement to stderr before running it"),
        )
        .arg(
            Arg::with_name("print-result")
                .short("r")
                .long("print-result")
                .help("Prints the program's result value after it runs"),
        )
        .get_matches();

    let source = match (matches.value_of("eval"), matches.value_of("script")) {
        (Some(source), _) => source.to_string(),
        (None, Some(file)) => match fs::read_to_string(file) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("Could not read '{}': {}", file, e);
                process::exit(EX_IOERR);
            }
        },
        (None, None) => {
            if matches.is_present("tokens") || matches.is_present("ast") {
                eprintln!("--tokens and --ast need a script or --eval");
                process::exit(EX_USAGE);
            }
            run_prompt(&matches);
            return;
        }
    };

    let code = if matches.is_present("tokens") {
        print_tokens(&source)
    } else if matches.is_present("ast") {
        print_ast(&source)
    } else {
        run_source(&source, &matches)
    };
    process::exit(code);
}

fn new_interpreter(matches: &ArgMatches) -> Interpreter<Stdout> {
    let mut interpreter = Interpreter::new();
    interpreter.set_trace(matches.is_present("trace"));
    interpreter
}

fn exit_code(err: &Error) -> i32 {
    if err.is_static() {
        EX_DATAERR
    } else {
        EX_SOFTWARE
    }
}

fn print_tokens(source: &str) -> i32 {
    match tokenize(source) {
        Ok(tokens) => {
            for token in tokens {
                println!(
                    "{:>4}:{:<4} {:<14} {}",
                    token.position.line,
                    token.position.column,
                    token.kind.to_string(),
                    token.lexeme
                );
            }
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            exit_code(&e)
        }
    }
}

fn print_ast(source: &str) -> i32 {
    match parse(source) {
        Ok(program) => {
            print!("{}", AstPrinter::print(&program));
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            exit_code(&e)
        }
    }
}

fn run_source(source: &str, matches: &ArgMatches) -> i32 {
    let mut interpreter = new_interpreter(matches);
    match interpreter.run(source) {
        Ok(result) => {
            if matches.is_present("print-result") {
                if let Some(value) = result {
                    println!("{}", value);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            exit_code(&e)
        }
    }
}

fn run_prompt(matches: &ArgMatches) {
    let mut interpreter = new_interpreter(matches);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("{}", e);
                return;
            }
            None => {
                println!();
                return;
            }
        };
        match interpreter.run(&line) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(e) => eprintln!("{}", e),
        }
    }
}
