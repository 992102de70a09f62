use lumo_lang::{
    compiler,
    options::{parse_args, Command, USAGE},
};
use std::{env, process};

fn main() {
    let command = match parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err}\n\n{USAGE}");
            process::exit(2);
        }
    };

    match command {
        Command::Help => println!("{USAGE}"),
        Command::Compile(options) => {
            let options = options.with_environment();
            if !compiler::run(&options) {
                process::exit(1);
            }
        }
    }
}
