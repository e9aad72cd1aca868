use jnane::driver;
use std::env;
use std::process;

fn main() {
    env_logger::init();

    let command = driver::Command::new();

    match command.run(env::args()) {
        Ok(output) => {
            print!("{}", output)
        }
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };
}
