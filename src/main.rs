//! todo - command-line front end for todo-graph

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = todo_graph::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
