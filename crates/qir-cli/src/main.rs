use std::{env, fs, process::ExitCode, time::Instant};

use qir_bytecode::HostCode;
use qir_translate::SourceTable;
use qir_transport::to_json;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: qir <normalized-program.json> [source-name ...]");
        return ExitCode::FAILURE;
    };

    let contents = match read_file(file_path) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code: HostCode = match serde_json::from_str(&contents) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {file_path} is not a valid normalized program: {err}");
            return ExitCode::FAILURE;
        }
    };

    let sources = args[2..]
        .iter()
        .fold(SourceTable::new(), |table, name| table.with_source(name.clone()));

    let start = Instant::now();
    match qir_translate::translate(&code, &sources) {
        Ok(expr) => {
            let elapsed = start.elapsed();
            match to_json(&expr) {
                Ok(json) => {
                    eprintln!("translated in: {elapsed:?}");
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("error: translated but could not render QIR as JSON: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(err) => {
            let elapsed = start.elapsed();
            eprintln!("error after: {elapsed:?}\n{err}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    eprintln!("Reading file: {file_path}");
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("Error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("Error reading {file_path}: {err}"));
        }
    }
    match fs::read_to_string(file_path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(format!("Error reading file: {err}")),
    }
}
