mod back;
mod error;
mod front;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use log::debug;

use error::{CompileResult, DiagnosticReporter};
use front::parser::Parser;
use front::source::SourceBuffer;

fn usage() {
    println!("usage: rcc1 <file.c>");
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 1 {
        usage();
        process::exit(1);
    }
    if let Err(code) = run(&args[0]) {
        process::exit(code);
    }
}

fn run(path: &str) -> Result<(), i32> {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("rcc1: error: could not read {path}: {e}");
            return Err(1);
        }
    };

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(path.to_string(), source.clone());
    let buf = SourceBuffer::new(path, source, 0);

    match compile(&buf) {
        Ok(assembly) => {
            let out_path = PathBuf::from(path).with_extension("s");
            if let Err(e) = fs::write(&out_path, assembly) {
                eprintln!("rcc1: error: could not write {}: {e}", out_path.display());
                return Err(1);
            }
            debug!("wrote {}", out_path.display());
            Ok(())
        }
        Err(err) => {
            reporter.report(file_id, &err);
            Err(1)
        }
    }
}

fn compile(buf: &SourceBuffer) -> CompileResult<String> {
    let mut parser = Parser::new(buf)?;
    let tu = parser.parse_translation_unit()?;
    let ctx = parser.into_context();
    back::generate_assembly(&ctx, &tu)
}
