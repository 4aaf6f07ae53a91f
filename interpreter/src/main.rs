use anyhow::Result;
use clap::Parser;

#[cfg(feature = "dev")]
use jy_lib::core::opcode;
use jy_lib::{compiler, parser, vm};

use std::io::stdout;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    script: PathBuf,

    #[cfg(feature = "dev")]
    #[arg(short = 'a', long)]
    show_ast: bool,

    #[cfg(feature = "dev")]
    #[arg(short = 'b', long)]
    show_byte_code: bool,
}

fn main() -> Result<()> {
    // usage errors exit with code 1, like every other failure
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            std::process::exit(1);
        }
    };
    let src = std::fs::read_to_string(cli.script)?;

    let ast = match parser::parse(&src) {
        Ok(ast) => ast,
        Err(e) => fail(&e),
    };
    #[cfg(feature = "dev")]
    if cli.show_ast {
        println!("{:#?}", ast);
        return Ok(());
    }

    let code = match compiler::compile(&ast) {
        Ok(asm) => asm.assemble(),
        Err(e) => fail(&e),
    };
    #[cfg(feature = "dev")]
    if cli.show_byte_code {
        println!("{}", opcode::disassemble(&code));
        return Ok(());
    }

    let mut out = stdout();
    if let Err(e) = vm::Vm::new(code, &mut out).run() {
        fail(&e);
    }
    Ok(())
}

fn fail(e: &dyn std::fmt::Display) -> ! {
    eprintln!("{}", e);
    std::process::exit(1);
}
