//! Pex CLI
//!
//! Evaluate percent-expressions and RPN formulas from a shell.

use pexc::commands::{dispatch, COMMANDS};

fn main() {
    pexc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = args[1].as_str();
    match command {
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => println!("pex {}", env!("CARGO_PKG_VERSION")),
        _ => match dispatch(command, &args[2..]) {
            Some(Ok(report)) => {
                for diagnostic in &report.diagnostics {
                    eprintln!("warning: {diagnostic}");
                }
                for line in &report.lines {
                    println!("{line}");
                }
            }
            Some(Err(e)) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
            None => {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
    }
}

fn print_usage() {
    println!("Pex - percent-expression and RPN formula evaluator");
    println!();
    println!("Usage:");
    for (_, usage) in COMMANDS {
        println!("  {usage}");
    }
    println!("  pex help");
    println!("  pex version");
    println!();
    println!("Options:");
    println!("  -p, --param <key=value>  Define a parameter (value is a percent-expression)");
    println!("  --scope <a,b>            Only resolve keys from providers with these scopes");
    println!("  --env                    Fall back to environment variables (scope `env`)");
    println!("  --dialect <name>         Formula dialect: percent, rpn, rpn-percents (default)");
    println!("  -r, --raw                Print values without the `<type>: ` prefix");
    println!("  --                       Treat the remaining arguments as input");
    println!();
    println!("Examples:");
    println!("  pex eval -p name=world 'hello %name'");
    println!("  pex eval '%{{=upper:%{{=env:USER}}}}'");
    println!("  pex rpn -p x=3 ',%x,'0,>,'pos,'neg,?:'");
    println!("  pex infix --dialect rpn ',a,b,+,c,*'");
    println!();
    println!("Set RUST_LOG=pex_eval=debug for evaluation logs, PEX_LOG_TREE=1 to nest them.");
}
