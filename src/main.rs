use clap::{Arg, ArgMatches, Command};
use color_eyre::eyre::{Report, Result};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use lexfa::{to_dot, Lex, LexError, RegEx, DFA, FA, NFA};

fn automaton_file_arg() -> Arg {
    Arg::new("file")
        .value_name("SPEC FILE")
        .help("The automaton specification file")
        .value_parser(clap::value_parser!(PathBuf))
        .required(true)
}

fn input_strings_arg() -> Arg {
    Arg::new("strings")
        .value_name("STRING")
        .help("Strings to run through the automaton")
        .num_args(1..)
        .value_parser(clap::value_parser!(String))
        .required(true)
}

fn dot_arg() -> Arg {
    Arg::new("dot")
        .long("dot")
        .value_name("DOT FILE")
        .help("Write the automaton out as a Graphviz DOT graph")
        .value_parser(clap::value_parser!(PathBuf))
}

fn build_cli() -> Command {
    Command::new("lexfa")
        .version("0.1.0")
        .about("Simulate finite automata, compile regular expressions and tokenize source files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("dfa")
                .about("Load a DFA specification file and simulate it on each string")
                .arg(automaton_file_arg())
                .arg(input_strings_arg())
                .arg(dot_arg()),
        )
        .subcommand(
            Command::new("nfa")
                .about("Load an NFA specification file, convert it to a DFA and simulate it on each string")
                .arg(automaton_file_arg())
                .arg(input_strings_arg())
                .arg(
                    Arg::new("save-dfa")
                        .long("save-dfa")
                        .value_name("DFA FILE")
                        .help("Save the DFA obtained after Subset Construction in the specification format")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(dot_arg()),
        )
        .subcommand(
            Command::new("regex")
                .about("Compile a regular expression and simulate it on each string")
                .arg(
                    Arg::new("alphabet")
                        .short('a')
                        .long("alphabet")
                        .value_name("ALPHABET")
                        .help("Every character of this argument is a symbol of the alphabet")
                        .value_parser(clap::value_parser!(String))
                        .required(true),
                )
                .arg(
                    Arg::new("expression")
                        .value_name("REGEX")
                        .help("The regular expression. Use e for the empty string and \\ to escape an operator")
                        .value_parser(clap::value_parser!(String))
                        .required(true),
                )
                .arg(input_strings_arg())
                .arg(dot_arg()),
        )
        .subcommand(
            Command::new("lex")
                .about("Tokenize a source file with the token types of a token definition file")
                .arg(
                    Arg::new("tokens")
                        .value_name("TOKEN FILE")
                        .help("Alphabet on the first line, then one NAME REGEX pair per line. Earlier token types win ties")
                        .value_parser(clap::value_parser!(PathBuf))
                        .required(true),
                )
                .arg(
                    Arg::new("input")
                        .value_name("INPUT SOURCE FILE")
                        .help("The program source file which should be scanned and tokenized")
                        .value_parser(clap::value_parser!(PathBuf))
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("OUTPUT RESULT FILE")
                        .help("The output file to store the lexer's output")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("save-lexer")
                        .long("save-lexer")
                        .value_name("JSON FILE")
                        .help("Save the compiled token table as json")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn input_strings(args: &ArgMatches) -> Vec<&String> {
    args.get_many::<String>("strings")
        .map(|strings| strings.collect())
        .unwrap_or_default()
}

fn report_simulation<F: Fn(&str) -> bool>(strings: &[&String], simulate: F) {
    for input in strings {
        let verdict = if simulate(input.as_str()) { "accepted" } else { "rejected" };
        println!("{:?}: {}", input, verdict);
    }
}

fn write_dot<T: FA>(args: &ArgMatches, fa: &T) -> Result<()> {
    if let Some(dot_path) = args.get_one::<PathBuf>("dot") {
        let mut dot_file = File::create(dot_path)?;
        write!(dot_file, "{}", to_dot(fa))?;
        info!("Wrote DOT graph to {}", dot_path.display());
    }
    Ok(())
}

fn run_dfa(args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        return Ok(());
    };
    let dfa = DFA::from_file(path)?;

    report_simulation(&input_strings(args), |input| dfa.simulate(input));
    write_dot(args, &dfa)
}

fn run_nfa(args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        return Ok(());
    };
    let nfa = NFA::from_file(path)?;
    let dfa = nfa.to_dfa();

    report_simulation(&input_strings(args), |input| dfa.simulate(input));

    if let Some(dfa_path) = args.get_one::<PathBuf>("save-dfa") {
        let mut dfa_file = File::create(dfa_path)?;
        write!(dfa_file, "{}", dfa.to_spec())?;
        info!("Saved DFA to {}", dfa_path.display());
    }

    write_dot(args, &dfa)
}

fn run_regex(args: &ArgMatches) -> Result<()> {
    let alphabet: Vec<char> = args
        .get_one::<String>("alphabet")
        .map(|alphabet| alphabet.chars().collect())
        .unwrap_or_default();
    let expression = args
        .get_one::<String>("expression")
        .map(String::as_str)
        .unwrap_or_default();

    let regex = RegEx::new(&alphabet, expression)?;

    report_simulation(&input_strings(args), |input| regex.simulate(input));
    write_dot(args, regex.dfa())
}

fn run_lex(args: &ArgMatches) -> Result<()> {
    let (Some(token_path), Some(src_path)) = (
        args.get_one::<PathBuf>("tokens"),
        args.get_one::<PathBuf>("input"),
    ) else {
        return Ok(());
    };

    let mut lex = Lex::from_file(token_path)?;

    if let Some(json_path) = args.get_one::<PathBuf>("save-lexer") {
        lex.save(json_path)?;
        info!("Saved lexer to {}", json_path.display());
    }

    lex.scan_file(src_path)?;

    let mut out: Box<dyn Write> = match args.get_one::<PathBuf>("output") {
        Some(out_path) => Box::new(File::create(out_path)?),
        None => Box::new(std::io::stdout()),
    };

    loop {
        match lex.next_token() {
            Ok(token) => writeln!(out, "{}", token)?,
            Err(LexError::EndOfInput) => break,
            Err(err) => return Err(Report::new(err)),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = build_cli().get_matches();

    match args.subcommand() {
        Some(("dfa", sub_args)) => run_dfa(sub_args),
        Some(("nfa", sub_args)) => run_nfa(sub_args),
        Some(("regex", sub_args)) => run_regex(sub_args),
        Some(("lex", sub_args)) => run_lex(sub_args),
        _ => Ok(()),
    }
}
