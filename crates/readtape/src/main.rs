use objtape::io::TapeReader;
use objtape::{Block, Classification, TapeErrorKind};
use std::fs::File;
use std::io::BufReader;

/// Version for this program.
const VERSION: &str = "1.0.0";

#[derive(Default)]
struct Args {
    file: String,
    words: bool,
    keep_going: bool,
}

fn print_help() {
    println!("Display the blocks of an object paper tape.\n");
    println!("usage: readtape [OPTIONS] <FILE>\n");
    println!("Options:");
    println!("  -h, --help\t\tPrint this message and quit.");
    println!("  -k, --keep-going\tReport blocks with a bad checksum and move on.");
    println!("  -w, --words\t\tDump the words of each block in octal.");
    println!("  -v, --version\t\tPrint version information.");
    std::process::exit(0);
}

// Parse the arguments given to the program and returns an Args object with the
// given information.
fn parse_arguments() -> Args {
    let mut args = std::env::args();
    let mut res = Args::default();

    // Skip command name.
    args.next();

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => print_help(),
            "-k" | "--keep-going" => res.keep_going = true,
            "-w" | "--words" => res.words = true,
            "-v" | "--version" => {
                println!("readtape {VERSION}");
                std::process::exit(0);
            }
            _ => {
                if arg.starts_with('-') {
                    die(format!("don't know how to handle the '{arg}' flag"));
                }
                if !res.file.is_empty() {
                    die("cannot have multiple tape files".to_string());
                }
                res.file = arg;
            }
        }
    }

    if res.file.is_empty() {
        die("you need to specify the file to be read".to_string());
    }

    res
}

// Print the given `message` and exit(1).
fn die(message: String) {
    eprintln!("error: {message}");
    std::process::exit(1);
}

fn print_block(block: &Block, classification: &Classification, words: bool) {
    println!(
        "{:>8}  leader {:>4}  type {:o}/{:02o}  {:>3} words  {}",
        block.stream_position,
        block.leader_frame_count,
        classification.block_type,
        classification.subtype,
        block.words.len(),
        classification.kind
    );

    if words {
        for chunk in block.words.chunks(8) {
            let line: Vec<String> = chunk.iter().map(|w| format!("{:06o}", w)).collect();
            println!("          {}", line.join(" "));
        }
    }
}

fn main() {
    let args = parse_arguments();

    let Ok(file) = File::open(&args.file) else {
        die(format!("failed to open the given file '{}'", &args.file));
        return;
    };
    let mut reader = TapeReader::new(BufReader::new(file));

    let mut count = 0;
    let mut bad = 0;
    loop {
        let block = match Block::decode(&mut reader) {
            Ok(block) => block,
            Err(e) if e.is_clean_end() => break,
            Err(e) if args.keep_going && e.kind == TapeErrorKind::ChecksumMismatch => {
                eprintln!("warning: {}", e);
                bad += 1;
                continue;
            }
            Err(e) => {
                die(e.to_string());
                return;
            }
        };

        match Classification::of(&block) {
            Ok(classification) => print_block(&block, &classification, args.words),
            Err(e) => {
                die(e.to_string());
                return;
            }
        }
        count += 1;
    }

    println!("{count} blocks, {bad} with a bad checksum");
    if bad > 0 {
        std::process::exit(1);
    }
}
