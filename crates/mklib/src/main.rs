use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use objtape::{parse_policy, Library, LibraryPolicy, ObjectFile};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Assembles multiple object tapes into a single library tape.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Object tapes to be put in the library, in the given order.
    files: Vec<String>,

    /// Place the output into the given <OUT> file. The standard output is used
    /// when this argument is not given.
    #[arg(short = 'o', long)]
    out: Option<String>,

    /// TOML file with the leader lengths to be used. See the documentation for
    /// more information on this format.
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Be more verbose. Pass it twice to trace every block.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// Install the subscriber for the logs produced by the library. The `RUST_LOG`
// environment variable takes precedence over the `verbose` flag.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

// Returns the library policy as given by the configuration file at `path`, or
// the default one.
fn load_policy(path: Option<&String>) -> Result<LibraryPolicy> {
    let Some(path) = path else {
        return Ok(LibraryPolicy::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read configuration file '{}'", path))?;
    match parse_policy(&text) {
        Ok(policy) => Ok(policy),
        Err(e) => bail!("{}: {}", path, e),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.files.is_empty() {
        bail!("you need to specify at least one object file");
    }
    let policy = load_policy(args.config.as_ref())?;
    info!(
        long_leader = policy.long_leader,
        short_leader = policy.short_leader,
        "library policy"
    );

    // Read all the object files. Each file is closed as soon as it has been
    // read.
    let mut library = Library::new(policy);
    for file in &args.files {
        match ObjectFile::from_path(Path::new(file)) {
            Ok(object) => library.push(object),
            Err(e) => {
                error!(file = file.as_str(), "could not read object file");
                eprintln!("error: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    }

    // Select the output stream.
    info!(
        output = args.out.as_deref().unwrap_or("<stdout>"),
        files = library.files().len(),
        "assembling library"
    );
    let output: Box<dyn Write> = match &args.out {
        Some(out) => Box::new(
            File::create(out).with_context(|| format!("could not create '{}'", out))?,
        ),
        None => Box::new(io::stdout()),
    };

    if let Err(e) = library.assemble(BufWriter::new(output)) {
        error!("library assembly failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_without_config() {
        let policy = load_policy(None).unwrap();
        assert_eq!(policy, LibraryPolicy::default());
    }

    #[test]
    fn policy_from_config_file() {
        let dir = std::env::temp_dir().join(format!("mklib-policy-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.toml");
        std::fs::write(&good, "[library]\nlong_leader = 12\nshort_leader = 3\n").unwrap();
        let policy = load_policy(Some(&good.display().to_string())).unwrap();
        assert_eq!(policy.long_leader, 12);
        assert_eq!(policy.short_leader, 3);

        let bad = dir.join("bad.toml");
        std::fs::write(&bad, "[library]\nlong_leader = -1\n").unwrap();
        let bad = bad.display().to_string();
        let err = load_policy(Some(&bad)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("{}: 'long_leader' cannot be negative", bad)
        );

        let missing = dir.join("missing.toml").display().to_string();
        assert!(load_policy(Some(&missing)).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
