use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use varwatch_core::{watch, VarwatchError, WatchRequest};
use varwatch_utils::{debug, init_logging, LogLevel};

/// Exit status when logging cannot be set up
const EXIT_LOGGING: i32 = 1;
// Usage errors exit with 2, which clap does on its own.
const EXIT_SYMBOL_NOT_FOUND: i32 = 3;
const EXIT_UNDEFINED_SYMBOL: i32 = 4;
const EXIT_UNSUPPORTED_WIDTH: i32 = 5;
const EXIT_BAD_BINARY: i32 = 6;
const EXIT_LAUNCH: i32 = 7;
const EXIT_BASE_ADDRESS: i32 = 8;
const EXIT_RUNTIME: i32 = 9;

/// Watch every read and write of a global variable using hardware watchpoints.
///
/// Each access is printed to stdout as `<symbol>\tread\t<value>` or
/// `<symbol>\twrite\t<previous> -> <current>`. When the target finishes,
/// varwatch exits with the target's exit status.
#[derive(Parser, Debug)]
#[command(name = "varwatch")]
#[command(version)]
#[command(about = "Watch every read and write of a global variable using hardware watchpoints")]
struct Cli
{
    /// Name of the global variable to watch (exact symbol table name)
    #[arg(long = "var", value_name = "NAME")]
    symbol: String,

    /// Executable to launch under supervision
    #[arg(long = "exec", value_name = "PATH")]
    executable: PathBuf,

    /// Log level for diagnostics on stderr (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Arguments passed to the executable, after `--`
    #[arg(last = true, value_name = "ARG")]
    args: Vec<String>,
}

impl Cli
{
    fn into_request(self) -> WatchRequest
    {
        WatchRequest {
            symbol: self.symbol,
            executable: self.executable,
            args: self.args,
        }
    }
}

/// Process exit status for a fatal error
fn exit_code_for(error: &VarwatchError) -> i32
{
    match error {
        VarwatchError::SymbolNotFound { .. } => EXIT_SYMBOL_NOT_FOUND,
        VarwatchError::UndefinedSymbol { .. } => EXIT_UNDEFINED_SYMBOL,
        VarwatchError::UnsupportedWatchWidth(_) => EXIT_UNSUPPORTED_WIDTH,
        VarwatchError::ReadBinary { .. }
        | VarwatchError::NotAnExecutable(_)
        | VarwatchError::UnsupportedFormat(_)
        | VarwatchError::MalformedBinary(_) => EXIT_BAD_BINARY,
        VarwatchError::InvalidArgument(_)
        | VarwatchError::LaunchFailed(_)
        | VarwatchError::ExecFailed { .. }
        | VarwatchError::UnexpectedInitialStop(_) => EXIT_LAUNCH,
        VarwatchError::BaseAddressNotFound { .. } => EXIT_BASE_ADDRESS,
        VarwatchError::AddressOutOfRange { .. }
        | VarwatchError::MemoryAccessFailed { .. }
        | VarwatchError::DebugRegisterAccess { .. }
        | VarwatchError::TraceControl { .. }
        | VarwatchError::Io(_) => EXIT_RUNTIME,
    }
}

fn run() -> i32
{
    let cli = Cli::parse();

    // Held until the run finishes so the file log gets flushed
    let _guard = match init_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_LOGGING;
        }
    };

    let request = cli.into_request();
    debug!(?request, "Starting watch");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match watch(&request, &mut out) {
        Ok(summary) => summary.exit.exit_code(),
        Err(err) => {
            debug!(category = ?err.category(), "Watch failed");
            eprintln!("error: {err}");
            exit_code_for(&err)
        }
    }
}

fn main()
{
    process::exit(run());
}

#[cfg(test)]
mod tests
{
    use std::path::Path;

    use super::*;

    #[test]
    fn test_parse_options_in_either_order()
    {
        let cli = Cli::try_parse_from(["varwatch", "--var", "g_value", "--exec", "./target"]).unwrap();
        assert_eq!(cli.symbol, "g_value");
        assert_eq!(cli.executable, Path::new("./target"));
        assert!(cli.args.is_empty());

        let cli = Cli::try_parse_from(["varwatch", "--exec", "./target", "--var", "g_value"]).unwrap();
        assert_eq!(cli.symbol, "g_value");
        assert_eq!(cli.executable, Path::new("./target"));
    }

    #[test]
    fn test_trailing_arguments_are_verbatim()
    {
        let cli = Cli::try_parse_from([
            "varwatch", "--var", "g_value", "--exec", "./target", "--", "--var", "-x", "two words",
        ])
        .unwrap();
        assert_eq!(cli.args, vec!["--var", "-x", "two words"]);

        let request = cli.into_request();
        assert_eq!(request.args.len(), 3);
        assert_eq!(request.symbol, "g_value");
    }

    #[test]
    fn test_log_level_flag()
    {
        let cli =
            Cli::try_parse_from(["varwatch", "--log-level", "debug", "--var", "x", "--exec", "/bin/true"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));

        assert!(Cli::try_parse_from(["varwatch", "--log-level", "loud", "--var", "x", "--exec", "/bin/true"]).is_err());
    }

    #[test]
    fn test_missing_required_options()
    {
        assert!(Cli::try_parse_from(["varwatch", "--exec", "./target"]).is_err());
        assert!(Cli::try_parse_from(["varwatch", "--var", "g_value"]).is_err());
        assert!(Cli::try_parse_from(["varwatch"]).is_err());

        let err = Cli::try_parse_from(["varwatch", "--exec", "./target"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes_are_distinct()
    {
        let cases = [
            (
                VarwatchError::SymbolNotFound {
                    name: "x".to_string(),
                    path: PathBuf::from("/t"),
                },
                3,
            ),
            (VarwatchError::UndefinedSymbol { name: "x".to_string() }, 4),
            (VarwatchError::UnsupportedWatchWidth(3), 5),
            (VarwatchError::NotAnExecutable("magic".to_string()), 6),
            (VarwatchError::MalformedBinary("shoff".to_string()), 6),
            (
                VarwatchError::ExecFailed {
                    path: PathBuf::from("/t"),
                    source: io::Error::from(io::ErrorKind::PermissionDenied),
                },
                7,
            ),
            (
                VarwatchError::BaseAddressNotFound {
                    pid: 1,
                    path: PathBuf::from("/t"),
                },
                8,
            ),
            (
                VarwatchError::TraceControl {
                    operation: "PTRACE_CONT",
                    source: io::Error::from(io::ErrorKind::NotFound),
                },
                9,
            ),
            (VarwatchError::Io(io::Error::from(io::ErrorKind::BrokenPipe)), 9),
        ];

        for (error, expected) in cases {
            assert_eq!(exit_code_for(&error), expected, "{error}");
        }
    }

    #[test]
    fn test_cli_definition_is_valid()
    {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
