use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use log::{info, LevelFilter};

use yul_suite::analysis::analyze_strict;
use yul_suite::backend::GasMeter;
use yul_suite::dialect::{Dialect, DialectKind};
use yul_suite::opts::Opts;
use yul_suite::passes::{DebugMode, OptimiserError, OptimiserSuite, Settings};
use yul_suite::utils::{Diagnostic, Reporter};
use yul_suite::yul::ast::Object;
use yul_suite::yul::printer::Printer;
use yul_suite::yul::{error_span, YulParser};

const OUTPUT_WIDTH: usize = 80;

fn read_input(file: &Option<PathBuf>) -> io::Result<(Cow<'_, str>, String)> {
    if let Some(file) = file {
        let filename = file.to_string_lossy();
        let src = fs::read_to_string(file)?;

        Ok((filename, src))
    } else {
        let filename = Cow::from("<stdin>");
        let src = io::read_to_string(io::stdin())?;

        Ok((filename, src))
    }
}

fn write_output(object: &Object, file: &Option<PathBuf>) -> io::Result<()> {
    let mut out: Box<dyn io::Write> = if let Some(path) = file {
        Box::new(File::create(path)?)
    } else {
        Box::new(io::stdout())
    };

    writeln!(out, "{}", Printer::object(object, OUTPUT_WIDTH))
}

fn init_logging(opts: &Opts) {
    let level = if opts.debug == DebugMode::None {
        opts.log_level
    } else {
        opts.log_level.max(LevelFilter::Info)
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    init_logging(&opts);

    let (filename, src) = match read_input(&opts.file) {
        Ok(result) => result,
        Err(err) => {
            Reporter::new("", "").emit(&Diagnostic::from(err));

            return ExitCode::FAILURE;
        }
    };

    let mut reporter = Reporter::new(&filename, &src);

    let mut object = match YulParser::parse_object(&src) {
        Ok(result) => result,
        Err(err) => {
            reporter.emit(
                &Diagnostic::error()
                    .with_message("syntax error")
                    .with_primary(error_span(&err), err.variant.message()),
            );

            return ExitCode::FAILURE;
        }
    };

    let dialect = Dialect::new(opts.dialect);

    if let Err(err) = analyze_strict(&dialect, &object) {
        reporter.emit(
            &Diagnostic::error()
                .with_message(err.to_string())
                .with_note(format!("in object `{}`", object.name)),
        );

        return ExitCode::FAILURE;
    }

    let meter = (opts.dialect == DialectKind::Evm)
        .then(|| GasMeter::new(opts.runs, opts.creation));
    let reserved: BTreeSet<_> = opts.reserve.iter().cloned().collect();
    let settings = Settings {
        optimize_stack_allocation: opts.optimize_stack_allocation,
        custom_sequence: opts.steps.clone(),
        max_rounds: opts.max_rounds,
        debug: opts.debug,
        ..Settings::default()
    };

    let stats = match OptimiserSuite::run(
        &dialect,
        meter.as_ref(),
        &mut object,
        &reserved,
        &settings,
    ) {
        Ok(stats) => stats,
        Err(err @ OptimiserError::Sequence(_)) => {
            reporter.emit(
                &Diagnostic::error()
                    .with_message(err.to_string())
                    .with_note("the sequence was given by `--steps`"),
            );

            return ExitCode::FAILURE;
        }
        Err(err) => {
            reporter.emit(&Diagnostic::error().with_message(err.to_string()));

            return ExitCode::FAILURE;
        }
    };

    info!(
        "{} of {} stability loops hit the round limit",
        stats.capped_loops,
        stats.loops.len()
    );

    if !stats.stack_fits {
        reporter.emit(
            &Diagnostic::warning()
                .with_message("code may not fit into the stack")
                .with_note(format!(
                    "gave up after {} compression rounds",
                    stats.stack_compression_iterations
                )),
        );
    }

    if let Err(err) = write_output(&object, &opts.output) {
        reporter.emit(&Diagnostic::from(err));

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
