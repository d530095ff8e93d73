use std::io::IsTerminal;
use std::time::Instant;

use pidview::ansi::AnsiDecoder;
use pidview::capture::ProcessCapture;
use pidview::config::{load_config, resolve_config_source};
use pidview::headless::{run_headless, HeadlessOptions};
use pidview::logging::{init_file_logging, log_path_from_env};
use pidview::session::LogSession;
use pidview::tui::run_viewer;
use pidview::ui::{MessageBlock, OutputMode, PlainRenderer, Renderer};
use pidview::{parse_command, print_usage, Command};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output_mode = OutputMode::from_env();
    let run = match parse_command(args) {
        Ok(Command::Run(run)) => run,
        Ok(Command::Help) => {
            print_usage();
            return;
        }
        Err(err) => {
            let mut renderer = PlainRenderer::stderr(output_mode);
            let _ = renderer.error_block(
                &MessageBlock::new("Invalid command arguments", err.to_string())
                    .with_hint("Run `pidview --help` to see supported options"),
            );
            print_usage();
            std::process::exit(2);
        }
    };

    if let Some(path) = log_path_from_env() {
        if let Err(err) = init_file_logging(&path) {
            let mut renderer = PlainRenderer::stderr(output_mode);
            let _ = renderer.warning_block(&MessageBlock::new(
                "Diagnostic logging disabled",
                format!("{}: {err}", path.display()),
            ));
        }
    }

    let config = match load_config(&resolve_config_source(run.config.as_deref())) {
        Ok(config) => config,
        Err(err) => {
            let mut renderer = PlainRenderer::stderr(output_mode);
            let _ = renderer.error_block(&MessageBlock::new("Invalid configuration", err.to_string()));
            std::process::exit(2);
        }
    };
    let spec = match run.launch_spec(&config) {
        Ok(spec) => spec,
        Err(err) => {
            let mut renderer = PlainRenderer::stderr(output_mode);
            let _ = renderer.error_block(
                &MessageBlock::new("Nothing to capture", err.to_string())
                    .with_hint("Pass a command, e.g. `pidview pidcat com.example.app`"),
            );
            std::process::exit(2);
        }
    };

    let mut capture_options = config.capture_options();
    if let Some(mode) = run.mode {
        capture_options.mode = mode;
    }
    let capture = ProcessCapture::new(AnsiDecoder::new(config.palette()), capture_options);
    let mut session = LogSession::new(capture, config.noise_filter(), config.search_engine());

    let plain = run.plain || !std::io::stdout().is_terminal();
    if plain {
        let options = HeadlessOptions {
            grep: run.grep.clone(),
            ignore_case: run.ignore_case,
            export: run.export.clone(),
        };
        let mut renderer = PlainRenderer::stdout(output_mode);
        match run_headless(&mut session, spec, &options, &mut renderer) {
            Ok(summary) => {
                let _ = renderer.flush();
                let mut status = PlainRenderer::stderr(output_mode);
                let _ = status.session_summary(&summary);
                if summary.abnormal {
                    std::process::exit(1);
                }
            }
            Err(err) => {
                let _ = renderer.flush();
                let mut renderer = PlainRenderer::stderr(output_mode);
                let _ = renderer.error_block(&MessageBlock::new("Capture failed", err.to_string()));
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(query) = run.grep.as_deref() {
        if run.ignore_case {
            session.set_case_sensitive(false);
        }
        session.set_query(query, Instant::now());
        session.commit_query();
    }
    if let Err(err) = run_viewer(&mut session, spec) {
        let mut renderer = PlainRenderer::stderr(output_mode);
        let _ = renderer.error_block(&MessageBlock::new("Viewer failed", err.to_string()));
        std::process::exit(1);
    }
}
