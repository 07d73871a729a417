use crate::context::BridgeContext;
use crate::frontend::config::BridgeConfig;
use crate::interop::DynamicValue;
use crate::logging;
use crate::runtime::{prelude, HostRuntime};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub function: Option<String>,
    pub args: Option<String>,
    pub config_path: Option<PathBuf>,
    pub json_logs: bool,
    pub list: bool,
    pub color: bool,
}

pub struct Cli {
    config: CliConfig,
    bridge: BridgeConfig,
}

impl Cli {
    pub fn new(config: CliConfig) -> Result<Self, String> {
        let mut bridge = match &config.config_path {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::discover(),
        };
        if config.json_logs {
            bridge.logging.json = true;
        }
        Ok(Self { config, bridge })
    }

    pub fn run(&self) -> Result<i32, String> {
        let _guard = logging::init_with_config(self.bridge.logging.to_log_config());

        if self.config.list {
            for name in prelude::PRELUDE {
                println!("{}", name);
            }
            return Ok(0);
        }

        let function = self
            .config
            .function
            .as_deref()
            .ok_or_else(|| "No function specified".to_string())?;

        let mut ctx = BridgeContext::with_config(HostRuntime::with_prelude(), &self.bridge);
        let result = match self.config.args.as_deref() {
            Some(raw) => {
                let args = parse_arguments(raw)?;
                ctx.try_call(function, &args)
            }
            None => ctx.try_call_no_args(function),
        };

        match result {
            Ok(value) => match render_result(&value) {
                Ok(rendered) => {
                    println!("{}", rendered);
                    Ok(0)
                }
                Err(msg) => {
                    self.print_error(&msg);
                    Ok(1)
                }
            },
            Err(error) => {
                self.print_error(&error.to_string());
                Ok(1)
            }
        }
    }

    fn print_error(&self, msg: &str) {
        if self.config.color {
            eprintln!("\x1b[31m{}\x1b[0m", msg);
        } else {
            eprintln!("{}", msg);
        }
    }
}

/// Parse a JSON array into call arguments
pub fn parse_arguments(raw: &str) -> Result<Vec<DynamicValue>, String> {
    match serde_json::from_str::<DynamicValue>(raw) {
        Ok(DynamicValue::List(items)) => Ok(items),
        Ok(other) => Err(format!(
            "Arguments must be a JSON array, got {}",
            other.type_name()
        )),
        Err(e) => Err(format!("Invalid arguments: {}", e)),
    }
}

/// Render a call result as JSON
///
/// JSON has no spelling for NaN or infinities, and serde_json would print
/// them as `null`.
pub fn render_result(value: &DynamicValue) -> Result<String, String> {
    if let Some(f) = non_finite(value) {
        return Err(format!("Result contains {}, which has no JSON representation", f));
    }
    serde_json::to_string(value).map_err(|e| format!("Failed to render result: {}", e))
}

fn non_finite(value: &DynamicValue) -> Option<f64> {
    match value {
        DynamicValue::Float(f) if !f.is_finite() => Some(*f),
        DynamicValue::List(items) => items.iter().find_map(non_finite),
        _ => None,
    }
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {} [OPTIONS] <function> [ARGS_JSON]\n\nOptions:\n  \
         --config FILE   Load bridge configuration from FILE\n  \
         --json-logs     Emit logs as JSON\n  \
         --no-color      Disable colored output\n  \
         --list          List prelude functions\n\n\
         Examples:\n  \
         {} sum '[[1, 2, 3]]'\n  \
         {} concat '[\"hello, \", \"world\"]'",
        prog, prog, prog
    )
}

pub fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let prog = args.first().map(String::as_str).unwrap_or("callbridge");

    if args.len() < 2 {
        return Err(usage(prog));
    }

    let mut config = CliConfig {
        color: true,
        ..CliConfig::default()
    };
    let mut positional = Vec::new();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Err(usage(prog)),
            "--json-logs" => config.json_logs = true,
            "--no-color" => config.color = false,
            "--list" => config.list = true,
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires an argument".to_string());
                }
                config.config_path = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with("--") => {
                return Err(format!("Unknown option: {}", arg));
            }
            value => positional.push(value.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    config.function = positional.next();
    config.args = positional.next();

    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    if config.function.is_none() && !config.list {
        return Err("No function specified".to_string());
    }

    Ok(config)
}

/// Entry point for CLI binary
pub fn main() -> Result<i32, String> {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args)?;
    Cli::new(config)?.run()
}
