use libcodeledger_core::LedgerError;
use serde::Serialize;
use crate::cli::Cli;

/// JSON response envelope, one per session command
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub schema_version: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Serialize)]
pub struct JsonError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// Human-readable rendering of a command result
pub trait Human {
    fn human(&self) -> String;
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"schema_version\":1,\"ok\":false,\"error\":{{\"code\":\"internal_error\",\"message\":\"{}\"}}}}", e))
}

/// Output a successful result
pub fn output_success<T: Serialize + Human>(cli: &Cli, data: T) {
    if cli.json {
        let response = JsonResponse {
            schema_version: 1,
            ok: true,
            data: Some(data),
            error: None,
        };
        println!("{}", to_json(&response));
    } else if !cli.quiet {
        let text = data.human();
        if !text.is_empty() {
            println!("{}", text.trim_end_matches('\n'));
        }
    }
}

/// Output an error
pub fn output_error(cli: &Cli, err: &LedgerError) {
    if cli.json {
        let suggestions = err.suggestions();
        let details = if suggestions.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::json!({ "suggestions": suggestions })
        };

        let response: JsonResponse<()> = JsonResponse {
            schema_version: 1,
            ok: false,
            data: None,
            error: Some(JsonError {
                code: err.error_code().to_string(),
                message: err.to_string(),
                details,
            }),
        };
        eprintln!("{}", to_json(&response));
    } else {
        eprintln!("error: {}", err);
        let suggestions = err.suggestions();
        if !suggestions.is_empty() {
            eprintln!();
            eprintln!("Suggestions:");
            for suggestion in suggestions {
                eprintln!("  - {}", suggestion);
            }
        }
    }
}

/// Print human-readable output (ignored in quiet and JSON modes)
pub fn print_human(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        println!("{}", msg);
    }
}
