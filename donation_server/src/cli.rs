use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Only variables without secrets are listed here
    const DISPLAY_ENVS: [&str; 20] = [
        "RUST_LOG",
        "DPG_HOST",
        "DPG_PORT",
        "DPG_DATABASE_URL",
        "DPG_GATEWAY_KEY_ID",
        "DPG_GATEWAY_BASE_URL",
        "DPG_GATEWAY_TIMEOUT",
        "DPG_CURRENCY",
        "DPG_RECEIPT_PREFIX",
        "DPG_MIN_AMOUNT",
        "DPG_MAX_AMOUNT",
        "DPG_PHONE_PATTERN",
        "DPG_DEDUP_WINDOW",
        "DPG_RATE_LIMIT_WINDOW",
        "DPG_RATE_LIMIT_MAX",
        "DPG_RATE_LIMIT_SKIP_SUCCESSFUL",
        "DPG_USE_X_FORWARDED_FOR",
        "DPG_USE_FORWARDED",
        "DPG_ALLOWED_ORIGINS",
        "DPG_PENDING_DONATION_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let webhook = if env::var("DPG_NOTIFICATION_WEBHOOK_URL").is_ok() { "Set (hidden)" } else { "Not set" };
    println!("  {:<35} {webhook:<15}", "DPG_NOTIFICATION_WEBHOOK_URL");
}
