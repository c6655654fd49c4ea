//! ANSI colour helpers for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Grey for placeholders such as `--:--`, unchanged otherwise.
pub fn colorize_optional(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() || v == "--:--" || v == "-" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}

/// Clock-in times green, clock-out times red, placeholders grey.
pub fn colorize_in_out(value: &str, is_in: bool) -> String {
    let v = value.trim();
    if v.is_empty() || v == "--:--" || v == "-" {
        return format!("{GREY}{value}{RESET}");
    }
    if is_in {
        format!("{GREEN}{value}{RESET}")
    } else {
        format!("{RED}{value}{RESET}")
    }
}

/// Yellow once `elapsed_hours` passes `max_hours`.
pub fn color_for_elapsed(elapsed_hours: f64, max_hours: f64) -> &'static str {
    if elapsed_hours > max_hours { YELLOW } else { RESET }
}
