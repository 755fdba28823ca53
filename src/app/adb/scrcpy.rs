use crate::app::config::ScrcpySettings;

/// Arguments for the mirroring tool. Default settings yield no arguments, so
/// scrcpy picks its own default device target.
pub fn build_scrcpy_args(settings: &ScrcpySettings) -> Vec<String> {
    let mut args = Vec::new();
    if settings.stay_awake {
        args.push("--stay-awake".to_string());
    }
    if settings.turn_screen_off {
        args.push("--turn-screen-off".to_string());
    }
    if !settings.bit_rate.trim().is_empty() {
        args.push("--video-bit-rate".to_string());
        args.push(settings.bit_rate.trim().to_string());
    }
    if settings.max_size > 0 {
        args.push("--max-size".to_string());
        args.push(settings.max_size.to_string());
    }
    args.extend(settings.extra_args.split_whitespace().map(str::to_string));
    args
}

pub fn version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

pub fn parse_scrcpy_major(output: &str) -> i32 {
    let lower = output.to_lowercase();
    for token in lower.split_whitespace() {
        let token = token.trim_start_matches("scrcpy").trim_start_matches('v');
        if let Some(major) = token.split('.').next() {
            if let Ok(value) = major.parse::<i32>() {
                return value;
            }
        }
    }
    2
}
