use chrono::{TimeZone, Utc};

pub fn handle_version() {
    let git_hash = option_env!("GIT_HASH").unwrap_or("unknown");
    let git_branch = option_env!("GIT_BRANCH").unwrap_or("unknown");

    let build_time_raw = option_env!("BUILD_TIME").unwrap_or("unknown");
    let build_time = build_time_raw
        .parse::<i64>()
        .ok()
        .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| build_time_raw.to_string());

    println!("bot {}", env!("CARGO_PKG_VERSION"));
    println!("Branch:     {}", git_branch);
    println!("Commit:     {}", git_hash);
    println!("Build Time: {}", build_time);
}
