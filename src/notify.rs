//! Best-effort desktop notifications. Failures are logged and swallowed;
//! a missing notification daemon must never fail an update run.

pub fn info(title: &str, message: &str) {
    send(title, message, "normal");
}

pub fn warn(title: &str, message: &str) {
    send(title, message, "critical");
}

fn send(title: &str, message: &str, urgency: &str) {
    match spawn_notifier(title, message, urgency) {
        Ok(None) => {}
        Ok(Some(status)) if status.success() => {}
        Ok(Some(status)) => {
            tracing::warn!("desktop notification command exited with {status}");
        }
        Err(err) => tracing::warn!("could not send desktop notification: {err}"),
    }
}

#[cfg(target_os = "linux")]
fn spawn_notifier(
    title: &str,
    message: &str,
    urgency: &str,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    std::process::Command::new("notify-send")
        .args(["-u", urgency, title, message])
        .status()
        .map(Some)
}

#[cfg(target_os = "macos")]
fn spawn_notifier(
    title: &str,
    message: &str,
    _urgency: &str,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let script = format!("display notification \"{message}\" with title \"{title}\"");
    std::process::Command::new("osascript")
        .args(["-e", &script])
        .status()
        .map(Some)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn spawn_notifier(
    _title: &str,
    _message: &str,
    _urgency: &str,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    Ok(None)
}
