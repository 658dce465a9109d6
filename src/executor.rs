use crate::goenv::{EnvironmentPort, GoPaths};
use crate::gotool::GoTool;
use crate::interrupt;
use crate::inventory;
use crate::notify;
use crate::print;
use crate::version::Package;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

pub struct UpdateOptions {
    /// Redirect installs to a scratch directory instead of $GOBIN.
    pub dry_run: bool,
    /// Send a desktop notification with the aggregate outcome.
    pub notify: bool,
    /// Upper bound on simultaneously running go subprocesses.
    pub jobs: usize,
    /// Binaries installed from @main/@master instead of @latest.
    pub main_pkgs: Vec<String>,
}

/// One worker's outcome, sent over the results channel and consumed
/// exactly once by the reporting loop.
pub struct UpdateResult {
    pub pkg: Package,
    pub err: Option<String>,
}

/// Fixed-width "[i/N]" counter. Both sides are zero-padded to the digit
/// count of N so result lines align.
pub fn count_format(seq: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{seq:0width$}/{total:0width$}]")
}

/// Update every package, at most `opts.jobs` installs in flight at once.
///
/// All workers are launched eagerly; the semaphore bounds how many hold
/// a slot and therefore how many go subprocesses run simultaneously.
/// Results are printed in completion order, one line per package.
/// Returns the process exit code.
pub async fn run_update(
    tool: Arc<dyn GoTool>,
    env: Arc<dyn EnvironmentPort>,
    pkgs: Vec<Package>,
    opts: UpdateOptions,
) -> i32 {
    let mut exit = 0;
    let total = pkgs.len();
    let paths = Arc::new(Mutex::new(GoPaths::new(env.as_ref())));

    print::info("update binary under $GOPATH/bin or $GOBIN");

    let mut watcher = None;
    if opts.dry_run {
        if let Err(err) = paths.lock().unwrap().enter_rehearsal(env.as_ref()) {
            print::err(&format!("can not change to dry run mode: {err}"));
            if opts.notify {
                notify::warn("binup", "Can not change to dry run mode");
            }
            return 1;
        }
        // Registered only after redirection succeeded; a signal from here
        // on must restore the environment before the process dies.
        watcher = Some(interrupt::watch_rehearsal(
            Arc::clone(&paths),
            Arc::clone(&env),
        ));
    }

    let semaphore = Arc::new(Semaphore::new(opts.jobs.max(1)));
    let (tx, mut rx) = mpsc::channel::<UpdateResult>(total.max(1));
    let main_pkgs: Arc<HashSet<String>> = Arc::new(opts.main_pkgs.iter().cloned().collect());

    for pkg in pkgs {
        let semaphore = Arc::clone(&semaphore);
        let tool = Arc::clone(&tool);
        let main_pkgs = Arc::clone(&main_pkgs);
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut pkg = pkg;
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    let _ = tx.send(UpdateResult { pkg, err: Some(err.to_string()) }).await;
                    return;
                }
            };

            let err = if pkg.import_path.is_empty() {
                Some(format!(
                    "{} is not installed by 'go install' (or permission incorrect)",
                    pkg.name
                ))
            } else {
                let installed = if main_pkgs.contains(&pkg.name) {
                    tool.install_main_or_master(&pkg.import_path)
                } else {
                    tool.install_latest(&pkg.import_path)
                };
                installed.err().map(|err| format!("{} {}", pkg.name, err))
            };

            // Refresh even after a failure so the report shows the
            // best-known state.
            pkg.version.latest = tool.binary_version(&pkg.name);
            drop(permit);
            let _ = tx.send(UpdateResult { pkg, err }).await;
        });
    }
    drop(tx);

    for seq in 1..=total {
        let Some(result) = rx.recv().await else {
            break;
        };
        match result.err {
            None => print::info(&format!(
                "{} {} ({})",
                count_format(seq, total),
                result.pkg.import_path,
                result.pkg.current_to_latest_str()
            )),
            Some(err) => {
                exit = 1;
                print::err(&format!("{} {}", count_format(seq, total), err));
            }
        }
    }

    if opts.dry_run {
        let left = paths.lock().unwrap().leave_rehearsal(env.as_ref());
        if let Some(watcher) = watcher {
            watcher.stop().await;
        }
        if let Err(err) = left {
            print::err(&format!("can not change dry run mode to normal mode: {err}"));
            exit = 1;
        }
    }

    if opts.notify {
        if exit == 0 {
            notify::info("binup", "All update success");
        } else {
            notify::warn("binup", "Some package can't update");
        }
    }
    exit
}

/// Read-only variant: query latest versions, never install. Collects the
/// packages that need an update and prints the command to update them.
pub async fn run_check(tool: Arc<dyn GoTool>, pkgs: Vec<Package>, jobs: usize) -> i32 {
    let mut exit = 0;
    let total = pkgs.len();

    print::info("check binary under $GOPATH/bin or $GOBIN");

    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let (tx, mut rx) = mpsc::channel::<UpdateResult>(total.max(1));

    for pkg in pkgs {
        let semaphore = Arc::clone(&semaphore);
        let tool = Arc::clone(&tool);
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut pkg = pkg;
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    let _ = tx.send(UpdateResult { pkg, err: Some(err.to_string()) }).await;
                    return;
                }
            };

            let err = if pkg.module_path.is_empty() {
                Some(format!(
                    "{} is not installed by 'go install' (or permission incorrect)",
                    pkg.name
                ))
            } else {
                match tool.latest_version(&pkg.module_path) {
                    Ok(latest) => {
                        pkg.version.latest = latest;
                        None
                    }
                    Err(err) => Some(format!("{} {}", pkg.name, err)),
                }
            };

            drop(permit);
            let _ = tx.send(UpdateResult { pkg, err }).await;
        });
    }
    drop(tx);

    let mut need_update = Vec::new();
    for seq in 1..=total {
        let Some(result) = rx.recv().await else {
            break;
        };
        match result.err {
            None => {
                print::info(&format!(
                    "{} {} ({})",
                    count_format(seq, total),
                    result.pkg.module_path,
                    result.pkg.version_check_result_str()
                ));
                if !result.pkg.version.is_already_up_to_date() {
                    need_update.push(result.pkg.name.clone());
                }
            }
            Some(err) => {
                exit = 1;
                print::err(&format!("{} {}", count_format(seq, total), err));
            }
        }
    }

    print_updatable(&need_update);
    exit
}

fn print_updatable(names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!();
    print::info(&format!(
        "If you want to update binaries, run the following command.\n{}$ binup update {}",
        " ".repeat(11),
        names.join(" ")
    ));
}

/// Inventory of the install target resolved to packages, shared by the
/// update/check/list/export commands.
pub fn package_info(
    tool: &dyn GoTool,
    env: &dyn EnvironmentPort,
) -> anyhow::Result<Vec<Package>> {
    use anyhow::Context;

    let gobin = crate::gotool::go_bin(env).context("can't find installed binaries")?;
    let bins = inventory::binary_path_list(&gobin)
        .context("can't get binary-paths installed by 'go install'")?;
    Ok(inventory::package_information(tool, &bins))
}
