mod cli;
mod conf;
mod executor;
mod goenv;
mod gotool;
mod interrupt;
mod inventory;
mod notify;
mod print;
mod version;


use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use console::style;
use executor::{package_info, run_check, run_update, UpdateOptions};
use goenv::{EnvironmentPort, ProcessEnv};
use gotool::{can_use_go_cmd, go_bin, GoCmd, GoTool};
use std::fs;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    let code = run(cli).await;
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    match cli.command {
        Commands::Version => {
            println!("binup v{}", env!("CARGO_PKG_VERSION"));
            0
        }

        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            0
        }

        Commands::Update {
            binaries,
            dry_run,
            notify,
            exclude,
            main_pkgs,
            jobs,
        } => {
            update_cmd(
                binaries,
                exclude,
                UpdateOptions {
                    dry_run,
                    notify,
                    jobs,
                    main_pkgs,
                },
            )
            .await
        }

        Commands::Check { binaries, jobs } => check_cmd(binaries, jobs).await,

        Commands::List => list_cmd(),

        Commands::Export { output } => export_cmd(output),

        Commands::Import {
            dry_run,
            notify,
            jobs,
        } => import_cmd(dry_run, notify, jobs).await,

        Commands::Remove { binaries, force } => remove_cmd(binaries, force),
    }
}

async fn update_cmd(binaries: Vec<String>, exclude: Vec<String>, opts: UpdateOptions) -> i32 {
    if let Err(err) = can_use_go_cmd() {
        print::err(&format!("you didn't install golang: {err}"));
        return 1;
    }

    let env: Arc<dyn EnvironmentPort> = Arc::new(ProcessEnv);
    let tool: Arc<dyn GoTool> = Arc::new(GoCmd::new());

    let pkgs = match package_info(tool.as_ref(), env.as_ref()) {
        Ok(pkgs) => pkgs,
        Err(err) => {
            print::err(&format!("can't get package info: {err:#}"));
            return 1;
        }
    };
    let pkgs = inventory::select_by_name(pkgs, &binaries);
    let pkgs = inventory::exclude_by_name(pkgs, &exclude);

    if pkgs.is_empty() {
        print::err("unable to update package: no package information or no package under $GOBIN");
        return 1;
    }
    run_update(tool, env, pkgs, opts).await
}

async fn check_cmd(binaries: Vec<String>, jobs: usize) -> i32 {
    if let Err(err) = can_use_go_cmd() {
        print::err(&format!("you didn't install golang: {err}"));
        return 1;
    }

    let env = ProcessEnv;
    let tool: Arc<dyn GoTool> = Arc::new(GoCmd::new());

    let pkgs = match package_info(tool.as_ref(), &env) {
        Ok(pkgs) => pkgs,
        Err(err) => {
            print::err(&format!("can't get package info: {err:#}"));
            return 1;
        }
    };
    let pkgs = inventory::select_by_name(pkgs, &binaries);

    if pkgs.is_empty() {
        print::err("unable to check package: no package information");
        return 1;
    }
    run_check(tool, pkgs, jobs).await
}

fn list_cmd() -> i32 {
    if let Err(err) = can_use_go_cmd() {
        print::err(&format!("you didn't install golang: {err}"));
        return 1;
    }

    let env = ProcessEnv;
    let tool = GoCmd::new();
    let pkgs = match package_info(&tool, &env) {
        Ok(pkgs) => pkgs,
        Err(err) => {
            print::err(&format!("can't get package info: {err:#}"));
            return 1;
        }
    };

    if pkgs.is_empty() {
        print::err("unable to list up package: no package information");
        return 1;
    }

    let width = pkgs.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for pkg in &pkgs {
        println!(
            "{:>width$}: {}{}",
            pkg.name,
            pkg.import_path,
            style(format!("@{}", pkg.version.current)).green(),
        );
    }
    0
}

fn export_cmd(output: bool) -> i32 {
    if let Err(err) = can_use_go_cmd() {
        print::err(&format!("you didn't install golang: {err}"));
        return 1;
    }

    let env = ProcessEnv;
    let tool = GoCmd::new();
    let pkgs = match package_info(&tool, &env) {
        Ok(pkgs) => pkgs,
        Err(err) => {
            print::err(&format!("can't get package info: {err:#}"));
            return 1;
        }
    };

    // Binaries without an import path cannot be reinstalled elsewhere.
    let pkgs: Vec<_> = pkgs
        .into_iter()
        .filter(|pkg| {
            if pkg.import_path.is_empty() {
                print::warn(&format!(
                    "can't get '{}' package path information. old go version binary",
                    pkg.name
                ));
                return false;
            }
            true
        })
        .collect();

    if pkgs.is_empty() {
        print::err("no package information");
        return 1;
    }

    if output {
        if let Err(err) = conf::write_conf(&mut std::io::stdout(), &pkgs) {
            print::err(&err.to_string());
            return 1;
        }
        return 0;
    }

    match write_conf_file(&pkgs) {
        Ok(path) => {
            print::info(&format!("Export {path}"));
            0
        }
        Err(err) => {
            print::err(&format!("{err:#}"));
            1
        }
    }
}

fn write_conf_file(pkgs: &[version::Package]) -> anyhow::Result<String> {
    use anyhow::Context;

    let dir = conf::dir_path()?;
    fs::create_dir_all(&dir).context("can not make config directory")?;

    let path = conf::file_path()?;
    let mut file = fs::File::create(&path)
        .with_context(|| format!("can't update {}", path.display()))?;
    conf::write_conf(&mut file, pkgs)
        .with_context(|| format!("can't update {}", path.display()))?;
    Ok(path.display().to_string())
}

async fn import_cmd(dry_run: bool, notify: bool, jobs: usize) -> i32 {
    let path = match conf::file_path() {
        Ok(path) => path,
        Err(err) => {
            print::err(&format!("{err:#}"));
            return 1;
        }
    };
    if !path.is_file() {
        print::err(&format!("{} is not found", path.display()));
        return 1;
    }

    let pkgs = match conf::read_conf_file(&path) {
        Ok(pkgs) => pkgs,
        Err(err) => {
            print::err(&format!("{err:#}"));
            return 1;
        }
    };
    if pkgs.is_empty() {
        print::err("unable to update package: no package information");
        return 1;
    }

    if let Err(err) = can_use_go_cmd() {
        print::err(&format!("you didn't install golang: {err}"));
        return 1;
    }

    run_update(
        Arc::new(GoCmd::new()),
        Arc::new(ProcessEnv),
        pkgs,
        UpdateOptions {
            dry_run,
            notify,
            jobs,
            main_pkgs: Vec::new(),
        },
    )
    .await
}

fn remove_cmd(binaries: Vec<String>, force: bool) -> i32 {
    let env = ProcessEnv;
    let gobin = match go_bin(&env) {
        Ok(gobin) => gobin,
        Err(err) => {
            print::err(&err.to_string());
            return 1;
        }
    };

    let mut result = 0;
    for name in binaries {
        // The user may omit the extension on Windows.
        let mut name = name;
        if cfg!(windows) && !name.to_lowercase().ends_with(".exe") {
            name.push_str(".exe");
        }

        let target = gobin.join(&name);
        if !target.is_file() {
            print::err(&format!("no such file or directory: {}", target.display()));
            result = 1;
            continue;
        }
        if !force && !print::question(&format!("remove {}?", target.display())) {
            print::info(&format!("cancel removal {}", target.display()));
            continue;
        }

        match fs::remove_file(&target) {
            Ok(()) => print::info(&format!("removed {}", target.display())),
            Err(err) => print::err(&err.to_string()),
        }
    }
    result
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}
