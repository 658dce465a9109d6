use console::style;
use std::io::{self, BufRead, Write};

const NAME: &str = "binup";

/// Result lines go to stdout without a prefix so the report stays
/// readable at full width.
pub fn info(msg: &str) {
    println!("{msg}");
}

pub fn warn(msg: &str) {
    eprintln!("{}:{}: {}", NAME, style("WARN ").yellow(), msg);
}

pub fn err(msg: &str) {
    eprintln!("{}:{}: {}", NAME, style("ERROR").yellow().bright(), msg);
}

/// Ask a yes/no question on the terminal. Plain enter means yes.
pub fn question(ask: &str) -> bool {
    loop {
        print!("{}:{}: {} [Y/n] ", NAME, style("CHECK").green(), ask);
        let _ = io::stdout().flush();

        let mut response = String::new();
        if io::stdin().lock().read_line(&mut response).is_err() {
            return false;
        }
        match response.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => return true,
            "n" | "no" => return false,
            _ => continue,
        }
    }
}
