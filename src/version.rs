use console::style;

/// Version pair of a single binary: the version found before this run and
/// the version observed or installed during it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub current: String,
    pub latest: String,
}

impl Version {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            latest: String::new(),
        }
    }

    /// Whether `current` is at or past `latest`.
    ///
    /// Comparison is lexical with the leading 'v' stripped, not semantic
    /// versioning. Untagged pseudo-versions (timestamp + hash) have no
    /// meaningful ordering, so they are compared as opaque strings; as a
    /// consequence numeric components can misorder ("9" > "10"). This is
    /// the behavior of the underlying toolchain's version labels and is
    /// kept as-is.
    pub fn is_already_up_to_date(&self) -> bool {
        if self.current == self.latest {
            return true;
        }
        up_to_date(
            self.current.trim_start_matches('v'),
            self.latest.trim_start_matches('v'),
        )
    }
}

/// A binary installed by 'go install', with the identity needed to
/// reinstall it and the version pairs for the binary and its toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// File name of the binary (includes `.exe` on Windows).
    pub name: String,
    /// Import path used by 'go install'. Empty if undiscoverable, which
    /// marks an orphaned binary that can be listed but never updated.
    pub import_path: String,
    /// Root module path, used for display and latest-version queries.
    pub module_path: String,
    pub version: Version,
    pub go_version: Version,
}

impl Package {
    /// True when neither the binary nor the toolchain that built it needs
    /// an update.
    pub fn is_already_up_to_date(&self) -> bool {
        if self.version.current == self.version.latest
            && self.go_version.current == self.go_version.latest
        {
            return true;
        }
        up_to_date(
            self.version.current.trim_start_matches('v'),
            self.version.latest.trim_start_matches('v'),
        ) && up_to_date(
            self.go_version.current.trim_start_matches(['g', 'o']),
            self.go_version.latest.trim_start_matches(['g', 'o']),
        )
    }

    /// Render the update transition for a result line, e.g.
    /// "v1.1.0 to v1.1.1" or "Already up-to-date: v1.1.1 / go1.22.0".
    /// Unchanged fragments are omitted.
    pub fn current_to_latest_str(&self) -> String {
        if self.is_already_up_to_date() {
            return format!(
                "Already up-to-date: {} / {}",
                style(&self.version.latest).green(),
                style(&self.go_version.current).green()
            );
        }

        let mut ret = String::new();
        if self.version.current != self.version.latest {
            ret.push_str(&format!(
                "{} to {}",
                style(&self.version.current).green(),
                style(&self.version.latest).yellow()
            ));
        }
        if self.go_version.current != self.go_version.latest {
            if !ret.is_empty() {
                ret.push_str(", ");
            }
            ret.push_str(&format!(
                "{} to {}",
                style(&self.go_version.current).green(),
                style(&self.go_version.latest).yellow()
            ));
        }
        ret
    }

    /// Render the check-mode result line.
    pub fn version_check_result_str(&self) -> String {
        if self.is_already_up_to_date() {
            return format!(
                "Already up-to-date: {} / {}",
                style(&self.version.latest).green(),
                style(&self.go_version.current).green()
            );
        }

        let mut ret = String::new();
        if self.version.current == self.version.latest {
            ret.push_str(&style(&self.version.current).green().to_string());
        } else {
            ret.push_str(&format!("current: {}, latest: ", style(&self.version.current).green()));
            if self.version.is_already_up_to_date() {
                ret.push_str(&style(&self.version.latest).green().to_string());
            } else {
                ret.push_str(&style(&self.version.latest).yellow().to_string());
            }
        }
        ret.push_str(" / ");
        if self.go_version.current == self.go_version.latest {
            ret.push_str(&style(&self.go_version.current).green().to_string());
        } else {
            ret.push_str(&format!(
                "current: {}, installed: ",
                style(&self.go_version.current).green()
            ));
            if self.go_version.is_already_up_to_date() {
                ret.push_str(&style(&self.go_version.latest).green().to_string());
            } else {
                ret.push_str(&style(&self.go_version.latest).yellow().to_string());
            }
        }
        ret
    }
}

// An empty `latest` means a failed check; it never counts as up to date.
fn up_to_date(current: &str, available: &str) -> bool {
    if current == available {
        return true;
    }
    !available.is_empty() && current >= available
}
