use serde::Serialize;

/// One catalog package plus its selection and installation status.
///
/// `versions` is kept in descending ordinal order without duplicates once the
/// catalog parser has finished building the entry.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    name: String,
    versions: Vec<String>,
    pub selected: Option<String>,
    pub installed: Option<String>,
}

/// Derived lifecycle state of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageState<'a> {
    Absent,
    Installed(&'a str),
    PendingInstall(&'a str),
    PendingChange { from: &'a str, to: &'a str },
}

/// What committing this package would do.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageAction {
    None,
    Install,
    Change,
    Remove,
}

impl PackageAction {
    pub fn label(self) -> &'static str {
        match self {
            PackageAction::None => "None",
            PackageAction::Install => "Install",
            PackageAction::Change => "Change",
            PackageAction::Remove => "Remove",
        }
    }
}

impl PackageEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
            selected: None,
            installed: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Newest version by ordinal order, if the catalog lists any.
    pub fn latest(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Appends a version while the catalog is being built.
    pub fn add_version(&mut self, version: impl Into<String>) {
        self.versions.push(version.into());
    }

    /// Sorts versions descending and drops duplicates.
    pub(crate) fn normalize_versions(&mut self) {
        self.versions.sort_by(|a, b| b.cmp(a));
        self.versions.dedup();
    }

    /// Nothing selected while something is installed.
    pub fn can_remove(&self) -> bool {
        self.selected.is_none() && self.installed.is_some()
    }

    /// A selection exists and differs from what is installed.
    pub fn can_install_or_change(&self) -> bool {
        self.selected.is_some() && self.selected != self.installed
    }

    pub fn is_pending(&self) -> bool {
        self.selected != self.installed
    }

    pub fn state(&self) -> PackageState<'_> {
        match (self.installed.as_deref(), self.selected.as_deref()) {
            (None, None) => PackageState::Absent,
            (None, Some(to)) => PackageState::PendingInstall(to),
            (Some(from), Some(to)) if from != to => PackageState::PendingChange { from, to },
            (Some(installed), _) => PackageState::Installed(installed),
        }
    }

    pub fn action(&self) -> PackageAction {
        if self.can_remove() {
            PackageAction::Remove
        } else if self.can_install_or_change() {
            if self.installed.is_none() {
                PackageAction::Install
            } else {
                PackageAction::Change
            }
        } else {
            PackageAction::None
        }
    }

    /// Sets both `installed` and `selected` to what the manifest records.
    pub(crate) fn reset_to(&mut self, installed: Option<String>) {
        self.selected = installed.clone();
        self.installed = installed;
    }
}
