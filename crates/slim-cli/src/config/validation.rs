use crate::config::{Optimizations, SlimConfig, Target};
use crate::error::UserInputError;
use slim_loader::LoadOptions;
use slim_optimize::OptimizeOptions;
use std::path::{Path, PathBuf};

/// Entry files tried in order when none is given.
pub const ENTRY_CANDIDATES: [&str; 8] = [
    "src/index.ts",
    "src/index.tsx",
    "src/index.js",
    "src/index.jsx",
    "index.ts",
    "index.tsx",
    "index.js",
    "index.jsx",
];

/// Configuration that passed validation, with paths made absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub root: PathBuf,
    pub entry: PathBuf,
    pub outfile: PathBuf,
    pub minify: bool,
    pub target: Target,
    pub external: Vec<String>,
    pub optimizations: Optimizations,
}

impl SlimConfig {
    /// Check user input before any build work starts.
    ///
    /// Relative paths resolve against `cwd` from the config when set,
    /// otherwise against `root`.
    pub fn validate(&self, root: &Path) -> Result<ValidatedConfig, UserInputError> {
        let root = match &self.cwd {
            Some(cwd) => root.join(cwd),
            None => root.to_path_buf(),
        };

        let target: Target = self.target.parse()?;
        let entry = resolve_entry(self.entry.as_deref(), &root)?;

        let outfile = root.join(&self.outfile);
        if outfile.is_dir() {
            return Err(UserInputError::OutfileIsDirectory(outfile));
        }

        Ok(ValidatedConfig {
            root,
            entry,
            outfile,
            minify: self.minify,
            target,
            external: self.external.clone(),
            optimizations: self.optimizations,
        })
    }
}

fn resolve_entry(entry: Option<&Path>, root: &Path) -> Result<PathBuf, UserInputError> {
    match entry {
        Some(entry) => {
            let path = root.join(entry);
            if path.is_file() {
                Ok(path)
            } else {
                Err(UserInputError::EntryNotFound(entry.to_path_buf()))
            }
        }
        None => ENTRY_CANDIDATES
            .iter()
            .map(|candidate| root.join(candidate))
            .find(|path| path.is_file())
            .ok_or_else(|| UserInputError::NoEntryCandidate {
                dir: root.to_path_buf(),
                candidates: ENTRY_CANDIDATES.iter().map(|c| c.to_string()).collect(),
            }),
    }
}

impl ValidatedConfig {
    pub fn optimize_options(&self) -> OptimizeOptions {
        let mut options = OptimizeOptions::new(&self.entry);
        options.outfile = self.outfile.clone();
        options.minify = self.minify;
        options.runtime = self.target.runtime();
        options.toggles = self.optimizations.into();
        options.external = self.external.clone();
        options.cwd = Some(self.root.clone());
        options.target = self.target.syntax_target().map(str::to_string);
        options
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::new()
            .runtime(self.target.runtime())
            .external(self.external.iter().cloned())
            .cwd(self.root.clone())
    }
}
