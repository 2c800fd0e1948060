use std::fmt;
use std::str::FromStr;

use slim_loader::RuntimeEnvironment;

use crate::error::UserInputError;

/// Environment target accepted by `--target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    EsNext,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    Es2023,
    Es2024,
    Node18,
    Node20,
    Node22,
    Node24,
    Deno,
    Bun,
    Workerd,
    Browser,
}

impl Target {
    /// Every accepted target, in the order shown to users.
    pub const ALL: [Target; 19] = [
        Target::EsNext,
        Target::Es2015,
        Target::Es2016,
        Target::Es2017,
        Target::Es2018,
        Target::Es2019,
        Target::Es2020,
        Target::Es2021,
        Target::Es2022,
        Target::Es2023,
        Target::Es2024,
        Target::Node18,
        Target::Node20,
        Target::Node22,
        Target::Node24,
        Target::Deno,
        Target::Bun,
        Target::Workerd,
        Target::Browser,
    ];

    pub const DEFAULT: Target = Target::Node20;

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::EsNext => "esnext",
            Target::Es2015 => "es2015",
            Target::Es2016 => "es2016",
            Target::Es2017 => "es2017",
            Target::Es2018 => "es2018",
            Target::Es2019 => "es2019",
            Target::Es2020 => "es2020",
            Target::Es2021 => "es2021",
            Target::Es2022 => "es2022",
            Target::Es2023 => "es2023",
            Target::Es2024 => "es2024",
            Target::Node18 => "node18",
            Target::Node20 => "node20",
            Target::Node22 => "node22",
            Target::Node24 => "node24",
            Target::Deno => "deno",
            Target::Bun => "bun",
            Target::Workerd => "workerd",
            Target::Browser => "browser",
        }
    }

    /// Runtime the probe and production builds resolve packages for.
    ///
    /// Bun resolves like Node. Plain ECMAScript versions and Deno get the
    /// neutral condition set.
    pub fn runtime(&self) -> RuntimeEnvironment {
        match self {
            Target::Node18 | Target::Node20 | Target::Node22 | Target::Node24 | Target::Bun => {
                RuntimeEnvironment::Node
            }
            Target::Workerd => RuntimeEnvironment::EdgeWorker,
            Target::Browser => RuntimeEnvironment::Browser,
            _ => RuntimeEnvironment::Neutral,
        }
    }

    /// Syntax level passed to the production build.
    ///
    /// ECMAScript versions and Node releases lower syntax the engine lacks.
    /// The rest track current engines and keep syntax as written.
    pub fn syntax_target(&self) -> Option<&'static str> {
        match self {
            Target::EsNext | Target::Deno | Target::Bun | Target::Workerd | Target::Browser => {
                None
            }
            other => Some(other.as_str()),
        }
    }

    /// Comma-separated whitelist for error messages.
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(Target::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = UserInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.as_str() == s)
            .ok_or_else(|| UserInputError::InvalidTarget {
                value: s.to_string(),
                valid: Self::valid_list(),
            })
    }
}
