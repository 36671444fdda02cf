use crate::format::ansi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// A person is at the keyboard; terraform may prompt.
    Operator,
    /// CI or an explicit override; prompts are auto-approved.
    Unattended,
}

impl ExecMode {
    pub fn label(self) -> &'static str {
        match self {
            ExecMode::Operator => "operator",
            ExecMode::Unattended => "unattended",
        }
    }

    pub fn colored_label(self) -> String {
        match self {
            ExecMode::Operator => ansi::green(self.label()),
            ExecMode::Unattended => ansi::red(self.label()),
        }
    }
}

const CI_TRUE_MARKERS: [(&str, &str); 7] = [
    ("GITHUB_ACTIONS", "true"),
    ("GITLAB_CI", "true"),
    ("CIRCLECI", "true"),
    ("TRAVIS", "true"),
    ("TF_BUILD", "True"),
    ("BUILDKITE", "true"),
    ("DRONE", "true"),
];

const CI_PRESENT_MARKERS: [&str; 5] = [
    "JENKINS_URL",
    "BUILD_NUMBER",
    "bamboo_buildKey",
    "TEAMCITY_VERSION",
    "CODEBUILD_BUILD_ID",
];

pub fn is_running_in_ci_with(env: impl Fn(&str) -> Option<String>) -> bool {
    let non_empty = |key: &str| env(key).is_some_and(|v| !v.is_empty());

    CI_TRUE_MARKERS
        .iter()
        .any(|(key, expected)| env(key).as_deref() == Some(*expected))
        || CI_PRESENT_MARKERS.iter().any(|key| non_empty(key))
        || matches!(env("CI").as_deref(), Some("true" | "1"))
        || env("USER").as_deref() == Some("jenkins")
}

pub fn detect_exec_mode_with(env: impl Fn(&str) -> Option<String>) -> ExecMode {
    let override_set = env("TF_EXEC_MODE_OVERRIDE").is_some_and(|v| !v.is_empty());
    if override_set || is_running_in_ci_with(&env) {
        return ExecMode::Unattended;
    }
    ExecMode::Operator
}

pub fn detect_exec_mode() -> ExecMode {
    detect_exec_mode_with(|key| std::env::var(key).ok())
}
