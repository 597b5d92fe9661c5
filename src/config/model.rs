//! JobConfig struct definition and default implementation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the thumbnail job runner.
///
/// This struct represents the contents of the runner's YAML config file.
/// Unknown fields in the YAML are ignored for forward compatibility.
///
/// Everything here describes the deployment the worker runs inside: where
/// the JVM lives, where the webapp tree with the worker's classpath roots
/// is, and which defaults apply when the property snapshot does not
/// override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Path to the JVM executable used to launch the worker.
    #[serde(default = "default_java_command_path")]
    pub java_command_path: String,

    /// Path to the webapp root (the directory containing `WEB-INF`).
    /// Also used as the worker's working directory, so the relative
    /// classpath entries resolve against it.
    #[serde(default = "default_webapp_path")]
    pub webapp_path: PathBuf,

    /// Build output directory; `<target>/classes` and
    /// `<target>/fess/WEB-INF/lib` are added to the classpath when they
    /// exist, and `<target>/logs` is the log path of last resort.
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    /// Cluster name passed to the worker when the property snapshot does
    /// not override it.
    #[serde(default = "default_cluster_name")]
    pub elasticsearch_cluster_name: String,

    /// Whether the worker gets a private temp directory keyed by session
    /// id instead of sharing the system temp root.
    #[serde(default = "default_true")]
    pub use_own_tmp_dir: bool,

    /// Default JVM options appended to every worker invocation. Blank
    /// entries are dropped.
    #[serde(default = "default_jvm_options")]
    pub jvm_options: Vec<String>,
}

// Default value functions for serde
fn default_java_command_path() -> String {
    "java".to_string()
}
fn default_webapp_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}
fn default_cluster_name() -> String {
    "fess-es".to_string()
}
fn default_true() -> bool {
    true
}
fn default_jvm_options() -> Vec<String> {
    vec![
        "-Djava.awt.headless=true".to_string(),
        "-Dfile.encoding=UTF-8".to_string(),
        "-Xmx256m".to_string(),
    ]
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            java_command_path: default_java_command_path(),
            webapp_path: default_webapp_path(),
            target_dir: default_target_dir(),
            elasticsearch_cluster_name: default_cluster_name(),
            use_own_tmp_dir: default_true(),
            jvm_options: default_jvm_options(),
        }
    }
}
